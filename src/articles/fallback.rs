// src/articles/fallback.rs
//! Statically authored articles, used when the store has no published record.

use anyhow::{anyhow, Context, Result};
use axum::http::HeaderValue;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{parse_body, ArticleBody, ArticleOrigin, ArticleRecord};
use crate::venues::RelatedVenueIds;

pub const ENV_FALLBACK_PATH: &str = "GUIDE_FALLBACK_PATH";

const SEED_JSON: &str = include_str!("../../config/fallback_articles.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FallbackArticle {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, alias = "image")]
    pub hero_image: String,
    /// Already a display string, e.g. "Mar 5, 2024".
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub read_time: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub related: RelatedVenueIds,
    #[serde(default)]
    pub is_external_page: bool,
    #[serde(default)]
    pub external_url: Option<String>,
}

impl FallbackArticle {
    /// Target URL when this entry is an external page. A missing URL, or one
    /// that cannot travel in a `Location` header, renders inline instead.
    pub fn redirect_target(&self) -> Option<&str> {
        if !self.is_external_page {
            return None;
        }
        let Some(url) = self
            .external_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        else {
            tracing::warn!(target: "articles", slug = %self.slug, "external page without URL; rendering inline");
            return None;
        };
        if let Err(e) = HeaderValue::try_from(url) {
            tracing::warn!(target: "articles", slug = %self.slug, error = %e, "external URL is not a valid header value; rendering inline");
            return None;
        }
        Some(url)
    }

    pub fn to_record(&self) -> ArticleRecord {
        let body = parse_body(self.body.as_ref()).unwrap_or_else(|e| {
            tracing::warn!(target: "articles", slug = %self.slug, error = %e, "fallback body unusable");
            ArticleBody::None
        });
        ArticleRecord {
            slug: self.slug.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            excerpt: self.excerpt.clone(),
            hero_image: self.hero_image.clone(),
            published_date: self.date.clone(),
            read_time: self.read_time.clone(),
            author_name: self.author_name.clone(),
            author_avatar: self.author_avatar.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            body,
            related: self.related.clone(),
            origin: ArticleOrigin::Fallback,
        }
    }
}

/// Immutable slug → article lookup. The first entry for a slug wins.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    entries: Vec<FallbackArticle>,
    index: HashMap<String, usize>,
}

impl FallbackTable {
    pub fn new(items: Vec<FallbackArticle>) -> Self {
        let mut entries = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for it in items {
            let slug = it.slug.trim().to_string();
            if slug.is_empty() {
                continue;
            }
            if index.contains_key(&slug) {
                tracing::warn!(target: "articles", %slug, "duplicate fallback slug ignored");
                continue;
            }
            index.insert(slug, entries.len());
            entries.push(it);
        }
        Self { entries, index }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &str) -> Option<&FallbackArticle> {
        self.index.get(slug).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FallbackArticle> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from an explicit path. Supports TOML (`[[article]]`) or JSON (array).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading fallback articles from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_table(&content, ext.as_str())
            .with_context(|| format!("parsing fallback articles {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $GUIDE_FALLBACK_PATH
    /// 2) config/fallback_articles.json
    /// 3) config/fallback_articles.toml
    /// 4) built-in seed
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_FALLBACK_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_FALLBACK_PATH} points to non-existent path"));
            }
        }
        let json_p = PathBuf::from("config/fallback_articles.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        let toml_p = PathBuf::from("config/fallback_articles.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Ok(Self::seed())
    }

    /// Articles compiled into the binary.
    pub fn seed() -> Self {
        match parse_json(SEED_JSON) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(target: "articles", error = %e, "built-in fallback articles do not parse");
                Self::empty()
            }
        }
    }
}

fn parse_table(s: &str, hint_ext: &str) -> Result<FallbackTable> {
    if hint_ext == "toml" {
        return parse_toml(s);
    }
    if let Ok(t) = parse_json(s) {
        return Ok(t);
    }
    parse_toml(s).map_err(|_| anyhow!("unsupported fallback article format"))
}

fn parse_toml(s: &str) -> Result<FallbackTable> {
    #[derive(Deserialize)]
    struct TomlArticles {
        #[serde(default)]
        article: Vec<FallbackArticle>,
    }
    let v: TomlArticles = toml::from_str(s)?;
    Ok(FallbackTable::new(v.article))
}

fn parse_json(s: &str) -> Result<FallbackTable> {
    let v: Vec<FallbackArticle> = serde_json::from_str(s)?;
    Ok(FallbackTable::new(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn seed_parses_and_contains_an_external_page() {
        let t = FallbackTable::seed();
        assert!(!t.is_empty());
        assert!(t.iter().any(|a| a.redirect_target().is_some()));
    }

    #[test]
    fn toml_tables_with_structured_body() {
        let s = r#"
            [[article]]
            slug = "edibles-101"
            title = "Edibles 101"
            date = "Jan 2, 2024"
            category = "Education"
            tags = ["Edibles"]

            [article.body]
            introduction = "Go slow."
            safetyTips = ["Wait two hours"]

            [[article.body.sections]]
            title = "Dosing"
            content = "<p>5mg</p>"
            icon = "clock"
            variant = "warning"

            [[article]]
            slug = "edibles-101"
            title = "Duplicate"
        "#;
        let t = parse_toml(s).unwrap();
        assert_eq!(t.len(), 1);
        let rec = t.get("edibles-101").unwrap().to_record();
        assert_eq!(rec.title, "Edibles 101");
        assert_eq!(rec.published_date, "Jan 2, 2024");
        let ArticleBody::Structured(b) = rec.body else {
            panic!("expected structured body");
        };
        assert_eq!(b.sections.len(), 1);
        assert_eq!(b.safety_tips, vec!["Wait two hours".to_string()]);
    }

    #[test]
    fn external_flag_without_url_renders_inline() {
        let a = FallbackArticle {
            is_external_page: true,
            external_url: Some("  ".into()),
            ..serde_json::from_str(r#"{"slug":"x","title":"X"}"#).unwrap()
        };
        assert_eq!(a.redirect_target(), None);
    }

    #[test]
    fn external_url_that_cannot_be_a_header_renders_inline() {
        let mut a: FallbackArticle = serde_json::from_str(
            r#"{"slug":"x","title":"X","is_external_page":true,"external_url":"https://ok.test/a"}"#,
        )
        .unwrap();
        assert_eq!(a.redirect_target(), Some("https://ok.test/a"));

        a.external_url = Some("https://bad.test/\nSet-Cookie: x=1".into());
        assert_eq!(a.redirect_target(), None);
        assert_eq!(a.to_record().title, "X");
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_FALLBACK_PATH);

        // No files in the temp CWD → built-in seed
        let seeded = FallbackTable::load_default().unwrap();
        assert_eq!(seeded.len(), FallbackTable::seed().len());

        // Env wins
        let p = tmp.path().join("articles.json");
        fs::write(&p, r#"[{"slug":"only","title":"Only"}]"#).unwrap();
        env::set_var(ENV_FALLBACK_PATH, p.display().to_string());
        let t = FallbackTable::load_default().unwrap();
        assert_eq!(t.len(), 1);
        assert!(t.get("only").is_some());

        env::set_var(ENV_FALLBACK_PATH, tmp.path().join("missing.json").display().to_string());
        assert!(FallbackTable::load_default().is_err());
        env::remove_var(ENV_FALLBACK_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
