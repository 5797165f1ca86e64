// src/articles/mod.rs
//! # Content Record Resolver
//!
//! An article slug resolves against two sources:
//!
//! 1. the persisted article table, published rows only;
//! 2. the statically authored [`FallbackTable`], injected at construction.
//!
//! Exactly one source is authoritative for a slug. A published persisted row
//! wins in full; the fallback record applies in full only when no such row
//! exists. Fields are never mixed across sources.
//!
//! Fallback records flagged as external pages resolve to
//! [`ArticleResolution::Redirect`] instead of inline content.

pub mod fallback;
pub mod icons;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use metrics::counter;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::store::TableNames;
use crate::error::ResolveError;
use crate::search::ArticleSummary;
use crate::store::types::{row_str, row_str_list};
use crate::store::{select_bounded, Filter, OrderBy, Row, Select, SharedStore};
use crate::venues::RelatedVenueIds;

pub use fallback::{FallbackArticle, FallbackTable};
pub use icons::IconKey;

/// Only rows with this status are visible.
pub const PUBLISHED: &str = "published";

/// Presentation-only styling of a body section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionVariant {
    #[default]
    Default,
    Accent,
    Warning,
    Gold,
}

impl SectionVariant {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "accent" => SectionVariant::Accent,
            "warning" => SectionVariant::Warning,
            "gold" => SectionVariant::Gold,
            _ => SectionVariant::Default,
        }
    }
}

impl<'de> Deserialize<'de> for SectionVariant {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().map(SectionVariant::from_name).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(alias = "body_markup", alias = "content", alias = "body")]
    pub body_markup: String,
    #[serde(default)]
    pub icon: IconKey,
    #[serde(default, alias = "color")]
    pub variant: SectionVariant,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, alias = "safety_tips")]
    pub safety_tips: Vec<String>,
}

impl StructuredBody {
    fn is_blank(&self) -> bool {
        self.introduction.is_none()
            && self.disclaimer.is_none()
            && self.sections.is_empty()
            && self.safety_tips.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArticleBody {
    /// Nothing to render past the header.
    #[default]
    None,
    Structured(StructuredBody),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleOrigin {
    Persisted,
    Fallback,
}

impl ArticleOrigin {
    fn as_str(self) -> &'static str {
        match self {
            ArticleOrigin::Persisted => "persisted",
            ArticleOrigin::Fallback => "fallback",
        }
    }
}

/// The origin-agnostic article shape every article page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub excerpt: String,
    pub hero_image: String,
    pub published_date: String,
    pub read_time: String,
    pub author_name: String,
    pub author_avatar: String,
    pub category: String,
    pub tags: Vec<String>,
    pub body: ArticleBody,
    pub related: RelatedVenueIds,
    /// Diagnostic only.
    pub origin: ArticleOrigin,
}

impl ArticleRecord {
    /// Normalize a persisted row. Unpublished rows and rows without slug/title yield `None`.
    pub fn from_persisted(row: &Row) -> Option<Self> {
        if !is_published(row) {
            return None;
        }
        let slug = row_str(row, "slug")?;
        let title = row_text(row, "title")?;

        let raw_body = row.get("body").or_else(|| row.get("content"));
        let body = parse_body(raw_body).unwrap_or_else(|e| {
            tracing::warn!(target: "articles", %slug, error = %e, "persisted body unusable; rendering without body");
            ArticleBody::None
        });

        let published_date = row_str(row, "published_at")
            .or_else(|| row_str(row, "created_at"))
            .map(|raw| format_display_date(&raw))
            .unwrap_or_default();

        Some(Self {
            slug,
            title,
            subtitle: row_text(row, "subtitle"),
            excerpt: row_text(row, "excerpt").unwrap_or_default(),
            hero_image: row_str(row, "hero_image").unwrap_or_default(),
            published_date,
            read_time: read_time_display(row.get("read_time")),
            author_name: row_str(row, "author_name").unwrap_or_default(),
            author_avatar: row_str(row, "author_avatar").unwrap_or_default(),
            category: row_str(row, "category").unwrap_or_default(),
            tags: row_str_list(row, "tags"),
            body,
            related: RelatedVenueIds {
                retailers: row_str_list(row, "related_dispensary_ids"),
                lodgings: row_str_list(row, "related_hotel_ids"),
            },
            origin: ArticleOrigin::Persisted,
        })
    }
}

/// Result of resolving one slug.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleResolution {
    Inline(ArticleRecord),
    /// Leave the site for this URL; nothing is rendered inline.
    Redirect(String),
    NotFound,
}

fn is_published(row: &Row) -> bool {
    row_str(row, "status").is_some_and(|s| s.eq_ignore_ascii_case(PUBLISHED))
}

/// Authored text exactly as stored; blank values count as absent.
fn row_text(row: &Row, col: &str) -> Option<String> {
    row.get(col)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn read_time_display(v: Option<&Value>) -> String {
    match v {
        Some(Value::Number(n)) => format!("{n} min read"),
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Parse a structured body payload.
///
/// Absent/null → `None`. A JSON string is parsed as embedded JSON. Anything
/// that is not an object of the expected shape is `MalformedPayload`.
pub fn parse_body(raw: Option<&Value>) -> Result<ArticleBody, ResolveError> {
    let owned;
    let value = match raw {
        None | Some(Value::Null) => return Ok(ArticleBody::None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(ArticleBody::None),
        Some(Value::String(s)) => {
            owned = serde_json::from_str::<Value>(s)
                .map_err(|e| ResolveError::MalformedPayload(format!("body is not JSON: {e}")))?;
            &owned
        }
        Some(v) => v,
    };
    if !value.is_object() {
        return Err(ResolveError::MalformedPayload("body is not an object".into()));
    }
    let body = StructuredBody::deserialize(value)
        .map_err(|e| ResolveError::MalformedPayload(e.to_string()))?;
    if body.is_blank() {
        return Ok(ArticleBody::None);
    }
    Ok(ArticleBody::Structured(body))
}

/// `2024-03-05T10:00:00Z` → `Mar 5, 2024`. Unparseable input passes through.
pub fn format_display_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub struct ContentResolver {
    store: SharedStore,
    table: String,
    fallback: Arc<FallbackTable>,
    timeout: Duration,
}

impl ContentResolver {
    pub fn new(
        store: SharedStore,
        tables: &TableNames,
        fallback: Arc<FallbackTable>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            table: tables.articles.clone(),
            fallback,
            timeout,
        }
    }

    /// Resolve `slug`: persisted (published) first, then fallback, else `NotFound`.
    ///
    /// A store fault counts as "no persisted record"; the fallback still applies.
    pub async fn resolve(&self, slug: &str) -> ArticleResolution {
        crate::metrics::ensure_metrics_described();
        let slug = slug.trim();
        if slug.is_empty() {
            return ArticleResolution::NotFound;
        }

        match self.fetch_persisted(slug).await {
            Ok(Some(record)) => {
                counter!("article_resolutions_total", "origin" => record.origin.as_str())
                    .increment(1);
                return ArticleResolution::Inline(record);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(target: "articles", %slug, error = %e, "persisted lookup failed; trying fallback");
            }
        }

        let Some(fb) = self.fallback.get(slug) else {
            counter!("article_resolutions_total", "origin" => "not_found").increment(1);
            tracing::debug!(target: "articles", %slug, "article not found");
            return ArticleResolution::NotFound;
        };
        if let Some(url) = fb.redirect_target() {
            counter!("article_resolutions_total", "origin" => "redirect").increment(1);
            return ArticleResolution::Redirect(url.to_string());
        }
        let record = fb.to_record();
        counter!("article_resolutions_total", "origin" => record.origin.as_str()).increment(1);
        ArticleResolution::Inline(record)
    }

    async fn fetch_persisted(&self, slug: &str) -> Result<Option<ArticleRecord>, ResolveError> {
        let q = Select::from(&self.table)
            .filter(Filter::eq("slug", slug))
            .filter(Filter::eq("status", PUBLISHED))
            .limit(Some(1));
        let rows = select_bounded(self.store.as_ref(), &q, self.timeout).await?;
        Ok(rows.iter().find_map(ArticleRecord::from_persisted))
    }

    /// Article index: published persisted articles (newest first), then fallback
    /// articles whose slug is not persisted. A store fault leaves the fallback list.
    pub async fn summaries(&self) -> Vec<ArticleSummary> {
        let q = Select::from(&self.table)
            .filter(Filter::eq("status", PUBLISHED))
            .order(OrderBy::desc_nulls_last("published_at"));

        let persisted: Vec<ArticleRecord> =
            match select_bounded(self.store.as_ref(), &q, self.timeout).await {
                Ok(rows) => rows.iter().filter_map(ArticleRecord::from_persisted).collect(),
                Err(e) => {
                    tracing::warn!(target: "articles", error = %e, "article index degraded to fallback entries");
                    Vec::new()
                }
            };

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(persisted.len() + self.fallback.len());
        for rec in &persisted {
            if seen.insert(rec.slug.clone()) {
                out.push(ArticleSummary::from(rec));
            }
        }
        for fb in self.fallback.iter() {
            if seen.insert(fb.slug.clone()) {
                out.push(ArticleSummary::from(&fb.to_record()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn dates_format_as_short_month_day_year() {
        assert_eq!(format_display_date("2024-03-05T10:00:00Z"), "Mar 5, 2024");
        assert_eq!(format_display_date("2024-11-21T23:30:00+00:00"), "Nov 21, 2024");
        assert_eq!(format_display_date("2023-01-09"), "Jan 9, 2023");
        assert_eq!(format_display_date("2023-01-09 08:00:00.123"), "Jan 9, 2023");
        assert_eq!(format_display_date("sometime soon"), "sometime soon");
    }

    #[test]
    fn malformed_bodies_are_errors_and_absent_bodies_are_none() {
        assert_eq!(parse_body(None).unwrap(), ArticleBody::None);
        assert_eq!(parse_body(Some(&Value::Null)).unwrap(), ArticleBody::None);
        assert!(parse_body(Some(&json!([1, 2]))).is_err());
        assert!(parse_body(Some(&json!(42))).is_err());
        assert!(parse_body(Some(&json!("{not json"))).is_err());
        assert!(parse_body(Some(&json!({"sections": "nope"}))).is_err());
        assert_eq!(parse_body(Some(&json!({}))).unwrap(), ArticleBody::None);
    }

    #[test]
    fn body_accepts_embedded_json_and_both_key_styles() {
        let embedded = json!(r#"{"introduction":"Hi","safety_tips":["Start low"],
            "sections":[{"title":"Where","content":"<p>x</p>","icon":"MapPin","color":"gold"}]}"#);
        let ArticleBody::Structured(b) = parse_body(Some(&embedded)).unwrap() else {
            panic!("expected structured body");
        };
        assert_eq!(b.introduction.as_deref(), Some("Hi"));
        assert_eq!(b.safety_tips, vec!["Start low".to_string()]);
        assert_eq!(b.sections[0].body_markup, "<p>x</p>");
        assert_eq!(b.sections[0].icon, IconKey::MapPin);
        assert_eq!(b.sections[0].variant, SectionVariant::Gold);
    }

    #[test]
    fn unknown_section_styling_falls_back() {
        let v = json!({"sections":[{"title":"T","bodyMarkup":"m","icon":"???","variant":"neon"}]});
        let ArticleBody::Structured(b) = parse_body(Some(&v)).unwrap() else {
            panic!("expected structured body");
        };
        assert_eq!(b.sections[0].icon, IconKey::Info);
        assert_eq!(b.sections[0].variant, SectionVariant::Default);
    }

    #[test]
    fn persisted_row_normalizes_and_bad_body_degrades() {
        let r = row(json!({
            "slug": "denver-101", "title": "Denver &amp; You ", "excerpt": "  Spaced  ", "status": "published",
            "published_at": "2024-03-05T10:00:00Z", "read_time": 6, "tags": ["Denver", "Guide"],
            "body": [1, 2, 3], "related_dispensary_ids": [10, 11], "related_hotel_ids": []
        }));
        let rec = ArticleRecord::from_persisted(&r).unwrap();
        assert_eq!(rec.title, "Denver &amp; You ");
        assert_eq!(rec.excerpt, "  Spaced  ");
        assert_eq!(rec.published_date, "Mar 5, 2024");
        assert_eq!(rec.read_time, "6 min read");
        assert_eq!(rec.body, ArticleBody::None);
        assert_eq!(rec.related.retailers, vec!["10".to_string(), "11".to_string()]);
        assert_eq!(rec.origin, ArticleOrigin::Persisted);
    }

    #[test]
    fn unpublished_rows_do_not_normalize() {
        let r = row(json!({"slug": "x", "title": "X", "status": "draft"}));
        assert!(ArticleRecord::from_persisted(&r).is_none());
        let r = row(json!({"slug": "x", "title": "X"}));
        assert!(ArticleRecord::from_persisted(&r).is_none());
    }
}
