// src/guides.rs
//! Guide catalog: every city/region page is one [`GuideSpec`] entry.
//!
//! Loaded from TOML; falls back to a built-in seed when no file is present.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::venues::{LocationScope, VenueCategory, VenueFlag, VenueQuery};

pub const DEFAULT_GUIDE_CATALOG_PATH: &str = "config/guides.toml";
pub const ENV_GUIDE_CATALOG_PATH: &str = "GUIDE_CATALOG_PATH";

const SEED_TOML: &str = include_str!("../config/guides.toml");

fn default_categories() -> Vec<VenueCategory> {
    VenueCategory::ALL.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideSpec {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub scope: LocationScope,
    #[serde(default = "default_categories")]
    pub categories: Vec<VenueCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<VenueFlag>,
}

impl GuideSpec {
    /// Venue query for one category of this page.
    pub fn query_for(&self, category: VenueCategory) -> VenueQuery {
        VenueQuery {
            scope: self.scope.clone(),
            categories: vec![category],
            limit: self.limit,
            require: self.require.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuideCatalog {
    guides: Vec<GuideSpec>,
}

impl GuideCatalog {
    /// Duplicate slugs (case-insensitive) keep the first entry.
    pub fn new(items: Vec<GuideSpec>) -> Self {
        let mut guides: Vec<GuideSpec> = Vec::with_capacity(items.len());
        for g in items {
            if g.slug.trim().is_empty() {
                continue;
            }
            if guides.iter().any(|x| x.slug.eq_ignore_ascii_case(g.slug.trim())) {
                tracing::warn!(target: "guides", slug = %g.slug, "duplicate guide slug ignored");
                continue;
            }
            guides.push(GuideSpec {
                slug: g.slug.trim().to_string(),
                ..g
            });
        }
        Self { guides }
    }

    pub fn get(&self, slug: &str) -> Option<&GuideSpec> {
        let slug = slug.trim();
        self.guides.iter().find(|g| g.slug.eq_ignore_ascii_case(slug))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GuideSpec> {
        self.guides.iter()
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct TomlCatalog {
            #[serde(default)]
            guide: Vec<GuideSpec>,
        }
        let v: TomlCatalog = toml::from_str(s)?;
        Ok(Self::new(v.guide))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading guide catalog from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing guide catalog {}", path.display()))
    }

    /// 1) $GUIDE_CATALOG_PATH, 2) config/guides.toml, 3) built-in seed.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_GUIDE_CATALOG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_GUIDE_CATALOG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_GUIDE_CATALOG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::seed())
    }

    pub fn seed() -> Self {
        Self::from_toml_str(SEED_TOML).unwrap_or_else(|e| {
            tracing::error!(target: "guides", error = %e, "built-in guide catalog does not parse");
            Self::default()
        })
    }
}
