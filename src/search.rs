// src/search.rs
//! Search/filter over an already-loaded article index. Pure and order-preserving.

use serde::{Deserialize, Serialize};

use crate::articles::ArticleRecord;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

/// List-page projection of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub published_date: String,
    pub hero_image: String,
    pub read_time: String,
}

impl From<&ArticleRecord> for ArticleSummary {
    fn from(r: &ArticleRecord) -> Self {
        Self {
            slug: r.slug.clone(),
            title: r.title.clone(),
            excerpt: r.excerpt.clone(),
            category: r.category.clone(),
            tags: r.tags.clone(),
            published_date: r.published_date.clone(),
            hero_image: r.hero_image.clone(),
            read_time: r.read_time.clone(),
        }
    }
}

/// Empty query matches everything; otherwise a case-insensitive substring of
/// title, excerpt, or any tag. Whitespace in the query is significant.
pub fn matches_query(s: &ArticleSummary, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let q = query.to_lowercase();
    s.title.to_lowercase().contains(&q)
        || s.excerpt.to_lowercase().contains(&q)
        || s.tags.iter().any(|t| t.to_lowercase().contains(&q))
}

pub fn matches_category(s: &ArticleSummary, category: &str) -> bool {
    category == ALL_CATEGORIES || s.category == category
}

pub fn filter(all: &[ArticleSummary], query: &str, category: &str) -> Vec<ArticleSummary> {
    all.iter()
        .filter(|s| matches_query(s, query) && matches_category(s, category))
        .cloned()
        .collect()
}

/// `"All"` followed by distinct categories in first-seen order.
pub fn categories(all: &[ArticleSummary]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for s in all {
        if !s.category.is_empty() && !out.iter().any(|c| c == &s.category) {
            out.push(s.category.clone());
        }
    }
    out
}
