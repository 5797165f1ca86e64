// src/venues.rs
//! # Entity Resolver
//!
//! Turns a page's location scope into an ordered list of venues:
//!
//! - one store query per venue category (retailer table, lodging table),
//! - rows normalized into one [`Venue`] shape,
//! - merged and ordered by rating, highest first, unrated last, ties in
//!   store order,
//! - a second entry point resolves an article's related-venue ids.
//!
//! Location matching is string matching, not geocoding. `ExactCity` compares
//! the `city` column case-insensitively; `AddressContains` looks for the value
//! inside `address`. The lodging table has no `city` column, so `ExactCity`
//! falls back to an address match there.

use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::store::TableNames;
use crate::error::ResolveError;
use crate::store::types::{row_bool, row_f32, row_str, row_str_list};
use crate::store::{select_bounded, Filter, OrderBy, Row, Select, SharedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueCategory {
    Retailer,
    Lodging,
}

impl VenueCategory {
    pub const ALL: [VenueCategory; 2] = [VenueCategory::Retailer, VenueCategory::Lodging];

    pub fn table<'a>(&self, tables: &'a TableNames) -> &'a str {
        match self {
            VenueCategory::Retailer => &tables.retailers,
            VenueCategory::Lodging => &tables.lodgings,
        }
    }

    fn has_city_column(&self) -> bool {
        matches!(self, VenueCategory::Retailer)
    }

    fn has_state_column(&self) -> bool {
        matches!(self, VenueCategory::Retailer)
    }

    /// Column backing `flag` on this category's table, if it has one.
    fn flag_column(&self, flag: VenueFlag) -> Option<&'static str> {
        match (self, flag) {
            (VenueCategory::Retailer, VenueFlag::Recreational) => Some("is_recreational"),
            (VenueCategory::Retailer, VenueFlag::Medical) => Some("is_medical"),
            (VenueCategory::Lodging, VenueFlag::CannabisFriendly) => Some("is_cannabis_friendly"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VenueFlag {
    Recreational,
    Medical,
    CannabisFriendly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    ExactCity,
    AddressContains,
}

/// Which venues belong on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationScope {
    pub mode: ScopeMode,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl LocationScope {
    pub fn exact_city(city: &str) -> Self {
        Self {
            mode: ScopeMode::ExactCity,
            value: city.to_string(),
            state: None,
        }
    }

    pub fn address_contains(fragment: &str) -> Self {
        Self {
            mode: ScopeMode::AddressContains,
            value: fragment.to_string(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    fn filters_for(&self, category: VenueCategory) -> Vec<Filter> {
        let value = self.value.trim();
        let mut out = Vec::with_capacity(2);
        match self.mode {
            ScopeMode::ExactCity if category.has_city_column() => {
                out.push(Filter::ieq("city", value));
            }
            ScopeMode::ExactCity | ScopeMode::AddressContains => {
                out.push(Filter::icontains("address", value));
            }
        }
        if let Some(st) = self.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if category.has_state_column() {
                out.push(Filter::ieq("state", st));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueQuery {
    pub scope: LocationScope,
    pub categories: Vec<VenueCategory>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub require: Vec<VenueFlag>,
}

impl VenueQuery {
    pub fn new(scope: LocationScope, categories: &[VenueCategory]) -> Self {
        Self {
            scope,
            categories: categories.to_vec(),
            limit: None,
            require: Vec::new(),
        }
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn require(mut self, flag: VenueFlag) -> Self {
        self.require.push(flag);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueFlags {
    pub recreational: bool,
    pub medical: bool,
    pub cannabis_friendly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub category: VenueCategory,
    pub location: VenueLocation,
    pub rating: Option<f32>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub flags: VenueFlags,
}

impl Venue {
    /// Normalize a retailer or lodging row. Rows without a slug or name are dropped.
    pub fn from_row(category: VenueCategory, row: &Row) -> Option<Self> {
        let slug = row_str(row, "slug")?;
        let name = row_str(row, "name")?;
        let id = row_str(row, "id").unwrap_or_else(|| slug.clone());

        let mut images = row_str_list(row, "images");
        if images.is_empty() {
            images = row_str_list(row, "image_url");
        }

        Some(Self {
            id,
            slug,
            name,
            category,
            location: VenueLocation {
                city: row_str(row, "city"),
                state: row_str(row, "state"),
                address: row_str(row, "address"),
            },
            rating: row_f32(row, "rating"),
            images,
            description: row_str(row, "description"),
            flags: VenueFlags {
                recreational: row_bool(row, "is_recreational"),
                medical: row_bool(row, "is_medical"),
                cannabis_friendly: row_bool(row, "is_cannabis_friendly"),
            },
        })
    }
}

/// Related-venue references carried by an article, split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedVenueIds {
    #[serde(default)]
    pub retailers: Vec<String>,
    #[serde(default)]
    pub lodgings: Vec<String>,
}

impl RelatedVenueIds {
    pub fn is_empty(&self) -> bool {
        self.retailers.is_empty() && self.lodgings.is_empty()
    }

    pub fn ids_for(&self, category: VenueCategory) -> &[String] {
        match category {
            VenueCategory::Retailer => &self.retailers,
            VenueCategory::Lodging => &self.lodgings,
        }
    }
}

/// Rating descending, unrated last. Ties compare equal so a stable sort keeps store order.
pub fn compare_rating(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_by_rating(venues: &mut [Venue]) {
    venues.sort_by(|a, b| compare_rating(a.rating, b.rating));
}

pub struct VenueResolver {
    store: SharedStore,
    tables: TableNames,
    timeout: Duration,
}

impl VenueResolver {
    pub fn new(store: SharedStore, tables: TableNames, timeout: Duration) -> Self {
        Self {
            store,
            tables,
            timeout,
        }
    }

    /// All venues in `query.scope` across the requested categories.
    pub async fn resolve(&self, query: &VenueQuery) -> Result<Vec<Venue>, ResolveError> {
        let mut seen = Vec::with_capacity(query.categories.len());
        let mut out = Vec::new();
        for &category in &query.categories {
            if seen.contains(&category) {
                continue;
            }
            seen.push(category);
            let mut part = self
                .resolve_category(&query.scope, category, query.limit, &query.require)
                .await?;
            out.append(&mut part);
        }
        sort_by_rating(&mut out);
        if let Some(n) = query.limit {
            out.truncate(n);
        }
        Ok(out)
    }

    /// One category's venues in `scope`, ordered by rating.
    pub async fn resolve_category(
        &self,
        scope: &LocationScope,
        category: VenueCategory,
        limit: Option<usize>,
        require: &[VenueFlag],
    ) -> Result<Vec<Venue>, ResolveError> {
        let mut q = Select::from(category.table(&self.tables));
        for f in scope.filters_for(category) {
            q = q.filter(f);
        }
        for &flag in require {
            if let Some(col) = category.flag_column(flag) {
                q = q.filter(Filter::eq(col, true));
            }
        }
        let q = q.order(OrderBy::desc_nulls_last("rating")).limit(limit);

        let venues = self.fetch(category, &q).await?;
        tracing::debug!(
            target: "venues",
            category = ?category,
            scope = %scope.value,
            count = venues.len(),
            "resolved venues"
        );
        Ok(venues)
    }

    /// Full venues for an article's related ids. Dangling ids are dropped.
    pub async fn resolve_related(&self, ids: &RelatedVenueIds) -> Result<Vec<Venue>, ResolveError> {
        let mut out = Vec::new();
        for category in VenueCategory::ALL {
            let mut part = self.resolve_related_category(category, ids.ids_for(category)).await?;
            out.append(&mut part);
        }
        sort_by_rating(&mut out);
        Ok(out)
    }

    pub async fn resolve_related_category(
        &self,
        category: VenueCategory,
        ids: &[String],
    ) -> Result<Vec<Venue>, ResolveError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = Select::from(category.table(&self.tables))
            .filter(Filter::is_in("id", ids.iter().cloned()))
            .order(OrderBy::desc_nulls_last("rating"));
        let venues = self.fetch(category, &q).await?;
        if venues.len() < ids.len() {
            tracing::debug!(
                target: "venues",
                category = ?category,
                wanted = ids.len(),
                found = venues.len(),
                "dropping unresolved related venue ids"
            );
        }
        Ok(venues)
    }

    async fn fetch(&self, category: VenueCategory, q: &Select) -> Result<Vec<Venue>, ResolveError> {
        let rows = select_bounded(self.store.as_ref(), q, self.timeout)
            .await
            .map_err(ResolveError::from)?;
        let mut venues: Vec<Venue> = rows
            .iter()
            .filter_map(|r| Venue::from_row(category, r))
            .collect();
        sort_by_rating(&mut venues);
        Ok(venues)
    }
}
