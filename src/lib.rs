// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod articles;
pub mod config;
pub mod error;
pub mod guides;
pub mod metrics;
pub mod page;
pub mod render;
pub mod search;
pub mod store;
pub mod subscribe;
pub mod venues;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::articles::{ArticleRecord, ArticleResolution, ContentResolver};
pub use crate::error::ResolveError;
pub use crate::subscribe::{SubscribeOutcome, SubscriptionWriter};
pub use crate::venues::{LocationScope, Venue, VenueResolver};

use anyhow::Context;
use tracing::info;

use crate::articles::FallbackTable;
use crate::config::store::StoreConfig;
use crate::guides::GuideCatalog;

/// Build the application state from config files and environment.
pub fn load_state(cfg: &StoreConfig) -> anyhow::Result<AppState> {
    let store = store::build_store(cfg).context("building store client")?;
    let fallback = FallbackTable::load_default().context("loading fallback articles")?;
    let guides = GuideCatalog::load_default().context("loading guide catalog")?;
    info!(
        store = store.name(),
        fallback_articles = fallback.len(),
        guides = guides.len(),
        "guide state loaded"
    );
    Ok(AppState::new(store, &cfg.tables, cfg.timeout(), fallback, guides))
}

/// Router with all routes, built from the default configuration.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = StoreConfig::load_default()?;
    let state = load_state(&cfg)?;
    Ok(router(state))
}
