// src/store/mod.rs
pub mod memory;
pub mod rest;
pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;

use crate::config::store::StoreConfig;
pub use types::{Filter, OrderBy, Row, Select, StoreClient, StoreError};

/// Shared handle used by every resolver.
pub type SharedStore = Arc<dyn StoreClient>;

/// Applied to every store call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the configured backend. An empty `base_url` yields an empty in-memory store.
pub fn build_store(cfg: &StoreConfig) -> Result<SharedStore, StoreError> {
    if cfg.base_url.trim().is_empty() {
        tracing::warn!(target: "store", "no store URL configured; using empty in-memory store");
        return Ok(Arc::new(memory::MemoryStore::new()));
    }
    let store = rest::RestStore::new(&cfg.base_url, &cfg.api_key, cfg.timeout())?;
    tracing::info!(target: "store", url = %cfg.base_url, timeout_ms = cfg.timeout_ms, "rest store ready");
    Ok(Arc::new(store))
}

async fn bounded<T>(
    table: &str,
    timeout: Duration,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    crate::metrics::ensure_metrics_described();
    counter!("store_queries_total", "table" => table.to_string()).increment(1);

    let out = match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Unavailable(format!(
            "no response within {} ms",
            timeout.as_millis()
        ))),
    };
    if let Err(StoreError::Unavailable(reason)) = &out {
        tracing::warn!(target: "store", table, %reason, "store unavailable");
        counter!("store_unavailable_total", "table" => table.to_string()).increment(1);
    }
    out
}

/// `select` bounded by `timeout`; expiry maps to `Unavailable`.
pub async fn select_bounded(
    store: &dyn StoreClient,
    query: &Select,
    timeout: Duration,
) -> Result<Vec<Row>, StoreError> {
    bounded(&query.table, timeout, store.select(query)).await
}

/// `insert` bounded by `timeout`; expiry maps to `Unavailable`.
pub async fn insert_bounded(
    store: &dyn StoreClient,
    table: &str,
    row: Row,
    timeout: Duration,
) -> Result<(), StoreError> {
    bounded(table, timeout, store.insert(table, row)).await
}
