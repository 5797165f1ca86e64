// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize Prometheus recorder and expose a static gauge for the store timeout.
    pub fn init(store_timeout_ms: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        gauge!("store_timeout_ms").set(store_timeout_ms as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("store_queries_total", "Store calls issued, by table.");
        describe_counter!(
            "store_unavailable_total",
            "Store calls that failed with a transport fault or timeout."
        );
        describe_counter!(
            "article_resolutions_total",
            "Article lookups by outcome origin (persisted, fallback, redirect, not_found)."
        );
        describe_counter!(
            "subscriptions_total",
            "Subscription attempts by outcome."
        );
        describe_gauge!("store_timeout_ms", "Configured per-request store timeout.");
    });
}
