//! Destination Guide: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, resolvers, and metrics.

use anyhow::Context;
use destination_guide::config::store::StoreConfig;
use destination_guide::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs. `RUST_LOG` wins; the default keeps this crate at info.
/// A subscriber installed by the runtime takes precedence.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("destination_guide=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = StoreConfig::load_default().context("loading store config")?;
    let state = destination_guide::load_state(&cfg)?;
    let metrics = Metrics::init(cfg.timeout_ms)?;

    let router = destination_guide::router(state).merge(metrics.router());

    Ok(router.into())
}
