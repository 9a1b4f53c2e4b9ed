//! Quake Insights Service: binary entrypoint
//! Boots the Axum HTTP server, wiring the feed client, session state, and metrics.

use std::sync::Arc;

use quake_insights::ingest::providers::usgs::UsgsClient;
use quake_insights::{api, config, metrics::Metrics};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Enables QUAKE_CONFIG_PATH / RUST_LOG from .env.
    let _ = dotenvy::dotenv();

    quake_insights::init_tracing();

    let cfg = config::load_default()?;
    tracing::info!(
        query_url = %cfg.query_url,
        pacing_ms = cfg.pacing_ms,
        dedup_by_id = cfg.dedup_by_id,
        "service config loaded"
    );

    let client = UsgsClient::with_endpoints(&cfg.summary_base_url, &cfg.query_url, cfg.request_timeout())?;
    let state = api::AppState::new(Arc::new(client), &cfg);

    let mut router = api::router(state);
    match Metrics::init(cfg.pacing_ms) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "prometheus recorder not installed; /metrics disabled"),
    }

    Ok(router.into())
}
