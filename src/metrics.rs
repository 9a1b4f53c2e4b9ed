use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured pacing as a static gauge.
    pub fn init(pacing_ms: u64) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new().install_recorder()?;

        crate::ingest::ensure_metrics_described();
        gauge!("ingest_pacing_ms").set(pacing_ms as f64);

        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text exposition format.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render))
            .with_state(self.handle.clone())
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render())
}
