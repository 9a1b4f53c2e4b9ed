use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::aggregate::{self, Histograms};
use crate::config::ServiceConfig;
use crate::event::{Bounds, FilterConfig};
use crate::ingest::types::{FeedClient, FeedWindow, QueryMode, TimeRange};
use crate::ingest::FetchOptions;
use crate::nearest::{self, CandidateSource, Ranking};
use crate::session::{FetchOutcome, FetchState, Session};

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn FeedClient>,
    pub session: Arc<Session>,
    pub options: FetchOptions,
    pub default_filter: FilterConfig,
}

impl AppState {
    pub fn new(client: Arc<dyn FeedClient>, cfg: &ServiceConfig) -> Self {
        Self {
            client,
            session: Arc::new(Session::new()),
            options: cfg.fetch_options(),
            default_filter: cfg.default_filter.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/events", get(fetch_events))
        .route("/events/{id}/nearest", get(nearest_to))
        .route("/status", get(status))
        .route("/histograms", get(histograms))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    window: Option<String>,
    start: Option<String>,
    end: Option<String>,
    min_magnitude: Option<f64>,
    mag_min: Option<f64>,
    mag_max: Option<f64>,
    depth_min: Option<f64>,
    depth_max: Option<f64>,
    limit: Option<i64>,
}

fn bad_request(msg: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg.into() }))).into_response()
}

fn parse_day(field: &str, raw: &str) -> Result<NaiveDate, Response> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| bad_request(format!("{field} must be YYYY-MM-DD, got '{raw}'")))
}

impl EventsQuery {
    /// A start date selects a custom range; otherwise the named window (default "day").
    fn mode(&self) -> Result<QueryMode, Response> {
        match self.start.as_deref() {
            Some(start) => {
                let start = parse_day("start", start)?;
                let end = self.end.as_deref().map(|e| parse_day("end", e)).transpose()?;
                Ok(QueryMode::CustomRange(TimeRange { start, end }))
            }
            None => Ok(QueryMode::NamedWindow(FeedWindow::from_name(
                self.window.as_deref().unwrap_or("day"),
            ))),
        }
    }

    fn filter(&self, defaults: &FilterConfig) -> FilterConfig {
        let mut cfg = defaults.clone();
        if let Some(m) = self.min_magnitude {
            cfg.min_magnitude = m;
        }
        // a half-open range takes its missing side from the current effective bounds
        if self.mag_min.is_some() || self.mag_max.is_some() {
            let fallback = cfg.magnitude_bounds();
            cfg.magnitude_range = Some(Bounds::new(
                self.mag_min.unwrap_or(fallback.lower),
                self.mag_max.unwrap_or(fallback.upper),
            ));
        }
        if let Some(lo) = self.depth_min {
            cfg.depth_range.lower = lo;
        }
        if let Some(hi) = self.depth_max {
            cfg.depth_range.upper = hi;
        }
        if self.limit.is_some() {
            cfg.max_results = self.limit;
        }
        cfg.sanitized()
    }
}

async fn fetch_events(State(state): State<AppState>, Query(q): Query<EventsQuery>) -> Response {
    let mode = match q.mode() {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let cfg = q.filter(&state.default_filter);

    match state
        .session
        .run(state.client.as_ref(), mode, &cfg, state.options)
        .await
    {
        FetchOutcome::Ready(ws) => Json(ws.as_ref().clone()).into_response(),
        FetchOutcome::Failed(e) if !e.is_remote() => bad_request(e.to_string()),
        FetchOutcome::Failed(e) => {
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
        FetchOutcome::Superseded => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "superseded by a newer request" })),
        )
            .into_response(),
    }
}

async fn status(State(state): State<AppState>) -> Json<FetchState> {
    Json(state.session.state())
}

async fn histograms(State(state): State<AppState>) -> Json<Histograms> {
    let ws = state.session.working_set();
    Json(aggregate::histograms(&ws.events))
}

#[derive(Debug, Default, Deserialize)]
pub struct NearestQuery {
    #[serde(default)]
    regional: bool,
}

async fn nearest_to(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<NearestQuery>,
) -> Response {
    let ws = state.session.working_set();
    let Some(reference) = ws.find(&id).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("event '{id}' is not in the working set") })),
        )
            .into_response();
    };

    let ranking = if q.regional {
        nearest::rank_nearest_regional(state.client.as_ref(), &reference, &ws.events).await
    } else {
        Ranking {
            source: CandidateSource::WorkingSet,
            ranked: nearest::rank_nearest(&reference, &ws.events),
        }
    };
    Json(ranking).into_response()
}
