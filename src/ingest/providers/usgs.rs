use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::event::Event;
use crate::ingest::error::{FetchError, Result};
use crate::ingest::types::{FeedClient, FeedRequest};

pub const DEFAULT_SUMMARY_BASE: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";
pub const DEFAULT_QUERY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    time: i64,
    place: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[lon, lat, depth]`
    coordinates: Vec<f64>,
}

/// Decode a GeoJSON feature collection. Features without a magnitude or a full
/// `[lon, lat, depth]` triple are skipped.
pub fn parse_feature_collection(body: &str, origin: &str) -> Result<Vec<Event>> {
    let t0 = std::time::Instant::now();
    let fc: FeatureCollection = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        url: origin.to_string(),
        reason: e.to_string(),
    })?;

    let mut skipped = 0u64;
    let mut out = Vec::with_capacity(fc.features.len());
    for f in fc.features {
        let coords = f.geometry.map(|g| g.coordinates).unwrap_or_default();
        let (Some(magnitude), [lon, lat, depth, ..]) = (f.properties.mag, coords.as_slice()) else {
            skipped += 1;
            continue;
        };
        out.push(Event {
            id: f.id,
            magnitude,
            depth_km: *depth,
            time_ms: f.properties.time,
            latitude: *lat,
            longitude: *lon,
            place: f.properties.place.unwrap_or_default(),
            url: f.properties.url.unwrap_or_default(),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_events_decoded_total").increment(out.len() as u64);
    counter!("feed_events_skipped_total").increment(skipped);
    if skipped > 0 {
        tracing::debug!(target: "ingest", origin, skipped, "features without magnitude/coordinates");
    }
    Ok(out)
}

pub struct UsgsClient {
    mode: Mode,
}

enum Mode {
    /// Serves the same payload for every request.
    Fixture(String),
    Http {
        client: reqwest::Client,
        summary_base: String,
        query_url: String,
    },
}

impl UsgsClient {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// Live client against the public USGS endpoints.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_endpoints(DEFAULT_SUMMARY_BASE, DEFAULT_QUERY_URL, timeout)
    }

    pub fn with_endpoints(summary_base: &str, query_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("quake-insights/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            mode: Mode::Http {
                client,
                summary_base: summary_base.trim_end_matches('/').to_string(),
                query_url: query_url.to_string(),
            },
        })
    }

    /// Full URL a request resolves to, query string encoded.
    pub fn request_url(
        summary_base: &str,
        query_url: &str,
        request: &FeedRequest,
    ) -> Result<reqwest::Url> {
        let parsed = match request {
            FeedRequest::Window(w) => {
                reqwest::Url::parse(&format!("{summary_base}/{}", w.feed_file()))
            }
            other => reqwest::Url::parse_with_params(query_url, other.query_pairs()),
        };
        parsed.map_err(|e| FetchError::Transport {
            url: request.describe(),
            reason: format!("invalid feed url: {e}"),
        })
    }
}

#[async_trait]
impl FeedClient for UsgsClient {
    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<Event>> {
        counter!("feed_requests_total").increment(1);
        match &self.mode {
            Mode::Fixture(s) => parse_feature_collection(s, "fixture"),

            Mode::Http {
                client,
                summary_base,
                query_url,
            } => {
                let url = Self::request_url(summary_base, query_url, request)?;
                let t0 = std::time::Instant::now();
                let result = get_body(client, url.clone()).await;
                histogram!("feed_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                match result {
                    Ok(body) => parse_feature_collection(&body, url.as_str()).inspect_err(|_| {
                        counter!("feed_request_errors_total").increment(1);
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, provider = "usgs", "feed http error");
                        counter!("feed_request_errors_total").increment(1);
                        Err(e)
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "usgs"
    }
}

async fn get_body(client: &reqwest::Client, url: reqwest::Url) -> Result<String> {
    let shown = url.to_string();
    let transport = |e: reqwest::Error| FetchError::Transport {
        url: shown.clone(),
        reason: e.to_string(),
    };
    let resp = client.get(url).send().await.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: shown.clone(),
            status: status.as_u16(),
        });
    }
    resp.text().await.map_err(transport)
}
