// src/ingest/mod.rs
pub(crate) mod chunk;
pub mod error;
pub mod providers;
pub mod types;

use std::collections::HashSet;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::event::{Bounds, Event};
use crate::ingest::error::Result;
use crate::ingest::types::{FeedClient, FeedRequest, QueryMode};

/// Default pause between consecutive chunk requests.
pub const DEFAULT_PACING: Duration = Duration::from_millis(300);

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_requests_total", "Remote feed requests issued.");
        describe_counter!(
            "feed_request_errors_total",
            "Remote feed requests that failed (status, transport or decode)."
        );
        describe_counter!("feed_events_decoded_total", "Events decoded from feed payloads.");
        describe_counter!(
            "feed_events_skipped_total",
            "Features skipped while decoding (no magnitude or coordinates)."
        );
        describe_histogram!("feed_request_ms", "Feed request latency in milliseconds.");
        describe_histogram!("feed_parse_ms", "Feed payload decode time in milliseconds.");
        describe_counter!("pipeline_kept_total", "Events kept by the filtering pipeline.");
        describe_counter!(
            "pipeline_dropped_total",
            "Events dropped by magnitude/depth/cap filtering."
        );
        describe_counter!("pipeline_dedup_total", "Events dropped by id de-duplication.");
        describe_counter!(
            "session_superseded_total",
            "Fetch results discarded because a newer fetch started."
        );
        describe_gauge!("ingest_last_fetch_ts", "Unix ts of the last successful fetch.");
        describe_gauge!("ingest_pacing_ms", "Configured pause between chunk requests (ms).");
    });
}

/// Knobs of a single orchestration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOptions {
    /// Sleep between consecutive requests. Zero disables pacing.
    pub pacing: Duration,
    /// Drop later events whose id was already seen. Off by default.
    pub dedup_by_id: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            dedup_by_id: false,
        }
    }
}

/// The ordered list of remote requests a query mode expands to.
pub fn plan_requests(mode: &QueryMode, magnitude: Bounds) -> Result<Vec<FeedRequest>> {
    match mode {
        // Named feeds take no magnitude parameters; the pipeline filters client-side.
        QueryMode::NamedWindow(window) => Ok(vec![FeedRequest::Window(*window)]),
        QueryMode::CustomRange(range) => {
            let (start, end) = range.bounded()?;
            Ok(chunk::plan_chunks(start, end)
                .into_iter()
                .map(|c| FeedRequest::range(c.start, c.end, magnitude))
                .collect())
        }
    }
}

/// Fetch the complete raw event set for `mode`.
///
/// Requests run strictly one after another with `opts.pacing` in between. The first
/// failure aborts the run and discards everything accumulated so far.
pub async fn fetch_all(
    client: &dyn FeedClient,
    mode: &QueryMode,
    magnitude: Bounds,
    opts: FetchOptions,
) -> Result<Vec<Event>> {
    ensure_metrics_described();

    let requests = plan_requests(mode, magnitude)?;
    let total = requests.len();
    let mut raw = Vec::new();

    for (i, req) in requests.iter().enumerate() {
        if i > 0 && !opts.pacing.is_zero() {
            tokio::time::sleep(opts.pacing).await;
        }
        match client.fetch(req).await {
            Ok(mut v) => {
                tracing::debug!(
                    target: "ingest",
                    client = client.name(),
                    request = %req.describe(),
                    chunk = i + 1,
                    of = total,
                    events = v.len(),
                    "chunk fetched"
                );
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    error = %e,
                    client = client.name(),
                    request = %req.describe(),
                    chunk = i + 1,
                    of = total,
                    "fetch aborted"
                );
                return Err(e);
            }
        }
    }

    if opts.dedup_by_id {
        let (kept, dropped) = dedup_by_id(raw);
        counter!("pipeline_dedup_total").increment(dropped as u64);
        raw = kept;
    }

    let now = chrono::Utc::now().timestamp().max(0);
    gauge!("ingest_last_fetch_ts").set(now as f64);
    tracing::info!(target: "ingest", requests = total, events = raw.len(), "fetch complete");
    Ok(raw)
}

/// Keep the first occurrence of every event id, preserving order.
/// Returns (kept, dropped_count).
pub fn dedup_by_id(events: Vec<Event>) -> (Vec<Event>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(events.len());
    let mut kept = Vec::with_capacity(events.len());
    let mut dropped = 0usize;
    for ev in events {
        if seen.insert(ev.id.clone()) {
            kept.push(ev);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}
