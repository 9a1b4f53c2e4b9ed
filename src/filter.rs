//! # Filtering Pipeline
//! Reduces the orchestrator's raw set to the working set: magnitude, then depth,
//! then the count cap. Order-preserving and deterministic.

use metrics::counter;
use serde::Serialize;

use crate::event::{truncate_to_cap, Bounds, Event, FilterConfig};
use crate::ingest::types::QueryMode;

/// The filtered working set handed to display and aggregation.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WorkingSet {
    pub count: usize,
    pub events: Vec<Event>,
}

impl WorkingSet {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            count: events.len(),
            events,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}

/// How many events each stage removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub by_magnitude: usize,
    pub by_depth: usize,
    pub by_cap: usize,
}

fn keep_magnitude(events: Vec<Event>, bounds: Bounds) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| e.magnitude_within(bounds))
        .collect()
}

pub fn apply(mode: &QueryMode, raw: Vec<Event>, cfg: &FilterConfig) -> WorkingSet {
    apply_with_stats(mode, raw, cfg).0
}

pub fn apply_with_stats(
    mode: &QueryMode,
    raw: Vec<Event>,
    cfg: &FilterConfig,
) -> (WorkingSet, FilterStats) {
    let mag = cfg.magnitude_bounds();
    let mut stats = FilterStats::default();

    let before_mag = raw.len();
    let after_mag = match mode {
        // Server already applied minmagnitude/maxmagnitude; this pass is idempotent.
        QueryMode::CustomRange(_) => keep_magnitude(raw, mag),
        // Window feeds accept no magnitude parameters, so this is the first pass.
        QueryMode::NamedWindow(_) => keep_magnitude(raw, mag),
    };
    stats.by_magnitude = before_mag - after_mag.len();

    let before_depth = after_mag.len();
    let after_depth: Vec<Event> = after_mag
        .into_iter()
        .filter(|e| e.depth_within(cfg.depth_range))
        .collect();
    stats.by_depth = before_depth - after_depth.len();

    let before_cap = after_depth.len();
    let kept = truncate_to_cap(after_depth, cfg.cap());
    stats.by_cap = before_cap - kept.len();

    counter!("pipeline_kept_total").increment(kept.len() as u64);
    counter!("pipeline_dropped_total")
        .increment((stats.by_magnitude + stats.by_depth + stats.by_cap) as u64);
    tracing::debug!(
        target: "pipeline",
        kept = kept.len(),
        by_magnitude = stats.by_magnitude,
        by_depth = stats.by_depth,
        by_cap = stats.by_cap,
        "filtered"
    );

    (WorkingSet::new(kept), stats)
}
