//! # Event Model & Predicates
//! The immutable event record plus the pure predicates used by the filtering pipeline.
//!
//! Nothing here does I/O; decoding from the wire lives in `ingest::providers`.

use serde::{Deserialize, Serialize};

/// A single seismic event as delivered by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub magnitude: f64,
    /// Kilometers; negative for sources above sea level.
    pub depth_km: f64,
    /// Epoch milliseconds.
    pub time_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub place: String,
    pub url: String,
}

impl Event {
    pub fn magnitude_within(&self, bounds: Bounds) -> bool {
        bounds.contains(self.magnitude)
    }

    pub fn depth_within(&self, bounds: Bounds) -> bool {
        bounds.contains(self.depth_km)
    }

    /// Great-circle distance to another event.
    pub fn distance_to(&self, other: &Event) -> f64 {
        crate::geo::distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lower <= v && v <= self.upper
    }

    /// Swap inverted bounds to keep a valid interval.
    fn sanitized(mut self) -> Self {
        if self.lower > self.upper {
            std::mem::swap(&mut self.lower, &mut self.upper);
        }
        self
    }
}

fn default_depth_range() -> Bounds {
    Bounds::new(-100.0, 1000.0)
}

fn default_min_magnitude() -> f64 {
    10.0
}

/// User-selected filtering constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterConfig {
    /// The single magnitude slider. Without an explicit range it acts as the *upper* cap.
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    /// Explicit `[min, max]` magnitude range; overrides the slider when present.
    #[serde(default)]
    pub magnitude_range: Option<Bounds>,
    #[serde(default = "default_depth_range")]
    pub depth_range: Bounds,
    /// Prefix cap on the filtered sequence. `None` or `<= 0` disables truncation.
    #[serde(default)]
    pub max_results: Option<i64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_magnitude: default_min_magnitude(),
            magnitude_range: None,
            depth_range: default_depth_range(),
            max_results: None,
        }
    }
}

impl FilterConfig {
    /// Effective magnitude bounds: the explicit range, else `[0, min_magnitude]`.
    pub fn magnitude_bounds(&self) -> Bounds {
        self.magnitude_range
            .unwrap_or(Bounds::new(0.0, self.min_magnitude))
    }

    /// Effective count cap, `None` when truncation is disabled.
    pub fn cap(&self) -> Option<usize> {
        self.max_results
            .filter(|n| *n > 0)
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
    }

    /// Normalize inverted bounds instead of rejecting them.
    pub fn sanitized(mut self) -> Self {
        self.magnitude_range = self.magnitude_range.map(Bounds::sanitized);
        self.depth_range = self.depth_range.sanitized();
        self
    }
}

/// Keep the first `cap` events; `None` keeps everything.
pub fn truncate_to_cap(mut events: Vec<Event>, cap: Option<usize>) -> Vec<Event> {
    if let Some(n) = cap {
        events.truncate(n);
    }
    events
}

#[cfg(test)]
pub(crate) fn mk_event(id: &str, magnitude: f64, depth_km: f64) -> Event {
    Event {
        id: id.to_string(),
        magnitude,
        depth_km,
        time_ms: 1_704_067_200_000, // 2024-01-01T00:00:00Z
        latitude: 0.0,
        longitude: 0.0,
        place: format!("test place {id}"),
        url: format!("https://example.test/{id}"),
    }
}
