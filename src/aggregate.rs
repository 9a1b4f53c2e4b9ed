//! # Aggregator
//! Histogram buckets over an event set: per UTC calendar day and per magnitude band,
//! plus a small summary for the insights panel.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::event::Event;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

/// Fixed magnitude bands: label and exclusive upper edge, checked in ascending order.
const MAGNITUDE_BANDS: [(&str, f64); 4] = [
    ("<2.0", 2.0),
    ("2.0-3.9", 4.0),
    ("4.0-5.9", 6.0),
    ("6.0+", f64::INFINITY),
];

fn utc_date(time_ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(time_ms).map(|dt| dt.date_naive())
}

/// Count events per UTC calendar date, ascending; days without events are absent.
pub fn day_buckets(events: &[Event]) -> Vec<Bucket> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ev in events {
        match utc_date(ev.time_ms) {
            Some(day) => *per_day.entry(day).or_default() += 1,
            None => tracing::debug!(id = %ev.id, time_ms = ev.time_ms, "timestamp out of range"),
        }
    }
    per_day
        .into_iter()
        .map(|(day, count)| Bucket {
            label: day.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

fn band_index(magnitude: f64) -> usize {
    MAGNITUDE_BANDS
        .iter()
        .position(|(_, upper)| magnitude < *upper)
        // NaN compares false everywhere; park it in the top band so totals still add up
        .unwrap_or(MAGNITUDE_BANDS.len() - 1)
}

/// Always four buckets in fixed order, zero counts included.
pub fn magnitude_buckets(events: &[Event]) -> Vec<Bucket> {
    let mut counts = [0usize; MAGNITUDE_BANDS.len()];
    for ev in events {
        counts[band_index(ev.magnitude)] += 1;
    }
    MAGNITUDE_BANDS
        .iter()
        .zip(counts)
        .map(|((label, _), count)| Bucket {
            label: (*label).to_string(),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub max_magnitude: Option<f64>,
    pub mean_magnitude: Option<f64>,
    pub mean_depth_km: Option<f64>,
}

pub fn summarize(events: &[Event]) -> Summary {
    let n = events.len();
    if n == 0 {
        return Summary {
            count: 0,
            max_magnitude: None,
            mean_magnitude: None,
            mean_depth_km: None,
        };
    }
    let max = events
        .iter()
        .map(|e| e.magnitude)
        .fold(f64::NEG_INFINITY, f64::max);
    let mag_sum: f64 = events.iter().map(|e| e.magnitude).sum();
    let depth_sum: f64 = events.iter().map(|e| e.depth_km).sum();
    Summary {
        count: n,
        max_magnitude: Some(max),
        mean_magnitude: Some(mag_sum / n as f64),
        mean_depth_km: Some(depth_sum / n as f64),
    }
}

/// Everything the charting collaborator consumes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Histograms {
    pub by_day: Vec<Bucket>,
    pub by_magnitude: Vec<Bucket>,
    pub summary: Summary,
}

pub fn histograms(events: &[Event]) -> Histograms {
    Histograms {
        by_day: day_buckets(events),
        by_magnitude: magnitude_buckets(events),
        summary: summarize(events),
    }
}
