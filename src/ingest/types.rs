// src/ingest/types.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::{Bounds, Event};
use crate::ingest::error::{FetchError, Result};

/// Result ceiling sent with every custom-range request.
pub const RANGE_RESULT_LIMIT: u32 = 20_000;
/// Search radius of the regional nearest-neighbor query.
pub const REGIONAL_RADIUS_KM: f64 = 500.0;
/// Result ceiling of the regional nearest-neighbor query.
pub const REGIONAL_RESULT_LIMIT: u32 = 200;

/// Fixed, server-defined recent feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedWindow {
    Day,
    Week,
}

impl FeedWindow {
    /// `"week"` selects the weekly feed; any other name falls back to the daily one.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("week") {
            FeedWindow::Week
        } else {
            FeedWindow::Day
        }
    }

    pub fn feed_file(self) -> &'static str {
        match self {
            FeedWindow::Day => "all_day.geojson",
            FeedWindow::Week => "all_week.geojson",
        }
    }
}

/// Calendar-day interval. An open end is only meaningful for named windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn open(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// Both bounds, checked for `start <= end`.
    pub fn bounded(&self) -> Result<(NaiveDate, NaiveDate)> {
        let end = self.end.ok_or(FetchError::OpenEndedRange)?;
        if self.start > end {
            return Err(FetchError::InvalidRange {
                start: self.start,
                end,
            });
        }
        Ok((self.start, end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    NamedWindow(FeedWindow),
    CustomRange(TimeRange),
}

/// One remote request, independent of transport.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRequest {
    Window(FeedWindow),
    Range {
        start: NaiveDate,
        end: NaiveDate,
        magnitude: Bounds,
        limit: u32,
    },
    Regional {
        latitude: f64,
        longitude: f64,
        max_radius_km: f64,
        limit: u32,
    },
}

impl FeedRequest {
    pub fn range(start: NaiveDate, end: NaiveDate, magnitude: Bounds) -> Self {
        FeedRequest::Range {
            start,
            end,
            magnitude,
            limit: RANGE_RESULT_LIMIT,
        }
    }

    pub fn regional(latitude: f64, longitude: f64) -> Self {
        FeedRequest::Regional {
            latitude,
            longitude,
            max_radius_km: REGIONAL_RADIUS_KM,
            limit: REGIONAL_RESULT_LIMIT,
        }
    }

    /// Query-string parameters for the FDSN query endpoint; empty for window feeds.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            FeedRequest::Window(_) => Vec::new(),
            FeedRequest::Range {
                start,
                end,
                magnitude,
                limit,
            } => vec![
                ("format", "geojson".to_string()),
                ("starttime", start.format("%Y-%m-%d").to_string()),
                ("endtime", end.format("%Y-%m-%d").to_string()),
                ("minmagnitude", magnitude.lower.to_string()),
                ("maxmagnitude", magnitude.upper.to_string()),
                ("limit", limit.to_string()),
            ],
            FeedRequest::Regional {
                latitude,
                longitude,
                max_radius_km,
                limit,
            } => vec![
                ("format", "geojson".to_string()),
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("maxradiuskm", max_radius_km.to_string()),
                ("limit", limit.to_string()),
                ("orderby", "time".to_string()),
            ],
        }
    }

    /// Short label for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            FeedRequest::Window(w) => w.feed_file().to_string(),
            FeedRequest::Range { start, end, .. } => format!("range {start}..{end}"),
            FeedRequest::Regional {
                latitude,
                longitude,
                ..
            } => format!("regional ({latitude:.3}, {longitude:.3})"),
        }
    }
}

/// Remote-fetch collaborator. Implementations must treat an empty collection as success.
#[async_trait::async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<Event>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn window_names_default_to_day() {
        assert_eq!(FeedWindow::from_name("day"), FeedWindow::Day);
        assert_eq!(FeedWindow::from_name("WEEK"), FeedWindow::Week);
        assert_eq!(FeedWindow::from_name("month"), FeedWindow::Day);
        assert_eq!(FeedWindow::from_name(""), FeedWindow::Day);
    }

    #[test]
    fn range_request_carries_magnitude_and_dates() {
        let req = FeedRequest::range(d("2024-01-01"), d("2024-01-15"), Bounds::new(0.0, 4.5));
        let q = req.query_pairs();
        assert!(q.contains(&("starttime", "2024-01-01".to_string())));
        assert!(q.contains(&("endtime", "2024-01-15".to_string())));
        assert!(q.contains(&("minmagnitude", "0".to_string())));
        assert!(q.contains(&("maxmagnitude", "4.5".to_string())));
        assert!(q.contains(&("limit", "20000".to_string())));
    }

    #[test]
    fn regional_request_shape() {
        let q = FeedRequest::regional(35.0, -118.5).query_pairs();
        assert!(q.contains(&("maxradiuskm", "500".to_string())));
        assert!(q.contains(&("limit", "200".to_string())));
        assert!(q.contains(&("orderby", "time".to_string())));
        assert!(q.contains(&("latitude", "35".to_string())));
    }

    #[test]
    fn bounded_rejects_inverted_and_open_ranges() {
        assert!(TimeRange::new(d("2024-01-01"), d("2024-01-01")).bounded().is_ok());
        assert_eq!(
            TimeRange::new(d("2024-02-01"), d("2024-01-01")).bounded(),
            Err(FetchError::InvalidRange {
                start: d("2024-02-01"),
                end: d("2024-01-01")
            })
        );
        assert_eq!(
            TimeRange::open(d("2024-01-01")).bounded(),
            Err(FetchError::OpenEndedRange)
        );
    }
}
