// tests/ingest_orchestrator.rs
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use quake_insights::ingest::error::FetchError;
use quake_insights::ingest::types::{FeedClient, FeedRequest, FeedWindow, QueryMode, TimeRange};
use quake_insights::ingest::{fetch_all, FetchOptions};
use quake_insights::{Bounds, Event};
use tokio::time::Instant;

/// Records every request; returns one event per request, or fails on the n-th call.
struct ScriptedClient {
    calls: Mutex<Vec<(FeedRequest, Instant)>>,
    fail_on_call: Option<usize>,
    duplicate_ids: bool,
}

impl ScriptedClient {
    fn ok() -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_on_call: None,
            duplicate_ids: false,
        }
    }

    fn failing_on(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::ok()
        }
    }

    fn requests(&self) -> Vec<FeedRequest> {
        self.calls.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }
}

fn event(id: &str) -> Event {
    Event {
        id: id.to_string(),
        magnitude: 2.5,
        depth_km: 10.0,
        time_ms: 1_704_067_200_000,
        latitude: 1.0,
        longitude: 2.0,
        place: "somewhere".into(),
        url: "https://example.test".into(),
    }
}

#[async_trait]
impl FeedClient for ScriptedClient {
    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<Event>, FetchError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((request.clone(), Instant::now()));
            calls.len()
        };
        if self.fail_on_call == Some(n) {
            return Err(FetchError::Status {
                url: request.describe(),
                status: 503,
            });
        }
        let id = if self.duplicate_ids {
            "same".to_string()
        } else {
            format!("ev{n}")
        };
        Ok(vec![event(&id)])
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn no_pacing() -> FetchOptions {
    FetchOptions {
        pacing: Duration::ZERO,
        dedup_by_id: false,
    }
}

fn custom(start: &str, end: &str) -> QueryMode {
    QueryMode::CustomRange(TimeRange::new(d(start), d(end)))
}

#[tokio::test]
async fn two_week_range_is_one_request_with_exact_dates() {
    let client = ScriptedClient::ok();
    let out = fetch_all(
        &client,
        &custom("2024-01-01", "2024-01-15"),
        Bounds::new(0.0, 4.5),
        no_pacing(),
    )
    .await
    .unwrap();
    assert_eq!(out.len(), 1);

    let reqs = client.requests();
    assert_eq!(reqs.len(), 1);
    let q = reqs[0].query_pairs();
    assert!(q.contains(&("starttime", "2024-01-01".to_string())));
    assert!(q.contains(&("endtime", "2024-01-15".to_string())));
    assert!(q.contains(&("maxmagnitude", "4.5".to_string())));
}

#[tokio::test]
async fn long_range_is_chunked_sequentially_in_order() {
    let client = ScriptedClient::ok();
    let out = fetch_all(
        &client,
        &custom("2024-01-01", "2024-04-10"),
        Bounds::new(0.0, 9.0),
        no_pacing(),
    )
    .await
    .unwrap();

    let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ev1", "ev2", "ev3", "ev4"], "fetch order preserved");

    let spans: Vec<(NaiveDate, NaiveDate)> = client
        .requests()
        .into_iter()
        .map(|r| match r {
            FeedRequest::Range { start, end, .. } => (start, end),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        spans,
        vec![
            (d("2024-01-01"), d("2024-01-31")),
            (d("2024-02-01"), d("2024-02-29")),
            (d("2024-03-01"), d("2024-03-31")),
            (d("2024-04-01"), d("2024-04-10")),
        ]
    );
}

#[tokio::test]
async fn named_window_is_single_request() {
    let client = ScriptedClient::ok();
    let out = fetch_all(
        &client,
        &QueryMode::NamedWindow(FeedWindow::from_name("hour")),
        Bounds::new(0.0, 1.0),
        no_pacing(),
    )
    .await
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(client.requests(), vec![FeedRequest::Window(FeedWindow::Day)]);
}

#[tokio::test(start_paused = true)]
async fn pacing_sleeps_between_requests_only() {
    let client = ScriptedClient::ok();
    let t0 = Instant::now();
    fetch_all(
        &client,
        &custom("2024-01-01", "2024-04-10"),
        Bounds::new(0.0, 9.0),
        FetchOptions {
            pacing: Duration::from_millis(300),
            dedup_by_id: false,
        },
    )
    .await
    .unwrap();

    let stamps: Vec<Instant> = client.calls.lock().unwrap().iter().map(|(_, t)| *t).collect();
    assert_eq!(stamps.len(), 4);
    assert_eq!(stamps[0], t0, "no delay before the first request");
    for w in stamps.windows(2) {
        assert!(w[1] - w[0] >= Duration::from_millis(300));
    }
    assert!(t0.elapsed() < Duration::from_millis(1200), "no delay after the last request");
}

#[tokio::test]
async fn failure_aborts_everything_without_retry() {
    let client = ScriptedClient::failing_on(2);
    let err = fetch_all(
        &client,
        &custom("2024-01-01", "2024-04-10"),
        Bounds::new(0.0, 9.0),
        no_pacing(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
    assert_eq!(client.requests().len(), 2, "stops at the failing chunk, no retry");
}

#[tokio::test]
async fn inverted_range_never_hits_the_feed() {
    let client = ScriptedClient::ok();
    let err = fetch_all(
        &client,
        &custom("2024-03-01", "2024-01-01"),
        Bounds::new(0.0, 9.0),
        no_pacing(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FetchError::InvalidRange { .. }));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn boundary_duplicates_are_kept_unless_dedup_enabled() {
    let client = ScriptedClient {
        duplicate_ids: true,
        ..ScriptedClient::ok()
    };
    let mode = custom("2024-01-01", "2024-03-15");
    let raw = fetch_all(&client, &mode, Bounds::new(0.0, 9.0), no_pacing())
        .await
        .unwrap();
    assert_eq!(raw.len(), 3);

    let deduped = fetch_all(
        &client,
        &mode,
        Bounds::new(0.0, 9.0),
        FetchOptions {
            pacing: Duration::ZERO,
            dedup_by_id: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(deduped.len(), 1);
}
