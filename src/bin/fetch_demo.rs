//! Demo that runs one day-window fetch against the live feed and logs what the core produces.

use std::time::Duration;

use quake_insights::ingest::providers::usgs::UsgsClient;
use quake_insights::ingest::FetchOptions;
use quake_insights::{aggregate, nearest, FeedWindow, FetchOutcome, FilterConfig, QueryMode, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let client = UsgsClient::new(Duration::from_secs(10))?;
    let session = Session::new();
    let cfg = FilterConfig::default();

    let outcome = session
        .run(
            &client,
            QueryMode::NamedWindow(FeedWindow::Day),
            &cfg,
            FetchOptions::default(),
        )
        .await;

    let ws = match outcome {
        FetchOutcome::Ready(ws) => ws,
        FetchOutcome::Failed(e) => anyhow::bail!("fetch failed: {e}"),
        FetchOutcome::Superseded => anyhow::bail!("fetch superseded"),
    };
    tracing::info!(count = ws.count, "working set ready");

    let h = aggregate::histograms(&ws.events);
    for b in &h.by_magnitude {
        tracing::info!(band = %b.label, count = b.count, "magnitude band");
    }
    for b in &h.by_day {
        tracing::info!(day = %b.label, count = b.count, "per day");
    }

    let strongest = ws
        .events
        .iter()
        .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude));
    if let Some(reference) = strongest {
        let ranking = nearest::rank_nearest_regional(&client, reference, &ws.events).await;
        tracing::info!(id = %reference.id, mag = reference.magnitude, source = ?ranking.source, "nearest to strongest");
        for r in ranking.ranked {
            tracing::info!(
                id = %r.event.id,
                mag = r.event.magnitude,
                km = %format!("{:.1}", r.distance_km),
                place = %r.event.place,
                "neighbor"
            );
        }
    }

    println!("fetch-demo done");
    Ok(())
}
