// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod event;
pub mod filter;
pub mod geo;
pub mod ingest;
pub mod metrics;
pub mod nearest;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::event::{Bounds, Event, FilterConfig};
pub use crate::geo::distance_km;
pub use crate::ingest::error::FetchError;
pub use crate::ingest::types::{FeedClient, FeedRequest, FeedWindow, QueryMode, TimeRange};
pub use crate::session::{FetchOutcome, FetchState, Session};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
/// Safe to call more than once (later calls are no-ops).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quake_insights=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
