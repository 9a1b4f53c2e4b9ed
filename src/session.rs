//! # Session
//! Owns the published working set and the fetch status, and discards results of
//! fetches that a newer fetch has superseded.
//!
//! Every fetch takes a [`Ticket`] carrying a monotonically increasing generation. On
//! completion the ticket is compared with the latest generation; stale results are
//! dropped without touching the published state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use metrics::counter;
use serde::Serialize;

use crate::event::FilterConfig;
use crate::filter::{self, WorkingSet};
use crate::ingest::error::FetchError;
use crate::ingest::types::{FeedClient, QueryMode};
use crate::ingest::{self, FetchOptions};

/// Result contract exposed to presentation collaborators.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    Idle,
    Loading { generation: u64 },
    Ready { generation: u64, count: usize },
    Failed { generation: u64, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Ready(Arc<WorkingSet>),
    Failed(FetchError),
    /// A newer fetch started meanwhile; this result was ignored.
    Superseded,
}

#[derive(Debug)]
pub struct Session {
    generation: AtomicU64,
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: FetchState,
    working: Arc<WorkingSet>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            inner: RwLock::new(Inner {
                state: FetchState::Idle,
                working: Arc::new(WorkingSet::default()),
            }),
        }
    }

    /// Start a new fetch; any older in-flight fetch becomes stale.
    pub fn begin(&self) -> Ticket {
        // bump under the write lock so `Loading` states publish in ticket order
        let mut inner = self.inner.write().expect("session rwlock poisoned");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.state = FetchState::Loading { generation };
        Ticket { generation }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Publish a finished fetch if its ticket is still the latest.
    pub fn complete(
        &self,
        ticket: Ticket,
        result: Result<WorkingSet, FetchError>,
    ) -> FetchOutcome {
        let mut inner = self.inner.write().expect("session rwlock poisoned");
        // checked under the write lock so a concurrent `begin` cannot interleave
        if !self.is_current(ticket) {
            counter!("session_superseded_total").increment(1);
            tracing::info!(
                target: "session",
                generation = ticket.generation,
                "stale fetch result discarded"
            );
            return FetchOutcome::Superseded;
        }
        match result {
            Ok(ws) => {
                let ws = Arc::new(ws);
                inner.state = FetchState::Ready {
                    generation: ticket.generation,
                    count: ws.count,
                };
                inner.working = Arc::clone(&ws);
                FetchOutcome::Ready(ws)
            }
            Err(e) => {
                // the previous working set stays published; only the status changes
                inner.state = FetchState::Failed {
                    generation: ticket.generation,
                    message: e.to_string(),
                };
                FetchOutcome::Failed(e)
            }
        }
    }

    pub fn state(&self) -> FetchState {
        self.inner
            .read()
            .expect("session rwlock poisoned")
            .state
            .clone()
    }

    pub fn working_set(&self) -> Arc<WorkingSet> {
        Arc::clone(&self.inner.read().expect("session rwlock poisoned").working)
    }

    /// Orchestrate, filter and publish in one go.
    pub async fn run(
        &self,
        client: &dyn FeedClient,
        mode: QueryMode,
        cfg: &FilterConfig,
        opts: FetchOptions,
    ) -> FetchOutcome {
        let ticket = self.begin();
        let result = ingest::fetch_all(client, &mode, cfg.magnitude_bounds(), opts)
            .await
            .map(|raw| filter::apply(&mode, raw, cfg));
        self.complete(ticket, result)
    }
}
