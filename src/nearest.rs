//! # Nearest-Neighbor Ranker
//! Bounded linear scan over a candidate set, ranked by great-circle distance.
//!
//! The regional variant first asks the feed for events within 500 km of the
//! reference; if that query fails it ranks the caller's working set instead.

use serde::Serialize;

use crate::event::Event;
use crate::ingest::types::{FeedClient, FeedRequest};

/// How many neighbors a ranking returns.
pub const NEAREST_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedEvent {
    pub event: Event,
    pub distance_km: f64,
}

/// Where the ranked candidates came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Regional,
    WorkingSet,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Ranking {
    pub source: CandidateSource,
    pub ranked: Vec<RankedEvent>,
}

/// Top `limit` candidates by distance from `reference`, ascending.
///
/// Ties keep arrival order. The reference itself is not excluded.
pub fn rank_by_distance(reference: &Event, candidates: &[Event], limit: usize) -> Vec<RankedEvent> {
    let mut ranked: Vec<RankedEvent> = candidates
        .iter()
        .map(|c| RankedEvent {
            distance_km: reference.distance_to(c),
            event: c.clone(),
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(limit);
    ranked
}

pub fn rank_nearest(reference: &Event, candidates: &[Event]) -> Vec<RankedEvent> {
    rank_by_distance(reference, candidates, NEAREST_LIMIT)
}

/// Rank against a fresh regional query, degrading to `working_set` on failure.
pub async fn rank_nearest_regional(
    client: &dyn FeedClient,
    reference: &Event,
    working_set: &[Event],
) -> Ranking {
    let request = FeedRequest::regional(reference.latitude, reference.longitude);
    match client.fetch(&request).await {
        Ok(regional) => Ranking {
            source: CandidateSource::Regional,
            ranked: rank_nearest(reference, &regional),
        },
        Err(e) => {
            tracing::warn!(
                target: "nearest",
                error = %e,
                reference = %reference.id,
                "regional query failed; ranking within working set"
            );
            Ranking {
                source: CandidateSource::WorkingSet,
                ranked: rank_nearest(reference, working_set),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::mk_event;

    fn at(id: &str, lat: f64, lon: f64) -> Event {
        Event {
            latitude: lat,
            longitude: lon,
            ..mk_event(id, 3.0, 10.0)
        }
    }

    #[test]
    fn equal_distances_keep_arrival_order() {
        let reference = at("ref", 0.0, 0.0);
        let out = rank_nearest(&reference, &[at("east", 0.0, 1.0), at("north", 1.0, 0.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].event.id, "east");
        assert_eq!(out[1].event.id, "north");
        assert!((out[0].distance_km - out[1].distance_km).abs() < 1e-9);
        assert!((out[0].distance_km - 111.19).abs() < 0.1);

        let flipped = rank_nearest(&reference, &[at("north", 1.0, 0.0), at("east", 0.0, 1.0)]);
        assert_eq!(flipped[0].event.id, "north");
    }

    #[test]
    fn reference_ranks_first_with_zero_distance() {
        let reference = at("ref", 10.0, 10.0);
        let cands = vec![at("far", 40.0, 40.0), reference.clone(), at("near", 10.5, 10.0)];
        let out = rank_nearest(&reference, &cands);
        assert_eq!(out[0].event.id, "ref");
        assert_eq!(out[0].distance_km, 0.0);
        assert_eq!(out[1].event.id, "near");
        assert_eq!(out[2].event.id, "far");
    }

    #[test]
    fn output_is_sorted_and_capped_at_ten() {
        let reference = at("ref", 0.0, 0.0);
        let cands: Vec<Event> = (0..25)
            .map(|i| at(&format!("e{i}"), (25 - i) as f64 * 0.3, 0.0))
            .collect();
        let out = rank_nearest(&reference, &cands);
        assert_eq!(out.len(), NEAREST_LIMIT);
        for w in out.windows(2) {
            assert!(w[0].distance_km <= w[1].distance_km);
        }
        assert_eq!(out[0].event.id, "e24");
    }

    #[test]
    fn fewer_candidates_than_limit() {
        let reference = at("ref", 0.0, 0.0);
        assert!(rank_nearest(&reference, &[]).is_empty());
        assert_eq!(rank_nearest(&reference, &[at("x", 1.0, 1.0)]).len(), 1);
    }
}
