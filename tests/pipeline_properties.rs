// tests/pipeline_properties.rs
//
// Randomized checks of the filtering pipeline and aggregator properties.

use quake_insights::aggregate::{day_buckets, magnitude_buckets};
use quake_insights::filter;
use quake_insights::{Bounds, Event, FeedWindow, FilterConfig, QueryMode};
use rand::Rng;

fn random_events(rng: &mut impl Rng, n: usize) -> Vec<Event> {
    (0..n)
        .map(|i| Event {
            id: format!("e{i}"),
            magnitude: rng.random_range(-1.0..9.5),
            depth_km: rng.random_range(-5.0..700.0),
            time_ms: rng.random_range(1_600_000_000_000i64..1_700_000_000_000),
            latitude: rng.random_range(-90.0..=90.0),
            longitude: rng.random_range(-180.0..=180.0),
            place: String::new(),
            url: String::new(),
        })
        .collect()
}

fn random_bounds(rng: &mut impl Rng, lo: f64, hi: f64) -> Bounds {
    let a = rng.random_range(lo..hi);
    let b = rng.random_range(lo..hi);
    Bounds::new(a.min(b), a.max(b))
}

#[test]
fn output_is_an_ordered_subset_satisfying_all_predicates() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let n = rng.random_range(0..120);
        let raw = random_events(&mut rng, n);
        let cfg = FilterConfig {
            min_magnitude: rng.random_range(0.0..9.0),
            magnitude_range: if rng.random_bool(0.5) {
                Some(random_bounds(&mut rng, -1.0, 9.5))
            } else {
                None
            },
            depth_range: random_bounds(&mut rng, -5.0, 700.0),
            max_results: None,
        };
        let mode = QueryMode::NamedWindow(FeedWindow::Day);
        let ws = filter::apply(&mode, raw.clone(), &cfg);
        let mag = cfg.magnitude_bounds();

        assert_eq!(ws.count, ws.events.len());
        assert!(ws.events.iter().all(|e| mag.contains(e.magnitude)));
        assert!(ws.events.iter().all(|e| cfg.depth_range.contains(e.depth_km)));

        // order-preserving subset: every kept id appears in raw at increasing positions
        let mut pos = 0usize;
        for e in &ws.events {
            let found = raw[pos..].iter().position(|r| r.id == e.id).expect("subset");
            pos += found + 1;
        }

        // cap yields exactly the prefix of the uncapped output
        let cap = rng.random_range(1..20i64);
        let capped = filter::apply(
            &mode,
            raw,
            &FilterConfig {
                max_results: Some(cap),
                ..cfg.clone()
            },
        );
        assert!(capped.count <= cap as usize);
        let k = capped.count;
        assert_eq!(capped.events[..], ws.events[..k]);
    }
}

#[test]
fn magnitude_bands_always_sum_to_input() {
    let mut rng = rand::rng();
    for _ in 0..100 {
        let n = rng.random_range(0..200);
        let evs = random_events(&mut rng, n);
        let bands = magnitude_buckets(&evs);
        assert_eq!(bands.len(), 4);
        assert_eq!(bands.iter().map(|b| b.count).sum::<usize>(), n);

        let days = day_buckets(&evs);
        assert_eq!(days.iter().map(|b| b.count).sum::<usize>(), n);
        assert!(days.windows(2).all(|w| w[0].label < w[1].label));
    }
}
