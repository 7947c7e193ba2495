//! Public API integration tests for qspace-histogram.

mod support;

use approx::assert_relative_eq;
use glam::DVec3;
use qspace_histogram::{
    Event, Histogram3D, HistogramError, HistogramStats, IntervalBinner, ProjectionBinner,
    RunnerConfig, SharedHistogram,
};
use std::time::Duration;
use support::events::{
    cube_edges, histogram_with_threads, one_per_bin, peak_events, random_box_events,
};

#[test]
fn test_single_event_in_small_cube() {
    let mut h = Histogram3D::new(cube_edges(4, 0.0, 4.0)).unwrap();
    let added = h.accumulate(&[Event::new(0.5, 0.5, 0.5, 2.0)], true).unwrap();

    assert_eq!(added, 2.0);
    assert_eq!(h.value_at(DVec3::new(0.5, 0.5, 0.5)), 2.0);
    assert_eq!(h.sum(), 2.0);
    assert_eq!(h.max(), 2.0);
    assert_eq!(h.num_added(), 1);
    assert_eq!(h.as_slice().iter().filter(|&&v| v != 0.0).count(), 1);
}

#[test]
fn test_clear_then_scan_gives_zero_aggregates() {
    let mut h = Histogram3D::new(cube_edges(8, -1.0, 1.0)).unwrap();
    h.accumulate(&random_box_events(5_000, -1.0, 1.0, 7), true)
        .unwrap();
    assert!(h.sum() > 0.0);

    h.clear().unwrap();
    h.scan_histogram().unwrap();
    assert_eq!(h.min(), 0.0);
    assert_eq!(h.max(), 0.0);
    assert_eq!(h.sum(), 0.0);
    assert_eq!(h.num_added(), 0);
    assert!(h.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn test_unweighted_sum_counts_in_range_events() {
    let mut h = Histogram3D::new(cube_edges(10, 0.0, 1.0)).unwrap();
    // Half the box lies outside the histogram.
    let events = random_box_events(20_000, -0.5, 1.0, 42);
    let in_range = events
        .iter()
        .filter(|e| e.x >= 0.0 && e.y >= 0.0 && e.z >= 0.0)
        .count();

    let added = h.accumulate(&events, false).unwrap();
    assert_eq!(added, in_range as f64);
    assert_eq!(h.sum(), in_range as f64);
    assert_eq!(h.num_added(), events.len() as u64);

    h.scan_histogram().unwrap();
    assert_eq!(h.sum(), in_range as f64);
}

#[test]
fn test_weighted_return_is_in_range_weight() {
    let mut h = Histogram3D::new(cube_edges(10, 0.0, 1.0)).unwrap();
    let events = random_box_events(10_000, -0.2, 1.2, 3);
    let expected: f64 = events
        .iter()
        .filter(|e| [e.x, e.y, e.z].iter().all(|&c| (0.0..1.0).contains(&c)))
        .map(|e| e.weight)
        .sum();

    // Cells are f32, so the binned weight only matches to single precision.
    let added = h.accumulate(&events, true).unwrap();
    assert_relative_eq!(added, expected, max_relative = 1e-5);
    let running = h.sum();
    h.scan_histogram().unwrap();
    assert_relative_eq!(h.sum(), running, max_relative = 1e-12);
}

#[test]
fn test_value_at_bin_interior() {
    let edges = cube_edges(5, 0.0, 5.0);
    let mut h = Histogram3D::new(edges.clone()).unwrap();
    let mut events = one_per_bin(&edges);
    events.push(Event::new(2.5, 1.5, 4.5, 3.0));
    h.accumulate(&events, true).unwrap();

    // Anywhere inside bin (2, 1, 4) reads the same cell.
    for p in [
        DVec3::new(2.0, 1.0, 4.0),
        DVec3::new(2.999, 1.999, 4.999),
        DVec3::new(2.3, 1.7, 4.1),
    ] {
        assert_eq!(h.value_at(p), 4.0, "at {p:?}");
    }
    assert_eq!(h.value_at(DVec3::new(5.0, 1.5, 1.5)), 0.0);
    assert_eq!(h.value_at(DVec3::new(f64::NAN, 1.5, 1.5)), 0.0);
}

#[test]
fn test_total_near_zero_equals_value_at() {
    let mut h = Histogram3D::new(cube_edges(12, -3.0, 3.0)).unwrap();
    h.accumulate(&peak_events(20_000, DVec3::ZERO, 1.5, 11), true)
        .unwrap();
    for e in random_box_events(200, -3.0, 3.0, 12) {
        let p = e.position();
        assert_eq!(h.total_near(p, 0), f64::from(h.value_at(p)));
    }
}

#[test]
fn test_streaming_chunks_match_single_batch() {
    let events = random_box_events(30_000, 0.0, 2.0, 99);

    let mut whole = Histogram3D::new(cube_edges(16, 0.0, 2.0)).unwrap();
    whole.accumulate(&events, true).unwrap();

    let mut streamed = Histogram3D::new(cube_edges(16, 0.0, 2.0)).unwrap();
    let mut total = 0.0;
    for chunk in events.chunks(4_096) {
        total += streamed.accumulate(chunk, true).unwrap();
    }

    assert_eq!(streamed.as_slice(), whole.as_slice());
    assert_eq!(streamed.num_added(), whole.num_added());
    assert_relative_eq!(total, whole.sum(), max_relative = 1e-12);
}

#[test]
fn test_cells_independent_of_thread_count() {
    let events = random_box_events(25_000, 0.0, 1.0, 2024);
    let configs = [(1, 1), (2, 3), (4, 4), (8, 16)];
    let histograms: Vec<Histogram3D> = configs
        .iter()
        .map(|&(threads, segments)| {
            let mut h = histogram_with_threads(cube_edges(10, 0.0, 1.0), threads, segments);
            h.accumulate(&events, true).unwrap();
            h
        })
        .collect();

    // A cell is owned by exactly one segment and sees events in batch order.
    let reference = &histograms[0];
    for (h, (threads, segments)) in histograms.iter().zip(configs).skip(1) {
        assert_eq!(h.as_slice(), reference.as_slice(), "threads={threads} segments={segments}");
        assert_relative_eq!(h.sum(), reference.sum(), max_relative = 1e-12);
    }
}

#[test]
fn test_more_segments_than_pages() {
    let mut h = histogram_with_threads(cube_edges(3, 0.0, 3.0), 4, 64);
    let events = one_per_bin(h.edge_binners());
    assert_eq!(h.accumulate(&events, true).unwrap(), 27.0);
    assert!(h.as_slice().iter().all(|&v| v == 1.0));
}

#[test]
fn test_explicit_edge_binner() {
    let x = ProjectionBinner::new(
        DVec3::X,
        IntervalBinner::from_edges(vec![0.0, 0.1, 0.5, 2.0]).unwrap(),
    )
    .unwrap();
    let y = ProjectionBinner::uniform(DVec3::Y, 0.0, 1.0, 2).unwrap();
    let z = ProjectionBinner::uniform(DVec3::Z, 0.0, 1.0, 1).unwrap();
    let mut h = Histogram3D::new([x, y, z]).unwrap();
    assert_eq!(h.dims(), [3, 2, 1]);

    h.accumulate(
        &[
            Event::new(0.05, 0.2, 0.5, 1.0),
            Event::new(0.3, 0.7, 0.5, 1.0),
            Event::new(1.9, 0.7, 0.5, 1.0),
            Event::new(2.0, 0.7, 0.5, 1.0),
        ],
        false,
    )
    .unwrap();
    assert_eq!(h.cell(0, 0, 0), Some(1.0));
    assert_eq!(h.cell(1, 1, 0), Some(1.0));
    assert_eq!(h.cell(2, 1, 0), Some(1.0));
    assert_eq!(h.sum(), 3.0);
    assert_relative_eq!(h.bin_location(2, 0, 0).x, 1.25);
}

#[test]
fn test_stats_snapshot() {
    let mut h = Histogram3D::new(cube_edges(4, 0.0, 4.0)).unwrap();
    assert_eq!(h.stats(), HistogramStats::EMPTY);
    h.accumulate(&[Event::new(1.5, 1.5, 1.5, 2.5)], true).unwrap();
    let s = h.stats();
    assert_eq!(s.sum, 2.5);
    assert_eq!(s.max, 2.5);
    assert_eq!(s.min, 2.5);
    assert_eq!(s.num_added, 1);

    // Untouched zero cells only show up after a full scan.
    h.scan_histogram().unwrap();
    assert_eq!(h.min(), 0.0);
}

#[test]
fn test_invalid_configuration() {
    let bad = RunnerConfig {
        num_segments: 0,
        ..RunnerConfig::default()
    };
    assert!(matches!(
        Histogram3D::with_config(cube_edges(4, 0.0, 1.0), bad),
        Err(HistogramError::InvalidConfig(_))
    ));
    assert!(matches!(
        IntervalBinner::uniform(1.0, 1.0, 4),
        Err(HistogramError::InvalidBinner(_))
    ));
    assert!(matches!(
        IntervalBinner::uniform(0.0, 1.0, 0),
        Err(HistogramError::InvalidBinner(_))
    ));
    assert!(matches!(
        IntervalBinner::from_edges(vec![0.0, 1.0, 1.0]),
        Err(HistogramError::InvalidBinner(_))
    ));
}

#[test]
fn test_timeout_reported() {
    support::init_logging();
    let config = RunnerConfig {
        timeout: Duration::from_nanos(1),
        ..RunnerConfig::default()
    };
    let mut h = Histogram3D::with_config(cube_edges(8, 0.0, 1.0), config).unwrap();
    let result = h.accumulate(&random_box_events(1_000, 0.0, 1.0, 5), true);
    assert!(
        matches!(
            result,
            Err(HistogramError::Timeout {
                operation: "accumulate",
                ..
            })
        ),
        "got {result:?}"
    );
    // Aggregates are untouched by the failed call.
    assert_eq!(h.num_added(), 0);
}

#[test]
fn test_shared_histogram_readers_and_writers() {
    let shared = SharedHistogram::new(Histogram3D::new(cube_edges(8, 0.0, 1.0)).unwrap());
    let batches: Vec<Vec<Event>> = (0..6).map(|s| random_box_events(2_000, 0.0, 1.0, s)).collect();

    std::thread::scope(|s| {
        for batch in &batches {
            let shared = shared.clone();
            s.spawn(move || shared.accumulate(batch.as_slice(), false).unwrap());
        }
        let reader = shared.clone();
        s.spawn(move || {
            // Every observed sum is a whole number of batches.
            let sum = reader.read().sum();
            assert_eq!(sum % 2_000.0, 0.0, "partial batch visible: {sum}");
        });
    });

    let h = shared.read();
    assert_eq!(h.sum(), 12_000.0);
    assert_eq!(h.num_added(), 12_000);
}

#[test]
fn test_shared_runner_between_histograms() {
    let a = Histogram3D::new(cube_edges(4, 0.0, 1.0)).unwrap();
    let b = Histogram3D::with_runner(cube_edges(6, 0.0, 1.0), a.runner().clone()).unwrap();
    assert!(std::sync::Arc::ptr_eq(a.runner(), b.runner()));
    assert_eq!(b.runner().config(), &RunnerConfig::default());
}
