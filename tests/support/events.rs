#![allow(dead_code)]

use glam::DVec3;
use qspace_histogram::{BinnerSet, Event, Histogram3D, ProjectionBinner, RunnerConfig};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Axis-aligned edges covering `[min, max)` with `n` bins per axis.
pub fn cube_edges(n: usize, min: f64, max: f64) -> BinnerSet {
    [DVec3::X, DVec3::Y, DVec3::Z].map(|d| ProjectionBinner::uniform(d, min, max, n).unwrap())
}

/// Edges along arbitrary (not necessarily orthogonal) directions.
pub fn skewed_edges(directions: [DVec3; 3], n: usize, min: f64, max: f64) -> BinnerSet {
    directions.map(|d| ProjectionBinner::uniform(d, min, max, n).unwrap())
}

pub fn histogram_with_threads(edges: BinnerSet, num_threads: usize, num_segments: usize) -> Histogram3D {
    Histogram3D::with_config(
        edges,
        RunnerConfig {
            num_threads,
            num_segments,
            ..RunnerConfig::default()
        },
    )
    .unwrap()
}

/// Generate events uniformly distributed in the box `[lo, hi)^3` with weights in `[0.5, 1.5)`.
pub fn random_box_events(n: usize, lo: f64, hi: f64, seed: u64) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_box_events_with_rng(n, lo, hi, &mut rng)
}

pub fn random_box_events_with_rng<R: Rng + ?Sized>(n: usize, lo: f64, hi: f64, rng: &mut R) -> Vec<Event> {
    (0..n)
        .map(|_| {
            Event::new(
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
                rng.gen_range(0.5..1.5),
            )
        })
        .collect()
}

/// Generate unit-weight events clustered around `center`.
///
/// Each coordinate is offset by the sum of three uniforms in `[-width, width)`,
/// a cheap bell-shaped profile symmetric about the center.
pub fn peak_events(n: usize, center: DVec3, width: f64, seed: u64) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bell = move || -> f64 {
        (0..3).map(|_| rng.gen_range(-width..width)).sum::<f64>() / 3.0
    };

    (0..n)
        .map(|_| Event::at(center + DVec3::new(bell(), bell(), bell()), 1.0))
        .collect()
}

/// One unit event at the real-space center of every bin of `edges`.
pub fn one_per_bin(edges: &BinnerSet) -> Vec<Event> {
    let [nx, ny, nz] = [edges[0].num_bins(), edges[1].num_bins(), edges[2].num_bins()];
    let mut events = Vec::with_capacity(nx * ny * nz);
    for iz in 0..nz {
        for iy in 0..ny {
            for ix in 0..nx {
                let p = edges[0].center_vec(ix) + edges[1].center_vec(iy) + edges[2].center_vec(iz);
                events.push(Event::at(p, 1.0));
            }
        }
    }
    events
}
