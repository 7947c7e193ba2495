//! Dense 3D histograms of weighted reciprocal-space events.
//!
//! Events are binned along three (possibly non-orthogonal) edge directions into a
//! single contiguous array. Bulk operations run page segments on a bounded worker
//! pool; spatial queries (integration, centroids, peak location) read the array
//! in place.
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use qspace_histogram::{Event, Histogram3D, ProjectionBinner};
//!
//! let edges = [DVec3::X, DVec3::Y, DVec3::Z]
//!     .map(|d| ProjectionBinner::uniform(d, 0.0, 4.0, 4).expect("valid binner"));
//! let mut histogram = Histogram3D::new(edges).expect("orthonormal basis");
//!
//! let added = histogram
//!     .accumulate(&[Event::new(0.5, 0.5, 0.5, 2.0)], true)
//!     .expect("accumulate should succeed");
//! assert_eq!(added, 2.0);
//! assert_eq!(histogram.value_at(DVec3::splat(0.5)), 2.0);
//! assert_eq!(histogram.num_added(), 1);
//! ```

pub mod binner;
mod error;
pub mod histogram;
pub mod runner;
mod types;
mod util;

pub use binner::{
    dual_binners, index3, reciprocal_basis, BinnerSet, IntervalBinner, ProjectionBinner,
    DEGENERATE_TRIPLE_PRODUCT,
};
pub use error::{HistogramError, Result};
pub use histogram::{
    BucketedSegment, Histogram3D, HistogramStats, IndexWindow, SharedHistogram, SphereIntegrals,
};
pub use runner::{JobRunner, PageRange, RunnerConfig};
pub use types::{BinEvent, Event, EventLike};
