//! Interval, projection and dual-basis binners.

mod dual;
mod interval;
mod projection;

pub use dual::{dual_binners, index3, reciprocal_basis, BinnerSet, DEGENERATE_TRIPLE_PRODUCT};
pub use interval::IntervalBinner;
pub use projection::ProjectionBinner;
