//! Binning of 3D points by their projection onto a direction.

use glam::DVec3;

use super::IntervalBinner;
use crate::error::{HistogramError, Result};

/// An `IntervalBinner` applied to `p · direction`, with `|direction| == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionBinner {
    direction: DVec3,
    interval: IntervalBinner,
}

impl ProjectionBinner {
    /// Create a binner along `direction`, which is normalized here.
    pub fn new(direction: DVec3, interval: IntervalBinner) -> Result<Self> {
        let len = direction.length();
        if !direction.is_finite() || len == 0.0 {
            return Err(HistogramError::InvalidDirection {
                x: direction.x,
                y: direction.y,
                z: direction.z,
            });
        }
        Ok(Self {
            direction: direction / len,
            interval,
        })
    }

    /// Uniform binner of `[min, max)` along `direction`.
    pub fn uniform(direction: DVec3, min: f64, max: f64, num_bins: usize) -> Result<Self> {
        Self::new(direction, IntervalBinner::uniform(min, max, num_bins)?)
    }

    #[inline]
    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    #[inline]
    pub fn interval(&self) -> &IntervalBinner {
        &self.interval
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.interval.num_bins()
    }

    /// Signed coordinate of `p` along the direction.
    #[inline]
    pub fn project(&self, p: DVec3) -> f64 {
        p.dot(self.direction)
    }

    /// Bin containing the projection of `p`; see `IntervalBinner::index`.
    #[inline]
    pub fn index(&self, p: DVec3) -> isize {
        self.interval.index(self.project(p))
    }

    /// Point on the axis at the center of bin `i`.
    #[inline]
    pub fn center_vec(&self, i: usize) -> DVec3 {
        self.direction * self.interval.center_val(i)
    }

    /// Point on the axis at a fractional bin index.
    #[inline]
    pub fn vec(&self, fractional_index: f64) -> DVec3 {
        self.direction * self.interval.val(fractional_index)
    }

    /// Same direction, interval restricted to bins `lo..=hi`.
    pub fn sub_range(&self, lo: usize, hi: usize) -> Result<Self> {
        Ok(Self {
            direction: self.direction,
            interval: self.interval.sub_range(lo, hi)?,
        })
    }
}
