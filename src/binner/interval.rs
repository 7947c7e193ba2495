//! One-dimensional binning of a half-open interval.

use crate::error::{HistogramError, Result};

/// Subdivision of the half-open interval `[min, max)` into `num_bins` bins.
///
/// `index` never fails: values below the interval map to a negative index and
/// values at or above `max` (or NaN) map to `num_bins`, so callers can range-check
/// once per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalBinner {
    layout: Layout,
}

#[derive(Debug, Clone, PartialEq)]
enum Layout {
    /// Bins `offset..offset + num_bins` of a uniform grid of `total` bins over
    /// `[origin, top)`. Sub-ranges keep the grid so they index exactly like it.
    Uniform {
        origin: f64,
        top: f64,
        step: f64,
        total: usize,
        offset: usize,
        num_bins: usize,
    },
    /// Ascending bin edges, `num_bins + 1` of them.
    Edges(Vec<f64>),
}

impl IntervalBinner {
    /// Uniform subdivision of `[min, max)`.
    pub fn uniform(min: f64, max: f64, num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(HistogramError::InvalidBinner(
                "num_bins must be at least 1".into(),
            ));
        }
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(HistogramError::InvalidBinner(format!(
                "interval [{min}, {max}) is empty or not finite"
            )));
        }
        Ok(Self::uniform_grid(min, max, num_bins, 0, num_bins))
    }

    fn uniform_grid(origin: f64, top: f64, total: usize, offset: usize, num_bins: usize) -> Self {
        Self {
            layout: Layout::Uniform {
                origin,
                top,
                step: (top - origin) / total as f64,
                total,
                offset,
                num_bins,
            },
        }
    }

    /// Subdivision by explicit, strictly increasing edges.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(HistogramError::InvalidBinner(format!(
                "need at least 2 edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(HistogramError::InvalidBinner("edges must be finite".into()));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(HistogramError::InvalidBinner(
                "edges must be strictly increasing".into(),
            ));
        }
        Ok(Self {
            layout: Layout::Edges(edges),
        })
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        match &self.layout {
            Layout::Uniform { num_bins, .. } => *num_bins,
            Layout::Edges(edges) => edges.len() - 1,
        }
    }

    /// Lower bound of the interval.
    #[inline]
    pub fn min(&self) -> f64 {
        match &self.layout {
            Layout::Uniform { .. } => self.min_val(0),
            Layout::Edges(edges) => edges[0],
        }
    }

    /// Upper (excluded) bound of the interval.
    #[inline]
    pub fn max(&self) -> f64 {
        match &self.layout {
            Layout::Uniform { num_bins, .. } => self.max_val(num_bins - 1),
            Layout::Edges(edges) => edges[edges.len() - 1],
        }
    }

    /// Bin width; the mean width for non-uniform layouts.
    #[inline]
    pub fn step(&self) -> f64 {
        match &self.layout {
            Layout::Uniform { step, .. } => *step,
            Layout::Edges(_) => (self.max() - self.min()) / self.num_bins() as f64,
        }
    }

    #[inline]
    pub fn is_uniform(&self) -> bool {
        matches!(self.layout, Layout::Uniform { .. })
    }

    /// Bin containing `v`.
    ///
    /// Returns `-1` for `v < min` and `num_bins` for `v >= max` or NaN.
    #[inline]
    pub fn index(&self, v: f64) -> isize {
        let n = self.num_bins() as isize;
        if v.is_nan() {
            return n;
        }
        match &self.layout {
            Layout::Uniform {
                origin,
                top,
                step,
                total,
                offset,
                ..
            } => {
                let total = *total as isize;
                let grid = if v >= *top {
                    total
                } else if v < *origin {
                    -1
                } else {
                    // Rounding can push values just below `top` onto `total`.
                    (((v - origin) / step) as isize).min(total - 1)
                };
                let i = grid - *offset as isize;
                if i < 0 {
                    -1
                } else {
                    i.min(n)
                }
            }
            Layout::Edges(edges) => {
                if v >= edges[edges.len() - 1] {
                    n
                } else if v < edges[0] {
                    -1
                } else {
                    edges.partition_point(|&e| e <= v) as isize - 1
                }
            }
        }
    }

    /// Lower edge of bin `i`.
    #[inline]
    pub fn min_val(&self, i: usize) -> f64 {
        debug_assert!(i < self.num_bins(), "bin {i} out of range");
        match &self.layout {
            Layout::Uniform {
                origin,
                step,
                offset,
                ..
            } => origin + (offset + i) as f64 * step,
            Layout::Edges(edges) => edges[i],
        }
    }

    /// Upper edge of bin `i`.
    #[inline]
    pub fn max_val(&self, i: usize) -> f64 {
        debug_assert!(i < self.num_bins(), "bin {i} out of range");
        match &self.layout {
            Layout::Uniform {
                origin,
                top,
                step,
                total,
                offset,
                ..
            } => {
                if offset + i + 1 == *total {
                    *top
                } else {
                    origin + (offset + i + 1) as f64 * step
                }
            }
            Layout::Edges(edges) => edges[i + 1],
        }
    }

    /// Midpoint of bin `i`.
    #[inline]
    pub fn center_val(&self, i: usize) -> f64 {
        match &self.layout {
            Layout::Uniform {
                origin,
                step,
                offset,
                ..
            } => origin + ((offset + i) as f64 + 0.5) * step,
            Layout::Edges(edges) => 0.5 * (edges[i] + edges[i + 1]),
        }
    }

    /// Value at a fractional bin index.
    ///
    /// The integer part selects the bin, the fractional part interpolates between
    /// its edges; `val(i + 0.5) == center_val(i)`. Indices outside `[0, num_bins]`
    /// extrapolate from the nearest end bin.
    #[inline]
    pub fn val(&self, fractional_index: f64) -> f64 {
        match &self.layout {
            Layout::Uniform {
                origin,
                step,
                offset,
                ..
            } => origin + (*offset as f64 + fractional_index) * step,
            Layout::Edges(edges) => {
                let last = edges.len() - 2;
                let bin = (fractional_index.floor().max(0.0) as usize).min(last);
                let frac = fractional_index - bin as f64;
                edges[bin] + frac * (edges[bin + 1] - edges[bin])
            }
        }
    }

    /// Binner covering bins `lo..=hi` of this one, with identical edges.
    ///
    /// `sub.index(v) == self.index(v) - lo` for every `v` inside the sub-range.
    pub fn sub_range(&self, lo: usize, hi: usize) -> Result<Self> {
        if lo > hi || hi >= self.num_bins() {
            return Err(HistogramError::InvalidBinner(format!(
                "sub range {lo}..={hi} outside 0..{}",
                self.num_bins()
            )));
        }
        match &self.layout {
            Layout::Uniform {
                origin,
                top,
                total,
                offset,
                ..
            } => Ok(Self::uniform_grid(*origin, *top, *total, offset + lo, hi - lo + 1)),
            Layout::Edges(edges) => Self::from_edges(edges[lo..=hi + 1].to_vec()),
        }
    }

    /// Binner with every edge multiplied by `factor` (> 0).
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(HistogramError::InvalidBinner(format!(
                "scale factor {factor} must be positive and finite"
            )));
        }
        match &self.layout {
            Layout::Uniform {
                origin,
                top,
                total,
                offset,
                num_bins,
                ..
            } => Ok(Self::uniform_grid(
                origin * factor,
                top * factor,
                *total,
                *offset,
                *num_bins,
            )),
            Layout::Edges(edges) => Self::from_edges(edges.iter().map(|e| e * factor).collect()),
        }
    }
}
