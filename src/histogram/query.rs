//! Point and neighborhood queries on the dense array.
//!
//! All queries fail softly: a point or window outside the histogram yields `0`,
//! `false` or `None` rather than an error. Windows are computed on the dual binners
//! (which index points) while distances use real-space bin centers from the edge
//! binners.

use std::sync::Arc;

use glam::DVec3;

use super::{Histogram3D, HistogramStats};
use crate::binner::{index3, ProjectionBinner};
use crate::error::Result;

/// Inclusive `(lo, hi)` bin range per axis.
pub type IndexWindow = [(usize, usize); 3];

/// Per-radius results of [`Histogram3D::sphere_integrals`], indexed like the radii.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SphereIntegrals {
    /// Sum of cell values whose bin center is closer than the radius.
    pub totals: Vec<f64>,
    /// Number of such bins.
    pub counts: Vec<usize>,
}

/// Raw indices of `center ± radius · direction`, ascending. May be out of range.
pub(crate) fn min_max_index(binner: &ProjectionBinner, center: DVec3, radius: f64) -> (isize, isize) {
    let step = binner.direction() * radius;
    let a = binner.index(center + step);
    let b = binner.index(center - step);
    (a.min(b), a.max(b))
}

/// Pull `lo` and `hi` to at most `max_offset` bins from `center`, never past it.
///
/// A negative `max_offset` disables the clamp.
pub(crate) fn clamp_index(lo: isize, hi: isize, center: isize, max_offset: isize) -> (isize, isize) {
    if max_offset < 0 {
        return (lo, hi);
    }
    let lo = if lo < center {
        lo.max(center - max_offset)
    } else {
        lo
    };
    let hi = if hi > center {
        hi.min(center + max_offset)
    } else {
        hi
    };
    (lo, hi)
}

impl Histogram3D {
    /// Value of the bin containing `p`, or `0` outside the histogram.
    pub fn value_at(&self, p: DVec3) -> f32 {
        match index3(&self.duals, p) {
            Some([ix, iy, iz]) => self.grid.get(ix, iy, iz),
            None => 0.0,
        }
    }

    pub fn is_point_in(&self, p: DVec3) -> bool {
        index3(&self.duals, p).is_some()
    }

    /// Sum of the `(2k+1)^3` cube of bins centered on the bin containing `p`.
    ///
    /// Returns `0` if `p` is outside or the cube does not fit inside the array.
    pub fn total_near(&self, p: DVec3, k: usize) -> f64 {
        let Some([ix, iy, iz]) = index3(&self.duals, p) else {
            return 0.0;
        };
        let [nx, ny, nz] = self.grid.dims();
        if ix < k || iy < k || iz < k || ix + k >= nx || iy + k >= ny || iz + k >= nz {
            return 0.0;
        }
        let data = self.grid.as_slice();
        let mut total = 0.0;
        for z in iz - k..=iz + k {
            for y in iy - k..=iy + k {
                let start = self.grid.offset(ix - k, y, z);
                total += data[start..=start + 2 * k]
                    .iter()
                    .map(|&v| f64::from(v))
                    .sum::<f64>();
            }
        }
        total
    }

    /// Real-space center of bin `(ix, iy, iz)`: the sum of the edge binners' centers.
    ///
    /// Indices past either end extrapolate from the nearest bin.
    pub fn bin_location(&self, ix: usize, iy: usize, iz: usize) -> DVec3 {
        self.edges[0].vec(ix as f64 + 0.5)
            + self.edges[1].vec(iy as f64 + 0.5)
            + self.edges[2].vec(iz as f64 + 0.5)
    }

    /// Bins covering the sphere of `radius` around `center`, clipped to the array.
    ///
    /// With `max_offsets`, each axis is further limited to that many bins on either
    /// side of the bin containing `center` (negative entries disable the limit).
    /// `None` if `center` is outside the histogram or `radius` is negative or NaN.
    pub fn index_window(
        &self,
        center: DVec3,
        radius: f64,
        max_offsets: Option<[isize; 3]>,
    ) -> Option<IndexWindow> {
        if !(radius >= 0.0) {
            return None;
        }
        let center_index = index3(&self.duals, center)?;
        let dims = self.grid.dims();
        let mut window = [(0, 0); 3];
        for k in 0..3 {
            let n = dims[k] as isize;
            let (mut lo, mut hi) = if radius.is_infinite() {
                (0, n - 1)
            } else {
                min_max_index(&self.duals[k], center, radius)
            };
            if let Some(offsets) = max_offsets {
                (lo, hi) = clamp_index(lo, hi, center_index[k] as isize, offsets[k]);
            }
            // The center bin is always inside, so the clipped range is non-empty.
            window[k] = (lo.max(0) as usize, hi.min(n - 1) as usize);
        }
        Some(window)
    }

    /// Edge-binner centers of the bins in `window`, per axis, offset by `window[k].0`.
    fn window_centers(&self, window: &IndexWindow) -> [Vec<DVec3>; 3] {
        [0, 1, 2].map(|k| {
            let (lo, hi) = window[k];
            (lo..=hi)
                .map(|i| self.edges[k].vec(i as f64 + 0.5))
                .collect()
        })
    }

    /// Copy of the bins around `center` as a new histogram.
    ///
    /// The window covers the sphere of `radius`, clipped to the array and to
    /// `max_offsets` bins from the center bin per axis (negative = unlimited). The
    /// copy's aggregates are computed over exactly the copied cells. Its
    /// `num_added` is set to the rounded `sum`: per-event counts cannot be
    /// recovered from merged bins, so this is only exact for unit weights.
    pub fn sub_histogram(
        &self,
        center: DVec3,
        radius: f64,
        max_offsets: [isize; 3],
    ) -> Result<Option<Histogram3D>> {
        let Some(window) = self.index_window(center, radius, Some(max_offsets)) else {
            return Ok(None);
        };
        let sub_edges = [
            self.edges[0].sub_range(window[0].0, window[0].1)?,
            self.edges[1].sub_range(window[1].0, window[1].1)?,
            self.edges[2].sub_range(window[2].0, window[2].1)?,
        ];
        let mut sub = Histogram3D::with_runner(sub_edges, Arc::clone(&self.runner))?;

        let [(x_lo, x_hi), (y_lo, y_hi), (z_lo, z_hi)] = window;
        let row_len = x_hi - x_lo + 1;
        for iz in z_lo..=z_hi {
            for iy in y_lo..=y_hi {
                let src = self.grid.offset(x_lo, iy, iz);
                let dst = sub.grid.offset(0, iy - y_lo, iz - z_lo);
                sub.grid.as_mut_slice()[dst..dst + row_len]
                    .copy_from_slice(&self.grid.as_slice()[src..src + row_len]);
            }
        }

        let mut stats = HistogramStats {
            sum: 0.0,
            ..HistogramStats::EMPTY
        };
        for &v in sub.grid.as_slice() {
            let v = f64::from(v);
            stats.sum += v;
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
        }
        stats.num_added = stats.sum.max(0.0).round() as u64;
        sub.stats = stats;
        Ok(Some(sub))
    }

    /// Value-weighted mean position of the bins whose center lies strictly inside
    /// the sphere of `radius` around `center`.
    ///
    /// The mean is taken per axis over fractional bin indices and mapped back to real
    /// space, so it is exact for skewed bases too. `None` if `center` is outside or
    /// the enclosed weight is zero.
    pub fn centroid(&self, center: DVec3, radius: f64) -> Option<DVec3> {
        let window = self.index_window(center, radius, None)?;
        let [cx, cy, cz] = self.window_centers(&window);
        let [(x_lo, x_hi), (y_lo, y_hi), (z_lo, z_hi)] = window;
        let r2 = radius * radius;

        let mut total = 0.0;
        let mut moments = [0.0f64; 3];
        for iz in z_lo..=z_hi {
            for iy in y_lo..=y_hi {
                let row_base = cz[iz - z_lo] + cy[iy - y_lo];
                for ix in x_lo..=x_hi {
                    let v = self.grid.get(ix, iy, iz);
                    if v == 0.0 {
                        continue;
                    }
                    let pos = row_base + cx[ix - x_lo];
                    if pos.distance_squared(center) >= r2 {
                        continue;
                    }
                    let w = f64::from(v);
                    total += w;
                    moments[0] += w * (ix as f64 + 0.5);
                    moments[1] += w * (iy as f64 + 0.5);
                    moments[2] += w * (iz as f64 + 0.5);
                }
            }
        }

        if total == 0.0 || !total.is_finite() {
            return None;
        }
        Some(
            self.edges
                .iter()
                .zip(moments)
                .map(|(edge, m)| edge.vec(m / total))
                .sum::<DVec3>(),
        )
    }

    /// Location of the per-axis maxima of the marginal sums around `center`.
    ///
    /// Inside the bounding window of the sphere, the bins are summed over the other
    /// two axes to get one 1D profile per axis; each axis picks its largest entry,
    /// ties going to the bin nearest `center`. This is a per-axis optimum, not the
    /// joint maximum cell. `None` if `center` is outside.
    pub fn max_point(&self, center: DVec3, radius: f64) -> Option<DVec3> {
        let center_index = index3(&self.duals, center)?;
        let window = self.index_window(center, radius, None)?;
        let [(x_lo, x_hi), (y_lo, y_hi), (z_lo, z_hi)] = window;

        let mut marginals = [
            vec![0.0f64; x_hi - x_lo + 1],
            vec![0.0f64; y_hi - y_lo + 1],
            vec![0.0f64; z_hi - z_lo + 1],
        ];
        for iz in z_lo..=z_hi {
            for iy in y_lo..=y_hi {
                for ix in x_lo..=x_hi {
                    let v = f64::from(self.grid.get(ix, iy, iz));
                    marginals[0][ix - x_lo] += v;
                    marginals[1][iy - y_lo] += v;
                    marginals[2][iz - z_lo] += v;
                }
            }
        }

        let mut best = [0usize; 3];
        for k in 0..3 {
            best[k] = argmax_nearest(&marginals[k], window[k].0, center_index[k]);
        }
        Some(self.bin_location(best[0], best[1], best[2]))
    }

    /// Sums of bin values within each of `radii` around `center`, in one pass.
    ///
    /// A bin counts for radius `r` when the distance from its real-space center to
    /// `center` is less than `r`. `None` if `center` is outside.
    pub fn sphere_integrals(&self, center: DVec3, radii: &[f64]) -> Option<SphereIntegrals> {
        let max_radius = radii.iter().copied().fold(0.0, f64::max);
        let window = self.index_window(center, max_radius, None)?;
        let [cx, cy, cz] = self.window_centers(&window);
        let [(x_lo, x_hi), (y_lo, y_hi), (z_lo, z_hi)] = window;

        let mut out = SphereIntegrals {
            totals: vec![0.0; radii.len()],
            counts: vec![0; radii.len()],
        };
        for iz in z_lo..=z_hi {
            for iy in y_lo..=y_hi {
                let row_base = cz[iz - z_lo] + cy[iy - y_lo];
                for ix in x_lo..=x_hi {
                    let dist = (row_base + cx[ix - x_lo]).distance(center);
                    let v = f64::from(self.grid.get(ix, iy, iz));
                    for (j, &r) in radii.iter().enumerate() {
                        if r > dist {
                            out.totals[j] += v;
                            out.counts[j] += 1;
                        }
                    }
                }
            }
        }
        Some(out)
    }
}

/// Absolute index of the largest entry of `profile` (which starts at `offset`),
/// ties resolved toward `center`.
fn argmax_nearest(profile: &[f64], offset: usize, center: usize) -> usize {
    let mut best = offset;
    let mut best_val = f64::NEG_INFINITY;
    for (i, &v) in profile.iter().enumerate() {
        let idx = offset + i;
        if v > best_val || (v == best_val && idx.abs_diff(center) < best.abs_diff(center)) {
            best = idx;
            best_val = v;
        }
    }
    best
}
