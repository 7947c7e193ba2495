//! Reciprocal ("dual") basis for skewed edge binners.
//!
//! Edge binners describe parallelepiped bins: a point `p = Σ t_k e_k` lies in bin
//! `(i0, i1, i2)` when each coordinate `t_k` falls in bin `i_k` of edge `k`. When the
//! edge directions are not orthogonal, `p · e_k != t_k`, so the edges cannot index
//! points directly. The reciprocal vectors `r_k = (e_{k+1} × e_{k+2}) / (e_0 · e_1 × e_2)`
//! satisfy `r_k · e_j = δ_kj`, hence `t_k = p · r_k`. A dual binner stores the unit
//! direction `r_k / |r_k|` and the edge interval scaled by `1 / |r_k|`, which yields
//! the same index as binning `t_k` on the edge interval.

use glam::DVec3;

use super::ProjectionBinner;
use crate::error::{HistogramError, Result};

/// Smallest `|e_0 · (e_1 × e_2)|` of unit edge directions accepted as a basis.
pub const DEGENERATE_TRIPLE_PRODUCT: f64 = 1e-6;

/// Three binners, one per axis, in `x, y, z` (column, row, page) order.
pub type BinnerSet = [ProjectionBinner; 3];

/// Derive the dual binners of `edges`.
///
/// Fails with `DegenerateBasis` when the edge directions are (nearly) coplanar.
pub fn dual_binners(edges: &BinnerSet) -> Result<BinnerSet> {
    let reciprocal = reciprocal_basis([
        edges[0].direction(),
        edges[1].direction(),
        edges[2].direction(),
    ])?;

    let dual = |k: usize| -> Result<ProjectionBinner> {
        let r = reciprocal[k];
        let len = r.length();
        ProjectionBinner::new(r, edges[k].interval().scaled(1.0 / len)?)
    };
    Ok([dual(0)?, dual(1)?, dual(2)?])
}

/// Reciprocal vectors `r_k` with `r_k · e_j = δ_kj`.
pub fn reciprocal_basis(e: [DVec3; 3]) -> Result<[DVec3; 3]> {
    let triple = e[0].dot(e[1].cross(e[2]));
    if !triple.is_finite() || triple.abs() < DEGENERATE_TRIPLE_PRODUCT {
        log::warn!("rejecting degenerate edge basis, triple product {triple:e}");
        return Err(HistogramError::DegenerateBasis {
            triple_product: triple,
        });
    }
    Ok([
        e[1].cross(e[2]) / triple,
        e[2].cross(e[0]) / triple,
        e[0].cross(e[1]) / triple,
    ])
}

/// Index of `p` on every binner, or `None` if any axis is out of range.
#[inline]
pub fn index3(binners: &BinnerSet, p: DVec3) -> Option<[usize; 3]> {
    let mut out = [0usize; 3];
    for (slot, b) in out.iter_mut().zip(binners) {
        let i = b.index(p);
        if i < 0 || i >= b.num_bins() as isize {
            return None;
        }
        *slot = i as usize;
    }
    Some(out)
}
