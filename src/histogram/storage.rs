//! Contiguous page-major cell storage.

use crate::error::{HistogramError, Result};

/// Dense `[page][row][col]` array of cells in one allocation.
///
/// `dims` is `[nx, ny, nz]` (columns, rows, pages); cell `(ix, iy, iz)` lives at
/// `(iz * ny + iy) * nx + ix`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Grid {
    data: Vec<f32>,
    dims: [usize; 3],
}

impl Grid {
    pub(crate) fn new(dims: [usize; 3]) -> Result<Self> {
        let len = Self::checked_len(dims)?;
        Ok(Self {
            data: vec![0.0; len],
            dims,
        })
    }

    fn checked_len(dims: [usize; 3]) -> Result<usize> {
        dims[0]
            .checked_mul(dims[1])
            .and_then(|n| n.checked_mul(dims[2]))
            .ok_or_else(|| {
                HistogramError::InvalidBinner(format!("histogram of {dims:?} cells is too large"))
            })
    }

    #[inline]
    pub(crate) fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Cells per page (`nx * ny`).
    #[inline]
    pub(crate) fn page_len(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    #[inline]
    pub(crate) fn num_pages(&self) -> usize {
        self.dims[2]
    }

    #[inline]
    pub(crate) fn offset(&self, ix: usize, iy: usize, iz: usize) -> usize {
        debug_assert!(
            ix < self.dims[0] && iy < self.dims[1] && iz < self.dims[2],
            "cell ({ix}, {iy}, {iz}) outside {:?}",
            self.dims
        );
        (iz * self.dims[1] + iy) * self.dims[0] + ix
    }

    #[inline]
    pub(crate) fn get(&self, ix: usize, iy: usize, iz: usize) -> f32 {
        self.data[self.offset(ix, iy, iz)]
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// All cells of page `iz`, row-major.
    pub(crate) fn page(&self, iz: usize) -> Option<&[f32]> {
        if iz >= self.dims[2] {
            return None;
        }
        let len = self.page_len();
        Some(&self.data[iz * len..(iz + 1) * len])
    }

    /// Copy of row `iy` across all pages, laid out `[page][col]`.
    pub(crate) fn row_slice(&self, iy: usize) -> Option<Vec<f32>> {
        let [nx, ny, nz] = self.dims;
        if iy >= ny {
            return None;
        }
        let mut out = Vec::with_capacity(nz * nx);
        for iz in 0..nz {
            let start = self.offset(0, iy, iz);
            out.extend_from_slice(&self.data[start..start + nx]);
        }
        Some(out)
    }

    /// Copy of column `ix` across all pages, laid out `[page][row]`.
    pub(crate) fn col_slice(&self, ix: usize) -> Option<Vec<f32>> {
        let [nx, ny, nz] = self.dims;
        if ix >= nx {
            return None;
        }
        let mut out = Vec::with_capacity(nz * ny);
        for iz in 0..nz {
            for iy in 0..ny {
                out.push(self.get(ix, iy, iz));
            }
        }
        Some(out)
    }
}
