//! Dense 3D histogram over skewed projection bins.
//!
//! The container owns one contiguous `[page][row][col]` array of `f32` cells,
//! the three edge binners that define the bin shapes, and the dual binners used to
//! index points. Bulk operations (`clear`, `accumulate`, `scan_histogram`,
//! `bucketize`) split the page axis into segments and run them on the shared
//! `JobRunner`; queries (see `query.rs`) read the array directly.
//!
//! Mutating operations take `&mut self`, so within one thread a query can never
//! observe a half-finished accumulate. To share a histogram across threads use
//! [`SharedHistogram`].

mod jobs;
mod query;
mod shared;
mod storage;

pub use jobs::BucketedSegment;
pub use query::{IndexWindow, SphereIntegrals};
pub use shared::SharedHistogram;

use std::sync::Arc;

use crate::binner::{dual_binners, BinnerSet, IntervalBinner};
use crate::error::Result;
use crate::runner::{JobRunner, RunnerConfig};
use crate::types::EventLike;
use jobs::SegmentStats;
use storage::Grid;

/// Running aggregates of a histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    /// Smallest cell value seen (see `Histogram3D::accumulate` for staleness).
    pub min: f64,
    /// Largest cell value seen.
    pub max: f64,
    /// Sum of all cells.
    pub sum: f64,
    /// Events passed to `accumulate` since the last clear, in or out of range.
    pub num_added: u64,
}

impl HistogramStats {
    /// Aggregates of a freshly allocated histogram.
    pub const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        sum: 0.0,
        num_added: 0,
    };

    /// Aggregates right after `clear`.
    pub const CLEARED: Self = Self {
        min: 0.0,
        max: 0.0,
        sum: 0.0,
        num_added: 0,
    };
}

/// Dense 3D histogram of weighted events.
#[derive(Debug)]
pub struct Histogram3D {
    edges: BinnerSet,
    duals: BinnerSet,
    grid: Grid,
    stats: HistogramStats,
    runner: Arc<JobRunner>,
}

impl Histogram3D {
    /// Histogram over `edges` (x, y, z) with a default worker pool.
    pub fn new(edges: BinnerSet) -> Result<Self> {
        Self::with_config(edges, RunnerConfig::default())
    }

    /// Histogram over `edges` with its own worker pool built from `config`.
    pub fn with_config(edges: BinnerSet, config: RunnerConfig) -> Result<Self> {
        Self::with_runner(edges, Arc::new(JobRunner::new(config)?))
    }

    /// Histogram over `edges` sharing an existing worker pool.
    pub fn with_runner(edges: BinnerSet, runner: Arc<JobRunner>) -> Result<Self> {
        let duals = dual_binners(&edges)?;
        let grid = Grid::new(dims_of(&edges))?;
        log::debug!("allocated histogram {:?}", grid.dims());
        Ok(Self {
            edges,
            duals,
            grid,
            stats: HistogramStats::EMPTY,
            runner,
        })
    }

    /// Move the histogram onto new edge binners, discarding its contents.
    ///
    /// Storage is reused (and cleared) when the bin counts are unchanged, otherwise
    /// reallocated with fresh aggregates. On error the binners and aggregates are
    /// unchanged; if the clear itself failed the cells are unspecified, as after
    /// any failed bulk operation.
    pub fn set_position(&mut self, edges: BinnerSet) -> Result<()> {
        let duals = dual_binners(&edges)?;
        let dims = dims_of(&edges);
        if dims == self.grid.dims() {
            log::debug!("reusing histogram storage {dims:?}");
            self.clear()?;
            self.edges = edges;
            self.duals = duals;
            Ok(())
        } else {
            log::debug!("reallocating histogram {:?} -> {dims:?}", self.grid.dims());
            self.grid = Grid::new(dims)?;
            self.edges = edges;
            self.duals = duals;
            self.stats = HistogramStats::EMPTY;
            Ok(())
        }
    }

    /// Zero every cell and reset the aggregates.
    pub fn clear(&mut self) -> Result<()> {
        let page_len = self.grid.page_len();
        let num_pages = self.grid.num_pages();
        self.runner.run_mut(
            "clear",
            self.grid.as_mut_slice(),
            page_len,
            num_pages,
            |_, slab, deadline| jobs::clear_segment(slab, page_len, deadline),
        )?;
        self.stats = HistogramStats::CLEARED;
        Ok(())
    }

    /// Add `events` to the histogram and return the increase of `sum`.
    ///
    /// Each event adds its weight (or `1` when `use_weights` is false) to the bin
    /// containing it; events outside the histogram are dropped. Cells are `f32`, and
    /// `sum` follows the rounded cell values, so it always matches a rescan. `num_added` grows by
    /// `events.len()` regardless. `min`/`max` only take into account cells touched
    /// here; call `scan_histogram` for exact values. An empty batch is a no-op.
    pub fn accumulate<E>(&mut self, events: &[E], use_weights: bool) -> Result<f64>
    where
        E: EventLike + Sync,
    {
        if events.is_empty() {
            return Ok(0.0);
        }
        let dims = self.grid.dims();
        let page_len = self.grid.page_len();
        let duals = &self.duals;
        let partials = self.runner.run_mut(
            "accumulate",
            self.grid.as_mut_slice(),
            page_len,
            dims[2],
            |range, slab, deadline| {
                jobs::accumulate_segment(range, slab, dims, duals, events, use_weights, deadline)
            },
        )?;

        let merged = partials
            .into_iter()
            .fold(SegmentStats::EMPTY, SegmentStats::merge);
        self.stats.sum += merged.sum;
        self.stats.min = self.stats.min.min(merged.min);
        self.stats.max = self.stats.max.max(merged.max);
        self.stats.num_added += events.len() as u64;
        log::debug!(
            "accumulated {} events, added {}",
            events.len(),
            merged.sum
        );
        Ok(merged.sum)
    }

    /// Recompute `min`, `max` and `sum` from every cell. `num_added` is unchanged.
    pub fn scan_histogram(&mut self) -> Result<()> {
        let page_len = self.grid.page_len();
        let data = self.grid.as_slice();
        let partials = self
            .runner
            .run("scan", self.grid.num_pages(), |range, deadline| {
                jobs::scan_segment(range, data, page_len, deadline)
            })?;
        let merged = partials
            .into_iter()
            .fold(SegmentStats::EMPTY, SegmentStats::merge);
        self.stats.sum = merged.sum;
        self.stats.min = merged.min;
        self.stats.max = merged.max;
        Ok(())
    }

    /// Re-express the array as sparse point lists, bucketed by cell value.
    ///
    /// One `BucketedSegment` per page segment, in page order. Each holds
    /// `level.num_bins() + 1` buckets; cells below `level.min()` are skipped.
    pub fn bucketize(&self, level: &IntervalBinner) -> Result<Vec<BucketedSegment>> {
        let dims = self.grid.dims();
        let data = self.grid.as_slice();
        let centers = jobs::axis_centers(&self.edges);
        self.runner
            .run("bucketize", self.grid.num_pages(), |range, deadline| {
                jobs::bucketize_segment(range, data, dims, &centers, level, deadline)
            })
    }

    /// `[nx, ny, nz]`: bins along edge 0, 1 and 2.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.grid.dims()
    }

    #[inline]
    pub fn edge_binners(&self) -> &BinnerSet {
        &self.edges
    }

    #[inline]
    pub fn dual_binners(&self) -> &BinnerSet {
        &self.duals
    }

    #[inline]
    pub fn stats(&self) -> HistogramStats {
        self.stats
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.stats.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.stats.max
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.stats.sum
    }

    #[inline]
    pub fn num_added(&self) -> u64 {
        self.stats.num_added
    }

    #[inline]
    pub fn runner(&self) -> &Arc<JobRunner> {
        &self.runner
    }

    /// Value of cell `(ix, iy, iz)`, or `None` outside the array.
    pub fn cell(&self, ix: usize, iy: usize, iz: usize) -> Option<f32> {
        let [nx, ny, nz] = self.grid.dims();
        (ix < nx && iy < ny && iz < nz).then(|| self.grid.get(ix, iy, iz))
    }

    /// The whole array, `[page][row][col]`.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        self.grid.as_slice()
    }

    /// Page `iz` (`ny * nx` cells, row-major) without copying.
    #[inline]
    pub fn page(&self, iz: usize) -> Option<&[f32]> {
        self.grid.page(iz)
    }

    /// Copy of row `iy` across pages, laid out `[page][col]`.
    #[inline]
    pub fn row_slice(&self, iy: usize) -> Option<Vec<f32>> {
        self.grid.row_slice(iy)
    }

    /// Copy of column `ix` across pages, laid out `[page][row]`.
    #[inline]
    pub fn col_slice(&self, ix: usize) -> Option<Vec<f32>> {
        self.grid.col_slice(ix)
    }
}

fn dims_of(edges: &BinnerSet) -> [usize; 3] {
    [edges[0].num_bins(), edges[1].num_bins(), edges[2].num_bins()]
}
