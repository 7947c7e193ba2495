//! Per-segment units of work dispatched by the `JobRunner`.
//!
//! Each job sees only its own page range. Mutating jobs receive the `&mut` slab of
//! those pages, so segments never alias and no locking is needed inside one dispatch.

use glam::DVec3;

use crate::binner::{BinnerSet, IntervalBinner};
use crate::error::Result;
use crate::runner::{Deadline, PageRange};
use crate::types::{BinEvent, EventLike};

/// Events scanned between deadline polls.
const EVENTS_PER_DEADLINE_POLL: usize = 1 << 14;

/// Partial aggregates of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentStats {
    pub(crate) sum: f64,
    pub(crate) min: f64,
    pub(crate) max: f64,
}

impl SegmentStats {
    pub(crate) const EMPTY: Self = Self {
        sum: 0.0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    #[inline(always)]
    fn observe(&mut self, v: f32) {
        let v = f64::from(v);
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Sparse re-expression of one segment: one event list per intensity bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedSegment {
    /// Pages this segment covered.
    pub pages: PageRange,
    /// `level.num_bins() + 1` lists; the last holds values at or above the top edge.
    pub buckets: Vec<Vec<BinEvent>>,
}

impl BucketedSegment {
    /// Total number of emitted events over all buckets.
    pub fn num_events(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

pub(crate) fn clear_segment(slab: &mut [f32], page_len: usize, deadline: &Deadline) -> Result<()> {
    for page in slab.chunks_mut(page_len.max(1)) {
        deadline.check()?;
        page.fill(0.0);
    }
    Ok(())
}

/// Add every event whose page index lies in `range` to `slab`.
///
/// Every segment scans the full batch; events outside its pages are skipped.
/// The returned sum is the net change of the cells, after f32 rounding.
/// Min/max cover only the cells this call touched.
pub(crate) fn accumulate_segment<E: EventLike>(
    range: PageRange,
    slab: &mut [f32],
    dims: [usize; 3],
    duals: &BinnerSet,
    events: &[E],
    use_weights: bool,
    deadline: &Deadline,
) -> Result<SegmentStats> {
    let [nx, ny, _] = dims;
    let (page_lo, page_hi) = (range.start as isize, range.end as isize);
    let mut stats = SegmentStats::EMPTY;

    for (n, event) in events.iter().enumerate() {
        if n % EVENTS_PER_DEADLINE_POLL == 0 {
            deadline.check()?;
        }
        let p = event.position();

        // Page first: most events belong to another segment.
        let iz = duals[2].index(p);
        if iz < page_lo || iz >= page_hi {
            continue;
        }
        let iy = duals[1].index(p);
        if iy < 0 || iy >= ny as isize {
            continue;
        }
        let ix = duals[0].index(p);
        if ix < 0 || ix >= nx as isize {
            continue;
        }

        let w = if use_weights { event.weight() } else { 1.0 };
        let cell = (((iz - page_lo) as usize) * ny + iy as usize) * nx + ix as usize;
        let old = slab[cell];
        slab[cell] += w as f32;
        // Track what the f32 cell actually gained so `sum` stays equal to the cells.
        stats.sum += f64::from(slab[cell]) - f64::from(old);
        stats.observe(slab[cell]);
    }
    Ok(stats)
}

/// Sum, min and max over every cell of `range`.
pub(crate) fn scan_segment(
    range: PageRange,
    data: &[f32],
    page_len: usize,
    deadline: &Deadline,
) -> Result<SegmentStats> {
    let mut stats = SegmentStats::EMPTY;
    for page in range.start..range.end {
        deadline.check()?;
        for &v in &data[page * page_len..(page + 1) * page_len] {
            stats.sum += f64::from(v);
            stats.observe(v);
        }
    }
    Ok(stats)
}

/// Real-space bin centers per axis, so a cell center is `x[ix] + y[iy] + z[iz]`.
pub(crate) fn axis_centers(edges: &BinnerSet) -> [Vec<DVec3>; 3] {
    [0, 1, 2].map(|k| (0..edges[k].num_bins()).map(|i| edges[k].center_vec(i)).collect())
}

/// Classify every cell of `range` by `level` and emit it at its bin center.
///
/// Cells below `level.min()` and NaN cells are not emitted.
pub(crate) fn bucketize_segment(
    range: PageRange,
    data: &[f32],
    dims: [usize; 3],
    centers: &[Vec<DVec3>; 3],
    level: &IntervalBinner,
    deadline: &Deadline,
) -> Result<BucketedSegment> {
    let [nx, ny, _] = dims;
    let top = level.num_bins();
    let mut buckets: Vec<Vec<BinEvent>> = vec![Vec::new(); top + 1];

    for iz in range.start..range.end {
        deadline.check()?;
        for iy in 0..ny {
            let row_base = centers[2][iz] + centers[1][iy];
            let row = &data[(iz * ny + iy) * nx..(iz * ny + iy + 1) * nx];
            for (ix, &value) in row.iter().enumerate() {
                if value.is_nan() {
                    continue;
                }
                let b = level.index(f64::from(value));
                if b < 0 {
                    continue;
                }
                let bucket = (b as usize).min(top);
                buckets[bucket].push(BinEvent {
                    position: row_base + centers[0][ix],
                    value,
                    bucket,
                });
            }
        }
    }

    Ok(BucketedSegment {
        pages: range,
        buckets,
    })
}
