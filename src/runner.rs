//! Fork-join dispatch of page-segment jobs on a bounded worker pool.
//!
//! Every bulk operation splits the outer (page) axis of the histogram into up to
//! `num_segments` contiguous ranges and runs one job per range. Jobs run on a
//! dedicated rayon pool, results come back in segment order, and the caller
//! reduces them. A dispatch either returns every job's result or an error: a
//! timeout or a panicking job fails the whole call.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::error::{HistogramError, Result};
use crate::util::{panic_message, Timed};

pub const DEFAULT_NUM_THREADS: usize = 4;
pub const DEFAULT_NUM_SEGMENTS: usize = 4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Worker threads in the pool.
    pub num_threads: usize,
    /// Upper bound on page segments per bulk operation (also capped by the page count).
    pub num_segments: usize,
    /// Overall deadline of one dispatch.
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            num_threads: DEFAULT_NUM_THREADS,
            num_segments: DEFAULT_NUM_SEGMENTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RunnerConfig {
    /// Defaults, overridden by `QSPACE_HIST_THREADS`, `QSPACE_HIST_SEGMENTS` and
    /// `QSPACE_HIST_TIMEOUT_SECS` when set. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        if let Some(v) = parse("QSPACE_HIST_THREADS") {
            self.num_threads = v as usize;
        }
        if let Some(v) = parse("QSPACE_HIST_SEGMENTS") {
            self.num_segments = v as usize;
        }
        if let Some(v) = parse("QSPACE_HIST_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(v);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(HistogramError::InvalidConfig(
                "num_threads must be at least 1".into(),
            ));
        }
        if self.num_segments == 0 {
            return Err(HistogramError::InvalidConfig(
                "num_segments must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(HistogramError::InvalidConfig(
                "timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Half-open range of pages `start..end` owned by one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn contains(&self, page: usize) -> bool {
        page >= self.start && page < self.end
    }
}

/// Shared deadline polled by running jobs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    operation: &'static str,
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    fn new(operation: &'static str, timeout: Duration) -> Self {
        Self {
            operation,
            // Saturate instead of overflowing on absurd timeouts.
            at: Instant::now()
                .checked_add(timeout)
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400 * 365)),
            timeout,
        }
    }

    /// `Err(Timeout)` once the deadline has passed.
    #[inline]
    pub(crate) fn check(&self) -> Result<()> {
        if Instant::now() > self.at {
            Err(HistogramError::Timeout {
                operation: self.operation,
                timeout: self.timeout,
            })
        } else {
            Ok(())
        }
    }
}

/// Bounded worker pool running page-segment jobs.
#[derive(Debug)]
pub struct JobRunner {
    pool: rayon::ThreadPool,
    config: RunnerConfig,
}

impl JobRunner {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("qspace-hist-{i}"))
            .build()
            .map_err(|e| HistogramError::ThreadPool(e.to_string()))?;
        Ok(Self { pool, config })
    }

    #[inline]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Contiguous, non-overlapping ranges covering `0..num_pages`.
    ///
    /// At most `num_segments` ranges, never more than `num_pages`; earlier ranges
    /// take the remainder pages.
    pub fn segments(&self, num_pages: usize) -> Vec<PageRange> {
        let n = self.config.num_segments.min(num_pages);
        if n == 0 {
            return Vec::new();
        }
        let base = num_pages / n;
        let extra = num_pages % n;
        let mut start = 0;
        (0..n)
            .map(|i| {
                let len = base + usize::from(i < extra);
                let range = PageRange {
                    start,
                    end: start + len,
                };
                start += len;
                range
            })
            .collect()
    }

    /// Run a read-only job per segment.
    pub(crate) fn run<R, F>(&self, operation: &'static str, num_pages: usize, job: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(PageRange, &Deadline) -> Result<R> + Sync,
    {
        let ranges = self.segments(num_pages);
        let deadline = Deadline::new(operation, self.config.timeout);
        log::debug!("{operation}: {} segments over {num_pages} pages", ranges.len());
        self.dispatch(operation, || {
            ranges
                .into_par_iter()
                .map(|range| job(range, &deadline))
                .collect()
        })
    }

    /// Run a job per segment, handing each the disjoint `&mut` slab of its pages.
    ///
    /// `data.len()` must equal `num_pages * page_len`.
    pub(crate) fn run_mut<R, F>(
        &self,
        operation: &'static str,
        data: &mut [f32],
        page_len: usize,
        num_pages: usize,
        job: F,
    ) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(PageRange, &mut [f32], &Deadline) -> Result<R> + Sync,
    {
        debug_assert_eq!(data.len(), num_pages * page_len, "slab size mismatch");
        let ranges = self.segments(num_pages);
        let deadline = Deadline::new(operation, self.config.timeout);
        log::debug!("{operation}: {} segments over {num_pages} pages", ranges.len());

        let mut slabs: Vec<(PageRange, &mut [f32])> = Vec::with_capacity(ranges.len());
        let mut rest = data;
        for range in ranges {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * page_len);
            slabs.push((range, head));
            rest = tail;
        }

        self.dispatch(operation, || {
            slabs
                .into_par_iter()
                .map(|(range, slab)| job(range, slab, &deadline))
                .collect()
        })
    }

    fn dispatch<R, F>(&self, operation: &'static str, f: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> Result<R> + Send,
    {
        let _t = Timed::debug(operation);
        match panic::catch_unwind(AssertUnwindSafe(|| self.pool.install(f))) {
            Ok(Ok(r)) => Ok(r),
            Ok(Err(e)) => {
                log::warn!("{operation} failed: {e}");
                Err(e)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("{operation} job panicked: {message}");
                Err(HistogramError::JobFailed { operation, message })
            }
        }
    }
}
