//! Cross-thread handle: concurrent queries, one bulk mutation at a time.

use std::sync::Arc;

use glam::DVec3;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Histogram3D;
use crate::binner::BinnerSet;
use crate::error::Result;
use crate::types::EventLike;

/// A `Histogram3D` behind a reader/writer lock.
///
/// Bulk operations (`accumulate`, `clear`, `scan_histogram`, `set_position`) take
/// the write lock, so only one is in flight per histogram and no reader ever sees
/// a partially updated array. Queries take the read lock and run concurrently.
#[derive(Debug, Clone)]
pub struct SharedHistogram {
    inner: Arc<RwLock<Histogram3D>>,
}

impl SharedHistogram {
    pub fn new(histogram: Histogram3D) -> Self {
        Self {
            inner: Arc::new(RwLock::new(histogram)),
        }
    }

    /// Read access for any query.
    pub fn read(&self) -> RwLockReadGuard<'_, Histogram3D> {
        self.inner.read()
    }

    /// Exclusive access for bulk operations not wrapped below.
    pub fn write(&self) -> RwLockWriteGuard<'_, Histogram3D> {
        self.inner.write()
    }

    pub fn accumulate<E>(&self, events: &[E], use_weights: bool) -> Result<f64>
    where
        E: EventLike + Sync,
    {
        self.inner.write().accumulate(events, use_weights)
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.write().clear()
    }

    pub fn scan_histogram(&self) -> Result<()> {
        self.inner.write().scan_histogram()
    }

    pub fn set_position(&self, edges: BinnerSet) -> Result<()> {
        self.inner.write().set_position(edges)
    }

    pub fn value_at(&self, p: DVec3) -> f32 {
        self.inner.read().value_at(p)
    }

    /// Take the histogram back if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<Histogram3D, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}
