//! Core event types consumed and produced by the histogram.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;

/// A weighted sample point in reciprocal space.
///
/// This type provides a small `#[repr(C)]` representation with a stable layout so
/// loaders can hand over raw buffers without copying field by field.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Event {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub weight: f64,
}

impl Event {
    /// Create a new event.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64, weight: f64) -> Self {
        Self { x, y, z, weight }
    }

    /// Create an event at `position`.
    #[inline]
    pub fn at(position: DVec3, weight: f64) -> Self {
        Self::new(position.x, position.y, position.z, weight)
    }

    /// Create from any type implementing `EventLike`.
    #[inline]
    pub fn from_like<E: EventLike>(e: &E) -> Self {
        Self::new(e.x(), e.y(), e.z(), e.weight())
    }

    /// The event's position as a vector.
    #[inline]
    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl From<[f64; 4]> for Event {
    #[inline]
    fn from([x, y, z, weight]: [f64; 4]) -> Self {
        Self::new(x, y, z, weight)
    }
}

impl From<Event> for [f64; 4] {
    #[inline]
    fn from(e: Event) -> Self {
        [e.x, e.y, e.z, e.weight]
    }
}

/// Trait for types that can be accumulated as events.
///
/// This allows zero-copy input from whatever record type a loader produces.
pub trait EventLike {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn z(&self) -> f64;
    fn weight(&self) -> f64;

    #[inline]
    fn position(&self) -> DVec3 {
        DVec3::new(self.x(), self.y(), self.z())
    }
}

impl EventLike for Event {
    #[inline]
    fn x(&self) -> f64 {
        self.x
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y
    }
    #[inline]
    fn z(&self) -> f64 {
        self.z
    }
    #[inline]
    fn weight(&self) -> f64 {
        self.weight
    }
}

impl EventLike for [f64; 4] {
    #[inline]
    fn x(&self) -> f64 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f64 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f64 {
        self[2]
    }
    #[inline]
    fn weight(&self) -> f64 {
        self[3]
    }
}

impl EventLike for (f64, f64, f64, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0
    }
    #[inline]
    fn y(&self) -> f64 {
        self.1
    }
    #[inline]
    fn z(&self) -> f64 {
        self.2
    }
    #[inline]
    fn weight(&self) -> f64 {
        self.3
    }
}

impl EventLike for (DVec3, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0.x
    }
    #[inline]
    fn y(&self) -> f64 {
        self.0.y
    }
    #[inline]
    fn z(&self) -> f64 {
        self.0.z
    }
    #[inline]
    fn weight(&self) -> f64 {
        self.1
    }
    #[inline]
    fn position(&self) -> DVec3 {
        self.0
    }
}

/// A synthetic event emitted by `bucketize`: one histogram cell re-expressed as a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEvent {
    /// Real-space center of the cell.
    pub position: DVec3,
    /// Cell value.
    pub value: f32,
    /// Intensity bucket the value fell into.
    pub bucket: usize,
}
