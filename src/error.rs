//! Error types for histogram construction and parallel dispatch.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while building or filling a histogram.
#[derive(Debug, Clone, Error)]
pub enum HistogramError {
    /// An interval binner was given an empty, inverted or non-finite range.
    #[error("invalid binner: {0}")]
    InvalidBinner(String),

    /// A projection direction was zero-length or not finite.
    #[error("invalid direction [{x}, {y}, {z}]: must be finite and non-zero")]
    InvalidDirection { x: f64, y: f64, z: f64 },

    /// The three edge directions are (nearly) coplanar, so no dual basis exists.
    #[error("degenerate edge basis: triple product {triple_product:e} is too close to zero")]
    DegenerateBasis { triple_product: f64 },

    /// The runner configuration cannot be used.
    #[error("invalid runner config: {0}")]
    InvalidConfig(String),

    /// A parallel dispatch did not finish within its deadline.
    #[error("{operation} did not finish within {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// A segment job panicked.
    ///
    /// The histogram contents are unspecified after this; clear or rescan before reuse.
    #[error("{operation} job failed: {message}")]
    JobFailed {
        operation: &'static str,
        message: String,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HistogramError>;
