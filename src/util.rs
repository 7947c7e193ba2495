//! Timing helpers for bulk operations.
//!
//! With the `timing` feature, `Timed` logs the elapsed time of a scope when dropped.
//! Without it the timer is zero-sized and compiles away.

#[cfg(feature = "timing")]
use std::time::Instant;

/// RAII timer that logs elapsed time on drop.
///
/// # Example
/// ```ignore
/// let _t = Timed::debug("accumulate");
/// // ... do work ...
/// // logs "accumulate: 1.234ms" when _t is dropped
/// ```
#[cfg(feature = "timing")]
pub(crate) struct Timed {
    name: &'static str,
    start: Instant,
    level: log::Level,
}

#[cfg(feature = "timing")]
impl Timed {
    /// Create a new timer that logs at DEBUG level.
    pub(crate) fn debug(name: &'static str) -> Self {
        log::trace!("{}...", name);
        Self {
            name,
            start: Instant::now(),
            level: log::Level::Debug,
        }
    }
}

#[cfg(feature = "timing")]
impl Drop for Timed {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        log::log!(self.level, "{}: {:.3?}", self.name, elapsed);
    }
}

/// Dummy timer when `timing` is disabled (zero-sized).
#[cfg(not(feature = "timing"))]
pub(crate) struct Timed;

#[cfg(not(feature = "timing"))]
impl Timed {
    #[inline(always)]
    pub(crate) fn debug(_name: &'static str) -> Self {
        Self
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
