//! Monotonic time source
//!
//! Debounce windows and polling periods are measured against an injected
//! clock so the filters can be driven deterministically from tests.

use core::time::Duration;

/// Monotonic clock
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin
    ///
    /// Successive calls never go backwards.
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Clock backed by `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Create a clock whose origin is the current instant
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}
