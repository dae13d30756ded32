//! Simulated Clock
//!
//! The engine never reads the system time. All instants are milliseconds
//! since session start, advanced explicitly by whoever drives the session
//! (the async runtime in production, the test directly otherwise).

use serde::{Serialize, Deserialize};

/// Milliseconds since session start.
pub type Millis = u64;

/// Milliseconds per second.
pub const MILLIS_PER_SEC: Millis = 1000;

/// Convert whole seconds to milliseconds.
#[inline]
pub const fn secs(s: u64) -> Millis {
    s * MILLIS_PER_SEC
}

/// Elapsed seconds between two instants, as a float.
///
/// Returns 0.0 if `now` is before `since`.
#[inline]
pub fn elapsed_secs(since: Millis, now: Millis) -> f64 {
    now.saturating_sub(since) as f64 / MILLIS_PER_SEC as f64
}

/// Monotonic simulated clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    now: Millis,
}

impl SimClock {
    /// Clock at session start.
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Current instant.
    #[inline]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move the clock to `instant`. Never moves backwards.
    #[inline]
    pub fn set(&mut self, instant: Millis) {
        self.now = self.now.max(instant);
    }

    /// Advance by `delta` milliseconds.
    #[cfg(test)]
    pub fn advance(&mut self, delta: Millis) {
        self.now = self.now.saturating_add(delta);
    }
}
