//! Injectable time source
//!
//! Every primitive computes TTL expiry against a [`Clock`] supplied at
//! construction instead of calling `Instant::now()` directly. Production
//! code uses [`SystemClock`]; tests use [`ManualClock`] and advance it
//! explicitly, so expiry races are reproduced deterministically without
//! sleeping.

use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, Instant};

/// A source of "now" for TTL arithmetic
///
/// Implementations must be cheap to call; primitives read the clock on
/// every operation while holding their internal mutex.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant according to this clock
    fn now(&self) -> Instant;
}

/// Wall-progress clock backed by `Instant::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic tests
///
/// Starts at the instant it was constructed and only moves when
/// [`advance`](ManualClock::advance) is called.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        *self.offset.lock() += delta;
    }

    /// Duration this clock has been advanced since construction
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
