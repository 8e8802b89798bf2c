//! In-memory atomic counter with optional TTL refresh
//!
//! All read-modify-write cycles run under one mutex, so increments from
//! arbitrarily many threads sum exactly. `set` is an unconditional
//! overwrite: racing it against concurrent increments is last-writer-wins
//! by contract.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_core::{Clock, CounterBackend, SystemClock};

#[derive(Debug)]
struct CounterRecord {
    value: i64,
    expires_at: Option<Instant>,
}

/// Thread-safe named counters, a local stand-in for a distributed counter
/// service (rate limits, idempotency counts)
#[derive(Debug)]
pub struct MemoryCounter {
    clock: Arc<dyn Clock>,
    counters: Mutex<HashMap<String, CounterRecord>>,
}

impl MemoryCounter {
    /// Create a counter store reading time from the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a counter store with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Add `amount` to `name` and return the new value
    ///
    /// An absent or expired counter starts from zero. `ttl` of `Some(_)`
    /// resets the expiry to now + ttl; `None` preserves whatever expiry the
    /// record already had.
    pub fn increment(&self, name: &str, amount: i64, ttl: Option<Duration>) -> i64 {
        let mut counters = self.counters.lock();
        let now = self.clock.now();
        Self::expire_if_due(&mut counters, name, now);

        let record = counters
            .entry(name.to_string())
            .or_insert_with(|| CounterRecord {
                value: 0,
                expires_at: None,
            });
        record.value += amount;
        if let Some(ttl) = ttl {
            record.expires_at = Some(now + ttl);
        }
        record.value
    }

    /// Subtract `amount` from `name` and return the new value
    pub fn decrement(&self, name: &str, amount: i64, ttl: Option<Duration>) -> i64 {
        self.increment(name, -amount, ttl)
    }

    /// Current value, `None` if the counter is absent or expired
    pub fn get(&self, name: &str) -> Option<i64> {
        let mut counters = self.counters.lock();
        let now = self.clock.now();
        Self::expire_if_due(&mut counters, name, now);
        counters.get(name).map(|r| r.value)
    }

    /// Unconditionally overwrite `name` (last-writer-wins)
    ///
    /// `ttl` of `None` stores the value without expiry, regardless of any
    /// expiry the previous record carried.
    pub fn set(&self, name: &str, value: i64, ttl: Option<Duration>) {
        let mut counters = self.counters.lock();
        let now = self.clock.now();
        counters.insert(
            name.to_string(),
            CounterRecord {
                value,
                expires_at: ttl.map(|t| now + t),
            },
        );
    }

    /// Remove `name`, returning whether a live entry existed
    pub fn delete(&self, name: &str) -> bool {
        let mut counters = self.counters.lock();
        let now = self.clock.now();
        Self::expire_if_due(&mut counters, name, now);
        counters.remove(name).is_some()
    }

    fn expire_if_due(counters: &mut HashMap<String, CounterRecord>, name: &str, now: Instant) {
        if counters
            .get(name)
            .and_then(|r| r.expires_at)
            .is_some_and(|at| at <= now)
        {
            counters.remove(name);
        }
    }
}

impl Default for MemoryCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterBackend for MemoryCounter {
    fn increment(&self, name: &str, amount: i64, ttl: Option<Duration>) -> i64 {
        MemoryCounter::increment(self, name, amount, ttl)
    }

    fn get(&self, name: &str) -> Option<i64> {
        MemoryCounter::get(self, name)
    }

    fn set(&self, name: &str, value: i64, ttl: Option<Duration>) {
        MemoryCounter::set(self, name, value, ttl)
    }

    fn delete(&self, name: &str) -> bool {
        MemoryCounter::delete(self, name)
    }
}
