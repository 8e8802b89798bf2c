//! In-memory TTL key-value store with optional background sweeper
//!
//! # Design
//!
//! Expiry is lazy by default: `get`/`delete`/`contains` treat an entry past
//! its `expires_at` as absent and remove it on the spot. A store built with
//! a positive sweep interval additionally runs one background thread that
//! periodically removes every currently-expired entry. The sweeper takes
//! the same mutex as foreground operations, so a sweep can never interleave
//! with a `clear_all` and resurrect a just-deleted key. Stopping the
//! sweeper (explicitly or by dropping the store) reverts to fully-passive
//! expiry.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tether_core::{Clock, KvBackend, SystemClock};

#[derive(Debug)]
struct KvEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

#[derive(Debug)]
struct KvShared {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, KvEntry>>,
    /// Sweeper shutdown flag, paired with `stop_signal` for prompt wakeup
    stop: Mutex<bool>,
    stop_signal: Condvar,
}

impl KvShared {
    fn expire_if_due(&self, entries: &mut HashMap<String, KvEntry>, key: &str, now: Instant) {
        if entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now)
        {
            entries.remove(key);
        }
    }

    /// Remove every currently-expired entry, returning how many went
    fn sweep(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at.map_or(true, |at| at > now));
        before - entries.len()
    }
}

/// Thread-safe TTL key-value store for ephemeral shared state
///
/// Local stand-in sharing the external contract of a distributed KV
/// backend; values are opaque bytes.
#[derive(Debug)]
pub struct MemoryKv {
    shared: Arc<KvShared>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryKv {
    /// Create a passive-expiry store reading time from the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a passive-expiry store with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(KvShared {
                clock,
                entries: Mutex::new(HashMap::new()),
                stop: Mutex::new(false),
                stop_signal: Condvar::new(),
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a store that proactively sweeps expired entries every
    /// `interval`
    ///
    /// A zero interval starts no sweeper; the store stays fully passive.
    pub fn with_sweep_interval(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        let store = Self::with_clock(clock);
        if interval > Duration::ZERO {
            let shared = Arc::clone(&store.shared);
            let handle = std::thread::spawn(move || {
                let mut stop = shared.stop.lock();
                loop {
                    let timed_out = shared
                        .stop_signal
                        .wait_for(&mut stop, interval)
                        .timed_out();
                    if *stop {
                        break;
                    }
                    if timed_out {
                        // Sweep without holding the stop flag lock.
                        drop(stop);
                        let removed = shared.sweep();
                        if removed > 0 {
                            tracing::debug!(
                                target: "tether::kv",
                                removed,
                                "sweeper removed expired entries"
                            );
                        }
                        stop = shared.stop.lock();
                        if *stop {
                            break;
                        }
                    }
                }
            });
            *store.sweeper.lock() = Some(handle);
        }
        store
    }

    /// Value for `key`, `None` if absent or expired
    ///
    /// An expired entry is removed during the read.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        self.shared.expire_if_due(&mut entries, key, now);
        entries.get(key).map(|e| e.value.clone())
    }

    /// Insert or overwrite `key`; `ttl` of `Some(t)` expires it at now + t
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        entries.insert(
            key.to_string(),
            KvEntry {
                value,
                expires_at: ttl.map(|t| now + t),
            },
        );
    }

    /// Remove `key`, returning whether a live entry existed
    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        self.shared.expire_if_due(&mut entries, key, now);
        entries.remove(key).is_some()
    }

    /// Remove every entry
    pub fn clear_all(&self) {
        self.shared.entries.lock().clear();
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        self.shared.expire_if_due(&mut entries, key, now);
        entries.contains_key(key)
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        entries
            .values()
            .filter(|e| e.expires_at.map_or(true, |at| at > now))
            .count()
    }

    /// Whether no live entries exist
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one sweep immediately, returning how many entries were removed
    pub fn sweep_now(&self) -> usize {
        self.shared.sweep()
    }

    /// Whether the background sweeper is currently running
    pub fn sweeper_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Stop the background sweeper; no further sweeps occur afterwards
    ///
    /// Idempotent. The store reverts to fully-passive expiry.
    pub fn stop_sweeper(&self) {
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            *self.shared.stop.lock() = true;
            self.shared.stop_signal.notify_all();
            let _ = handle.join();
            tracing::debug!(target: "tether::kv", "sweeper stopped");
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryKv {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        MemoryKv::get(self, key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        MemoryKv::set(self, key, value, ttl)
    }

    fn delete(&self, key: &str) -> bool {
        MemoryKv::delete(self, key)
    }

    fn clear_all(&self) {
        MemoryKv::clear_all(self)
    }

    fn contains(&self, key: &str) -> bool {
        MemoryKv::contains(self, key)
    }

    fn len(&self) -> usize {
        MemoryKv::len(self)
    }
}
