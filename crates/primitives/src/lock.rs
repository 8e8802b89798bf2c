//! In-memory token-gated lock with TTL auto-release
//!
//! # Design
//!
//! One mutex guards a `name → LockRecord` map. Acquisition is a bounded
//! busy-poll: attempt under the mutex, and if the key is held, drop the
//! mutex and sleep a fixed short interval before retrying, until the
//! caller's deadline passes. This is the documented baseline contract of
//! the primitive; callers bound their own wait through `timeout`.
//!
//! Expiry is lazy. A record past its `expires_at` is removed by whichever
//! operation observes it first, so at most one valid record exists per key
//! at any instant. An expired token proves nothing: `release` and `renew`
//! on an expired record return false, since the TTL may already have handed
//! the key to a new holder.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_core::{Clock, LockBackend, LockToken, SystemClock};
use uuid::Uuid;

/// Sleep between acquisition attempts while a key stays held
const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug)]
struct LockRecord {
    token: LockToken,
    expires_at: Instant,
}

/// Thread-safe local stand-in for a distributed mutex lock
///
/// Acquisition mints an opaque random token; release and renewal require
/// it. Every lock carries a TTL so a holder that never releases cannot
/// wedge the key forever.
#[derive(Debug)]
pub struct MemoryLock {
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    locks: Mutex<HashMap<String, LockRecord>>,
}

impl MemoryLock {
    /// Create a lock store reading time from the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a lock store with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            poll_interval: ACQUIRE_POLL_INTERVAL,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Override the retry sleep used while waiting for a held key
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Single acquisition attempt under the mutex
    fn try_acquire(&self, key: &str, ttl: Duration) -> Option<LockToken> {
        let mut locks = self.locks.lock();
        let now = self.clock.now();

        if let Some(record) = locks.get(key) {
            if record.expires_at > now {
                return None;
            }
            tracing::debug!(target: "tether::lock", key, "expired lock reclaimed");
            locks.remove(key);
        }

        let token = LockToken::new(Uuid::new_v4().to_string());
        locks.insert(
            key.to_string(),
            LockRecord {
                token: token.clone(),
                expires_at: now + ttl,
            },
        );
        Some(token)
    }

    /// Try to take `key`, waiting up to `timeout`
    ///
    /// `timeout` of zero is a single non-blocking attempt. Returns `None`
    /// once the deadline passes with the key still held; a timeout is an
    /// expected race, not an error.
    pub fn acquire(&self, key: &str, ttl: Duration, timeout: Duration) -> Option<LockToken> {
        let deadline = self.clock.now() + timeout;
        loop {
            if let Some(token) = self.try_acquire(key, ttl) {
                return Some(token);
            }
            if self.clock.now() >= deadline {
                tracing::debug!(
                    target: "tether::lock",
                    key,
                    timeout_ms = timeout.as_millis() as u64,
                    "acquisition timed out"
                );
                return None;
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    /// Acquire `key` and wrap the token in a guard that releases on drop
    pub fn acquire_guard(
        &self,
        key: &str,
        ttl: Duration,
        timeout: Duration,
    ) -> Option<LockGuard<'_>> {
        let token = self.acquire(key, ttl, timeout)?;
        Some(LockGuard {
            lock: self,
            key: key.to_string(),
            token,
        })
    }

    /// Release `key` if `token` still owns a live record
    pub fn release(&self, key: &str, token: &LockToken) -> bool {
        let mut locks = self.locks.lock();
        let now = self.clock.now();

        match locks.get(key) {
            Some(record) if record.expires_at <= now => {
                // The TTL already freed this key; the token no longer
                // proves ownership even if it matches.
                locks.remove(key);
                false
            }
            Some(record) if record.token == *token => {
                locks.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Extend the expiry of `key` to now + `ttl` if `token` still owns it
    pub fn renew(&self, key: &str, token: &LockToken, ttl: Duration) -> bool {
        let mut locks = self.locks.lock();
        let now = self.clock.now();

        match locks.get_mut(key) {
            Some(record) if record.expires_at <= now => {
                locks.remove(key);
                false
            }
            Some(record) if record.token == *token => {
                record.expires_at = now + ttl;
                true
            }
            _ => false,
        }
    }

    /// Whether `key` is currently held by a live record
    pub fn is_held(&self, key: &str) -> bool {
        let locks = self.locks.lock();
        let now = self.clock.now();
        locks.get(key).is_some_and(|r| r.expires_at > now)
    }
}

impl Default for MemoryLock {
    fn default() -> Self {
        Self::new()
    }
}

impl LockBackend for MemoryLock {
    fn acquire(&self, key: &str, ttl: Duration, timeout: Duration) -> Option<LockToken> {
        MemoryLock::acquire(self, key, ttl, timeout)
    }

    fn release(&self, key: &str, token: &LockToken) -> bool {
        MemoryLock::release(self, key, token)
    }

    fn renew(&self, key: &str, token: &LockToken, ttl: Duration) -> bool {
        MemoryLock::renew(self, key, token, ttl)
    }
}

/// RAII ownership of one lock key; releases on drop
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a MemoryLock,
    key: String,
    token: LockToken,
}

impl LockGuard<'_> {
    /// The token this guard holds
    pub fn token(&self) -> &LockToken {
        &self.token
    }

    /// Extend the lock's TTL to now + `ttl`
    pub fn renew(&self, ttl: Duration) -> bool {
        self.lock.renew(&self.key, &self.token, ttl)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(&self.key, &self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{Error, LockBackendExt, ManualClock};

    const TTL: Duration = Duration::from_millis(1000);
    const NO_WAIT: Duration = Duration::ZERO;

    fn setup() -> (Arc<ManualClock>, MemoryLock) {
        let clock = Arc::new(ManualClock::new());
        let lock = MemoryLock::with_clock(clock.clone());
        (clock, lock)
    }

    #[test]
    fn test_acquire_free_key_succeeds_immediately() {
        let (_clock, lock) = setup();
        assert!(lock.acquire("r", TTL, NO_WAIT).is_some());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let (_clock, lock) = setup();
        let token = lock.acquire("r", TTL, NO_WAIT).unwrap();
        assert!(lock.acquire("r", TTL, NO_WAIT).is_none());

        assert!(lock.release("r", &token));
        let token2 = lock.acquire("r", TTL, NO_WAIT).unwrap();
        assert_ne!(token, token2);
    }

    #[test]
    fn test_release_wrong_token_keeps_holder() {
        let (_clock, lock) = setup();
        let _token = lock.acquire("r", TTL, NO_WAIT).unwrap();
        assert!(!lock.release("r", &LockToken::new("forged")));
        assert!(lock.acquire("r", TTL, NO_WAIT).is_none());
    }

    #[test]
    fn test_release_unheld_key_is_false() {
        let (_clock, lock) = setup();
        assert!(!lock.release("r", &LockToken::new("anything")));
    }

    #[test]
    fn test_ttl_expiry_frees_key() {
        let (clock, lock) = setup();
        let _token = lock.acquire("r", TTL, NO_WAIT).unwrap();
        clock.advance(TTL);
        assert!(lock.acquire("r", TTL, NO_WAIT).is_some());
    }

    #[test]
    fn test_release_after_expiry_is_false() {
        let (clock, lock) = setup();
        let token = lock.acquire("r", TTL, NO_WAIT).unwrap();
        clock.advance(TTL);
        // The TTL already freed the key; a stale releaser must not be able
        // to free whoever acquires next.
        assert!(!lock.release("r", &token));
        assert!(lock.acquire("r", TTL, NO_WAIT).is_some());
    }

    #[test]
    fn test_stale_token_cannot_release_new_holder() {
        let (clock, lock) = setup();
        let stale = lock.acquire("r", TTL, NO_WAIT).unwrap();
        clock.advance(TTL);
        let _fresh = lock.acquire("r", TTL, NO_WAIT).unwrap();
        assert!(!lock.release("r", &stale));
        assert!(lock.is_held("r"));
    }

    #[test]
    fn test_renew_extends_expiry() {
        let (clock, lock) = setup();
        let token = lock.acquire("r", TTL, NO_WAIT).unwrap();

        clock.advance(Duration::from_millis(900));
        assert!(lock.renew("r", &token, TTL));

        // Past the original expiry, still held thanks to the renewal.
        clock.advance(Duration::from_millis(500));
        assert!(lock.acquire("r", TTL, NO_WAIT).is_none());
    }

    #[test]
    fn test_renew_fails_on_expired_or_wrong_token() {
        let (clock, lock) = setup();
        let token = lock.acquire("r", TTL, NO_WAIT).unwrap();
        assert!(!lock.renew("r", &LockToken::new("forged"), TTL));

        clock.advance(TTL);
        assert!(!lock.renew("r", &token, TTL));
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let lock = Arc::new(MemoryLock::new().with_poll_interval(Duration::from_millis(1)));
        let token = lock.acquire("r", Duration::from_secs(10), NO_WAIT).unwrap();

        let waiter = {
            let lock = lock.clone();
            std::thread::spawn(move || lock.acquire("r", TTL, Duration::from_secs(5)))
        };

        std::thread::sleep(Duration::from_millis(20));
        assert!(lock.release("r", &token));
        let acquired = waiter.join().unwrap();
        assert!(acquired.is_some());
    }

    #[test]
    fn test_acquire_timeout_elapses() {
        let lock = MemoryLock::new().with_poll_interval(Duration::from_millis(1));
        let _token = lock.acquire("r", Duration::from_secs(10), NO_WAIT).unwrap();
        let start = Instant::now();
        assert!(lock.acquire("r", TTL, Duration::from_millis(30)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_mutual_exclusion_under_contention() {
        let lock = Arc::new(MemoryLock::new().with_poll_interval(Duration::from_millis(1)));
        let counter = Arc::new(Mutex::new(0u32));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let lock = lock.clone();
            let counter = counter.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    let token = lock
                        .acquire("shared", Duration::from_secs(10), Duration::from_secs(10))
                        .expect("acquire within generous timeout");
                    *counter.lock() += 1;
                    assert!(lock.release("shared", &token));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*counter.lock(), 8 * 50);
    }

    #[test]
    fn test_with_lock_releases_on_success() {
        let (_clock, lock) = setup();
        let out = lock.with_lock("r", TTL, NO_WAIT, || 41 + 1).unwrap();
        assert_eq!(out, 42);
        assert!(lock.acquire("r", TTL, NO_WAIT).is_some());
    }

    #[test]
    fn test_with_lock_timeout_is_error() {
        let (_clock, lock) = setup();
        let _token = lock.acquire("r", TTL, NO_WAIT).unwrap();
        let err = lock.with_lock("r", TTL, NO_WAIT, || ()).unwrap_err();
        assert!(matches!(err, Error::LockTimeout { .. }));
    }

    #[test]
    fn test_with_lock_releases_on_panic() {
        let (_clock, lock) = setup();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = lock.with_lock("r", TTL, NO_WAIT, || panic!("body failed"));
        }));
        assert!(result.is_err());
        assert!(lock.acquire("r", TTL, NO_WAIT).is_some());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let (_clock, lock) = setup();
        {
            let guard = lock.acquire_guard("r", TTL, NO_WAIT).unwrap();
            assert!(guard.renew(TTL));
            assert!(lock.acquire("r", TTL, NO_WAIT).is_none());
        }
        assert!(lock.acquire("r", TTL, NO_WAIT).is_some());
    }
}
