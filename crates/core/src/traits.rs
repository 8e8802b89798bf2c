//! Backend traits for the four coordination primitives
//!
//! Application code programs against these seams; the registry resolves a
//! named adapter to an `Arc<dyn …Backend>` handle. The in-memory adapters in
//! `tether-primitives` are the stand-in implementations; alternative
//! backends plug in by implementing the same trait and registering a
//! factory.
//!
//! # Propagation policy
//!
//! Expected races are signalled in-band: `Option` for absence, `bool` for
//! token checks. None of these methods return `Result`; the only erroring
//! surface is [`LockBackendExt::with_lock`], which converts a failed
//! acquisition into [`Error::LockTimeout`].

use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

/// Opaque proof of lock ownership
///
/// Minted by [`LockBackend::acquire`]; required to release or renew.
/// Comparing tokens is the only supported operation besides display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Wrap an already-minted token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capacity-bounded key→value cache with LRU eviction and per-entry TTL
///
/// Entries are addressed by `(key, selector)`; a key typically identifies a
/// resource and selectors identify views of it, so invalidation can flush
/// one view or every view of a key at once. Values are opaque bytes —
/// serialization lives with the caller.
pub trait CacheBackend: Send + Sync + fmt::Debug {
    /// Look up `(key, selector)`, touching it as most recently used
    ///
    /// Returns `None` on a miss or when the entry's TTL has passed; an
    /// expired entry is removed at this point and counted as a miss.
    fn fetch(&self, key: &str, selector: &str) -> Option<Vec<u8>>;

    /// Insert or overwrite `(key, selector)`, touching it as most recently
    /// used; evicts the least-recently-used entry when over capacity
    ///
    /// `ttl` of `None` means the entry never expires.
    fn put(&self, key: &str, selector: &str, value: Vec<u8>, ttl: Option<Duration>);

    /// Remove one `(key, selector)` entry
    ///
    /// Returns whether a live (non-expired) entry was removed.
    fn remove(&self, key: &str, selector: &str) -> bool;

    /// Remove selectors under `key`, returning how many entries were removed
    ///
    /// A literal `"*"` anywhere in `selectors` removes every selector under
    /// the key.
    fn flush(&self, key: &str, selectors: &[&str]) -> usize;
}

/// Token-gated mutual-exclusion lock with TTL auto-release
///
/// The contract mirrors a distributed lock service: acquisition returns an
/// opaque token, the TTL bounds how long a crashed holder can wedge the
/// key, and release/renew require the token so strangers cannot free or
/// extend someone else's lock.
pub trait LockBackend: Send + Sync {
    /// Try to take `key`, waiting up to `timeout`
    ///
    /// Returns a fresh token on success, `None` if the key stayed held for
    /// the whole timeout. `timeout` of zero means a single non-blocking
    /// attempt. The lock auto-releases once `ttl` elapses.
    fn acquire(&self, key: &str, ttl: Duration, timeout: Duration) -> Option<LockToken>;

    /// Release `key` if `token` still owns it
    ///
    /// Returns `false` for a wrong token, an unheld key, or a record whose
    /// TTL has already passed (an expired token no longer proves anything).
    fn release(&self, key: &str, token: &LockToken) -> bool;

    /// Extend the TTL of `key` to `ttl` from now, if `token` still owns it
    fn renew(&self, key: &str, token: &LockToken, ttl: Duration) -> bool;
}

/// Scoped acquisition on top of any [`LockBackend`]
pub trait LockBackendExt: LockBackend {
    /// Run `body` while holding `key`, releasing on every exit path
    ///
    /// A failed acquisition becomes [`Error::LockTimeout`]; this is the one
    /// place an acquisition timeout surfaces as an error rather than a
    /// sentinel. The release also runs if `body` panics.
    fn with_lock<R>(
        &self,
        key: &str,
        ttl: Duration,
        timeout: Duration,
        body: impl FnOnce() -> R,
    ) -> Result<R> {
        let token = self
            .acquire(key, ttl, timeout)
            .ok_or_else(|| Error::LockTimeout {
                key: key.to_string(),
                waited_ms: timeout.as_millis() as u64,
            })?;

        struct ReleaseOnDrop<'a, L: LockBackend + ?Sized> {
            lock: &'a L,
            key: &'a str,
            token: LockToken,
        }
        impl<L: LockBackend + ?Sized> Drop for ReleaseOnDrop<'_, L> {
            fn drop(&mut self) {
                self.lock.release(self.key, &self.token);
            }
        }

        let _guard = ReleaseOnDrop {
            lock: self,
            key,
            token,
        };
        Ok(body())
    }
}

impl<L: LockBackend + ?Sized> LockBackendExt for L {}

/// Named counter with serialized read-modify-write and optional TTL refresh
pub trait CounterBackend: Send + Sync {
    /// Add `amount` to `name` (initializing at zero) and return the new value
    ///
    /// `ttl` of `Some(_)` resets the expiry to now + ttl; `None` leaves any
    /// existing expiry untouched.
    fn increment(&self, name: &str, amount: i64, ttl: Option<Duration>) -> i64;

    /// Subtract `amount` from `name` and return the new value
    fn decrement(&self, name: &str, amount: i64, ttl: Option<Duration>) -> i64 {
        self.increment(name, -amount, ttl)
    }

    /// Current value, `None` if absent or expired
    fn get(&self, name: &str) -> Option<i64>;

    /// Unconditionally overwrite `name`
    ///
    /// Last-writer-wins: a `set` racing concurrent `increment`s may clobber
    /// them. This is the documented contract, not a defect.
    fn set(&self, name: &str, value: i64, ttl: Option<Duration>);

    /// Remove `name`, returning whether a live entry existed
    fn delete(&self, name: &str) -> bool;
}

/// TTL-bearing key-value store for ephemeral shared state
pub trait KvBackend: Send + Sync + fmt::Debug {
    /// Value for `key`, `None` if absent or expired
    ///
    /// An expired entry is removed during the read (self-healing).
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Insert or overwrite `key`
    ///
    /// `ttl` of `Some(t)` sets the absolute expiry to now + t; `None`
    /// stores the value without expiry.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);

    /// Remove `key`, returning whether a live entry existed
    ///
    /// Deleting an already-expired entry removes the husk but returns
    /// `false`.
    fn delete(&self, key: &str) -> bool;

    /// Remove every entry
    fn clear_all(&self);

    /// Whether a live entry exists for `key`
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of live (non-expired) entries
    fn len(&self) -> usize;

    /// Whether no live entries exist
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
