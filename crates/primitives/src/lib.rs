//! In-memory adapters for tether
//!
//! This crate implements the four coordination primitives as local,
//! thread-safe stand-ins sharing the exact external contract of their
//! distributed counterparts:
//! - MemoryCache: capacity-bounded O(1) LRU cache with per-entry TTL
//! - MemoryLock: token-gated lock with TTL auto-release and bounded waiting
//! - MemoryCounter: serialized read-modify-write counters with TTL refresh
//! - MemoryKv: TTL key-value store with an optional background sweeper
//!
//! Every adapter owns one `parking_lot::Mutex` over its whole internal
//! state; operations are synchronous and atomic with respect to each other.
//! All TTL arithmetic goes through the `Clock` injected at construction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod counter;
pub mod kv;
pub mod lock;

pub use cache::{CacheStats, MemoryCache};
pub use counter::MemoryCounter;
pub use kv::MemoryKv;
pub use lock::{LockGuard, MemoryLock};
