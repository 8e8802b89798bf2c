//! Tether - thread-safe, TTL-aware in-process coordination primitives
//!
//! Tether provides local stand-ins that share the exact external contract
//! of distributed coordination backends:
//! - [`MemoryCache`]: capacity-bounded O(1) LRU cache with per-entry TTL
//! - [`MemoryLock`]: token-gated lock with TTL auto-release and bounded
//!   blocking acquisition
//! - [`MemoryCounter`]: exactly-summing counters with optional TTL refresh
//! - [`MemoryKv`]: TTL key-value store with optional background sweeping
//!
//! Applications wire them (or alternative backends) through the
//! [`Registry`], which resolves a named adapter to one process-wide
//! singleton per `(handle type, name)` pair.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tether::{
//!     register_memory_adapters, AdapterKind, AdapterSpec, CacheBackend, LockBackend,
//!     LockBackendExt, Registry,
//! };
//!
//! let registry = Registry::new();
//! register_memory_adapters(
//!     &registry,
//!     &[
//!         AdapterSpec::new(AdapterKind::Cache, "memory"),
//!         AdapterSpec::new(AdapterKind::Lock, "memory"),
//!     ],
//! );
//!
//! let cache = registry.resolve::<Arc<dyn CacheBackend>>(None).unwrap();
//! cache.put("user:1", "profile", b"alice".to_vec(), None);
//!
//! let lock = registry.resolve::<Arc<dyn LockBackend>>(None).unwrap();
//! let ttl = Duration::from_secs(5);
//! lock.with_lock("user:1", ttl, Duration::ZERO, || {
//!     // critical section
//! })
//! .unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boot;
pub mod cached;

pub use boot::{register_memory_adapters, AdapterKind, AdapterSpec};
pub use tether_core::{
    AdapterConfig, CacheBackend, Clock, CounterBackend, Error, KvBackend, LockBackend,
    LockBackendExt, LockToken, ManualClock, Result, SystemClock,
};
pub use tether_primitives::{
    CacheStats, LockGuard, MemoryCache, MemoryCounter, MemoryKv, MemoryLock,
};
pub use tether_registry::Registry;
