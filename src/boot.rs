//! Boot-time adapter wiring
//!
//! The surrounding application parses its configuration into an ordered
//! list of [`AdapterSpec`]s and hands them to
//! [`register_memory_adapters`], which registers the in-memory factory for
//! each one. The first spec of each kind becomes that kind's default
//! adapter. Validating the configuration file itself stays with the
//! application; this module only consumes the already-parsed triples.
//!
//! Config keys understood by the memory factories:
//! - cache: `capacity` (entries, default 1024)
//! - lock: `poll_interval_ms` (acquisition retry sleep, default 5)
//! - kv: `sweep_interval_ms` (background sweep period, default 0 = passive)
//! - counter: none

use std::sync::Arc;
use std::time::Duration;
use tether_core::{
    AdapterConfig, CacheBackend, CounterBackend, KvBackend, LockBackend, SystemClock,
};
use tether_primitives::{MemoryCache, MemoryCounter, MemoryKv, MemoryLock};
use tether_registry::Registry;

const DEFAULT_CACHE_CAPACITY: u64 = 1024;
const DEFAULT_LOCK_POLL_MS: u64 = 5;

/// Which primitive interface an adapter implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// LRU cache behind [`CacheBackend`]
    Cache,
    /// Mutex lock behind [`LockBackend`]
    Lock,
    /// Atomic counter behind [`CounterBackend`]
    Counter,
    /// Key-value store behind [`KvBackend`]
    Kv,
}

/// One parsed `{kind, name, config}` triple from boot configuration
#[derive(Debug, Clone)]
pub struct AdapterSpec {
    /// Primitive interface this adapter serves
    pub kind: AdapterKind,
    /// Adapter name used at resolve time
    pub name: String,
    /// Config handed to the factory on first resolution
    pub config: AdapterConfig,
}

impl AdapterSpec {
    /// Spec with an empty config
    pub fn new(kind: AdapterKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            config: AdapterConfig::new(),
        }
    }

    /// Builder-style config attachment
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }
}

/// Register the in-memory factory for each spec, in order
///
/// The first spec of each kind also becomes the default adapter for that
/// kind, so `resolve(None)` works out of the box. Specs only register
/// factories; nothing is constructed until first resolution.
pub fn register_memory_adapters(registry: &Registry, specs: &[AdapterSpec]) {
    for spec in specs {
        match spec.kind {
            AdapterKind::Cache => {
                registry.register::<Arc<dyn CacheBackend>>(&spec.name, |config| {
                    let capacity = config
                        .get_u64("capacity")
                        .unwrap_or(DEFAULT_CACHE_CAPACITY) as usize;
                    Arc::new(MemoryCache::with_clock(capacity, Arc::new(SystemClock)))
                });
                registry.adapter_config::<Arc<dyn CacheBackend>>(&spec.name, spec.config.clone());
                if registry.default_adapter::<Arc<dyn CacheBackend>>().is_none() {
                    registry.set_default_adapter::<Arc<dyn CacheBackend>>(&spec.name);
                }
            }
            AdapterKind::Lock => {
                registry.register::<Arc<dyn LockBackend>>(&spec.name, |config| {
                    let poll_ms = config.get_u64("poll_interval_ms").unwrap_or(DEFAULT_LOCK_POLL_MS);
                    Arc::new(
                        MemoryLock::with_clock(Arc::new(SystemClock))
                            .with_poll_interval(Duration::from_millis(poll_ms)),
                    )
                });
                registry.adapter_config::<Arc<dyn LockBackend>>(&spec.name, spec.config.clone());
                if registry.default_adapter::<Arc<dyn LockBackend>>().is_none() {
                    registry.set_default_adapter::<Arc<dyn LockBackend>>(&spec.name);
                }
            }
            AdapterKind::Counter => {
                registry.register::<Arc<dyn CounterBackend>>(&spec.name, |_config| {
                    Arc::new(MemoryCounter::with_clock(Arc::new(SystemClock)))
                });
                registry.adapter_config::<Arc<dyn CounterBackend>>(&spec.name, spec.config.clone());
                if registry
                    .default_adapter::<Arc<dyn CounterBackend>>()
                    .is_none()
                {
                    registry.set_default_adapter::<Arc<dyn CounterBackend>>(&spec.name);
                }
            }
            AdapterKind::Kv => {
                registry.register::<Arc<dyn KvBackend>>(&spec.name, |config| {
                    let sweep_ms = config.get_u64("sweep_interval_ms").unwrap_or(0);
                    Arc::new(MemoryKv::with_sweep_interval(
                        Arc::new(SystemClock),
                        Duration::from_millis(sweep_ms),
                    ))
                });
                registry.adapter_config::<Arc<dyn KvBackend>>(&spec.name, spec.config.clone());
                if registry.default_adapter::<Arc<dyn KvBackend>>().is_none() {
                    registry.set_default_adapter::<Arc<dyn KvBackend>>(&spec.name);
                }
            }
        }
        tracing::debug!(
            target: "tether::boot",
            kind = ?spec.kind,
            name = %spec.name,
            "memory adapter registered"
        );
    }
}
