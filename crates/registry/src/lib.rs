//! Adapter registry for tether
//!
//! Maps `(handle type, adapter name)` pairs to factories and memoizes one
//! instance per pair, so every part of the process that resolves the same
//! adapter shares the same backend. The handle type is whatever the caller
//! wants back from [`Registry::resolve`] — typically an `Arc<dyn …Backend>`
//! trait object, so alternative backends plug in behind the same seam.
//!
//! Registries are explicit objects rather than process globals: tests build
//! one per case and throw it away, or call [`Registry::reset`] to reuse one.
//! Factories are plain `name → factory` entries populated at startup by the
//! application; there is no runtime string-to-type resolution.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_core::{AdapterConfig, CounterBackend};
//! use tether_primitives::MemoryCounter;
//! use tether_registry::Registry;
//!
//! let registry = Registry::new();
//! registry.register::<Arc<dyn CounterBackend>>("memory", |_config| {
//!     Arc::new(MemoryCounter::new())
//! });
//! registry.set_default_adapter::<Arc<dyn CounterBackend>>("memory");
//!
//! let counter = registry.resolve::<Arc<dyn CounterBackend>>(None).unwrap();
//! counter.increment("hits", 1, None);
//!
//! // Same (type, name) resolves to the identical instance.
//! let again = registry.resolve::<Arc<dyn CounterBackend>>(Some("memory")).unwrap();
//! assert_eq!(again.get("hits"), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tether_core::{AdapterConfig, Error, Result};

type BoxedInstance = Box<dyn Any + Send + Sync>;
type BoxedFactory = Box<dyn Fn(&AdapterConfig) -> BoxedInstance + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    factories: HashMap<(TypeId, String), BoxedFactory>,
    configs: HashMap<(TypeId, String), AdapterConfig>,
    instances: HashMap<(TypeId, String), BoxedInstance>,
    defaults: HashMap<TypeId, String>,
}

/// Adapter registration and singleton resolution
///
/// One mutex guards the whole registry, including factory invocation, so a
/// first-resolution race across threads constructs exactly one instance.
/// Factories must therefore be cheap and must not resolve from the same
/// registry re-entrantly.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for handle type `H` under `name`
    ///
    /// Re-registering the same `(type, name)` replaces the factory and
    /// drops any previously resolved instance.
    pub fn register<H>(
        &self,
        name: &str,
        factory: impl Fn(&AdapterConfig) -> H + Send + Sync + 'static,
    ) where
        H: Clone + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = (TypeId::of::<H>(), name.to_string());
        inner.instances.remove(&id);
        inner
            .factories
            .insert(id, Box::new(move |config| Box::new(factory(config))));
        tracing::debug!(
            target: "tether::registry",
            kind = std::any::type_name::<H>(),
            name,
            "adapter registered"
        );
    }

    /// Supply the config handed to the factory for `(H, name)`
    ///
    /// Only effective before the first resolution of that pair; afterwards
    /// the call is ignored and returns `false`.
    pub fn adapter_config<H: 'static>(&self, name: &str, config: AdapterConfig) -> bool {
        let mut inner = self.inner.lock();
        let id = (TypeId::of::<H>(), name.to_string());
        if inner.instances.contains_key(&id) {
            tracing::warn!(
                target: "tether::registry",
                kind = std::any::type_name::<H>(),
                name,
                "config ignored: adapter already resolved"
            );
            return false;
        }
        inner.configs.insert(id, config);
        true
    }

    /// Name resolved when `resolve::<H>(None)` is called
    pub fn set_default_adapter<H: 'static>(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.defaults.insert(TypeId::of::<H>(), name.to_string());
    }

    /// The configured default adapter name for `H`, if any
    pub fn default_adapter<H: 'static>(&self) -> Option<String> {
        self.inner.lock().defaults.get(&TypeId::of::<H>()).cloned()
    }

    /// Adapter names registered for handle type `H`
    pub fn registered<H: 'static>(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let ty = TypeId::of::<H>();
        let mut names: Vec<String> = inner
            .factories
            .keys()
            .filter(|(t, _)| *t == ty)
            .map(|(_, n)| n.clone())
            .collect();
        names.sort();
        names
    }

    /// Resolve the singleton instance for `(H, name)`
    ///
    /// `name` of `None` uses the default configured for `H`. The first
    /// resolution constructs via the registered factory with the pair's
    /// config (empty if none was supplied) and memoizes the result; every
    /// later resolution returns a clone of the identical handle.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when no default is set (for `None`) or no
    /// factory is registered for the pair — programmer errors, raised
    /// immediately rather than signalled in-band.
    pub fn resolve<H>(&self, name: Option<&str>) -> Result<H>
    where
        H: Clone + Send + Sync + 'static,
    {
        let kind = std::any::type_name::<H>();
        let mut inner = self.inner.lock();
        let ty = TypeId::of::<H>();

        let name = match name {
            Some(n) => n.to_string(),
            None => inner
                .defaults
                .get(&ty)
                .cloned()
                .ok_or_else(|| Error::no_default_adapter(kind))?,
        };
        let id = (ty, name);

        if !inner.instances.contains_key(&id) {
            let factory = inner
                .factories
                .get(&id)
                .ok_or_else(|| Error::unknown_adapter(kind, &id.1))?;
            let config = inner.configs.get(&id).cloned().unwrap_or_default();
            let instance = factory(&config);
            tracing::debug!(target: "tether::registry", kind, name = %id.1, "adapter constructed");
            inner.instances.insert(id.clone(), instance);
        }

        inner
            .instances
            .get(&id)
            .and_then(|boxed| boxed.downcast_ref::<H>())
            .cloned()
            .ok_or_else(|| Error::Configuration {
                message: format!("registry slot for {kind}/{} holds an unexpected type", id.1),
            })
    }

    /// Clear all registrations, configs, defaults, and resolved instances
    ///
    /// Used to isolate test runs; the registry returns to its freshly
    /// constructed state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.factories.clear();
        inner.configs.clear();
        inner.instances.clear();
        inner.defaults.clear();
        tracing::debug!(target: "tether::registry", "registry reset");
    }
}
