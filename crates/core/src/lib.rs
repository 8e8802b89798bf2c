//! Core layer for tether
//!
//! This crate is the leaf of the workspace. It defines everything the
//! adapter crates and the registry share:
//! - Clock: injectable time source (SystemClock, ManualClock)
//! - Error/Result: the workspace error enum
//! - AdapterConfig: string-keyed configuration passed to adapter factories
//! - Backend traits: the four primitive interfaces adapters implement
//!
//! Nothing here allocates threads or holds domain state; the in-memory
//! adapters live in `tether-primitives`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AdapterConfig;
pub use error::{Error, Result};
pub use traits::{
    CacheBackend, CounterBackend, KvBackend, LockBackend, LockBackendExt, LockToken,
};
