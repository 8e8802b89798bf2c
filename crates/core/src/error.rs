//! Error types for tether
//!
//! The split follows the propagation policy of the primitives: expected
//! races (token mismatch, TTL expiry, a missing key, an acquisition timing
//! out at the raw API) are reported through `Option`/`bool` return values
//! and never appear here. `Error` covers the three genuine failure kinds:
//! misconfiguration at resolve time, the scoped-lock wrapper giving up, and
//! a cached payload that would not decode.

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the coordination core
#[derive(Debug, Error)]
pub enum Error {
    /// Adapter resolution failed: unregistered (type, name) or no default
    /// adapter configured for the type. A programmer error, raised
    /// immediately at resolve time.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was misconfigured, naming the adapter type and name involved
        message: String,
    },

    /// `with_lock` could not acquire the lock within the caller's timeout
    #[error("timed out acquiring lock {key:?} after {waited_ms} ms")]
    LockTimeout {
        /// Lock key that stayed held for the whole wait
        key: String,
        /// The timeout budget that elapsed, in milliseconds
        waited_ms: u64,
    },

    /// An opaque cached payload failed to decode
    ///
    /// Callers must treat this as a cache miss (recompute and re-cache),
    /// never as fatal; `tether::cached::fetch_or_compute` does so.
    #[error("failed to decode cached payload for {key:?}/{selector:?}: {reason}")]
    Serialization {
        /// Cache key of the undecodable entry
        key: String,
        /// Cache selector of the undecodable entry
        selector: String,
        /// Decoder-provided description of the failure
        reason: String,
    },
}

impl Error {
    /// Configuration error for an unregistered adapter
    pub fn unknown_adapter(kind: &str, name: &str) -> Self {
        Error::Configuration {
            message: format!("no adapter named {name:?} registered for type {kind}"),
        }
    }

    /// Configuration error for a type with no default adapter
    pub fn no_default_adapter(kind: &str) -> Self {
        Error::Configuration {
            message: format!("no default adapter configured for type {kind}"),
        }
    }

    /// Serialization error for an undecodable cached payload
    pub fn serialization(key: &str, selector: &str, reason: impl ToString) -> Self {
        Error::Serialization {
            key: key.to_string(),
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_adapter_names_both() {
        let err = Error::unknown_adapter("CacheBackend", "redis");
        let msg = err.to_string();
        assert!(msg.contains("CacheBackend"));
        assert!(msg.contains("redis"));
    }

    #[test]
    fn test_no_default_names_type() {
        let err = Error::no_default_adapter("LockBackend");
        assert!(err.to_string().contains("LockBackend"));
    }

    #[test]
    fn test_lock_timeout_display() {
        let err = Error::LockTimeout {
            key: "jobs:reindex".into(),
            waited_ms: 1500,
        };
        let msg = err.to_string();
        assert!(msg.contains("jobs:reindex"));
        assert!(msg.contains("1500"));
    }
}
