//! Adapter configuration
//!
//! Boot-time wiring hands each adapter factory an [`AdapterConfig`]: a flat
//! string-keyed map of JSON values. Parsing and validating the surrounding
//! configuration file is the application's concern; this type only carries
//! the already-extracted per-adapter section and offers typed getters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat key → JSON value configuration for one adapter instance
///
/// Immutable once the adapter has been resolved; the registry ignores
/// config updates after first resolution.
///
/// # Examples
///
/// ```
/// use tether_core::AdapterConfig;
///
/// let config = AdapterConfig::new()
///     .with("capacity", 512)
///     .with("sweep_interval_ms", 1000);
///
/// assert_eq!(config.get_u64("capacity"), Some(512));
/// assert_eq!(config.get_u64("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterConfig {
    values: BTreeMap<String, serde_json::Value>,
}

impl AdapterConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw value lookup
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Unsigned integer value, `None` if absent or not a u64
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(|v| v.as_u64())
    }

    /// Signed integer value, `None` if absent or not an i64
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    /// String value, `None` if absent or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Boolean value, `None` if absent or not a bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    /// Number of configured keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys are configured
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let config = AdapterConfig::new()
            .with("capacity", 128)
            .with("name", "primary")
            .with("sweep", true);

        assert_eq!(config.get_u64("capacity"), Some(128));
        assert_eq!(config.get_str("name"), Some("primary"));
        assert_eq!(config.get_bool("sweep"), Some(true));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn test_type_mismatch_is_none() {
        let config = AdapterConfig::new().with("capacity", "not a number");
        assert_eq!(config.get_u64("capacity"), None);
        assert_eq!(config.get_str("capacity"), Some("not a number"));
    }

    #[test]
    fn test_empty() {
        let config = AdapterConfig::new();
        assert!(config.is_empty());
        assert_eq!(config.get("anything"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut config = AdapterConfig::new().with("capacity", 1);
        config.set("capacity", 2);
        assert_eq!(config.get_u64("capacity"), Some(2));
    }

    #[test]
    fn test_json_round_trip() {
        let config = AdapterConfig::new().with("capacity", 64).with("tag", "a");
        let json = serde_json::to_string(&config).unwrap();
        let back: AdapterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
