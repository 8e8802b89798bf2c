//! Fetch-or-compute caching layer
//!
//! The cache stores opaque bytes; how a value becomes bytes is the
//! caller's concern. This helper wraps the common read path: try the
//! cache, decode on a hit, and on a miss (or a payload that fails to
//! decode) compute the value, re-cache it, and return it. A decode failure
//! is logged and treated exactly like a miss — it never propagates as a
//! fatal error.

use std::time::Duration;
use tether_core::{CacheBackend, Result};

/// Fetch `(key, selector)` through `cache`, computing and re-caching on a
/// miss
///
/// `decode` turns a cached payload back into a value (use
/// [`Error::serialization`](tether_core::Error::serialization) for the
/// failure); `encode` produces the payload stored after `compute` runs.
/// Only `compute` errors propagate.
pub fn fetch_or_compute<T>(
    cache: &dyn CacheBackend,
    key: &str,
    selector: &str,
    ttl: Option<Duration>,
    decode: impl FnOnce(&[u8]) -> Result<T>,
    encode: impl FnOnce(&T) -> Vec<u8>,
    compute: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if let Some(payload) = cache.fetch(key, selector) {
        match decode(&payload) {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(
                    target: "tether::cached",
                    key,
                    selector,
                    error = %err,
                    "cached payload failed to decode; treating as miss"
                );
            }
        }
    }

    let value = compute()?;
    cache.put(key, selector, encode(&value), ttl);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tether_core::Error;
    use tether_primitives::MemoryCache;

    fn decode_utf8<'a>(
        key: &'a str,
        selector: &'a str,
    ) -> impl FnOnce(&[u8]) -> Result<String> + 'a {
        move |bytes| {
            String::from_utf8(bytes.to_vec())
                .map_err(|e| Error::serialization(key, selector, e))
        }
    }

    #[test]
    fn test_miss_computes_and_caches() {
        let cache = MemoryCache::new(4);
        let computed = Cell::new(0);

        let value = fetch_or_compute(
            &cache,
            "k",
            "s",
            None,
            decode_utf8("k", "s"),
            |v: &String| v.clone().into_bytes(),
            || {
                computed.set(computed.get() + 1);
                Ok("fresh".to_string())
            },
        )
        .unwrap();

        assert_eq!(value, "fresh");
        assert_eq!(computed.get(), 1);
        assert_eq!(cache.fetch("k", "s").unwrap(), b"fresh");
    }

    #[test]
    fn test_hit_skips_compute() {
        let cache = MemoryCache::new(4);
        cache.put("k", "s", b"warm".to_vec(), None);

        let value = fetch_or_compute(
            &cache,
            "k",
            "s",
            None,
            decode_utf8("k", "s"),
            |v: &String| v.clone().into_bytes(),
            || -> Result<String> { panic!("compute must not run on a hit") },
        )
        .unwrap();
        assert_eq!(value, "warm");
    }

    #[test]
    fn test_undecodable_payload_is_recomputed_and_recached() {
        let cache = MemoryCache::new(4);
        cache.put("k", "s", vec![0xff, 0xfe], None);

        let value = fetch_or_compute(
            &cache,
            "k",
            "s",
            None,
            decode_utf8("k", "s"),
            |v: &String| v.clone().into_bytes(),
            || Ok("repaired".to_string()),
        )
        .unwrap();

        assert_eq!(value, "repaired");
        assert_eq!(cache.fetch("k", "s").unwrap(), b"repaired");
    }

    #[test]
    fn test_compute_error_propagates() {
        let cache = MemoryCache::new(4);
        let err = fetch_or_compute(
            &cache,
            "k",
            "s",
            None,
            decode_utf8("k", "s"),
            |v: &String| v.clone().into_bytes(),
            || -> Result<String> {
                Err(Error::Configuration {
                    message: "upstream unavailable".into(),
                })
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(cache.fetch("k", "s").is_none());
    }
}
