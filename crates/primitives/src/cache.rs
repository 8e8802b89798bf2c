//! In-memory LRU cache with per-entry TTL
//!
//! # Design
//!
//! - Recency list: doubly-linked list stored as an arena (`Vec<Node>` with
//!   a free list) addressed by stable indices, with sentinel head/tail
//!   nodes. No `Rc`/raw-pointer cycles.
//! - Index: nested `key → selector → arena index` map, so a single lookup
//!   never allocates and `flush(key, ["*"])` sees every selector of a key
//!   directly.
//! - Expiry is lazy: a fetch past `expires_at` removes the entry and counts
//!   as a miss. Eviction removes exactly the least-recently-used entry, at
//!   most one per put.
//!
//! One mutex guards the whole structure; every operation is O(1) and fully
//! serialized, so no partial update is ever visible.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_core::{CacheBackend, Clock, SystemClock};

/// Arena index of the list head sentinel (most-recently-used end)
const HEAD: usize = 0;
/// Arena index of the list tail sentinel (least-recently-used end)
const TAIL: usize = 1;

/// Hit/miss/eviction counters for one cache instance
///
/// An expired entry found by `fetch` increments both `expirations` and
/// `misses`: expiry is observably identical to a true miss.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Fetches that returned a live value
    pub hits: u64,
    /// Fetches that returned nothing (absent or expired)
    pub misses: u64,
    /// Entries removed by capacity pressure
    pub evictions: u64,
    /// Entries removed because their TTL had passed
    pub expirations: u64,
}

#[derive(Debug)]
struct Entry {
    key: String,
    selector: String,
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

#[derive(Debug)]
struct Node {
    prev: usize,
    next: usize,
    /// `None` for the two sentinels and for free-list slots
    entry: Option<Entry>,
}

#[derive(Debug)]
struct CacheInner {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<String, HashMap<String, usize>>,
    len: usize,
    stats: CacheStats,
}

impl CacheInner {
    fn new() -> Self {
        let nodes = vec![
            Node {
                prev: usize::MAX,
                next: TAIL,
                entry: None,
            },
            Node {
                prev: HEAD,
                next: usize::MAX,
                entry: None,
            },
        ];
        Self {
            nodes,
            free: Vec::new(),
            index: HashMap::new(),
            len: 0,
            stats: CacheStats::default(),
        }
    }

    fn lookup(&self, key: &str, selector: &str) -> Option<usize> {
        self.index.get(key)?.get(selector).copied()
    }

    /// Unlink `idx` from the recency list
    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    /// Link `idx` right after the head sentinel (most-recently-used)
    fn push_front(&mut self, idx: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = first;
        self.nodes[first].prev = idx;
        self.nodes[HEAD].next = idx;
    }

    fn alloc(&mut self, entry: Entry) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx].entry = Some(entry);
                idx
            }
            None => {
                self.nodes.push(Node {
                    prev: usize::MAX,
                    next: usize::MAX,
                    entry: Some(entry),
                });
                self.nodes.len() - 1
            }
        }
    }

    /// Detach `idx`, drop its entry from the index, and reclaim the slot
    fn remove_node(&mut self, idx: usize) {
        self.detach(idx);
        if let Some(entry) = self.nodes[idx].entry.take() {
            if let Some(selectors) = self.index.get_mut(&entry.key) {
                selectors.remove(&entry.selector);
                if selectors.is_empty() {
                    self.index.remove(&entry.key);
                }
            }
            self.len -= 1;
        }
        self.free.push(idx);
    }

    fn is_expired(&self, idx: usize, now: Instant) -> bool {
        self.nodes[idx]
            .entry
            .as_ref()
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now)
    }
}

/// Thread-safe O(1) LRU cache keyed by `(key, selector)`
///
/// Local stand-in sharing the external contract of a distributed cache:
/// opaque byte values, optional per-entry TTL, recency eviction bounded by
/// a fixed capacity.
#[derive(Debug)]
pub struct MemoryCache {
    capacity: usize,
    clock: Arc<dyn Clock>,
    inner: Mutex<CacheInner>,
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` entries (minimum 1),
    /// reading time from the system clock
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Create a cache with an injected clock
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity: capacity.max(1),
            clock,
            inner: Mutex::new(CacheInner::new()),
        }
    }

    /// Look up `(key, selector)`, touching it as most recently used
    pub fn fetch(&self, key: &str, selector: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();

        let Some(idx) = inner.lookup(key, selector) else {
            inner.stats.misses += 1;
            return None;
        };

        if inner.is_expired(idx, now) {
            inner.remove_node(idx);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
            tracing::debug!(target: "tether::cache", key, selector, "entry expired on fetch");
            return None;
        }

        inner.detach(idx);
        inner.push_front(idx);
        inner.stats.hits += 1;
        inner.nodes[idx].entry.as_ref().map(|e| e.value.clone())
    }

    /// Insert or overwrite `(key, selector)` as the most-recently-used entry
    ///
    /// When the insert pushes the cache over capacity, the entry at the
    /// least-recently-used end is evicted. Capacity is only ever exceeded
    /// by one, so at most one eviction happens per call.
    pub fn put(&self, key: &str, selector: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        let expires_at = ttl.map(|t| now + t);

        if let Some(idx) = inner.lookup(key, selector) {
            if let Some(entry) = inner.nodes[idx].entry.as_mut() {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            inner.detach(idx);
            inner.push_front(idx);
            return;
        }

        let idx = inner.alloc(Entry {
            key: key.to_string(),
            selector: selector.to_string(),
            value,
            expires_at,
        });
        inner.push_front(idx);
        inner
            .index
            .entry(key.to_string())
            .or_default()
            .insert(selector.to_string(), idx);
        inner.len += 1;

        if inner.len > self.capacity {
            let lru = inner.nodes[TAIL].prev;
            if let Some(victim) = inner.nodes[lru].entry.as_ref() {
                tracing::debug!(
                    target: "tether::cache",
                    key = %victim.key,
                    selector = %victim.selector,
                    "evicting least-recently-used entry"
                );
            }
            inner.remove_node(lru);
            inner.stats.evictions += 1;
        }
    }

    /// Remove one `(key, selector)` entry
    ///
    /// Returns whether a live entry was removed; an expired husk is cleaned
    /// up but reported as absent.
    pub fn remove(&self, key: &str, selector: &str) -> bool {
        let mut inner = self.inner.lock();
        let now = self.clock.now();

        let Some(idx) = inner.lookup(key, selector) else {
            return false;
        };
        let expired = inner.is_expired(idx, now);
        inner.remove_node(idx);
        if expired {
            inner.stats.expirations += 1;
        }
        !expired
    }

    /// Remove the named selectors under `key`; `"*"` removes all of them
    ///
    /// Returns the number of entries removed.
    pub fn flush(&self, key: &str, selectors: &[&str]) -> usize {
        let mut inner = self.inner.lock();

        let targets: HashSet<usize> = if selectors.iter().any(|s| *s == "*") {
            inner
                .index
                .get(key)
                .map(|m| m.values().copied().collect())
                .unwrap_or_default()
        } else {
            selectors
                .iter()
                .filter_map(|s| inner.lookup(key, s))
                .collect()
        };

        let count = targets.len();
        for idx in targets {
            inner.remove_node(idx);
        }
        if count > 0 {
            tracing::debug!(target: "tether::cache", key, removed = count, "flushed selectors");
        }
        count
    }

    /// Number of resident entries (expired-but-unfetched entries included)
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the hit/miss/eviction counters
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

impl CacheBackend for MemoryCache {
    fn fetch(&self, key: &str, selector: &str) -> Option<Vec<u8>> {
        MemoryCache::fetch(self, key, selector)
    }

    fn put(&self, key: &str, selector: &str, value: Vec<u8>, ttl: Option<Duration>) {
        MemoryCache::put(self, key, selector, value, ttl)
    }

    fn remove(&self, key: &str, selector: &str) -> bool {
        MemoryCache::remove(self, key, selector)
    }

    fn flush(&self, key: &str, selectors: &[&str]) -> usize {
        MemoryCache::flush(self, key, selectors)
    }
}
