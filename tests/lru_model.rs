//! Property test: MemoryCache agrees with a naive reference LRU
//!
//! The reference keeps an explicit recency-ordered list; the cache keeps an
//! arena-backed linked list. After any sequence of puts and fetches both
//! must agree on every fetch result and on the resident set (the C
//! most-recently-touched pairs).

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};
use tether::MemoryCache;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u8, u8),
    Fetch(u8, u8),
}

/// Naive O(n) LRU used as the oracle
struct ModelLru {
    capacity: usize,
    /// Front is most-recently-used
    order: VecDeque<(u8, u8)>,
    values: HashMap<(u8, u8), u8>,
}

impl ModelLru {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            values: HashMap::new(),
        }
    }

    fn touch(&mut self, id: (u8, u8)) {
        if let Some(pos) = self.order.iter().position(|x| *x == id) {
            self.order.remove(pos);
        }
        self.order.push_front(id);
    }

    fn put(&mut self, key: u8, sel: u8, value: u8) {
        let id = (key, sel);
        let fresh = !self.values.contains_key(&id);
        self.values.insert(id, value);
        self.touch(id);
        if fresh && self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_back() {
                self.values.remove(&evicted);
            }
        }
    }

    fn fetch(&mut self, key: u8, sel: u8) -> Option<u8> {
        let id = (key, sel);
        let value = self.values.get(&id).copied()?;
        self.touch(id);
        Some(value)
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6, 0u8..3, any::<u8>()).prop_map(|(k, s, v)| Op::Put(k, s, v)),
        (0u8..6, 0u8..3).prop_map(|(k, s)| Op::Fetch(k, s)),
    ]
}

proptest! {
    #[test]
    fn cache_matches_reference_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let cache = MemoryCache::new(capacity);
        let mut model = ModelLru::new(capacity);

        for op in &ops {
            match *op {
                Op::Put(k, s, v) => {
                    cache.put(&k.to_string(), &s.to_string(), vec![v], None);
                    model.put(k, s, v);
                }
                Op::Fetch(k, s) => {
                    let got = cache.fetch(&k.to_string(), &s.to_string());
                    let want = model.fetch(k, s);
                    prop_assert_eq!(got, want.map(|v| vec![v]));
                }
            }
            prop_assert!(cache.len() <= capacity);
        }

        // The resident sets agree exactly.
        prop_assert_eq!(cache.len(), model.values.len());
        for (&(k, s), &v) in &model.values {
            let got = cache.fetch(&k.to_string(), &s.to_string());
            prop_assert_eq!(got, Some(vec![v]));
        }
    }
}
