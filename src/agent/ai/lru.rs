// Bounded map with strict least-recently-used eviction.
//
// Backs both the transposition table and the learned-value store. Every slot
// carries a monotonically increasing stamp; a BTreeMap from stamp to key gives
// the eviction order in O(log n).

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    stamp: u64,
}

#[derive(Debug, Clone)]
pub struct LruMap<V> {
    slots: HashMap<u64, Slot<V>>,
    /// stamp -> key, oldest first
    order: BTreeMap<u64, u64>,
    capacity: usize,
    tick: u64,
}

impl<V> LruMap<V> {
    /// A map holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: HashMap::with_capacity(capacity.min(100_000)),
            order: BTreeMap::new(),
            capacity,
            tick: 0,
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up `key` and mark it most recently used
    pub fn get(&mut self, key: u64) -> Option<&V> {
        let stamp = self.next_stamp();
        let slot = self.slots.get_mut(&key)?;
        self.order.remove(&slot.stamp);
        self.order.insert(stamp, key);
        slot.stamp = stamp;
        Some(&slot.value)
    }

    /// Look up `key` without touching its recency
    pub fn peek(&self, key: u64) -> Option<&V> {
        self.slots.get(&key).map(|slot| &slot.value)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.slots.contains_key(&key)
    }

    /// Insert or replace `key`, marking it most recently used.
    /// Returns the evicted `(key, value)` when the map was full.
    pub fn insert(&mut self, key: u64, value: V) -> Option<(u64, V)> {
        let stamp = self.next_stamp();

        if let Some(slot) = self.slots.get_mut(&key) {
            self.order.remove(&slot.stamp);
            self.order.insert(stamp, key);
            slot.stamp = stamp;
            slot.value = value;
            return None;
        }

        let evicted = if self.slots.len() >= self.capacity {
            self.order
                .pop_first()
                .and_then(|(_, old_key)| self.slots.remove(&old_key).map(|slot| (old_key, slot.value)))
        } else {
            None
        };

        self.slots.insert(key, Slot { value, stamp });
        self.order.insert(stamp, key);
        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.tick = 0;
    }

    /// Entries from least to most recently used
    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.order
            .values()
            .filter_map(move |key| self.slots.get(key).map(|slot| (*key, &slot.value)))
    }
}
