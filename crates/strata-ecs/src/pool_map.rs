//! Robin-hood hash table from component type to its erased pool.
//!
//! Open addressing with linear probing; on insertion, a candidate that has
//! probed further than the resident of a slot steals it and the resident
//! continues probing (robin hood). This keeps probe distances along any
//! chain near-uniform, bounding worst-case lookup.
//!
//! Capacity is always a power of two of at least 16. Exceeding a 0.7 load
//! factor doubles the table and rehashes every bucket. Pools are never
//! removed -- a pool lives for the lifetime of the owning registry -- so the
//! table needs no tombstones.

use tracing::trace;

use crate::component::ComponentTypeId;
use crate::pool::ErasedPool;

const INITIAL_CAPACITY: usize = 16;
const MAX_LOAD: f32 = 0.7;

struct Bucket {
    /// Cached `hash_u64` of `key`; probe distances are derived from it.
    hash: u64,
    key: ComponentTypeId,
    pool: Box<dyn ErasedPool>,
}

/// Hash table owning one erased pool per component type.
pub struct PoolMap {
    buckets: Vec<Option<Bucket>>,
    len: usize,
}

impl Default for PoolMap {
    fn default() -> Self {
        Self::new()
    }
}

/// How far `hash`'s bucket at `index` sits from its ideal slot.
#[inline]
fn distance(hash: u64, index: usize, mask: usize) -> usize {
    index.wrapping_sub(hash as usize) & mask
}

impl PoolMap {
    /// Create an empty map at the initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create an empty map with at least `capacity` buckets, rounded up to a
    /// power of two no smaller than the initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(INITIAL_CAPACITY).next_power_of_two();
        Self {
            buckets: std::iter::repeat_with(|| None).take(capacity).collect(),
            len: 0,
        }
    }

    /// Number of stored pools.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no pools.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Whether a pool is registered under `key`.
    pub fn contains(&self, key: ComponentTypeId) -> bool {
        self.find(key).is_some()
    }

    /// Insert `pool` under `key`, replacing any existing pool for that key.
    pub fn insert(&mut self, key: ComponentTypeId, pool: Box<dyn ErasedPool>) {
        if (self.len + 1) as f32 / self.buckets.len() as f32 > MAX_LOAD {
            self.rehash(self.buckets.len() * 2);
        }
        self.insert_bucket(Bucket {
            hash: key.hash_u64(),
            key,
            pool,
        });
    }

    /// The pool registered under `key`, if any.
    pub fn get(&self, key: ComponentTypeId) -> Option<&dyn ErasedPool> {
        let index = self.find(key)?;
        self.buckets[index].as_ref().map(|bucket| bucket.pool.as_ref())
    }

    /// The pool registered under `key`, mutable, if any.
    pub fn get_mut(&mut self, key: ComponentTypeId) -> Option<&mut dyn ErasedPool> {
        let index = self.find(key)?;
        self.buckets[index].as_mut().map(|bucket| bucket.pool.as_mut())
    }

    /// Visit every pool exactly once, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ErasedPool> {
        self.buckets
            .iter()
            .flatten()
            .map(|bucket| bucket.pool.as_ref())
    }

    /// Visit every pool exactly once, mutable. This is the destroy cascade's
    /// path.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn ErasedPool> + '_ {
        self.buckets
            .iter_mut()
            .flatten()
            .map(|bucket| bucket.pool.as_mut())
    }

    /// The keys of every stored pool, in bucket order.
    pub fn keys(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.buckets.iter().flatten().map(|bucket| bucket.key)
    }

    /// Probe for `key`, returning its bucket index.
    ///
    /// Terminates on an empty slot or once the probe distance exceeds the
    /// bucket count; either way the key is absent.
    fn find(&self, key: ComponentTypeId) -> Option<usize> {
        let capacity = self.buckets.len();
        let mask = capacity - 1;
        let hash = key.hash_u64();
        let mut index = hash as usize & mask;
        let mut dist = 0;
        loop {
            match &self.buckets[index] {
                None => return None,
                Some(bucket) if bucket.key == key => return Some(index),
                Some(_) => {}
            }
            dist += 1;
            if dist > capacity {
                return None;
            }
            index = (index + 1) & mask;
        }
    }

    /// Robin-hood insertion of a prepared bucket. The load factor must
    /// already have been honored by the caller.
    fn insert_bucket(&mut self, mut incoming: Bucket) {
        let mask = self.buckets.len() - 1;
        let mut index = incoming.hash as usize & mask;
        let mut dist = 0;
        loop {
            match &mut self.buckets[index] {
                slot @ None => {
                    *slot = Some(incoming);
                    self.len += 1;
                    return;
                }
                Some(resident) if resident.key == incoming.key => {
                    resident.pool = incoming.pool;
                    return;
                }
                Some(resident) => {
                    // A resident that probed less far than the candidate
                    // yields its slot and probes onward itself.
                    let resident_dist = distance(resident.hash, index, mask);
                    if resident_dist < dist {
                        std::mem::swap(resident, &mut incoming);
                        dist = resident_dist;
                    }
                }
            }
            index = (index + 1) & mask;
            dist += 1;
        }
    }

    /// Double the table and reinsert every bucket.
    fn rehash(&mut self, new_capacity: usize) {
        trace!(
            from = self.buckets.len(),
            to = new_capacity,
            pools = self.len,
            "pool map rehash"
        );
        let old = std::mem::replace(
            &mut self.buckets,
            std::iter::repeat_with(|| None).take(new_capacity).collect(),
        );
        self.len = 0;
        for bucket in old.into_iter().flatten() {
            self.insert_bucket(bucket);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;

    /// Distinct zero-sized component types for keying the map.
    struct Marker<const N: usize>;

    fn key<const N: usize>() -> ComponentTypeId {
        ComponentTypeId::of::<Marker<N>>()
    }

    fn pool<const N: usize>() -> Box<dyn ErasedPool> {
        Box::new(Pool::<Marker<N>>::new())
    }

    /// Robin-hood structural checks: every occupied bucket is reachable from
    /// its ideal slot through occupied buckets, and probe distances along a
    /// run grow by at most one per step.
    fn assert_probe_invariants(map: &PoolMap) {
        let capacity = map.buckets.len();
        let mask = capacity - 1;
        for (index, slot) in map.buckets.iter().enumerate() {
            let Some(bucket) = slot else { continue };
            let dist = distance(bucket.hash, index, mask);
            for back in 1..=dist {
                let chain = index.wrapping_sub(back) & mask;
                assert!(
                    map.buckets[chain].is_some(),
                    "hole inside the probe chain of {:?}",
                    bucket.key
                );
            }
            let prev = index.wrapping_sub(1) & mask;
            if let Some(prev_bucket) = &map.buckets[prev] {
                let prev_dist = distance(prev_bucket.hash, prev, mask);
                assert!(dist <= prev_dist + 1, "probe distance jumped at {index}");
            }
        }
    }

    #[test]
    fn starts_at_initial_capacity() {
        let map = PoolMap::new();
        assert_eq!(map.capacity(), 16);
        assert!(map.is_empty());
    }

    #[test]
    fn insert_then_get() {
        let mut map = PoolMap::new();
        map.insert(key::<0>(), pool::<0>());
        map.insert(key::<1>(), pool::<1>());

        assert!(map.get(key::<0>()).is_some());
        assert!(map.get(key::<1>()).is_some());
        assert!(map.get(key::<2>()).is_none());
        assert_eq!(map.len(), 2);
        assert_probe_invariants(&map);
    }

    #[test]
    fn insert_same_key_overwrites() {
        let mut map = PoolMap::new();
        map.insert(key::<0>(), pool::<0>());
        map.insert(key::<0>(), pool::<0>());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn typed_pools_survive_erasure() {
        let mut map = PoolMap::new();
        map.insert(key::<3>(), pool::<3>());

        let erased = map.get_mut(key::<3>()).expect("pool present");
        let typed = erased
            .downcast_mut::<Pool<Marker<3>>>()
            .expect("downcast to the registered type");
        typed.insert(7, Marker::<3>);

        assert!(map.get(key::<3>()).is_some_and(|p| p.contains(7)));
    }

    #[test]
    fn thirteen_pools_trigger_exactly_one_rehash() {
        let mut map = PoolMap::new();
        let entries: Vec<(ComponentTypeId, Box<dyn ErasedPool>)> = vec![
            (key::<0>(), pool::<0>()),
            (key::<1>(), pool::<1>()),
            (key::<2>(), pool::<2>()),
            (key::<3>(), pool::<3>()),
            (key::<4>(), pool::<4>()),
            (key::<5>(), pool::<5>()),
            (key::<6>(), pool::<6>()),
            (key::<7>(), pool::<7>()),
            (key::<8>(), pool::<8>()),
            (key::<9>(), pool::<9>()),
            (key::<10>(), pool::<10>()),
            (key::<11>(), pool::<11>()),
            (key::<12>(), pool::<12>()),
        ];
        let keys: Vec<ComponentTypeId> = entries.iter().map(|(k, _)| *k).collect();

        for (key, pool) in entries {
            map.insert(key, pool);
        }

        // 13 pools push past 0.7 * 16 once: a single doubling, then headroom.
        assert_eq!(map.len(), 13);
        assert_eq!(map.capacity(), 32);
        for key in keys {
            assert!(map.get(key).is_some(), "lost {key} across the rehash");
        }
        assert_probe_invariants(&map);
    }

    #[test]
    fn iter_visits_every_pool_once() {
        let mut map = PoolMap::new();
        map.insert(key::<0>(), pool::<0>());
        map.insert(key::<1>(), pool::<1>());
        map.insert(key::<2>(), pool::<2>());

        assert_eq!(map.iter().count(), 3);
        assert_eq!(map.keys().count(), 3);

        let mut seen: Vec<String> = map.keys().map(|k| k.name().to_owned()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }
}
