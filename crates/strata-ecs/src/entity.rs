//! Entity identifiers and allocation.
//!
//! An [`Entity`] is a bare 32-bit index. The allocator keeps a parallel
//! *generation* counter per slot so that successive reuses of the same index
//! can be told apart through [`EntityAllocator::generation`]; the component
//! API itself deliberately accepts raw ids without a generation check.
//!
//! Destroyed ids go onto a LIFO free list and are handed out again by the
//! next [`EntityAllocator::create`], with the slot's generation bumped
//! exactly once per reuse.

use crate::buffer::Buffer;

/// A lightweight entity identifier: an index into the allocator's slots.
pub type Entity = u32;

/// Reserved id that never names a live entity.
pub const INVALID_ENTITY: Entity = Entity::MAX;

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`Entity`] ids with generational tracking.
///
/// Ids are dense: the allocator never leaves holes. Freed ids are reused
/// most-recently-destroyed first.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation of each slot. Bumped on reuse, saturating.
    generations: Buffer<u32>,
    /// Whether the slot is currently alive.
    alive: Buffer<bool>,
    /// Destroyed ids awaiting reuse (LIFO).
    free: Buffer<Entity>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an entity id.
    ///
    /// Pops the free list if possible, bumping the slot's generation;
    /// otherwise extends the slot arrays with a fresh id at generation 0.
    pub fn create(&mut self) -> Entity {
        if let Some(id) = self.free.pop() {
            let slot = id as usize;
            let generation = self.generations[slot].saturating_add(1);
            self.generations[slot] = generation;
            self.alive[slot] = true;
            return id;
        }

        let id = self.generations.len() as Entity;
        assert!(id != INVALID_ENTITY, "entity id space exhausted");
        self.generations.push(0);
        self.alive.push(true);
        id
    }

    /// Whether `entity` names a currently live slot.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity as usize;
        slot < self.generations.len() && self.alive[slot]
    }

    /// Destroy `entity`, pushing its id onto the free list.
    ///
    /// Destroying a dead or never-allocated id is a no-op.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            return;
        }
        self.alive[entity as usize] = false;
        self.free.push(entity);
    }

    /// The generation of `entity`'s slot, or 0 when the slot has never been
    /// allocated.
    #[inline]
    pub fn generation(&self, entity: Entity) -> u32 {
        self.generations.get(entity as usize).copied().unwrap_or(0)
    }

    /// Number of currently live entities.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&alive| alive).count()
    }

    /// Number of slots that have ever been allocated.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.generations.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_unique_dense_ids() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<Entity> = (0..100).map(|_| alloc.create()).collect();
        for (expected, id) in ids.iter().enumerate() {
            assert_eq!(*id, expected as Entity);
        }
        assert_eq!(alloc.alive_count(), 100);
    }

    #[test]
    fn reuses_most_recently_destroyed_id() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.create();
        let e1 = alloc.create();
        alloc.destroy(e0);
        alloc.destroy(e1);
        // LIFO: e1 comes back first.
        assert_eq!(alloc.create(), e1);
        assert_eq!(alloc.create(), e0);
    }

    #[test]
    fn generation_bumps_exactly_once_per_reuse() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.create();
        assert_eq!(alloc.generation(e), 0);
        alloc.destroy(e);
        // Bump happens on reuse, not on destroy.
        assert_eq!(alloc.generation(e), 0);
        let reused = alloc.create();
        assert_eq!(reused, e);
        assert_eq!(alloc.generation(e), 1);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.create();
        alloc.destroy(e);
        alloc.destroy(e);
        // A double destroy must not put the id on the free list twice.
        let r0 = alloc.create();
        let r1 = alloc.create();
        assert_eq!(r0, e);
        assert_ne!(r1, e);
    }

    #[test]
    fn destroy_of_unallocated_id_is_noop() {
        let mut alloc = EntityAllocator::new();
        alloc.destroy(12345);
        assert_eq!(alloc.slot_count(), 0);
        assert_eq!(alloc.create(), 0);
    }

    #[test]
    fn generation_of_unallocated_slot_is_zero() {
        let alloc = EntityAllocator::new();
        assert_eq!(alloc.generation(7), 0);
    }

    #[test]
    fn liveness_tracks_lifecycle() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.create();
        assert!(alloc.is_alive(e));
        alloc.destroy(e);
        assert!(!alloc.is_alive(e));
        let reused = alloc.create();
        assert_eq!(reused, e);
        assert!(alloc.is_alive(e));
    }
}
