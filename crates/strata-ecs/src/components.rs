//! The component manager: resolves component types to their pools.
//!
//! [`Components`] owns the [`PoolMap`] and is the only place that creates
//! pools. A pool is materialised lazily the first time its component type is
//! written; reads against a type that has never been written simply report
//! absence.

use tracing::trace;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::pool::Pool;
use crate::pool_map::PoolMap;

/// Owns one pool per component type and forwards typed operations to them.
#[derive(Default)]
pub struct Components {
    pools: PoolMap,
}

impl Components {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            pools: PoolMap::new(),
        }
    }

    /// The pool for `T`, if it has ever been materialised.
    pub fn pool<T: Component>(&self) -> Option<&Pool<T>> {
        let erased = self.pools.get(ComponentTypeId::of::<T>())?;
        match erased.downcast_ref::<Pool<T>>() {
            Some(pool) => Some(pool),
            None => unreachable!("pool keyed by {} holds another type", ComponentTypeId::of::<T>()),
        }
    }

    /// The pool for `T`, mutable, if it has ever been materialised.
    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut Pool<T>> {
        let erased = self.pools.get_mut(ComponentTypeId::of::<T>())?;
        match erased.downcast_mut::<Pool<T>>() {
            Some(pool) => Some(pool),
            None => unreachable!("pool keyed by {} holds another type", ComponentTypeId::of::<T>()),
        }
    }

    /// The pool for `T`, creating it when absent.
    pub fn pool_or_insert<T: Component>(&mut self) -> &mut Pool<T> {
        let key = ComponentTypeId::of::<T>();
        if !self.pools.contains(key) {
            trace!(component = %key, "created component pool");
            self.pools.insert(key, Box::new(Pool::<T>::new()));
        }
        match self.pool_mut::<T>() {
            Some(pool) => pool,
            None => unreachable!("pool for {key} inserted above"),
        }
    }

    /// Attach `value` to `entity`, overwriting any existing `T`.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) {
        self.pool_or_insert::<T>().insert(entity, value);
    }

    /// Attach the value produced by `build` to `entity`, overwriting any
    /// existing `T`.
    pub fn emplace<T: Component>(&mut self, entity: Entity, build: impl FnOnce() -> T) {
        self.pool_or_insert::<T>().insert_with(entity, build);
    }

    /// Detach `entity`'s `T`. A missing pool or component is a no-op.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        if let Some(pool) = self.pool_mut::<T>() {
            pool.remove(entity);
        }
    }

    /// Whether `entity` has a `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Mutable reference to `entity`'s `T`, or `None` when either the pool or
    /// the component is absent.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// Number of stored components of type `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.pool::<T>().map_or(0, Pool::len)
    }

    /// Number of materialised pools.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Detach every component owned by `entity`, across all pools.
    ///
    /// This is the destroy cascade: it walks every occupied bucket through
    /// the erased interface, so no component type needs to be known here.
    pub fn remove_all(&mut self, entity: Entity) {
        for pool in self.pools.iter_mut() {
            pool.remove(entity);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
