//! The registry façade: entity lifecycle plus component access in one place.
//!
//! A [`Registry`] owns an [`EntityAllocator`] and a [`Components`] manager.
//! Destroying an entity first cascades through every pool (so no component
//! outlives its owner) and only then releases the id for reuse.
//!
//! The component API is keyed by the raw 32-bit id and performs no
//! generation check: after a destroy and a reuse, calls made with the old id
//! apply to the slot's current incarnation. Callers that need staleness
//! detection can compare [`Registry::generation`] snapshots.

use std::any::type_name;

use crate::component::Component;
use crate::components::Components;
use crate::entity::{Entity, EntityAllocator};
use crate::view::{View, ViewSet};

/// The top-level container: allocator, pools, and the public API.
#[derive(Default)]
pub struct Registry {
    entities: EntityAllocator,
    components: Components,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Allocate a new entity.
    pub fn create(&mut self) -> Entity {
        self.entities.create()
    }

    /// Destroy `entity`: detach every component it owns, then release the id.
    ///
    /// The cascade runs first so component storage never refers to a released
    /// id. Destroying a dead entity is a no-op.
    pub fn destroy(&mut self, entity: Entity) {
        self.components.remove_all(entity);
        self.entities.destroy(entity);
    }

    /// Whether `entity` names a currently live slot.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// The generation of `entity`'s slot (0 for never-allocated slots).
    #[inline]
    pub fn generation(&self, entity: Entity) -> u32 {
        self.entities.generation(entity)
    }

    /// Number of currently live entities.
    pub fn alive_count(&self) -> usize {
        self.entities.alive_count()
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, overwriting any existing `T`.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) {
        self.components.add(entity, value);
    }

    /// Attach the value produced by `build` to `entity`, overwriting any
    /// existing `T`.
    pub fn emplace<T: Component>(&mut self, entity: Entity, build: impl FnOnce() -> T) {
        self.components.emplace(entity, build);
    }

    /// Detach `entity`'s `T`. Removing an absent component is a no-op.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.components.remove::<T>(entity);
    }

    /// Whether `entity` has a `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.components.has::<T>(entity)
    }

    /// Mutable reference to `entity`'s `T`.
    ///
    /// The reference is valid only until the next mutating call on the same
    /// pool.
    ///
    /// # Panics
    ///
    /// Panics when the component is absent; that is a caller bug, not a
    /// runtime condition. Use [`try_get`](Self::try_get) when absence is
    /// expected.
    pub fn get<T: Component>(&mut self, entity: Entity) -> &mut T {
        match self.components.get_mut::<T>(entity) {
            Some(component) => component,
            None => panic!("entity {entity} has no {} component", type_name::<T>()),
        }
    }

    /// Mutable reference to `entity`'s `T`, or `None` when absent.
    pub fn try_get<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    // -- views --------------------------------------------------------------

    /// A view over every entity holding all of the component types in `Q`.
    ///
    /// ```
    /// use strata_ecs::prelude::*;
    ///
    /// struct Pos(f32);
    /// struct Vel(f32);
    ///
    /// let mut registry = Registry::new();
    /// let e = registry.create();
    /// registry.add(e, Pos(0.0));
    /// registry.add(e, Vel(2.0));
    ///
    /// registry.view::<(Pos, Vel)>().each(|_entity, pos, vel| {
    ///     pos.0 += vel.0;
    /// });
    /// assert_eq!(registry.get::<Pos>(e).0, 2.0);
    /// ```
    pub fn view<Q: ViewSet>(&mut self) -> View<'_, Q> {
        View::new(&mut self.components)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
