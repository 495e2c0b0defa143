//! Strata ECS -- a sparse-set entity-component registry.
//!
//! Entities are bare 32-bit ids handed out by a generational allocator.
//! Each component type lives in its own [`Pool`](pool::Pool), a sparse set
//! pairing O(1) membership with a tightly packed value array, and pools are
//! owned type-erased by a robin-hood hash table keyed on the component's
//! runtime type. Views iterate the intersection of several pools by walking
//! the smallest one and filtering the rest.
//!
//! The registry is single-threaded and entirely self-contained: multiple
//! registries coexist without any shared state. References returned by
//! `get`, `try_get`, or a view callback are valid only until the next
//! mutating call on the same pool.
//!
//! # Quick Start
//!
//! ```
//! use strata_ecs::prelude::*;
//!
//! struct Position { x: f32, y: f32 }
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut registry = Registry::new();
//!
//! let e = registry.create();
//! registry.add(e, Position { x: 0.0, y: 0.0 });
//! registry.add(e, Velocity { dx: 1.0, dy: 2.0 });
//!
//! registry.view::<(Position, Velocity)>().each(|_entity, pos, vel| {
//!     pos.x += vel.dx;
//!     pos.y += vel.dy;
//! });
//!
//! assert_eq!(registry.get::<Position>(e).x, 1.0);
//! registry.destroy(e);
//! assert!(!registry.has::<Position>(e));
//! ```

#![deny(unsafe_code)]

pub mod buffer;
pub mod component;
pub mod components;
pub mod entity;
pub mod pool;
pub mod pool_map;
pub mod registry;
pub mod sparse;
#[allow(unsafe_code)]
pub mod view;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::buffer::Buffer;
    pub use crate::component::{Component, ComponentTypeId};
    pub use crate::components::Components;
    pub use crate::entity::{Entity, EntityAllocator, INVALID_ENTITY};
    pub use crate::pool::{ErasedPool, Pool};
    pub use crate::registry::Registry;
    pub use crate::sparse::SparseSet;
    pub use crate::view::{View, ViewSet};
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
