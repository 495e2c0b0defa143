//! Views: iteration over the intersection of several component pools.
//!
//! A [`View`] is built from a tuple of component types,
//! `registry.view::<(Pos, Vel)>()`. It walks the packed entity list of the
//! *smallest* participating pool and filters each candidate against the
//! remaining pools, so the cost is `O(n_min * (k - 1))` membership probes.
//! If any requested pool has never been materialised, the view is empty.
//!
//! ## Soundness
//!
//! [`View::each`] hands the callback one mutable reference per pool. A view
//! holds the registry's `&mut` for its whole lifetime, so nothing else can
//! touch the pools during a traversal, and the callback itself has no path
//! back to the registry -- the "no structural mutation during traversal"
//! contract is enforced by the borrow checker rather than at runtime. The
//! pools of a view are pairwise distinct (duplicate component types are
//! rejected at construction), so the per-pool references never alias.

use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};

use crate::component::{Component, ComponentTypeId};
use crate::components::Components;
use crate::entity::Entity;
use crate::pool::Pool;

// ---------------------------------------------------------------------------
// ViewSet -- a tuple of component types usable as a view
// ---------------------------------------------------------------------------

/// Trait for tuples of component types accepted by
/// [`Registry::view`](crate::registry::Registry::view). Implemented for
/// tuples of arity 1 through 4.
pub trait ViewSet {
    /// The component type ids, in tuple order.
    fn type_ids() -> SmallVec<[ComponentTypeId; 4]>;

    /// The entities holding every component in the tuple, in driving-pool
    /// order.
    fn entities(components: &Components) -> Vec<Entity>;
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A lazy query over the entities that hold every component type in `Q`.
pub struct View<'w, Q: ViewSet> {
    components: &'w mut Components,
    _marker: PhantomData<fn() -> Q>,
}

impl<'w, Q: ViewSet> View<'w, Q> {
    /// Build a view, verifying that no component type appears twice.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate component type in `Q`: the same pool cannot be
    /// borrowed mutably more than once per entity.
    pub(crate) fn new(components: &'w mut Components) -> Self {
        let ids = Q::type_ids();
        for (index, id) in ids.iter().enumerate() {
            if ids[..index].contains(id) {
                panic!("view contains duplicate component type {id}");
            }
        }
        Self {
            components,
            _marker: PhantomData,
        }
    }

    /// Iterate the entities in the intersection.
    ///
    /// Yields each matching entity exactly once, in the driving pool's packed
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> {
        Q::entities(self.components).into_iter()
    }

    /// Number of entities in the intersection.
    pub fn count(&self) -> usize {
        Q::entities(self.components).len()
    }
}

// ---------------------------------------------------------------------------
// Arity 1
// ---------------------------------------------------------------------------

impl<A: Component> ViewSet for (A,) {
    fn type_ids() -> SmallVec<[ComponentTypeId; 4]> {
        smallvec![ComponentTypeId::of::<A>()]
    }

    fn entities(components: &Components) -> Vec<Entity> {
        match components.pool::<A>() {
            Some(pool) => pool.entities().to_vec(),
            None => Vec::new(),
        }
    }
}

impl<'w, A: Component> View<'w, (A,)> {
    /// Invoke `f` with each entity and its component.
    pub fn each(&mut self, mut f: impl FnMut(Entity, &mut A)) {
        let Some(pool) = self.components.pool_mut::<A>() else {
            return;
        };
        for index in 0..pool.len() {
            let entity = pool.entities()[index];
            let Some(a) = pool.get_mut(entity) else {
                unreachable!("packed entity {entity} missing from its own pool");
            };
            f(entity, a);
        }
    }
}

// ---------------------------------------------------------------------------
// Arity 2
// ---------------------------------------------------------------------------

impl<A: Component, B: Component> ViewSet for (A, B) {
    fn type_ids() -> SmallVec<[ComponentTypeId; 4]> {
        smallvec![ComponentTypeId::of::<A>(), ComponentTypeId::of::<B>()]
    }

    fn entities(components: &Components) -> Vec<Entity> {
        let (Some(pa), Some(pb)) = (components.pool::<A>(), components.pool::<B>()) else {
            return Vec::new();
        };
        if pa.len() <= pb.len() {
            pa.entities()
                .iter()
                .copied()
                .filter(|&e| pb.contains(e))
                .collect()
        } else {
            pb.entities()
                .iter()
                .copied()
                .filter(|&e| pa.contains(e))
                .collect()
        }
    }
}

impl<'w, A: Component, B: Component> View<'w, (A, B)> {
    /// Invoke `f` with each matching entity and its components.
    pub fn each(&mut self, mut f: impl FnMut(Entity, &mut A, &mut B)) {
        let pa: *mut Pool<A> = match self.components.pool_mut::<A>() {
            Some(pool) => pool,
            None => return,
        };
        let pb: *mut Pool<B> = match self.components.pool_mut::<B>() {
            Some(pool) => pool,
            None => return,
        };
        // Safety: the pools are distinct boxed allocations (duplicate types
        // are rejected in `View::new`) and stay exactly where they are for
        // the whole traversal, because this view exclusively borrows the
        // registry. Each pool is borrowed mutably for one entity at a time.
        unsafe {
            if (*pa).len() <= (*pb).len() {
                for index in 0..(*pa).len() {
                    let entity = (*pa).entities()[index];
                    if !(*pb).contains(entity) {
                        continue;
                    }
                    let (Some(a), Some(b)) = ((*pa).get_mut(entity), (*pb).get_mut(entity))
                    else {
                        unreachable!("membership of {entity} verified above");
                    };
                    f(entity, a, b);
                }
            } else {
                for index in 0..(*pb).len() {
                    let entity = (*pb).entities()[index];
                    if !(*pa).contains(entity) {
                        continue;
                    }
                    let (Some(a), Some(b)) = ((*pa).get_mut(entity), (*pb).get_mut(entity))
                    else {
                        unreachable!("membership of {entity} verified above");
                    };
                    f(entity, a, b);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Arity 3
// ---------------------------------------------------------------------------

impl<A: Component, B: Component, C: Component> ViewSet for (A, B, C) {
    fn type_ids() -> SmallVec<[ComponentTypeId; 4]> {
        smallvec![
            ComponentTypeId::of::<A>(),
            ComponentTypeId::of::<B>(),
            ComponentTypeId::of::<C>(),
        ]
    }

    fn entities(components: &Components) -> Vec<Entity> {
        let (Some(pa), Some(pb), Some(pc)) = (
            components.pool::<A>(),
            components.pool::<B>(),
            components.pool::<C>(),
        ) else {
            return Vec::new();
        };
        let (la, lb, lc) = (pa.len(), pb.len(), pc.len());
        if la <= lb && la <= lc {
            pa.entities()
                .iter()
                .copied()
                .filter(|&e| pb.contains(e) && pc.contains(e))
                .collect()
        } else if lb <= lc {
            pb.entities()
                .iter()
                .copied()
                .filter(|&e| pa.contains(e) && pc.contains(e))
                .collect()
        } else {
            pc.entities()
                .iter()
                .copied()
                .filter(|&e| pa.contains(e) && pb.contains(e))
                .collect()
        }
    }
}

impl<'w, A: Component, B: Component, C: Component> View<'w, (A, B, C)> {
    /// Invoke `f` with each matching entity and its components.
    pub fn each(&mut self, mut f: impl FnMut(Entity, &mut A, &mut B, &mut C)) {
        let pa: *mut Pool<A> = match self.components.pool_mut::<A>() {
            Some(pool) => pool,
            None => return,
        };
        let pb: *mut Pool<B> = match self.components.pool_mut::<B>() {
            Some(pool) => pool,
            None => return,
        };
        let pc: *mut Pool<C> = match self.components.pool_mut::<C>() {
            Some(pool) => pool,
            None => return,
        };
        // Safety: see the arity-2 `each`; the same argument covers any number
        // of pairwise-distinct pools.
        unsafe {
            let (la, lb, lc) = ((*pa).len(), (*pb).len(), (*pc).len());
            if la <= lb && la <= lc {
                for index in 0..la {
                    let entity = (*pa).entities()[index];
                    if !((*pb).contains(entity) && (*pc).contains(entity)) {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc);
                }
            } else if lb <= lc {
                for index in 0..lb {
                    let entity = (*pb).entities()[index];
                    if !((*pa).contains(entity) && (*pc).contains(entity)) {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc);
                }
            } else {
                for index in 0..lc {
                    let entity = (*pc).entities()[index];
                    if !((*pa).contains(entity) && (*pb).contains(entity)) {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc);
                }
            }
        }
    }

    /// Shared tail of the three driver branches.
    ///
    /// # Safety
    ///
    /// The pools must be distinct, live, and all contain `entity`.
    unsafe fn invoke(
        f: &mut impl FnMut(Entity, &mut A, &mut B, &mut C),
        entity: Entity,
        pa: *mut Pool<A>,
        pb: *mut Pool<B>,
        pc: *mut Pool<C>,
    ) {
        let (Some(a), Some(b), Some(c)) = (
            (*pa).get_mut(entity),
            (*pb).get_mut(entity),
            (*pc).get_mut(entity),
        ) else {
            unreachable!("membership of {entity} verified by the caller");
        };
        f(entity, a, b, c);
    }
}

// ---------------------------------------------------------------------------
// Arity 4
// ---------------------------------------------------------------------------

impl<A: Component, B: Component, C: Component, D: Component> ViewSet for (A, B, C, D) {
    fn type_ids() -> SmallVec<[ComponentTypeId; 4]> {
        smallvec![
            ComponentTypeId::of::<A>(),
            ComponentTypeId::of::<B>(),
            ComponentTypeId::of::<C>(),
            ComponentTypeId::of::<D>(),
        ]
    }

    fn entities(components: &Components) -> Vec<Entity> {
        let (Some(pa), Some(pb), Some(pc), Some(pd)) = (
            components.pool::<A>(),
            components.pool::<B>(),
            components.pool::<C>(),
            components.pool::<D>(),
        ) else {
            return Vec::new();
        };
        let (la, lb, lc, ld) = (pa.len(), pb.len(), pc.len(), pd.len());
        if la <= lb && la <= lc && la <= ld {
            pa.entities()
                .iter()
                .copied()
                .filter(|&e| pb.contains(e) && pc.contains(e) && pd.contains(e))
                .collect()
        } else if lb <= lc && lb <= ld {
            pb.entities()
                .iter()
                .copied()
                .filter(|&e| pa.contains(e) && pc.contains(e) && pd.contains(e))
                .collect()
        } else if lc <= ld {
            pc.entities()
                .iter()
                .copied()
                .filter(|&e| pa.contains(e) && pb.contains(e) && pd.contains(e))
                .collect()
        } else {
            pd.entities()
                .iter()
                .copied()
                .filter(|&e| pa.contains(e) && pb.contains(e) && pc.contains(e))
                .collect()
        }
    }
}

impl<'w, A: Component, B: Component, C: Component, D: Component> View<'w, (A, B, C, D)> {
    /// Invoke `f` with each matching entity and its components.
    pub fn each(&mut self, mut f: impl FnMut(Entity, &mut A, &mut B, &mut C, &mut D)) {
        let pa: *mut Pool<A> = match self.components.pool_mut::<A>() {
            Some(pool) => pool,
            None => return,
        };
        let pb: *mut Pool<B> = match self.components.pool_mut::<B>() {
            Some(pool) => pool,
            None => return,
        };
        let pc: *mut Pool<C> = match self.components.pool_mut::<C>() {
            Some(pool) => pool,
            None => return,
        };
        let pd: *mut Pool<D> = match self.components.pool_mut::<D>() {
            Some(pool) => pool,
            None => return,
        };
        // Safety: see the arity-2 `each`.
        unsafe {
            let (la, lb, lc, ld) = ((*pa).len(), (*pb).len(), (*pc).len(), (*pd).len());
            if la <= lb && la <= lc && la <= ld {
                for index in 0..la {
                    let entity = (*pa).entities()[index];
                    if !((*pb).contains(entity) && (*pc).contains(entity) && (*pd).contains(entity))
                    {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc, pd);
                }
            } else if lb <= lc && lb <= ld {
                for index in 0..lb {
                    let entity = (*pb).entities()[index];
                    if !((*pa).contains(entity) && (*pc).contains(entity) && (*pd).contains(entity))
                    {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc, pd);
                }
            } else if lc <= ld {
                for index in 0..lc {
                    let entity = (*pc).entities()[index];
                    if !((*pa).contains(entity) && (*pb).contains(entity) && (*pd).contains(entity))
                    {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc, pd);
                }
            } else {
                for index in 0..ld {
                    let entity = (*pd).entities()[index];
                    if !((*pa).contains(entity) && (*pb).contains(entity) && (*pc).contains(entity))
                    {
                        continue;
                    }
                    Self::invoke(&mut f, entity, pa, pb, pc, pd);
                }
            }
        }
    }

    /// Shared tail of the four driver branches.
    ///
    /// # Safety
    ///
    /// The pools must be distinct, live, and all contain `entity`.
    unsafe fn invoke(
        f: &mut impl FnMut(Entity, &mut A, &mut B, &mut C, &mut D),
        entity: Entity,
        pa: *mut Pool<A>,
        pb: *mut Pool<B>,
        pc: *mut Pool<C>,
        pd: *mut Pool<D>,
    ) {
        let (Some(a), Some(b), Some(c), Some(d)) = (
            (*pa).get_mut(entity),
            (*pb).get_mut(entity),
            (*pc).get_mut(entity),
            (*pd).get_mut(entity),
        ) else {
            unreachable!("membership of {entity} verified by the caller");
        };
        f(entity, a, b, c, d);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::registry::Registry;

    #[derive(Debug, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Vel {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Hp(u32);

    struct Tag;

    #[test]
    fn intersection_of_two_pools() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        let c = registry.create();
        registry.add(a, Pos { x: 0.0, y: 0.0 });
        registry.add(a, Vel { dx: 1.0, dy: 0.0 });
        registry.add(b, Pos { x: 1.0, y: 0.0 });
        registry.add(c, Pos { x: 2.0, y: 0.0 });
        registry.add(c, Vel { dx: 0.0, dy: 1.0 });

        let mut matched: Vec<_> = registry.view::<(Pos, Vel)>().iter().collect();
        matched.sort();
        assert_eq!(matched, vec![a, c]);

        // The same set regardless of the tuple order.
        let mut flipped: Vec<_> = registry.view::<(Vel, Pos)>().iter().collect();
        flipped.sort();
        assert_eq!(flipped, vec![a, c]);
    }

    #[test]
    fn missing_pool_makes_the_view_empty() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Pos { x: 0.0, y: 0.0 });

        assert_eq!(registry.view::<(Pos, Vel)>().iter().count(), 0);
        let mut calls = 0;
        registry.view::<(Pos, Vel)>().each(|_, _, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn smallest_pool_drives_iteration_order() {
        let mut registry = Registry::new();
        let entities: Vec<_> = (0..100).map(|_| registry.create()).collect();
        for &e in &entities {
            registry.add(e, Pos { x: 0.0, y: 0.0 });
        }
        // Velocity insertion order deliberately differs from creation order.
        registry.add(entities[50], Vel { dx: 0.0, dy: 0.0 });
        registry.add(entities[10], Vel { dx: 0.0, dy: 0.0 });

        let matched: Vec<_> = registry.view::<(Pos, Vel)>().iter().collect();
        assert_eq!(matched, vec![entities[50], entities[10]]);
    }

    #[test]
    fn each_mutates_through_the_references() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Pos { x: 0.0, y: 0.0 });
        registry.add(e, Vel { dx: 1.0, dy: 2.0 });

        registry.view::<(Pos, Vel)>().each(|_entity, pos, vel| {
            pos.x += vel.dx;
            pos.y += vel.dy;
        });

        assert_eq!(*registry.get::<Pos>(e), Pos { x: 1.0, y: 2.0 });
    }

    #[test]
    fn each_passes_the_matching_entity() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        registry.add(a, Hp(1));
        registry.add(b, Hp(2));

        let mut seen = Vec::new();
        registry.view::<(Hp,)>().each(|entity, hp| {
            seen.push((entity, hp.0));
        });
        assert_eq!(seen, vec![(a, 1), (b, 2)]);
    }

    #[test]
    fn three_pool_intersection() {
        let mut registry = Registry::new();
        let full = registry.create();
        let partial = registry.create();
        registry.add(full, Pos { x: 0.0, y: 0.0 });
        registry.add(full, Vel { dx: 0.0, dy: 0.0 });
        registry.add(full, Hp(10));
        registry.add(partial, Pos { x: 0.0, y: 0.0 });
        registry.add(partial, Hp(5));

        let matched: Vec<_> = registry.view::<(Pos, Vel, Hp)>().iter().collect();
        assert_eq!(matched, vec![full]);

        let mut calls = 0;
        registry.view::<(Pos, Vel, Hp)>().each(|entity, _, _, hp| {
            assert_eq!(entity, full);
            assert_eq!(hp.0, 10);
            calls += 1;
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn four_pool_intersection() {
        let mut registry = Registry::new();
        let full = registry.create();
        registry.add(full, Pos { x: 0.0, y: 0.0 });
        registry.add(full, Vel { dx: 0.0, dy: 0.0 });
        registry.add(full, Hp(1));
        registry.add(full, Tag);

        for _ in 0..3 {
            let e = registry.create();
            registry.add(e, Pos { x: 0.0, y: 0.0 });
            registry.add(e, Vel { dx: 0.0, dy: 0.0 });
        }

        let matched: Vec<_> = registry.view::<(Pos, Vel, Hp, Tag)>().iter().collect();
        assert_eq!(matched, vec![full]);
    }

    #[test]
    fn removal_shrinks_the_view() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        for &e in &[a, b] {
            registry.add(e, Pos { x: 0.0, y: 0.0 });
            registry.add(e, Vel { dx: 0.0, dy: 0.0 });
        }
        assert_eq!(registry.view::<(Pos, Vel)>().count(), 2);

        registry.remove::<Vel>(a);
        let matched: Vec<_> = registry.view::<(Pos, Vel)>().iter().collect();
        assert_eq!(matched, vec![b]);
    }

    #[test]
    #[should_panic(expected = "duplicate component type")]
    fn duplicate_component_types_are_rejected() {
        let mut registry = Registry::new();
        registry.view::<(Pos, Pos)>();
    }
}
