//! Signature queries over the component store.
//!
//! A query names the components an entity must hold (`Q`, a tuple of `&T`)
//! and an optional filter (`F`) on components that are checked but not
//! fetched, such as tag markers:
//!
//! ```
//! use breakout_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Pos(f32);
//! #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Frozen;
//!
//! let mut world = World::new();
//! world.register_component::<Pos>("pos");
//! world.register_component::<Frozen>("frozen");
//! world.spawn_bundle(ComponentBundle::new().with(Pos(1.0))).unwrap();
//! world.spawn_bundle(ComponentBundle::new().with(Pos(2.0)).with(Frozen)).unwrap();
//!
//! let moving: Vec<f32> = world
//!     .query_filtered::<(&Pos,), Without<Frozen>>()
//!     .map(|(_, (p,))| p.0)
//!     .collect();
//! assert_eq!(moving, vec![1.0]);
//! ```
//!
//! Only live, enabled, non-prefab entities match. Iteration runs in
//! ascending slot order, so repeated runs over the same world visit entities
//! in the same sequence.

use std::marker::PhantomData;

use crate::component::Component;
use crate::entity::EntityId;
use crate::world::World;
use crate::EcsError;

// ---------------------------------------------------------------------------
// QueryItem -- one fetched component
// ---------------------------------------------------------------------------

/// A single element of a query tuple.
pub trait QueryItem {
    type Item<'w>;
    fn fetch(world: &World, index: u32) -> Option<Self::Item<'_>>;
}

impl<T: Component> QueryItem for &T {
    type Item<'w> = &'w T;

    fn fetch(world: &World, index: u32) -> Option<Self::Item<'_>> {
        world.storage::<T>()?.get(index)
    }
}

// ---------------------------------------------------------------------------
// Query -- tuples of QueryItems
// ---------------------------------------------------------------------------

/// The fetched part of a query signature.
pub trait Query {
    type Item<'w>;
    fn fetch_row(world: &World, index: u32) -> Option<Self::Item<'_>>;
}

impl<A: QueryItem> Query for (A,) {
    type Item<'w> = (A::Item<'w>,);

    fn fetch_row(world: &World, index: u32) -> Option<Self::Item<'_>> {
        Some((A::fetch(world, index)?,))
    }
}

impl<A: QueryItem, B: QueryItem> Query for (A, B) {
    type Item<'w> = (A::Item<'w>, B::Item<'w>);

    fn fetch_row(world: &World, index: u32) -> Option<Self::Item<'_>> {
        Some((A::fetch(world, index)?, B::fetch(world, index)?))
    }
}

impl<A: QueryItem, B: QueryItem, C: QueryItem> Query for (A, B, C) {
    type Item<'w> = (A::Item<'w>, B::Item<'w>, C::Item<'w>);

    fn fetch_row(world: &World, index: u32) -> Option<Self::Item<'_>> {
        Some((
            A::fetch(world, index)?,
            B::fetch(world, index)?,
            C::fetch(world, index)?,
        ))
    }
}

impl<A: QueryItem, B: QueryItem, C: QueryItem, D: QueryItem> Query for (A, B, C, D) {
    type Item<'w> = (A::Item<'w>, B::Item<'w>, C::Item<'w>, D::Item<'w>);

    fn fetch_row(world: &World, index: u32) -> Option<Self::Item<'_>> {
        Some((
            A::fetch(world, index)?,
            B::fetch(world, index)?,
            C::fetch(world, index)?,
            D::fetch(world, index)?,
        ))
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// A presence/absence check that fetches nothing.
pub trait Filter {
    fn accepts(world: &World, index: u32) -> bool;
}

/// Entity must hold a `T`.
pub struct With<T>(PhantomData<T>);

/// Entity must not hold a `T`.
pub struct Without<T>(PhantomData<T>);

impl Filter for () {
    fn accepts(_world: &World, _index: u32) -> bool {
        true
    }
}

impl<T: Component> Filter for With<T> {
    fn accepts(world: &World, index: u32) -> bool {
        world.storage::<T>().is_some_and(|t| t.get(index).is_some())
    }
}

impl<T: Component> Filter for Without<T> {
    fn accepts(world: &World, index: u32) -> bool {
        !With::<T>::accepts(world, index)
    }
}

impl<A: Filter, B: Filter> Filter for (A, B) {
    fn accepts(world: &World, index: u32) -> bool {
        A::accepts(world, index) && B::accepts(world, index)
    }
}

impl<A: Filter, B: Filter, C: Filter> Filter for (A, B, C) {
    fn accepts(world: &World, index: u32) -> bool {
        A::accepts(world, index) && B::accepts(world, index) && C::accepts(world, index)
    }
}

// ---------------------------------------------------------------------------
// QueryIter
// ---------------------------------------------------------------------------

/// Iterator over `(EntityId, Q::Item)` for every matching entity.
pub struct QueryIter<'w, Q: Query, F: Filter> {
    world: &'w World,
    cursor: u32,
    end: u32,
    _marker: PhantomData<(Q, F)>,
}

impl<'w, Q: Query, F: Filter> Iterator for QueryIter<'w, Q, F> {
    type Item = (EntityId, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end {
            let index = self.cursor;
            self.cursor += 1;
            let Some(entity) = self.world.is_active_slot(index) else {
                continue;
            };
            if !F::accepts(self.world, index) {
                continue;
            }
            if let Some(item) = Q::fetch_row(self.world, index) {
                return Some((entity, item));
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// World entry points
// ---------------------------------------------------------------------------

impl World {
    /// Iterate every active entity holding all components in `Q`.
    pub fn query<Q: Query>(&self) -> QueryIter<'_, Q, ()> {
        self.query_filtered::<Q, ()>()
    }

    /// Like [`query`](Self::query), restricted by the filter `F`.
    pub fn query_filtered<Q: Query, F: Filter>(&self) -> QueryIter<'_, Q, F> {
        QueryIter {
            world: self,
            cursor: 0,
            end: self.slot_count(),
            _marker: PhantomData,
        }
    }

    /// Ids of every entity matching `Q` and `F`, collected up front so the
    /// caller can mutate the world while walking them.
    pub fn matching<Q: Query, F: Filter>(&self) -> Vec<EntityId> {
        self.query_filtered::<Q, F>().map(|(e, _)| e).collect()
    }

    /// The one entity matching `Q` and `F`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotSingle`] when zero or several entities match.
    pub fn single<Q: Query, F: Filter>(&self) -> Result<(EntityId, Q::Item<'_>), EcsError> {
        let mut iter = self.query_filtered::<Q, F>();
        let first = iter.next();
        let extra = iter.count();
        match first {
            Some(hit) if extra == 0 => Ok(hit),
            Some(_) => Err(EcsError::NotSingle {
                query: std::any::type_name::<(Q, F)>(),
                found: extra + 1,
            }),
            None => Err(EcsError::NotSingle {
                query: std::any::type_name::<(Q, F)>(),
                found: 0,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
