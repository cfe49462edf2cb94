//! Breakout ECS -- a small typed component store with prefabs and queries.
//!
//! Entities are generational handles with no data of their own. Every piece
//! of state lives in a per-kind component table keyed by the entity's slot
//! index. On top of plain attach/detach/get the store offers:
//!
//! - **named entities** for lookups by role (`"Paddle"`, `"Brick12"`),
//! - **prefabs**: template entities that are never simulated and can be
//!   instantiated with copy semantics plus per-instance overrides,
//! - **disable-not-destroy**: disabled entities keep their data but drop out
//!   of every query until their slots are reclaimed,
//! - **signature queries** with `With`/`Without` filters, iterated in a
//!   deterministic slot order.
//!
//! # Quick Start
//!
//! ```
//! use breakout_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Health(u32);
//!
//! let mut world = World::new();
//! world.register_component::<Position>("position");
//! world.register_component::<Health>("health");
//!
//! let template = world
//!     .spawn_prefab("Crate", ComponentBundle::new().with(Position { x: 0.0, y: 0.0 }).with(Health(3)))
//!     .unwrap();
//! let crate_a = world
//!     .instantiate_named(template, "CrateA", ComponentBundle::new().with(Position { x: 5.0, y: 0.0 }))
//!     .unwrap();
//!
//! assert_eq!(world.get_component::<Health>(crate_a).unwrap(), &Health(3));
//! assert_eq!(world.query::<(&Position, &Health)>().count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod query;
pub mod storage;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// A component type was used before being registered.
    #[error("component type '{name}' not registered. Registered components: [{registered}]")]
    UnknownComponent { name: String, registered: String },

    /// The entity is alive but does not hold the requested component.
    #[error("entity {entity:?} has no '{component}' component")]
    ComponentNotFound {
        entity: entity::EntityId,
        component: String,
    },

    /// Another live entity already carries this name.
    #[error("entity name '{name}' is already taken by {existing:?}")]
    DuplicateName {
        name: String,
        existing: entity::EntityId,
    },

    /// `instantiate` was called on an entity that is not a prefab.
    #[error("entity {entity:?} is not a prefab")]
    NotAPrefab { entity: entity::EntityId },

    /// A query expected to match exactly one entity matched some other number.
    #[error("query {query} expected exactly one match, found {found}")]
    NotSingle { query: &'static str, found: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentTypeId};
    pub use crate::entity::EntityId;
    pub use crate::query::{Filter, Query, QueryItem, QueryIter, With, Without};
    pub use crate::world::{ComponentBundle, World};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Size {
        w: f32,
        h: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct BrickTag;

    fn setup_world() -> World {
        let mut world = World::new();
        world.register_component::<Position>("position");
        world.register_component::<Size>("size");
        world.register_component::<BrickTag>("brick");
        world
    }

    fn brick_prefab(world: &mut World) -> EntityId {
        let bundle = ComponentBundle::new()
            .with(Position { x: 0.0, y: 0.0 })
            .with(Size { w: 64.0, h: 48.0 })
            .with(BrickTag);
        world.spawn_prefab("Brick", bundle).unwrap()
    }

    // -- attach / get / has -------------------------------------------------

    #[test]
    fn attach_overwrites_existing_value() {
        let mut world = setup_world();
        let e = world.spawn();
        world.insert_component(e, Position { x: 1.0, y: 2.0 }).unwrap();
        world.insert_component(e, Position { x: 9.0, y: 8.0 }).unwrap();
        assert_eq!(
            world.get_component::<Position>(e).unwrap(),
            &Position { x: 9.0, y: 8.0 }
        );
    }

    #[test]
    fn has_never_fails() {
        let mut world = setup_world();
        let e = world.spawn();
        assert!(!world.has_component::<Position>(e));
        world.despawn(e).unwrap();
        assert!(!world.has_component::<Position>(e));
    }

    #[test]
    fn detach_then_get_is_not_found() {
        let mut world = setup_world();
        let e = world
            .spawn_bundle(ComponentBundle::new().with(Size { w: 1.0, h: 1.0 }))
            .unwrap();
        world.remove_component::<Size>(e).unwrap();
        world.remove_component::<Size>(e).unwrap();
        assert!(matches!(
            world.get_component::<Size>(e),
            Err(EcsError::ComponentNotFound { .. })
        ));
    }

    // -- prefabs ------------------------------------------------------------

    #[test]
    fn instance_copies_full_component_set() {
        let mut world = setup_world();
        let prefab = brick_prefab(&mut world);
        let brick = world
            .instantiate_named(
                prefab,
                "Brick0",
                ComponentBundle::new().with(Position { x: 64.0, y: 48.0 }),
            )
            .unwrap();

        assert_eq!(
            world.get_component::<Position>(brick).unwrap(),
            &Position { x: 64.0, y: 48.0 }
        );
        assert_eq!(
            world.get_component::<Size>(brick).unwrap(),
            &Size { w: 64.0, h: 48.0 }
        );
        assert!(world.has_component::<BrickTag>(brick));
        assert!(!world.is_prefab(brick));
        assert_eq!(world.lookup("Brick0"), Some(brick));
    }

    #[test]
    fn later_prefab_changes_do_not_reach_existing_instances() {
        let mut world = setup_world();
        let prefab = brick_prefab(&mut world);
        let early = world.instantiate(prefab, ComponentBundle::new()).unwrap();

        world.get_component_mut::<Size>(prefab).unwrap().w = 10.0;
        let late = world.instantiate(prefab, ComponentBundle::new()).unwrap();

        assert_eq!(world.get_component::<Size>(early).unwrap().w, 64.0);
        assert_eq!(world.get_component::<Size>(late).unwrap().w, 10.0);
    }

    #[test]
    fn components_attached_to_prefab_before_spawn_are_inherited() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Texture(u32);

        let mut world = setup_world();
        world.register_component::<Texture>("texture");
        let prefab = brick_prefab(&mut world);
        world.insert_component(prefab, Texture(7)).unwrap();

        let brick = world.instantiate(prefab, ComponentBundle::new()).unwrap();
        assert_eq!(world.get_component::<Texture>(brick).unwrap(), &Texture(7));
    }

    #[test]
    fn prefab_is_never_matched() {
        let mut world = setup_world();
        let prefab = brick_prefab(&mut world);
        assert_eq!(world.query::<(&Position, &Size)>().count(), 0);
        world.instantiate(prefab, ComponentBundle::new()).unwrap();
        assert_eq!(world.query::<(&Position, &Size)>().count(), 1);
    }

    // -- disable / reclaim --------------------------------------------------

    #[test]
    fn disabled_brick_drops_out_but_stays_inspectable() {
        let mut world = setup_world();
        let prefab = brick_prefab(&mut world);
        let bricks: Vec<_> = (0..3)
            .map(|_| world.instantiate(prefab, ComponentBundle::new()).unwrap())
            .collect();

        world.disable(bricks[1]).unwrap();
        let active = world.matching::<(&Position,), With<BrickTag>>();
        assert_eq!(active, vec![bricks[0], bricks[2]]);
        assert!(world.get_component::<Position>(bricks[1]).is_ok());

        assert_eq!(world.reclaim_disabled(), 1);
        assert!(!world.is_alive(bricks[1]));
        assert!(world.is_alive(prefab));
    }

    // -- scale --------------------------------------------------------------

    #[test]
    fn scale_10k_instances() {
        let mut world = setup_world();
        let prefab = brick_prefab(&mut world);
        let mut ids = Vec::with_capacity(10_000);
        for i in 0..10_000u32 {
            let overrides = ComponentBundle::new().with(Position {
                x: i as f32,
                y: 0.0,
            });
            ids.push(world.instantiate(prefab, overrides).unwrap());
        }
        assert_eq!(world.query::<(&Position, &Size)>().count(), 10_000);

        for e in ids.iter().step_by(2) {
            world.disable(*e).unwrap();
        }
        assert_eq!(world.query::<(&Position, &Size)>().count(), 5_000);
        assert_eq!(world.reclaim_disabled(), 5_000);
        assert_eq!(world.entity_count(), 5_001);
    }
}
