//! Brick prefab and grid layout.
//!
//! Bricks fill the board from the top-left corner in rows of
//! `bricks.columns`. Brick `i` sits in column `i % columns`, row
//! `i / columns`, one brick-size cell per step.

use breakout_ecs::prelude::*;

use crate::components::{Brick, Position, Rectangle, Tint};
use crate::config::GameConfig;

pub const BRICK_PREFAB: &str = "Brick";

/// Create the brick template: default position, brick size, tint, bounds
/// and tag. The sprite is attached later, once textures have loaded.
pub fn brick_prefab(world: &mut World, config: &GameConfig) -> Result<EntityId, EcsError> {
    let size = config.bricks.size();
    world.spawn_prefab(
        BRICK_PREFAB,
        ComponentBundle::new()
            .with(Position::default())
            .with(size)
            .with(Tint(config.bricks.tint))
            .with(Rectangle::from_position_size(Position::default(), size))
            .with(Brick),
    )
}

/// `(column, row)` of brick `index`.
pub fn grid_cell(index: u32, columns: u32) -> (u32, u32) {
    (index % columns, index / columns)
}

/// Instantiate `bricks.count` bricks named `Brick0`, `Brick1`, ... from
/// `prefab`, overriding only their position.
pub fn spawn_bricks(world: &mut World, prefab: EntityId, config: &GameConfig) -> Result<Vec<EntityId>, EcsError> {
    let bricks = &config.bricks;
    let mut spawned = Vec::with_capacity(bricks.count as usize);
    for i in 0..bricks.count {
        let (col, row) = grid_cell(i, bricks.columns);
        let position = Position::new(col as f32 * bricks.width, row as f32 * bricks.height);
        let brick = world.instantiate_named(
            prefab,
            &format!("Brick{i}"),
            ComponentBundle::new().with(position),
        )?;
        spawned.push(brick);
    }
    tracing::info!(count = spawned.len(), columns = bricks.columns, "bricks spawned");
    Ok(spawned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{self, Size};

    #[test]
    fn grid_cell_wraps_rows() {
        assert_eq!(grid_cell(0, 10), (0, 0));
        assert_eq!(grid_cell(9, 10), (9, 0));
        assert_eq!(grid_cell(10, 10), (0, 1));
        assert_eq!(grid_cell(49, 10), (9, 4));
    }

    #[test]
    fn bricks_copy_prefab_and_override_position() {
        let mut world = World::new();
        components::register_all(&mut world);
        let config = GameConfig::default();
        let prefab = brick_prefab(&mut world, &config).unwrap();
        let bricks = spawn_bricks(&mut world, prefab, &config).unwrap();

        assert_eq!(bricks.len(), 50);
        let last = bricks[49];
        assert_eq!(world.name_of(last), Some("Brick49"));
        assert_eq!(world.get_component::<Position>(last).unwrap(), &Position::new(576.0, 192.0));
        assert_eq!(world.get_component::<Size>(last).unwrap(), &Size::new(64.0, 48.0));
        assert!(world.has_component::<Brick>(last));
        assert_eq!(world.matching::<(&Position,), With<Brick>>().len(), 50);
    }

    #[test]
    fn spawning_twice_without_clearing_is_a_name_clash() {
        let mut world = World::new();
        components::register_all(&mut world);
        let config = GameConfig::default();
        let prefab = brick_prefab(&mut world, &config).unwrap();
        spawn_bricks(&mut world, prefab, &config).unwrap();
        assert!(matches!(
            spawn_bricks(&mut world, prefab, &config),
            Err(EcsError::DuplicateName { .. })
        ));
    }
}
