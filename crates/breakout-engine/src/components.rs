//! Breakout component types.
//!
//! Every component is a small `Copy` value. [`Rectangle`] is a derived cache
//! kept in sync with [`Position`] by the alignment system; everything else is
//! source state. The three tags ([`Paddle`], [`Ball`], [`Brick`]) carry no
//! data and exist only so systems can select entities by role.

use breakout_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Spatial components
// ---------------------------------------------------------------------------

/// Top-left screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box dimensions. Not changed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Scalar movement speed in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Speed {
    pub value: f32,
}

/// Movement direction. Each axis is one of `-1`, `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub x: f32,
    pub y: f32,
}

impl Direction {
    pub const IDLE: Direction = Direction { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both axes reversed.
    pub fn reflected(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Integer collision bounds.
///
/// Uses the same edge rule as most 2D frameworks: rectangles that only share
/// an edge do not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds for an entity at `position` with extent `size`.
    pub fn from_position_size(position: Position, size: Size) -> Self {
        Self {
            x: position.x.floor() as i32,
            y: position.y.floor() as i32,
            width: size.width as i32,
            height: size.height as i32,
        }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Strict overlap test: touching edges do not count.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        other.left() < self.right()
            && self.left() < other.right()
            && other.top() < self.bottom()
            && self.top() < other.bottom()
    }
}

// ---------------------------------------------------------------------------
// Drawing components
// ---------------------------------------------------------------------------

/// Opaque reference to a texture owned by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Drawable asset. Attached once assets have loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: TextureHandle,
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const MONOGAME_ORANGE: Color = Color::rgb(231, 60, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Per-entity display color, used for entities without a fixed role color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tint(pub Color);

// ---------------------------------------------------------------------------
// Role tags
// ---------------------------------------------------------------------------

/// The player-controlled paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paddle;

/// The ball. Only the ball's direction is changed by collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ball;

/// A destructible brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Brick;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every Breakout component kind with `world`.
///
/// Registration order fixes the component order used by
/// [`World::state_hash`], so it never changes between runs.
pub fn register_all(world: &mut World) {
    world.register_component::<Position>("position");
    world.register_component::<Size>("size");
    world.register_component::<Speed>("speed");
    world.register_component::<Direction>("direction");
    world.register_component::<Rectangle>("rectangle");
    world.register_component::<Sprite>("sprite");
    world.register_component::<Tint>("tint");
    world.register_component::<Paddle>("paddle");
    world.register_component::<Ball>("ball");
    world.register_component::<Brick>("brick");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rectangles_intersect() {
        let a = Rectangle::new(0, 0, 64, 48);
        let b = Rectangle::new(32, 24, 32, 32);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rectangle::new(0, 0, 64, 48);
        assert!(!a.intersects(&Rectangle::new(64, 0, 64, 48)));
        assert!(!a.intersects(&Rectangle::new(0, 48, 64, 48)));
        assert!(a.intersects(&Rectangle::new(63, 47, 64, 48)));
    }

    #[test]
    fn bounds_floor_negative_positions() {
        let r = Rectangle::from_position_size(Position::new(-0.5, 10.9), Size::new(32.0, 32.0));
        assert_eq!(r, Rectangle::new(-1, 10, 32, 32));
    }

    #[test]
    fn register_all_is_idempotent() {
        let mut world = World::new();
        register_all(&mut world);
        register_all(&mut world);
        assert_eq!(world.registry().len(), 10);
        assert_eq!(world.registry().name_of::<Rectangle>(), "rectangle");
    }
}
