//! Render-phase draw dispatch.
//!
//! The core never touches a graphics device. It describes each frame as a
//! sequence of calls on a [`DrawSurface`] that the host implements:
//!
//! 1. one full-board background draw,
//! 2. one [`DrawCommand`] per sprited entity, issued by [`draw_entities`].
//!
//! [`RecordingSurface`] is a headless surface that stores the calls, for
//! tests and for hosts that batch their own drawing.
//!
//! # Tint by role
//!
//! | Entity | Tint |
//! |--------|------|
//! | Paddle | `paddle.color` from the config |
//! | Ball | `ball.color` from the config |
//! | Anything else | its own [`Tint`] component |

use breakout_ecs::prelude::*;

use crate::components::{Ball, Color, Paddle, Position, Sprite, TextureHandle, Tint};
use crate::config::GameConfig;
use crate::state::Board;

// ---------------------------------------------------------------------------
// DrawCommand
// ---------------------------------------------------------------------------

/// One sprite draw at a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub texture: TextureHandle,
    /// Top-left X in screen pixels.
    pub x: f32,
    /// Top-left Y in screen pixels.
    pub y: f32,
    pub tint: Color,
}

// ---------------------------------------------------------------------------
// DrawSurface
// ---------------------------------------------------------------------------

/// The host's drawing target for one frame.
pub trait DrawSurface {
    /// Stretch `texture` over the whole board.
    fn draw_background(&mut self, texture: TextureHandle, board: Board);

    fn draw(&mut self, command: DrawCommand);
}

/// A call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceCall {
    Background { texture: TextureHandle, board: Board },
    Sprite(DrawCommand),
}

/// Headless surface that keeps every call in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sprite draws only, without the background.
    pub fn sprites(&self) -> impl Iterator<Item = &DrawCommand> {
        self.calls.iter().filter_map(|call| match call {
            SurfaceCall::Sprite(cmd) => Some(cmd),
            SurfaceCall::Background { .. } => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DrawSurface for RecordingSurface {
    fn draw_background(&mut self, texture: TextureHandle, board: Board) {
        self.calls.push(SurfaceCall::Background { texture, board });
    }

    fn draw(&mut self, command: DrawCommand) {
        self.calls.push(SurfaceCall::Sprite(command));
    }
}

// ---------------------------------------------------------------------------
// Draw system
// ---------------------------------------------------------------------------

/// Issue one draw per active entity holding `Position` and `Sprite`.
///
/// Tinted entities (bricks) are drawn first, then the paddle, then the ball.
/// Entities without a sprite are skipped, as are entities with neither a
/// role color nor a `Tint`. Returns the number of draws issued. The world
/// is not modified.
pub fn draw_entities(world: &World, config: &GameConfig, surface: &mut dyn DrawSurface) -> usize {
    let mut issued = 0;

    for (_, (pos, sprite, tint)) in
        world.query_filtered::<(&Position, &Sprite, &Tint), (Without<Paddle>, Without<Ball>)>()
    {
        surface.draw(command(pos, sprite, tint.0));
        issued += 1;
    }
    for (_, (pos, sprite)) in world.query_filtered::<(&Position, &Sprite), With<Paddle>>() {
        surface.draw(command(pos, sprite, config.paddle.color));
        issued += 1;
    }
    for (_, (pos, sprite)) in world.query_filtered::<(&Position, &Sprite), (With<Ball>, Without<Paddle>)>() {
        surface.draw(command(pos, sprite, config.ball.color));
        issued += 1;
    }

    tracing::trace!(issued, "entities drawn");
    issued
}

fn command(pos: &Position, sprite: &Sprite, tint: Color) -> DrawCommand {
    DrawCommand {
        texture: sprite.texture,
        x: pos.x,
        y: pos.y,
        tint,
    }
}

/// Draw a full frame: the background, then every entity.
pub fn render_frame(
    world: &World,
    config: &GameConfig,
    background: TextureHandle,
    surface: &mut dyn DrawSurface,
) -> usize {
    surface.draw_background(background, Board::from_config(config));
    draw_entities(world, config, surface)
}
