//! The Breakout simulation systems.
//!
//! Each system selects entities by component signature and role tag. The
//! pipeline order is fixed by [`TickLoop::breakout`](crate::tick::TickLoop::breakout):
//!
//! | Order | System | Signature |
//! |-------|--------|-----------|
//! | 1 | [`paddle_movement`] | `Position, Speed, Direction` with `Paddle` |
//! | 2 | [`ball_movement`] | `Position, Speed, Direction` without `Paddle` |
//! | 3 | [`align_rectangles`] | `Position, Rectangle` |
//! | 4 | [`paddle_collision`] | `Rectangle, Direction` with `Paddle` |
//! | 5 | [`brick_collision`] | `Position, Rectangle` with `Brick` |
//!
//! Queries borrow the world, so systems first collect what they need and
//! then write through [`World::get_component_mut`].

use breakout_ecs::prelude::*;
use rand::Rng;

use crate::components::{Ball, Brick, Direction, Paddle, Position, Rectangle, Size, Speed};
use crate::config::MultiHitPolicy;
use crate::state::{GameStatus, TickContext};

pub const PADDLE_MOVEMENT: &str = "paddle_movement";
pub const BALL_MOVEMENT: &str = "ball_movement";
pub const ALIGN_RECTANGLES: &str = "align_rectangles";
pub const PADDLE_COLLISION: &str = "paddle_collision";
pub const BRICK_COLLISION: &str = "brick_collision";

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Move the paddle horizontally by `speed * direction.x * dt`.
///
/// With `paddle.clamp_to_board` set, the paddle is then held inside
/// `[0, board.width - width]`.
pub fn paddle_movement(world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
    let dt = ctx.delta_time.as_f32();
    let moves: Vec<(EntityId, f32)> = world
        .query_filtered::<(&Position, &Speed, &Direction), With<Paddle>>()
        .map(|(e, (_, speed, dir))| (e, speed.value * dir.x * dt))
        .collect();

    for (paddle, dx) in moves {
        let max_x = if ctx.config.paddle.clamp_to_board {
            let width = world.get_component::<Size>(paddle)?.width;
            Some((ctx.board.width - width).max(0.0))
        } else {
            None
        };
        let pos = world.get_component_mut::<Position>(paddle)?;
        pos.x += dx;
        if let Some(max_x) = max_x {
            pos.x = pos.x.clamp(0.0, max_x);
        }
    }
    Ok(())
}

/// Integrate every non-paddle mover and apply the board's boundary rules.
///
/// Leaving the left or right edge flips `direction.x`. Crossing the top
/// flips `direction.y`. Crossing the bottom costs a life: the ball is served
/// again from its configured position, or the session ends when no lives
/// remain.
///
/// Every mover needs a `Size` for the edge tests. One without it is
/// reported as [`EcsError::ComponentNotFound`].
pub fn ball_movement(world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
    let dt = ctx.delta_time.as_f32();
    let balls = world.matching::<(&Position, &Speed, &Direction), Without<Paddle>>();

    for ball in balls {
        let speed = world.get_component::<Speed>(ball)?.value;
        let size = *world.get_component::<Size>(ball)?;
        let mut dir = *world.get_component::<Direction>(ball)?;
        let mut pos = *world.get_component::<Position>(ball)?;

        pos.x += dir.x * speed * dt;
        pos.y += dir.y * speed * dt;

        if pos.x < 0.0 || pos.x + size.width > ctx.board.width {
            dir.x = -dir.x;
        }

        if pos.y < 0.0 {
            dir.y = -dir.y;
        } else if pos.y + size.height > ctx.board.height {
            let remaining = ctx.session.lives.lose();
            if remaining > 0 {
                pos = ctx.config.ball.position();
                dir = serve_direction(ctx);
                tracing::info!(%ball, remaining, "life lost, ball served again");
            } else {
                ctx.session.status = GameStatus::GameOver;
                tracing::info!(%ball, score = ctx.session.score.value(), "game over");
            }
        }

        *world.get_component_mut::<Position>(ball)? = pos;
        *world.get_component_mut::<Direction>(ball)? = dir;
    }
    Ok(())
}

/// Random horizontal direction, configured vertical direction.
fn serve_direction(ctx: &mut TickContext<'_>) -> Direction {
    let x = if ctx.session.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    Direction::new(x, ctx.config.ball.direction_y)
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Copy each floored `Position` into its `Rectangle`, leaving the extent alone.
pub fn align_rectangles(world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
    let targets: Vec<(EntityId, Position)> = world
        .query::<(&Position, &Rectangle)>()
        .map(|(e, (pos, _))| (e, *pos))
        .collect();

    for (entity, pos) in targets {
        let rect = world.get_component_mut::<Rectangle>(entity)?;
        rect.x = pos.x.floor() as i32;
        rect.y = pos.y.floor() as i32;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Collision
// ---------------------------------------------------------------------------

/// The ball's entity, bounds and direction.
fn ball_state(world: &World) -> Result<(EntityId, Rectangle, Direction), EcsError> {
    let (ball, (rect, dir)) = world.single::<(&Rectangle, &Direction), With<Ball>>()?;
    Ok((ball, *rect, *dir))
}

/// Bounce the ball off the paddle.
///
/// On overlap the ball takes the paddle's horizontal direction and its own
/// vertical direction flips. The rule reapplies on every tick the two
/// rectangles keep overlapping.
pub fn paddle_collision(world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
    let (ball, ball_rect, _) = ball_state(world)?;
    let hits: Vec<f32> = world
        .query_filtered::<(&Rectangle, &Direction), With<Paddle>>()
        .filter(|(_, (rect, _))| rect.intersects(&ball_rect))
        .map(|(_, (_, dir))| dir.x)
        .collect();

    for paddle_x in hits {
        let dir = world.get_component_mut::<Direction>(ball)?;
        *dir = Direction::new(paddle_x, -dir.y);
        tracing::trace!(%ball, x = dir.x, y = dir.y, "paddle bounce");
    }
    Ok(())
}

/// Disable and score every active brick the ball overlaps, then reflect
/// the ball according to the configured [`MultiHitPolicy`].
pub fn brick_collision(world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
    let (ball, ball_rect, _) = ball_state(world)?;
    let hits: Vec<EntityId> = world
        .query_filtered::<(&Position, &Rectangle), With<Brick>>()
        .filter(|(_, (_, rect))| rect.intersects(&ball_rect))
        .map(|(e, _)| e)
        .collect();
    if hits.is_empty() {
        return Ok(());
    }

    for &brick in &hits {
        world.disable(brick)?;
        ctx.session.score.award(ctx.config.bricks.score_value);
        ctx.session.bricks_remaining = ctx.session.bricks_remaining.saturating_sub(1);
        tracing::debug!(
            %brick,
            name = world.name_of(brick).unwrap_or("-"),
            score = ctx.session.score.value(),
            "brick hit"
        );
    }

    let reflections = match ctx.config.multi_hit {
        MultiHitPolicy::CombinedReflection => 1,
        MultiHitPolicy::LastWriteWins => hits.len(),
    };
    let dir = world.get_component_mut::<Direction>(ball)?;
    for _ in 0..reflections {
        *dir = dir.reflected();
    }

    if ctx.session.bricks_remaining == 0 && ctx.session.is_playing() {
        ctx.session.status = GameStatus::Cleared;
        tracing::info!(score = ctx.session.score.value(), "board cleared");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
