//! Mapping from raw key state to paddle intent.

use breakout_ecs::prelude::*;

use crate::components::{Direction, Paddle};

/// Horizontal paddle intent for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveIntent {
    Left,
    Right,
    #[default]
    Idle,
}

impl MoveIntent {
    /// Left wins when both keys are held.
    pub fn from_keys(left: bool, right: bool) -> Self {
        if left {
            MoveIntent::Left
        } else if right {
            MoveIntent::Right
        } else {
            MoveIntent::Idle
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            MoveIntent::Left => Direction::new(-1.0, 0.0),
            MoveIntent::Right => Direction::new(1.0, 0.0),
            MoveIntent::Idle => Direction::IDLE,
        }
    }
}

/// Everything the host reports about input for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInput {
    pub intent: MoveIntent,
    /// The player asked to leave the game.
    pub quit: bool,
}

impl FrameInput {
    pub fn from_keys(left: bool, right: bool, quit: bool) -> Self {
        Self {
            intent: MoveIntent::from_keys(left, right),
            quit,
        }
    }
}

/// Overwrite the paddle's direction with `intent`.
pub fn apply_intent(world: &mut World, intent: MoveIntent) -> Result<(), EcsError> {
    for paddle in world.matching::<(&Direction,), With<Paddle>>() {
        *world.get_component_mut::<Direction>(paddle)? = intent.direction();
    }
    Ok(())
}
