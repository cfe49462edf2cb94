//! Breakout Engine -- the simulation core of a Breakout game.
//!
//! Built on [`breakout_ecs`], this crate provides the Breakout component
//! schema, the five-system simulation pipeline, the brick spawner, the
//! render-phase draw dispatch and a [`Game`](game::Game) facade for hosts.
//! Windowing, texture loading and drawing stay with the host, behind the
//! [`AssetLoader`](assets::AssetLoader) and [`DrawSurface`](render::DrawSurface)
//! traits.
//!
//! # Quick Start
//!
//! ```
//! use breakout_engine::prelude::*;
//!
//! struct Loader;
//! impl AssetLoader for Loader {
//!     fn load_texture(&mut self, _name: &str) -> Result<TextureHandle, AssetError> {
//!         Ok(TextureHandle(0))
//!     }
//! }
//!
//! let mut game = Game::new(GameConfig::default()).unwrap();
//! game.load_content(&mut Loader).unwrap();
//!
//! let outcome = game.update(FrameInput::from_keys(false, true, false), 1.0 / 60.0).unwrap();
//! assert_eq!(outcome, FrameOutcome::Running);
//!
//! let mut surface = RecordingSurface::new();
//! assert_eq!(game.draw(&mut surface).unwrap(), 52);
//! ```

#![deny(unsafe_code)]

pub mod assets;
pub mod components;
pub mod config;
pub mod game;
pub mod input;
pub mod render;
pub mod spawner;
pub mod state;
pub mod systems;
pub mod tick;

/// Re-export the ECS crate for convenience.
pub use breakout_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced to the host by [`Game`](game::Game).
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Ecs(#[from] breakout_ecs::EcsError),

    #[error(transparent)]
    Tick(#[from] tick::TickError),

    #[error(transparent)]
    Asset(#[from] assets::AssetError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("content is already loaded")]
    ContentAlreadyLoaded,

    #[error("content must be loaded before drawing")]
    ContentNotLoaded,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use breakout_ecs::prelude::*;

    pub use crate::assets::{AssetError, AssetLoader, GameAssets};
    pub use crate::components::{
        Ball, Brick, Color, Direction, Paddle, Position, Rectangle, Size, Speed, Sprite,
        TextureHandle, Tint,
    };
    pub use crate::config::{ConfigError, GameConfig, MultiHitPolicy};
    pub use crate::game::{FrameOutcome, Game};
    pub use crate::input::{FrameInput, MoveIntent};
    pub use crate::render::{DrawCommand, DrawSurface, RecordingSurface, SurfaceCall};
    pub use crate::state::{Board, DeltaTime, GameStatus, Lives, Score, Session, TickContext};
    pub use crate::tick::{SystemFn, TickDiagnostics, TickError, TickLoop};
    pub use crate::GameError;
}
