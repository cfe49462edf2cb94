//! Headless breakout run -- scripted input, fake textures, recorded draws.
//!
//! Run with:
//!   cargo run --example breakout_headless -p breakout-engine
//!   cargo run --example breakout_headless -p breakout-engine -- path/to/config.json
//!
//! Set `RUST_LOG=breakout_engine=debug` to see every brick hit.

use breakout_engine::prelude::*;

const FRAME_DT: f64 = 1.0 / 60.0;
const MAX_FRAMES: u64 = 60 * 120;

// ---------------------------------------------------------------------------
// Host collaborators
// ---------------------------------------------------------------------------

/// Hands out sequential texture handles instead of touching the disk.
#[derive(Default)]
struct FakeTextures {
    next: u32,
}

impl AssetLoader for FakeTextures {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, AssetError> {
        let handle = TextureHandle(self.next);
        self.next += 1;
        tracing::debug!(name, ?handle, "texture loaded");
        Ok(handle)
    }
}

/// Steer the paddle toward the ball, like a player who never misses.
fn track_ball(game: &Game) -> Result<FrameInput, EcsError> {
    let world = game.world();
    let ball = world.get_component::<Position>(game.ball())?;
    let ball_size = world.get_component::<Size>(game.ball())?;
    let paddle = world.get_component::<Position>(game.paddle())?;
    let paddle_size = world.get_component::<Size>(game.paddle())?;

    let ball_center = ball.x + ball_size.width / 2.0;
    let paddle_center = paddle.x + paddle_size.width / 2.0;
    let left = ball_center < paddle_center - 8.0;
    let right = ball_center > paddle_center + 8.0;
    Ok(FrameInput::from_keys(left, right, false))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_path(path)?,
        None => GameConfig::default(),
    };

    let mut game = Game::new(config)?;
    game.load_content(&mut FakeTextures::default())?;

    let mut surface = RecordingSurface::new();
    let mut frames = 0;
    let outcome = loop {
        if frames == MAX_FRAMES {
            break FrameOutcome::Quit;
        }
        let input = track_ball(&game)?;
        let outcome = game.update(input, FRAME_DT)?;

        surface.clear();
        game.draw(&mut surface)?;
        frames += 1;

        if frames % 600 == 0 {
            tracing::info!(
                frames,
                score = game.score(),
                lives = game.lives(),
                draws = surface.calls.len(),
                "progress"
            );
        }
        if outcome != FrameOutcome::Running {
            break outcome;
        }
    };

    tracing::info!(
        ?outcome,
        frames,
        score = game.score(),
        lives = game.lives(),
        bricks_remaining = game.session().bricks_remaining,
        state_hash = %game.world().state_hash(),
        "run finished"
    );
    Ok(())
}
