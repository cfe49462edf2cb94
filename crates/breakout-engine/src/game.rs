//! The [`Game`] facade driven by the host once per frame.
//!
//! Lifecycle:
//!
//! 1. [`Game::new`] builds the world: components, brick prefab, paddle and
//!    ball. Nothing has a sprite yet.
//! 2. [`Game::load_content`] loads textures, attaches sprites and spawns the
//!    brick grid.
//! 3. Each frame the host calls [`Game::update`] then [`Game::draw`].

use breakout_ecs::prelude::*;

use crate::assets::{AssetLoader, GameAssets};
use crate::components::{self, Ball, Direction, Paddle, Position, Rectangle, Speed, Sprite};
use crate::config::GameConfig;
use crate::input::{self, FrameInput};
use crate::render::{self, DrawSurface};
use crate::spawner;
use crate::state::{GameStatus, Session};
use crate::tick::{self, TickLoop};
use crate::GameError;

pub const PADDLE_NAME: &str = "Paddle";
pub const BALL_NAME: &str = "Ball";

/// What the host should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep running.
    Running,
    /// The session ended this frame or earlier. The host may restart it.
    Finished(GameStatus),
    /// The player asked to quit. No tick was run.
    Quit,
}

/// One Breakout session.
#[derive(Debug)]
pub struct Game {
    tick_loop: TickLoop,
    prefab: EntityId,
    paddle: EntityId,
    ball: EntityId,
    bricks: Vec<EntityId>,
    assets: Option<GameAssets>,
}

impl Game {
    /// Validate `config` and build the initial world.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;

        let mut world = World::new();
        components::register_all(&mut world);
        let prefab = spawner::brick_prefab(&mut world, &config)?;
        let paddle = world.spawn_named(
            PADDLE_NAME,
            ComponentBundle::new()
                .with(config.paddle.position())
                .with(config.paddle.size())
                .with(Speed { value: config.paddle.speed })
                .with(Direction::IDLE)
                .with(Rectangle::from_position_size(config.paddle.position(), config.paddle.size()))
                .with(Paddle),
        )?;
        let ball = world.spawn_named(
            BALL_NAME,
            ComponentBundle::new()
                .with(config.ball.position())
                .with(config.ball.size())
                .with(Speed { value: config.ball.speed })
                .with(config.ball.direction())
                .with(Rectangle::from_position_size(config.ball.position(), config.ball.size()))
                .with(Ball),
        )?;

        tracing::info!(
            board_width = config.board.width,
            board_height = config.board.height,
            bricks = config.bricks.count,
            lives = config.max_lives,
            "game created"
        );
        Ok(Self {
            tick_loop: TickLoop::breakout(world, config),
            prefab,
            paddle,
            ball,
            bricks: Vec::new(),
            assets: None,
        })
    }

    /// Load textures, give the prefab, paddle and ball their sprites, then
    /// spawn the brick grid so every brick inherits the brick sprite.
    pub fn load_content(&mut self, loader: &mut dyn AssetLoader) -> Result<(), GameError> {
        if self.assets.is_some() {
            return Err(GameError::ContentAlreadyLoaded);
        }
        let assets = GameAssets::load(loader)?;

        let world = self.tick_loop.world_mut();
        world.insert_component(self.prefab, Sprite { texture: assets.brick })?;
        world.insert_component(self.paddle, Sprite { texture: assets.paddle })?;
        world.insert_component(self.ball, Sprite { texture: assets.ball })?;

        let config = self.tick_loop.config().clone();
        self.bricks = spawner::spawn_bricks(self.tick_loop.world_mut(), self.prefab, &config)?;
        self.assets = Some(assets);
        Ok(())
    }

    /// Advance one frame of `dt` seconds.
    ///
    /// A quit request returns [`FrameOutcome::Quit`] before anything else
    /// happens. Otherwise the paddle takes the frame's intent and, while the
    /// session is still playing, the simulation ticks once.
    ///
    /// # Errors
    ///
    /// [`GameError::Tick`] when `dt` is not a finite, non-negative number
    /// of seconds. The world is left untouched.
    pub fn update(&mut self, input: FrameInput, dt: f64) -> Result<FrameOutcome, GameError> {
        if input.quit {
            tracing::info!(tick = self.tick_loop.tick_count(), "quit requested");
            return Ok(FrameOutcome::Quit);
        }
        tick::check_delta_time(dt)?;
        input::apply_intent(self.tick_loop.world_mut(), input.intent)?;

        if self.tick_loop.session().is_playing() {
            self.tick_loop.tick(dt)?;
        }
        Ok(match self.status() {
            GameStatus::Playing => FrameOutcome::Running,
            finished => FrameOutcome::Finished(finished),
        })
    }

    /// Draw the background and every sprited entity. Returns the number of
    /// entity draws.
    pub fn draw(&self, surface: &mut dyn DrawSurface) -> Result<usize, GameError> {
        let assets = self.assets.ok_or(GameError::ContentNotLoaded)?;
        Ok(render::render_frame(
            self.tick_loop.world(),
            self.tick_loop.config(),
            assets.background,
            surface,
        ))
    }

    /// Start a new session on the same world.
    ///
    /// Every brick is reclaimed and the grid is spawned again from the
    /// prefab. Score, lives and the serve RNG start over, and the paddle and
    /// ball return to their configured starting state.
    pub fn restart(&mut self) -> Result<(), GameError> {
        let config = self.tick_loop.config().clone();
        let world = self.tick_loop.world_mut();

        for &brick in &self.bricks {
            world.disable(brick)?;
        }
        let reclaimed = world.reclaim_disabled();

        reset_mover(world, self.paddle, config.paddle.position(), Direction::IDLE)?;
        reset_mover(world, self.ball, config.ball.position(), config.ball.direction())?;

        self.bricks = if self.assets.is_some() {
            spawner::spawn_bricks(world, self.prefab, &config)?
        } else {
            Vec::new()
        };
        *self.tick_loop.session_mut() = Session::new(&config);
        tracing::info!(reclaimed, "game restarted");
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn world(&self) -> &World {
        self.tick_loop.world()
    }

    /// Direct world access for host-side setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        self.tick_loop.world_mut()
    }

    pub fn tick_loop(&self) -> &TickLoop {
        &self.tick_loop
    }

    pub fn session(&self) -> &Session {
        self.tick_loop.session()
    }

    pub fn config(&self) -> &GameConfig {
        self.tick_loop.config()
    }

    pub fn status(&self) -> GameStatus {
        self.tick_loop.session().status
    }

    pub fn score(&self) -> u32 {
        self.tick_loop.session().score.value()
    }

    pub fn lives(&self) -> u32 {
        self.tick_loop.session().lives.remaining()
    }

    pub fn paddle(&self) -> EntityId {
        self.paddle
    }

    pub fn ball(&self) -> EntityId {
        self.ball
    }

    pub fn brick_prefab(&self) -> EntityId {
        self.prefab
    }

    /// Brick instances spawned by the last load or restart, including
    /// disabled ones.
    pub fn bricks(&self) -> &[EntityId] {
        &self.bricks
    }

    pub fn assets(&self) -> Option<&GameAssets> {
        self.assets.as_ref()
    }
}

fn reset_mover(world: &mut World, entity: EntityId, position: Position, direction: Direction) -> Result<(), EcsError> {
    *world.get_component_mut::<Position>(entity)? = position;
    *world.get_component_mut::<Direction>(entity)? = direction;
    let size = *world.get_component::<components::Size>(entity)?;
    *world.get_component_mut::<Rectangle>(entity)? = Rectangle::from_position_size(position, size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::components::TextureHandle;
    use crate::input::MoveIntent;
    use crate::render::RecordingSurface;

    struct FakeLoader;

    impl AssetLoader for FakeLoader {
        fn load_texture(&mut self, name: &str) -> Result<TextureHandle, AssetError> {
            Ok(TextureHandle(name.len() as u32))
        }
    }

    fn loaded_game() -> Game {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.load_content(&mut FakeLoader).unwrap();
        game
    }

    #[test]
    fn new_game_has_paddle_ball_and_no_bricks() {
        let game = Game::new(GameConfig::default()).unwrap();
        assert_eq!(game.world().lookup(PADDLE_NAME), Some(game.paddle()));
        assert_eq!(game.world().lookup(BALL_NAME), Some(game.ball()));
        assert!(game.bricks().is_empty());
        assert!(game.world().is_prefab(game.brick_prefab()));
        assert_eq!(game.lives(), 3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.max_lives = 0;
        assert!(matches!(Game::new(config), Err(GameError::Config(_))));
    }

    #[test]
    fn draw_before_load_fails() {
        let game = Game::new(GameConfig::default()).unwrap();
        let mut surface = RecordingSurface::new();
        assert!(matches!(game.draw(&mut surface), Err(GameError::ContentNotLoaded)));
    }

    #[test]
    fn load_content_spawns_sprited_bricks_once() {
        let mut game = loaded_game();
        assert_eq!(game.bricks().len(), 50);
        assert!(game.world().has_component::<Sprite>(game.bricks()[0]));
        assert!(matches!(
            game.load_content(&mut FakeLoader),
            Err(GameError::ContentAlreadyLoaded)
        ));

        let mut surface = RecordingSurface::new();
        assert_eq!(game.draw(&mut surface).unwrap(), 52);
    }

    #[test]
    fn quit_skips_the_tick() {
        let mut game = loaded_game();
        let outcome = game.update(FrameInput { intent: MoveIntent::Right, quit: true }, 0.1).unwrap();
        assert_eq!(outcome, FrameOutcome::Quit);
        assert_eq!(game.tick_loop().tick_count(), 0);
    }

    #[test]
    fn update_applies_intent_then_ticks() {
        let mut game = loaded_game();
        let outcome = game.update(FrameInput::from_keys(false, true, false), 0.1).unwrap();
        assert_eq!(outcome, FrameOutcome::Running);
        assert_eq!(
            game.world().get_component::<Position>(game.paddle()).unwrap().x,
            335.0
        );
        assert_eq!(game.tick_loop().tick_count(), 1);
    }

    #[test]
    fn restart_rebuilds_the_board() {
        let mut game = loaded_game();
        let first = game.bricks()[3];
        game.tick_loop.world_mut().disable(first).unwrap();
        game.tick_loop.session_mut().score.award(7);
        game.tick_loop.session_mut().status = GameStatus::GameOver;

        game.restart().unwrap();
        assert_eq!(game.score(), 0);
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.bricks().len(), 50);
        assert!(!game.world().is_alive(first));
        assert_eq!(game.world().matching::<(&Position,), With<crate::components::Brick>>().len(), 50);
        assert_eq!(
            game.world().get_component::<Position>(game.ball()).unwrap(),
            &Position::new(300.0, 320.0)
        );
    }
}
