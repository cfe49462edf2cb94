//! Variable-timestep tick loop.
//!
//! The [`TickLoop`] owns the [`World`] and the [`Session`]. Each tick:
//!
//! 1. The host-supplied elapsed time becomes the tick's [`DeltaTime`]. It
//!    must be finite and non-negative; anything else is rejected before a
//!    system runs.
//! 2. Every registered system runs to completion, in registration order,
//!    with a fresh [`TickContext`].
//! 3. The tick counter and simulation time advance.
//!
//! A system error stops the tick immediately and is returned to the caller
//! as [`TickError::System`].
//! Systems only ask the world for components their queries guarantee, so an
//! error here is a bug rather than a game condition.
//!
//! # Example
//!
//! ```
//! use breakout_engine::prelude::*;
//!
//! let mut tick_loop = TickLoop::new(World::new(), GameConfig::default());
//! tick_loop.add_system("noop", |_world, _ctx| Ok(()));
//!
//! for _ in 0..10 {
//!     tick_loop.tick(1.0 / 60.0).unwrap();
//! }
//! assert_eq!(tick_loop.tick_count(), 10);
//! ```

use std::time::{Duration, Instant};

use breakout_ecs::prelude::*;

use crate::config::GameConfig;
use crate::state::{Board, DeltaTime, Session, TickContext};
use crate::systems;

// ---------------------------------------------------------------------------
// TickError
// ---------------------------------------------------------------------------

/// Why a tick did not complete.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The elapsed time was NaN, infinite or negative.
    #[error("invalid delta time {dt}: must be finite and non-negative")]
    InvalidDeltaTime { dt: f64 },

    /// A system returned an error.
    #[error(transparent)]
    System(#[from] EcsError),
}

/// Accept `dt` only if it is a finite, non-negative number of seconds.
pub fn check_delta_time(dt: f64) -> Result<(), TickError> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(())
    } else {
        Err(TickError::InvalidDeltaTime { dt })
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(String, Duration)>,
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// A system function run once per tick.
///
/// Systems mutate the world directly. Score, lives and the other session
/// records are reached through the [`TickContext`].
pub type SystemFn = fn(&mut World, &mut TickContext<'_>) -> Result<(), EcsError>;

#[derive(Debug)]
struct RegisteredSystem {
    name: String,
    func: SystemFn,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Runs the system pipeline against the world, one tick at a time.
pub struct TickLoop {
    world: World,
    session: Session,
    config: GameConfig,
    board: Board,
    systems: Vec<RegisteredSystem>,
    tick_counter: u64,
    /// Sum of every delta time supplied so far.
    sim_time: f64,
    last_diagnostics: TickDiagnostics,
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_counter", &self.tick_counter)
            .field("systems", &self.system_names())
            .field("status", &self.session.status)
            .finish()
    }
}

impl TickLoop {
    /// Create a loop with no systems and a fresh session built from `config`.
    pub fn new(world: World, config: GameConfig) -> Self {
        Self {
            world,
            session: Session::new(&config),
            board: Board::from_config(&config),
            config,
            systems: Vec::new(),
            tick_counter: 0,
            sim_time: 0.0,
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Create a loop running the Breakout simulation pipeline.
    ///
    /// Movement runs first, then rectangle alignment, then both collision
    /// systems. Collision reads the rectangles, so alignment must sit
    /// between the two groups.
    pub fn breakout(world: World, config: GameConfig) -> Self {
        let mut tick_loop = Self::new(world, config);
        tick_loop.add_system(systems::PADDLE_MOVEMENT, systems::paddle_movement);
        tick_loop.add_system_after(
            systems::BALL_MOVEMENT,
            &[systems::PADDLE_MOVEMENT],
            systems::ball_movement,
        );
        tick_loop.add_system_after(
            systems::ALIGN_RECTANGLES,
            &[systems::PADDLE_MOVEMENT, systems::BALL_MOVEMENT],
            systems::align_rectangles,
        );
        tick_loop.add_system_after(
            systems::PADDLE_COLLISION,
            &[systems::ALIGN_RECTANGLES],
            systems::paddle_collision,
        );
        tick_loop.add_system_after(
            systems::BRICK_COLLISION,
            &[systems::ALIGN_RECTANGLES, systems::PADDLE_COLLISION],
            systems::brick_collision,
        );
        tick_loop
    }

    /// Register a system to be run each tick, after every system registered
    /// before it.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        self.add_system_after(name, &[], func);
    }

    /// Register a system that must run after every system in `after`.
    ///
    /// Systems run in registration order, so requiring each dependency to
    /// be registered first is what enforces the ordering.
    ///
    /// # Panics
    ///
    /// - If any system in `after` is not already registered.
    /// - If a system with this name already exists.
    pub fn add_system_after(&mut self, name: &str, after: &[&str], func: SystemFn) {
        for dep in after {
            assert!(
                self.systems.iter().any(|s| s.name == *dep),
                "system '{name}' declares dependency on '{dep}', but '{dep}' is not registered"
            );
        }
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );

        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Execute one tick with `dt` seconds of elapsed time.
    ///
    /// # Errors
    ///
    /// - [`TickError::InvalidDeltaTime`] if `dt` is NaN, infinite or
    ///   negative. No system runs.
    /// - [`TickError::System`] with the first error raised by a system.
    ///   Later systems do not run.
    ///
    /// Either way the tick counter and simulation time do not advance.
    pub fn tick(&mut self, dt: f64) -> Result<(), TickError> {
        if let Err(e) = check_delta_time(dt) {
            tracing::warn!(tick = self.tick_counter, dt, "rejected delta time");
            return Err(e);
        }

        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());
        let mut ctx = TickContext {
            delta_time: DeltaTime { seconds: dt },
            board: self.board,
            config: &self.config,
            session: &mut self.session,
        };

        for system in &self.systems {
            let sys_start = Instant::now();
            if let Err(e) = (system.func)(&mut self.world, &mut ctx) {
                tracing::error!(system = %system.name, tick = self.tick_counter, error = %e, "system failed");
                return Err(e.into());
            }
            system_times.push((system.name.clone(), sys_start.elapsed()));
        }

        self.tick_counter += 1;
        self.sim_time += dt;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
        };
        tracing::trace!(tick = self.tick_counter, dt, "tick complete");
        Ok(())
    }

    /// Run `count` ticks of `dt` seconds each, stopping at the first error.
    pub fn run_ticks(&mut self, count: u64, dt: f64) -> Result<(), TickError> {
        for _ in 0..count {
            self.tick(dt)?;
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Total simulated seconds.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup, input and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Registered system names, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{self, Position, Speed};

    fn setup_loop() -> TickLoop {
        let mut world = World::new();
        components::register_all(&mut world);
        TickLoop::new(world, GameConfig::default())
    }

    fn drift_right(world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
        for e in world.matching::<(&Position, &Speed), ()>() {
            let speed = world.get_component::<Speed>(e)?.value;
            world.get_component_mut::<Position>(e)?.x += speed * ctx.delta_time.as_f32();
        }
        Ok(())
    }

    fn score_one(_world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
        ctx.session.score.award(1);
        Ok(())
    }

    fn fail(world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), EcsError> {
        world.single::<(&Position,), ()>().map(|_| ())
    }

    // -- 1. Construction ----------------------------------------------------

    #[test]
    fn new_tick_loop_starts_at_zero() {
        let tick_loop = setup_loop();
        assert_eq!(tick_loop.tick_count(), 0);
        assert_eq!(tick_loop.sim_time(), 0.0);
        assert_eq!(tick_loop.system_count(), 0);
        assert_eq!(tick_loop.session().score.value(), 0);
    }

    #[test]
    fn breakout_pipeline_order() {
        let tick_loop = TickLoop::breakout(World::new(), GameConfig::default());
        assert_eq!(
            tick_loop.system_names(),
            vec![
                systems::PADDLE_MOVEMENT,
                systems::BALL_MOVEMENT,
                systems::ALIGN_RECTANGLES,
                systems::PADDLE_COLLISION,
                systems::BRICK_COLLISION,
            ]
        );
    }

    // -- 2. Registration ----------------------------------------------------

    #[test]
    #[should_panic(expected = "duplicate system name")]
    fn duplicate_system_name_panics() {
        let mut tick_loop = setup_loop();
        tick_loop.add_system("score", score_one);
        tick_loop.add_system("score", score_one);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn dependency_on_missing_system_panics() {
        let mut tick_loop = setup_loop();
        tick_loop.add_system_after("score", &["movement"], score_one);
    }

    // -- 3. Execution -------------------------------------------------------

    #[test]
    fn tick_passes_delta_time_and_session() {
        let mut tick_loop = setup_loop();
        let e = tick_loop
            .world_mut()
            .spawn_bundle(
                ComponentBundle::new()
                    .with(Position::new(0.0, 0.0))
                    .with(Speed { value: 10.0 }),
            )
            .unwrap();
        tick_loop.add_system("drift", drift_right);
        tick_loop.add_system_after("score", &["drift"], score_one);

        tick_loop.tick(0.5).unwrap();
        tick_loop.tick(0.25).unwrap();

        assert_eq!(tick_loop.world().get_component::<Position>(e).unwrap().x, 7.5);
        assert_eq!(tick_loop.session().score.value(), 2);
        assert_eq!(tick_loop.tick_count(), 2);
        assert_eq!(tick_loop.sim_time(), 0.75);
    }

    #[test]
    fn failing_system_stops_the_tick() {
        let mut tick_loop = setup_loop();
        tick_loop.add_system("fail", fail);
        tick_loop.add_system("score", score_one);

        let err = tick_loop.tick(0.1).unwrap_err();
        assert!(matches!(err, TickError::System(EcsError::NotSingle { found: 0, .. })));
        assert_eq!(tick_loop.session().score.value(), 0);
        assert_eq!(tick_loop.tick_count(), 0);
    }

    #[test]
    fn bad_delta_time_is_rejected_before_any_system() {
        let mut tick_loop = setup_loop();
        tick_loop.add_system("score", score_one);
        tick_loop.tick(0.0).unwrap();

        for dt in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
            let err = tick_loop.tick(dt).unwrap_err();
            assert!(matches!(err, TickError::InvalidDeltaTime { .. }), "dt = {dt}");
        }
        assert_eq!(tick_loop.session().score.value(), 1);
        assert_eq!(tick_loop.tick_count(), 1);
        assert_eq!(tick_loop.sim_time(), 0.0);
        assert!(tick_loop.run_ticks(2, f64::NAN).is_err());
    }

    #[test]
    fn dependencies_registered_earlier_are_accepted() {
        let mut tick_loop = setup_loop();
        tick_loop.add_system("a", score_one);
        tick_loop.add_system_after("b", &["a"], score_one);
        tick_loop.add_system_after("c", &["a", "b"], score_one);
        assert_eq!(tick_loop.system_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn diagnostics_record_every_system() {
        let mut tick_loop = setup_loop();
        tick_loop.add_system("a", score_one);
        tick_loop.add_system("b", score_one);
        tick_loop.run_ticks(3, 0.016).unwrap();

        let diag = tick_loop.last_diagnostics();
        let names: Vec<&str> = diag.system_times.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(diag.total_time >= diag.system_times[0].1);
    }
}
