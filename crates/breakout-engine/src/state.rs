//! Per-session state and the per-tick system context.
//!
//! Score, board bounds and elapsed time are single-instance records owned by
//! the tick loop. They are handed to every system explicitly through a
//! [`TickContext`] rather than stored as entities.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

// ---------------------------------------------------------------------------
// Singletons
// ---------------------------------------------------------------------------

/// Playfield bounds. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width: f32,
    pub height: f32,
}

impl Board {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            width: config.board.width,
            height: config.board.height,
        }
    }
}

/// Seconds elapsed since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeltaTime {
    pub seconds: f64,
}

impl DeltaTime {
    /// Elapsed time in the precision the movement systems integrate with.
    pub fn as_f32(self) -> f32 {
        self.seconds as f32
    }
}

/// Running score. Only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Score(u32);

impl Score {
    pub fn value(self) -> u32 {
        self.0
    }

    /// Add `points`, saturating at `u32::MAX`.
    pub fn award(&mut self, points: u32) {
        self.0 = self.0.saturating_add(points);
    }
}

/// Remaining lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lives {
    remaining: u32,
    max: u32,
}

impl Lives {
    pub fn new(max: u32) -> Self {
        Self { remaining: max, max }
    }

    pub fn remaining(self) -> u32 {
        self.remaining
    }

    pub fn max(self) -> u32 {
        self.max
    }

    /// Take one life away and return how many are left.
    pub fn lose(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Playing,
    /// Every brick has been disabled.
    Cleared,
    /// The ball left the board with no lives remaining.
    GameOver,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Mutable game state that lives outside the component store.
#[derive(Debug, Clone)]
pub struct Session {
    pub score: Score,
    pub lives: Lives,
    pub bricks_remaining: u32,
    pub status: GameStatus,
    /// Picks the horizontal serve direction after a lost life.
    pub rng: Pcg32,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: Score::default(),
            lives: Lives::new(config.max_lives),
            bricks_remaining: config.bricks.count,
            status: GameStatus::Playing,
            rng: Pcg32::seed_from_u64(config.seed),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Everything a system may read or change besides the world itself.
#[derive(Debug)]
pub struct TickContext<'a> {
    pub delta_time: DeltaTime,
    pub board: Board,
    pub config: &'a GameConfig,
    pub session: &'a mut Session,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn score_only_grows() {
        let mut score = Score::default();
        score.award(1);
        score.award(0);
        score.award(4);
        assert_eq!(score.value(), 5);
        score.award(u32::MAX);
        assert_eq!(score.value(), u32::MAX);
    }

    #[test]
    fn lives_stop_at_zero() {
        let mut lives = Lives::new(2);
        assert_eq!(lives.lose(), 1);
        assert_eq!(lives.lose(), 0);
        assert_eq!(lives.lose(), 0);
        assert_eq!(lives.max(), 2);
    }

    #[test]
    fn session_rng_is_seeded_from_config() {
        let config = GameConfig::default();
        let mut a = Session::new(&config);
        let mut b = Session::new(&config);
        let xs: Vec<bool> = (0..16).map(|_| a.rng.gen_bool(0.5)).collect();
        let ys: Vec<bool> = (0..16).map(|_| b.rng.gen_bool(0.5)).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.bricks_remaining, 50);
        assert!(a.is_playing());
    }
}
