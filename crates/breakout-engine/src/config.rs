//! Game configuration.
//!
//! [`GameConfig::default`] reproduces the fixed Breakout layout: a 640x480
//! board, fifty 64x48 bricks in rows of ten, a 128x48 paddle and a 32x32
//! ball. Hosts may load overrides from JSON; any field left out keeps its
//! default.
//!
//! ```
//! use breakout_engine::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "max_lives": 5, "ball": { "speed": 250.0 } }"#).unwrap();
//! assert_eq!(config.max_lives, 5);
//! assert_eq!(config.ball.speed, 250.0);
//! assert_eq!(config.ball.width, 32.0);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::components::{Color, Direction, Position, Size};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How the ball reacts when it strikes several bricks in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiHitPolicy {
    /// Every struck brick is disabled and scored, then the ball reflects once.
    #[default]
    CombinedReflection,
    /// Each struck brick reflects the ball in turn, so an even number of
    /// hits leaves the direction unchanged.
    LastWriteWins,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickConfig {
    pub width: f32,
    pub height: f32,
    pub count: u32,
    pub columns: u32,
    /// Points awarded per brick.
    pub score_value: u32,
    pub tint: Color,
}

impl Default for BrickConfig {
    fn default() -> Self {
        Self {
            width: 64.0,
            height: 48.0,
            count: 50,
            columns: 10,
            score_value: 1,
            tint: Color::WHITE,
        }
    }
}

impl BrickConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Occupied `(columns, rows)` of the brick grid.
    pub fn grid_dimensions(&self) -> (u32, u32) {
        let columns = self.columns.min(self.count);
        let rows = self.count.div_ceil(self.columns.max(1));
        (columns, rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleConfig {
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub color: Color,
    /// Keep the paddle inside `[0, board.width - width]`.
    pub clamp_to_board: bool,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            width: 128.0,
            height: 48.0,
            x: 320.0,
            y: 400.0,
            speed: 150.0,
            color: Color::BLUE,
            clamp_to_board: true,
        }
    }
}

impl PaddleConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub width: f32,
    pub height: f32,
    /// Serve position, used at startup and after a lost life.
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub direction_x: f32,
    pub direction_y: f32,
    pub color: Color,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            width: 32.0,
            height: 32.0,
            x: 300.0,
            y: 320.0,
            speed: 200.0,
            direction_x: 1.0,
            direction_y: 1.0,
            color: Color::MONOGAME_ORANGE,
        }
    }
}

impl BallConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn direction(&self) -> Direction {
        Direction::new(self.direction_x, self.direction_y)
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Complete configuration for one Breakout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub bricks: BrickConfig,
    pub paddle: PaddleConfig,
    pub ball: BallConfig,
    pub max_lives: u32,
    pub multi_hit: MultiHitPolicy,
    /// Seed for the serve-direction RNG.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            bricks: BrickConfig::default(),
            paddle: PaddleConfig::default(),
            ball: BallConfig::default(),
            max_lives: 3,
            multi_hit: MultiHitPolicy::default(),
            seed: 0x5EED_B411,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Reject values the systems cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("board.width", self.board.width)?;
        positive("board.height", self.board.height)?;
        positive("bricks.width", self.bricks.width)?;
        positive("bricks.height", self.bricks.height)?;
        positive("paddle.width", self.paddle.width)?;
        positive("paddle.height", self.paddle.height)?;
        positive("ball.width", self.ball.width)?;
        positive("ball.height", self.ball.height)?;
        non_negative("paddle.speed", self.paddle.speed)?;
        non_negative("ball.speed", self.ball.speed)?;
        unit_axis("ball.direction_x", self.ball.direction_x)?;
        unit_axis("ball.direction_y", self.ball.direction_y)?;

        if self.bricks.count == 0 {
            return Err(invalid("bricks.count", "must be at least 1".to_owned()));
        }
        if self.bricks.columns == 0 {
            return Err(invalid("bricks.columns", "must be at least 1".to_owned()));
        }
        if self.max_lives == 0 {
            return Err(invalid("max_lives", "must be at least 1".to_owned()));
        }
        if self.paddle.width > self.board.width {
            return Err(invalid(
                "paddle.width",
                format!("{} is wider than the board ({})", self.paddle.width, self.board.width),
            ));
        }

        // The grid must fit across the board and end above the paddle.
        let (columns, rows) = self.bricks.grid_dimensions();
        let grid_width = columns as f32 * self.bricks.width;
        if grid_width > self.board.width {
            return Err(invalid(
                "bricks.columns",
                format!("{columns} columns span {grid_width}, wider than the board ({})", self.board.width),
            ));
        }
        let grid_height = rows as f32 * self.bricks.height;
        if grid_height > self.paddle.y.min(self.board.height) {
            return Err(invalid(
                "bricks.count",
                format!("{rows} rows reach y = {grid_height}, past the paddle at y = {}", self.paddle.y),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a positive finite number, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a non-negative finite number, got {value}")))
    }
}

fn unit_axis(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value == -1.0 || value == 0.0 || value == 1.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected -1, 0 or 1, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_layout() {
        let config = GameConfig::default();
        assert_eq!((config.board.width, config.board.height), (640.0, 480.0));
        assert_eq!(config.bricks.count, 50);
        assert_eq!(config.bricks.columns, 10);
        assert_eq!(config.paddle.position(), Position::new(320.0, 400.0));
        assert_eq!(config.ball.direction(), Direction::new(1.0, 1.0));
        assert_eq!(config.ball.color, Color::MONOGAME_ORANGE);
        assert_eq!(config.max_lives, 3);
        assert_eq!(config.multi_hit, MultiHitPolicy::CombinedReflection);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "multi_hit": "last_write_wins", "paddle": { "clamp_to_board": false } }"#,
        )
        .unwrap();
        assert_eq!(config.multi_hit, MultiHitPolicy::LastWriteWins);
        assert!(!config.paddle.clamp_to_board);
        assert_eq!(config.paddle.speed, 150.0);
        assert_eq!(config.bricks, BrickConfig::default());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ max_lives: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_name_the_field() {
        let err = GameConfig::from_json_str(r#"{ "ball": { "direction_y": 0.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ball.direction_y", .. }));

        let err = GameConfig::from_json_str(r#"{ "bricks": { "columns": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bricks.columns", .. }));

        let err = GameConfig::from_json_str(r#"{ "board": { "width": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "board.width", .. }));
    }

    #[test]
    fn brick_grid_must_fit_above_the_paddle() {
        let err = GameConfig::from_json_str(r#"{ "bricks": { "count": 500 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bricks.count", .. }));

        let err = GameConfig::from_json_str(r#"{ "bricks": { "columns": 11, "count": 55 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bricks.columns", .. }));

        // Eight full rows end at y = 384, just above the paddle at 400.
        GameConfig::from_json_str(r#"{ "bricks": { "count": 80 } }"#).unwrap();
        // A lone brick only occupies one column.
        GameConfig::from_json_str(r#"{ "bricks": { "count": 1, "columns": 40 } }"#).unwrap();
    }

    #[test]
    fn grid_dimensions_round_rows_up() {
        let mut bricks = BrickConfig::default();
        assert_eq!(bricks.grid_dimensions(), (10, 5));
        bricks.count = 51;
        assert_eq!(bricks.grid_dimensions(), (10, 6));
        bricks.count = 3;
        assert_eq!(bricks.grid_dimensions(), (3, 1));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::from_path("/definitely/not/here/breakout.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
