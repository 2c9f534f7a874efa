//! Session configuration, read at session start and on restart.

use crate::engine::cluster::Connectivity;
use crate::engine::overflow::OverflowMonitor;
use crate::engine::physics::{Material, Vec2};
use crate::engine::score::ClearBonus;
use std::time::Duration;
use thiserror::Error;

/// Number of colors in the full neon palette.
pub const PALETTE_SIZE: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("arena must be at least {min}x{min} units, got {width}x{height}")]
    ArenaTooSmall { width: f64, height: f64, min: f64 },
    #[error("initial color count must be between 2 and {max}, got {got}")]
    ColorCount { got: usize, max: usize },
    #[error("piece area must be positive, got {0}")]
    PieceArea(f64),
    #[error("{name} interval must be non-zero")]
    ZeroInterval { name: &'static str },
    #[error("game-over line must be a fraction of the arena height in (0, 1), got {0}")]
    GameOverLine(f64),
    #[error("cluster size must be at least 2, got {0}")]
    ClusterSize(usize),
}

/// Arena dimensions in simulation units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Arena {
    pub const MIN_SIDE: f64 = 200.0;

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Piece size categories: target area per piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PieceSize {
    Small,
    #[default]
    Medium,
    Large,
    XLarge,
}

impl PieceSize {
    pub fn target_area(self) -> f64 {
        match self {
            Self::Small => 2500.0,
            Self::Medium => 3500.0,
            Self::Large => 4500.0,
            Self::XLarge => 6000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub arena: Arena,
    pub piece_area: f64,
    pub material: Material,
    /// Downward acceleration in units/s².
    pub gravity: f64,
    /// Spawn point distance below the top edge.
    pub spawn_depth: f64,
    pub initial_colors: usize,
    pub palette_size: usize,
    pub connectivity: Connectivity,
    pub cluster_min_size: usize,
    pub clear_bonus: ClearBonus,
    pub max_bonus: u32,
    pub overflow: OverflowMonitor,
    pub spawn_interval: Duration,
    pub check_interval: Duration,
    /// Wait after a settle before another spawn is allowed.
    pub settle_rearm_delay: Duration,
    /// Game-over boundary as a fraction of arena height from the top.
    pub game_over_line: f64,
    pub pausable: bool,
    /// Horizontal speed for slide commands and angular speed for spin commands.
    pub slide_speed: f64,
    pub spin_speed: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            arena: Arena {
                width: 420.0,
                height: 640.0,
            },
            piece_area: PieceSize::default().target_area(),
            material: Material::PIECE,
            gravity: 300.0,
            spawn_depth: 50.0,
            initial_colors: 4,
            palette_size: PALETTE_SIZE,
            connectivity: Connectivity::default(),
            cluster_min_size: 5,
            clear_bonus: ClearBonus::default(),
            max_bonus: 1000,
            overflow: OverflowMonitor::default(),
            spawn_interval: Duration::from_millis(1000),
            check_interval: Duration::from_millis(100),
            settle_rearm_delay: Duration::ZERO,
            game_over_line: 0.2,
            pausable: true,
            slide_speed: 300.0,
            spin_speed: 3.0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Arena { width, height } = self.arena;
        if width < Arena::MIN_SIDE || height < Arena::MIN_SIDE {
            return Err(ConfigError::ArenaTooSmall {
                width,
                height,
                min: Arena::MIN_SIDE,
            });
        }
        if !(2..=self.palette_size).contains(&self.initial_colors) {
            return Err(ConfigError::ColorCount {
                got: self.initial_colors,
                max: self.palette_size,
            });
        }
        if self.piece_area <= 0.0 || !self.piece_area.is_finite() {
            return Err(ConfigError::PieceArea(self.piece_area));
        }
        if self.spawn_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "spawn" });
        }
        if self.check_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "check" });
        }
        if !(self.game_over_line > 0.0 && self.game_over_line < 1.0) {
            return Err(ConfigError::GameOverLine(self.game_over_line));
        }
        if self.cluster_min_size < 2 {
            return Err(ConfigError::ClusterSize(self.cluster_min_size));
        }
        Ok(())
    }

    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.arena.width / 2.0, self.spawn_depth)
    }

    /// y coordinate of the game-over boundary.
    pub fn game_over_y(&self) -> f64 {
        self.arena.height * self.game_over_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut c = SessionConfig::default();
        c.initial_colors = 11;
        assert!(matches!(c.validate(), Err(ConfigError::ColorCount { got: 11, .. })));

        let mut c = SessionConfig::default();
        c.arena.width = 50.0;
        assert!(matches!(c.validate(), Err(ConfigError::ArenaTooSmall { .. })));

        let mut c = SessionConfig::default();
        c.check_interval = Duration::ZERO;
        assert_eq!(c.validate(), Err(ConfigError::ZeroInterval { name: "check" }));
    }

    #[test]
    fn test_game_over_line_position() {
        let c = SessionConfig::default();
        assert!((c.game_over_y() - 128.0).abs() < 1e-9);
        assert_eq!(c.spawn_point(), Vec2::new(210.0, 50.0));
    }
}
