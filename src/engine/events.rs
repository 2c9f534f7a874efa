//! Outbound notifications for the presentation and sound layers.

use crate::engine::geometry::ShapeKind;
use crate::engine::physics::{BodyHandle, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Spawned {
        handle: BodyHandle,
        kind: ShapeKind,
        color: u8,
        at: Vec2,
    },
    /// The falling piece came to rest on the ground or the board.
    Settled {
        handle: BodyHandle,
        color: u8,
        at: Vec2,
    },
    /// Points were added; `color` is the palette index the label should use.
    Scored {
        points: u32,
        color: Option<u8>,
        at: Vec2,
    },
    ClusterCleared {
        color: u8,
        size: usize,
        centroid: Vec2,
    },
    OverflowCleared {
        removed: usize,
        fill_ratio: f64,
        centroid: Vec2,
    },
    ColorsUnlocked {
        count: usize,
    },
    Paused,
    Resumed,
    GameOver {
        score: u32,
    },
    Restarted,
}
