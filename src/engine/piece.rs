//! Piece record: a physics handle tagged with its shape, color and size.

use crate::engine::geometry::{Geometry, ShapeKind};
use crate::engine::physics::{Aabb, BodyHandle, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceStatus {
    Falling,
    Settled,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub handle: BodyHandle,
    pub kind: ShapeKind,
    /// Index into the active palette.
    pub color: u8,
    pub geometry: Geometry,
    pub status: PieceStatus,
}

impl Piece {
    #[inline]
    pub fn is_falling(&self) -> bool {
        self.status == PieceStatus::Falling
    }
}

/// Where a settled piece sits right now, read from the physics world for one check tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub handle: BodyHandle,
    pub color: u8,
    pub center: Vec2,
    pub bounds: Aabb,
    /// Circle radius, if the piece is a circle.
    pub radius: Option<f64>,
}

impl Footprint {
    /// Radius for circles, otherwise the larger half extent of the current bounds.
    pub fn half_size(&self) -> f64 {
        self.radius
            .unwrap_or_else(|| (self.bounds.width() / 2.0).max(self.bounds.height() / 2.0))
    }
}
