//! Physics seam: value types and the world trait the engine drives.
//!
//! The engine never integrates motion itself. It creates and removes bodies, reads their
//! pose and bounds by handle, and writes velocity only for the falling piece (input) and
//! for pause snapshots.

use crate::engine::geometry::{Geometry, ShapeKind};
use thiserror::Error;

/// 2D vector in arena units. `y` grows downwards (0 is the top of the arena).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotate around the origin by `angle` radians.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Mean of a set of points; `None` for an empty set.
    pub fn centroid(points: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut sum = Self::ZERO;
        let mut n = 0usize;
        for p in points {
            sum.x += p.x;
            sum.y += p.y;
            n += 1;
        }
        (n > 0).then(|| Self::new(sum.x / n as f64, sum.y / n as f64))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Axis-aligned bounding box in arena units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn around(center: Vec2, half_width: f64, half_height: f64) -> Self {
        Self {
            min: Vec2::new(center.x - half_width, center.y - half_height),
            max: Vec2::new(center.x + half_width, center.y + half_height),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Larger of width and height.
    #[inline]
    pub fn max_extent(&self) -> f64 {
        self.width().max(self.height())
    }
}

/// Linear and angular velocity of a body (units/s, rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f64,
}

impl Velocity {
    pub const ZERO: Self = Self {
        linear: Vec2::ZERO,
        angular: 0.0,
    };
}

/// Opaque identity of a body inside the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Surface and damping profile shared by every piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: f64,
    pub restitution: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
}

impl Material {
    pub const PIECE: Self = Self {
        friction: 0.3,
        restitution: 0.1,
        linear_damping: 1.2,
        angular_damping: 1.2,
    };
}

impl Default for Material {
    fn default() -> Self {
        Self::PIECE
    }
}

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("could not build a collider for a {kind} with {points} outline points")]
    DegenerateShape { kind: ShapeKind, points: usize },
}

/// Capabilities the engine consumes from a rigid-body simulation.
pub trait PhysicsWorld {
    /// Create a dynamic body and add it to the simulation.
    fn create_body(
        &mut self,
        kind: ShapeKind,
        geometry: &Geometry,
        material: &Material,
        position: Vec2,
    ) -> Result<BodyHandle, PhysicsError>;

    /// Remove a body. Returns false if the handle is unknown.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn position(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Rotation in radians.
    fn angle(&self, handle: BodyHandle) -> Option<f64>;

    fn bounds(&self, handle: BodyHandle) -> Option<Aabb>;

    fn velocity(&self, handle: BodyHandle) -> Option<Velocity>;

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Velocity);

    fn set_gravity(&mut self, gravity: Vec2);

    /// The static floor body.
    fn ground(&self) -> BodyHandle;

    /// Advance the simulation by one fixed step.
    fn step(&mut self);

    /// Collision-start notifications queued since the last drain, in arrival order.
    fn drain_collisions(&mut self) -> Vec<(BodyHandle, BodyHandle)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_of_points() {
        let c = Vec2::centroid([Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(5.0, 9.0)])
            .unwrap();
        assert!((c.x - 5.0).abs() < 1e-9);
        assert!((c.y - 3.0).abs() < 1e-9);
        assert!(Vec2::centroid(std::iter::empty()).is_none());
    }

    #[test]
    fn test_aabb_extents() {
        let b = Aabb::around(Vec2::new(10.0, 10.0), 4.0, 1.0);
        assert_eq!(b.width(), 8.0);
        assert_eq!(b.height(), 2.0);
        assert_eq!(b.area(), 16.0);
        assert_eq!(b.max_extent(), 8.0);
    }
}
