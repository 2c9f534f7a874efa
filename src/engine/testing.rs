//! In-memory world for engine tests: bodies stay where tests put them.

use crate::engine::geometry::{Geometry, ShapeKind};
use crate::engine::physics::{
    Aabb, BodyHandle, Material, PhysicsError, PhysicsWorld, Vec2, Velocity,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct FakeBody {
    pub kind: ShapeKind,
    pub position: Vec2,
    pub half: Vec2,
    pub velocity: Velocity,
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    pub bodies: BTreeMap<BodyHandle, FakeBody>,
    pub pending: Vec<(BodyHandle, BodyHandle)>,
    pub gravity: Vec2,
    pub steps: usize,
    next_id: u64,
}

impl FakeWorld {
    pub const GROUND: BodyHandle = BodyHandle(0);

    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn place(&mut self, handle: BodyHandle, x: f64, y: f64) {
        if let Some(b) = self.bodies.get_mut(&handle) {
            b.position = Vec2::new(x, y);
        }
    }

    pub fn push_collision(&mut self, a: BodyHandle, b: BodyHandle) {
        self.pending.push((a, b));
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }
}

impl PhysicsWorld for FakeWorld {
    fn create_body(
        &mut self,
        kind: ShapeKind,
        geometry: &Geometry,
        _material: &Material,
        position: Vec2,
    ) -> Result<BodyHandle, PhysicsError> {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            handle,
            FakeBody {
                kind,
                position,
                half: geometry.half_extents(),
                velocity: Velocity::ZERO,
            },
        );
        Ok(handle)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(&handle).is_some()
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.position)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f64> {
        self.bodies.get(&handle).map(|_| 0.0)
    }

    fn bounds(&self, handle: BodyHandle) -> Option<Aabb> {
        self.bodies
            .get(&handle)
            .map(|b| Aabb::around(b.position, b.half.x, b.half.y))
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Velocity> {
        self.bodies.get(&handle).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Velocity) {
        if let Some(b) = self.bodies.get_mut(&handle) {
            b.velocity = velocity;
        }
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn ground(&self) -> BodyHandle {
        Self::GROUND
    }

    fn step(&mut self) {
        self.steps += 1;
    }

    fn drain_collisions(&mut self) -> Vec<(BodyHandle, BodyHandle)> {
        std::mem::take(&mut self.pending)
    }
}
