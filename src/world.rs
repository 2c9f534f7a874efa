//! Rapier-backed arena: static floor and side walls, dynamic pieces, collision-start events.

use crate::engine::config::Arena;
use crate::engine::geometry::{Geometry, ShapeKind};
use crate::engine::physics::{
    Aabb, BodyHandle, Material, PhysicsError, PhysicsWorld, Vec2, Velocity,
};
use rapier2d::crossbeam::channel::{Receiver, unbounded};
use rapier2d::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

/// Length of one physics step.
pub const STEP: Duration = Duration::from_nanos(16_666_667);

/// Thickness of the floor and walls.
const BORDER: f64 = 20.0;

pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    collector: ChannelEventCollector,
    collisions: Receiver<CollisionEvent>,
    _contact_forces: Receiver<ContactForceEvent>,
    handles: HashMap<BodyHandle, RigidBodyHandle>,
    ground: BodyHandle,
    next_id: u64,
}

impl RapierWorld {
    pub fn new(arena: &Arena) -> Self {
        let (collision_send, collisions) = unbounded();
        let (force_send, contact_forces) = unbounded();
        let mut world = Self {
            gravity: vector![0.0, 0.0],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            collector: ChannelEventCollector::new(collision_send, force_send),
            collisions,
            _contact_forces: contact_forces,
            handles: HashMap::new(),
            ground: BodyHandle(0),
            next_id: 0,
        };

        let (w, h) = (arena.width, arena.height);
        world.ground = world.add_fixed(Vec2::new(w / 2.0, h + BORDER / 2.0), w / 2.0 + BORDER, BORDER / 2.0);
        // Walls reach well above the arena so nothing spills over the top edge.
        world.add_fixed(Vec2::new(-BORDER / 2.0, h / 2.0), BORDER / 2.0, h);
        world.add_fixed(Vec2::new(w + BORDER / 2.0, h / 2.0), BORDER / 2.0, h);
        world
    }

    fn allocate(&mut self) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        handle
    }

    fn add_fixed(&mut self, center: Vec2, half_width: f64, half_height: f64) -> BodyHandle {
        let handle = self.allocate();
        let body = RigidBodyBuilder::fixed()
            .translation(vector![center.x as Real, center.y as Real])
            .user_data(u128::from(handle.0))
            .build();
        let rb = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half_width as Real, half_height as Real)
            .friction(0.5)
            .build();
        self.colliders
            .insert_with_parent(collider, rb, &mut self.bodies);
        self.handles.insert(handle, rb);
        handle
    }

    fn collider_for(kind: ShapeKind, geometry: &Geometry) -> Result<ColliderBuilder, PhysicsError> {
        match geometry {
            Geometry::Circle { radius } => Ok(ColliderBuilder::ball(*radius as Real)),
            Geometry::Rect { width, height } => Ok(ColliderBuilder::cuboid(
                (width / 2.0) as Real,
                (height / 2.0) as Real,
            )),
            Geometry::Regular { .. } | Geometry::Outline { .. } => {
                let points: Vec<Point<Real>> = geometry
                    .outline(0)
                    .iter()
                    .map(|v| point![v.x as Real, v.y as Real])
                    .collect();
                ColliderBuilder::convex_hull(&points).ok_or(PhysicsError::DegenerateShape {
                    kind,
                    points: points.len(),
                })
            }
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.handles.get(&handle).and_then(|rb| self.bodies.get(*rb))
    }

    fn owner(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let parent = self.colliders.get(collider)?.parent()?;
        let body = self.bodies.get(parent)?;
        Some(BodyHandle(body.user_data as u64))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_body(
        &mut self,
        kind: ShapeKind,
        geometry: &Geometry,
        material: &Material,
        position: Vec2,
    ) -> Result<BodyHandle, PhysicsError> {
        let collider = Self::collider_for(kind, geometry)?
            .friction(material.friction as Real)
            .restitution(material.restitution as Real)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let handle = self.allocate();
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x as Real, position.y as Real])
            .linear_damping(material.linear_damping as Real)
            .angular_damping(material.angular_damping as Real)
            .ccd_enabled(true)
            .user_data(u128::from(handle.0))
            .build();
        let rb = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, rb, &mut self.bodies);
        self.handles.insert(handle, rb);
        Ok(handle)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if handle == self.ground {
            return false;
        }
        let Some(rb) = self.handles.remove(&handle) else {
            return false;
        };
        self.bodies
            .remove(
                rb,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        let t = self.body(handle)?.translation();
        Some(Vec2::new(f64::from(t.x), f64::from(t.y)))
    }

    fn angle(&self, handle: BodyHandle) -> Option<f64> {
        Some(f64::from(self.body(handle)?.rotation().angle()))
    }

    fn bounds(&self, handle: BodyHandle) -> Option<Aabb> {
        let body = self.body(handle)?;
        body.colliders()
            .iter()
            .filter_map(|c| self.colliders.get(*c))
            .map(|c| {
                let aabb = c.compute_aabb();
                Aabb {
                    min: Vec2::new(f64::from(aabb.mins.x), f64::from(aabb.mins.y)),
                    max: Vec2::new(f64::from(aabb.maxs.x), f64::from(aabb.maxs.y)),
                }
            })
            .reduce(|a, b| Aabb {
                min: Vec2::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
                max: Vec2::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
            })
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Velocity> {
        let body = self.body(handle)?;
        let v = body.linvel();
        Some(Velocity {
            linear: Vec2::new(f64::from(v.x), f64::from(v.y)),
            angular: f64::from(body.angvel()),
        })
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Velocity) {
        let Some(body) = self
            .handles
            .get(&handle)
            .and_then(|rb| self.bodies.get_mut(*rb))
        else {
            return;
        };
        body.set_linvel(
            vector![velocity.linear.x as Real, velocity.linear.y as Real],
            true,
        );
        body.set_angvel(velocity.angular as Real, true);
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x as Real, gravity.y as Real];
    }

    fn ground(&self) -> BodyHandle {
        self.ground
    }

    fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.collector,
        );
    }

    fn drain_collisions(&mut self) -> Vec<(BodyHandle, BodyHandle)> {
        let events: Vec<CollisionEvent> = self.collisions.try_iter().collect();
        events
            .into_iter()
            .filter_map(|e| match e {
                CollisionEvent::Started(a, b, _) => Some((self.owner(a)?, self.owner(b)?)),
                CollisionEvent::Stopped(..) => None,
            })
            .collect()
    }
}
