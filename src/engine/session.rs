//! Game session: state machine, schedules, spawn arbitration, collision dispatch,
//! clearing passes, pause and restart.
//!
//! Everything mutable about a game lives here. The main loop owns one `GameSession` and
//! hands it the physics world on every call; nothing is reached through globals.

use crate::engine::cluster;
use crate::engine::config::SessionConfig;
use crate::engine::events::GameEvent;
use crate::engine::factory::PieceFactory;
use crate::engine::physics::{BodyHandle, PhysicsWorld, Vec2, Velocity};
use crate::engine::piece::{Footprint, Piece, PieceStatus};
use crate::engine::schedule::Schedule;
use crate::engine::score::{ScoreEvent, ScoreTracker, bonus_for};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Active,
    Paused,
    GameOver,
}

/// Velocity command for the falling piece, produced by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityCommand {
    /// Set horizontal velocity, keep vertical.
    Slide(f64),
    /// Set angular velocity.
    Spin(f64),
}

/// What a check tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Another check was running, or the session is paused or over.
    Skipped,
    Ran {
        clusters: usize,
        overflow_removed: usize,
        game_over: bool,
    },
}

#[derive(Debug)]
pub struct GameSession {
    config: SessionConfig,
    state: GameState,
    board: BTreeMap<BodyHandle, Piece>,
    falling: Option<Piece>,
    score: ScoreTracker,
    factory: PieceFactory,
    paused_velocities: HashMap<BodyHandle, Velocity>,
    spawn_schedule: Schedule,
    check_schedule: Schedule,
    check_in_progress: bool,
    clearing: bool,
    /// Earliest session time at which the next spawn may happen.
    spawn_ready_at: Duration,
    now: Duration,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        let score = ScoreTracker::new(config.initial_colors, config.palette_size, config.max_bonus);
        let factory = PieceFactory::new(config.piece_area, config.material);
        Self {
            spawn_schedule: Schedule::new(config.spawn_interval),
            check_schedule: Schedule::new(config.check_interval),
            config,
            state: GameState::Active,
            board: BTreeMap::new(),
            falling: None,
            score,
            factory,
            paused_velocities: HashMap::new(),
            check_in_progress: false,
            clearing: false,
            spawn_ready_at: Duration::ZERO,
            now: Duration::ZERO,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    /// Configure gravity and arm both schedules.
    pub fn start(&mut self, now: Duration, world: &mut dyn PhysicsWorld) {
        world.set_gravity(Vec2::new(0.0, self.config.gravity));
        self.now = now;
        self.state = GameState::Active;
        self.spawn_schedule.arm(now);
        self.check_schedule.arm(now);
        info!(
            colors = self.score.unlocked_colors(),
            piece_area = self.config.piece_area,
            connectivity = ?self.config.connectivity,
            "session started"
        );
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == GameState::Paused
    }

    pub fn is_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn score(&self) -> u32 {
        self.score.score()
    }

    pub fn displayed_score(&self) -> f64 {
        self.score.displayed()
    }

    pub fn unlocked_colors(&self) -> usize {
        self.score.unlocked_colors()
    }

    pub fn next_unlock_at(&self) -> Option<u32> {
        self.score.next_unlock_at()
    }

    pub fn falling(&self) -> Option<&Piece> {
        self.falling.as_ref()
    }

    pub fn board(&self) -> impl Iterator<Item = &Piece> {
        self.board.values()
    }

    pub fn board_len(&self) -> usize {
        self.board.len()
    }

    /// Falling piece first, then the board.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.falling.iter().chain(self.board.values())
    }

    pub fn schedules_armed(&self) -> (bool, bool) {
        (self.spawn_schedule.is_armed(), self.check_schedule.is_armed())
    }

    /// Notifications accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Poll both schedules at session time `now`.
    pub fn advance(&mut self, now: Duration, world: &mut dyn PhysicsWorld) {
        self.now = now;
        if self.spawn_schedule.poll(now) {
            self.try_spawn(world);
        }
        if self.check_schedule.poll(now) {
            self.run_check(world);
        }
    }

    /// Spawn a piece if the session allows one right now.
    pub fn try_spawn(&mut self, world: &mut dyn PhysicsWorld) -> Option<BodyHandle> {
        if self.state != GameState::Active
            || self.falling.is_some()
            || self.clearing
            || self.now < self.spawn_ready_at
        {
            return None;
        }
        let at = self.config.spawn_point();
        let unlocked = self.score.unlocked_colors();
        let piece = match self.factory.spawn(world, &mut self.rng, unlocked, at) {
            Ok(piece) => piece,
            Err(e) => {
                warn!(error = %e, "spawn failed");
                return None;
            }
        };
        debug!(handle = %piece.handle, kind = %piece.kind, color = piece.color, "spawned");
        let (handle, color) = (piece.handle, piece.color);
        self.events.push(GameEvent::Spawned {
            handle,
            kind: piece.kind,
            color,
            at,
        });
        self.falling = Some(piece);
        self.award(ScoreEvent::Spawn, at, Some(color));
        Some(handle)
    }

    /// Dispatch one batch of collision-start pairs. Only the first pair that puts the falling
    /// piece against the ground or a settled piece is acted on.
    pub fn handle_collisions(
        &mut self,
        pairs: &[(BodyHandle, BodyHandle)],
        world: &mut dyn PhysicsWorld,
    ) -> Option<BodyHandle> {
        if self.state != GameState::Active {
            return None;
        }
        let falling = self.falling.as_ref()?.handle;
        let ground = world.ground();
        pairs.iter().find(|&&(a, b)| {
            let other = match (a == falling, b == falling) {
                (true, _) => b,
                (_, true) => a,
                _ => return false,
            };
            other == ground || self.board.contains_key(&other)
        })?;
        self.settle(world)
    }

    fn settle(&mut self, world: &mut dyn PhysicsWorld) -> Option<BodyHandle> {
        let mut piece = self.falling.take()?;
        piece.status = PieceStatus::Settled;
        let (handle, color) = (piece.handle, piece.color);
        let at = world
            .position(handle)
            .unwrap_or_else(|| self.config.spawn_point());
        self.board.insert(handle, piece);
        self.spawn_ready_at = self.now + self.config.settle_rearm_delay;
        self.events.push(GameEvent::Settled { handle, color, at });
        self.award(ScoreEvent::Settle, at, Some(color));
        Some(handle)
    }

    /// Cluster clearing, overflow sweep and the game-over test, in that order.
    pub fn run_check(&mut self, world: &mut dyn PhysicsWorld) -> CheckOutcome {
        if self.check_in_progress || self.state != GameState::Active {
            return CheckOutcome::Skipped;
        }
        self.check_in_progress = true;
        let clusters = self.clear_clusters(world);
        let overflow_removed = self.sweep_overflow(world);
        let game_over = self.check_game_over(world);
        self.check_in_progress = false;
        CheckOutcome::Ran {
            clusters,
            overflow_removed,
            game_over,
        }
    }

    fn footprints(&self, world: &dyn PhysicsWorld) -> Vec<Footprint> {
        self.board
            .values()
            .filter_map(|p| {
                Some(Footprint {
                    handle: p.handle,
                    color: p.color,
                    center: world.position(p.handle)?,
                    bounds: world.bounds(p.handle)?,
                    radius: p.geometry.radius(),
                })
            })
            .collect()
    }

    fn clear_clusters(&mut self, world: &mut dyn PhysicsWorld) -> usize {
        let footprints = self.footprints(world);
        let falling = self.falling.as_ref().map(|p| p.handle);
        let found = cluster::clearable(
            &footprints,
            self.config.connectivity,
            self.config.cluster_min_size,
            falling,
        );
        if found.is_empty() {
            return 0;
        }
        self.clearing = true;
        for c in &found {
            for &h in &c.members {
                self.remove_piece(h, world);
            }
            debug!(color = c.color, size = c.len(), "cluster cleared");
            self.events.push(GameEvent::ClusterCleared {
                color: c.color,
                size: c.len(),
                centroid: c.centroid,
            });
            self.award(
                ScoreEvent::ClusterClear { size: c.len() },
                c.centroid,
                Some(c.color),
            );
        }
        self.clearing = false;
        found.len()
    }

    fn sweep_overflow(&mut self, world: &mut dyn PhysicsWorld) -> usize {
        let footprints = self.footprints(world);
        let Some(sweep) = self
            .config
            .overflow
            .scan(&footprints, self.config.arena.area())
        else {
            return 0;
        };
        self.clearing = true;
        let removed = sweep
            .doomed
            .iter()
            .filter(|&&h| self.remove_piece(h, world).is_some())
            .count();
        self.clearing = false;
        debug!(
            removed,
            fill_ratio = sweep.fill_ratio,
            distance = sweep.distance,
            "overflow sweep"
        );
        self.events.push(GameEvent::OverflowCleared {
            removed,
            fill_ratio: sweep.fill_ratio,
            centroid: sweep.centroid,
        });
        self.award(
            ScoreEvent::OverflowClear {
                removed,
                fill_ratio: sweep.fill_ratio,
            },
            sweep.centroid,
            None,
        );
        removed
    }

    /// Take a settled piece off the board and out of the world, marked `Removed`.
    /// Unknown handles are ignored.
    fn remove_piece(&mut self, handle: BodyHandle, world: &mut dyn PhysicsWorld) -> Option<Piece> {
        let mut piece = self.board.remove(&handle)?;
        piece.status = PieceStatus::Removed;
        world.remove_body(handle);
        Some(piece)
    }

    fn check_game_over(&mut self, world: &dyn PhysicsWorld) -> bool {
        let line = self.config.game_over_y();
        let crossed = self
            .board
            .keys()
            .any(|&h| world.position(h).is_some_and(|p| p.y < line));
        if crossed {
            self.end_game();
        }
        crossed
    }

    fn end_game(&mut self) {
        self.state = GameState::GameOver;
        self.spawn_schedule.disarm();
        self.check_schedule.disarm();
        info!(score = self.score.score(), board = self.board.len(), "game over");
        self.events.push(GameEvent::GameOver {
            score: self.score.score(),
        });
    }

    fn award(&mut self, event: ScoreEvent, at: Vec2, color: Option<u8>) {
        let raw = bonus_for(event, self.config.clear_bonus, &mut self.rng);
        let before = self.score.unlocked_colors();
        if let Some(points) = self.score.award(raw) {
            self.events.push(GameEvent::Scored { points, color, at });
        }
        let after = self.score.unlocked_colors();
        if after > before {
            info!(colors = after, score = self.score.score(), "colors unlocked");
            self.events.push(GameEvent::ColorsUnlocked { count: after });
        }
    }

    /// Apply an input command to the falling piece. No-op unless active with a falling piece.
    pub fn command(&mut self, command: VelocityCommand, world: &mut dyn PhysicsWorld) -> bool {
        if self.state != GameState::Active {
            return false;
        }
        let Some(handle) = self.falling.as_ref().map(|p| p.handle) else {
            return false;
        };
        let Some(mut v) = world.velocity(handle) else {
            return false;
        };
        match command {
            VelocityCommand::Slide(vx) => v.linear.x = vx,
            VelocityCommand::Spin(w) => v.angular = w,
        }
        world.set_velocity(handle, v);
        true
    }

    /// Freeze every piece and suspend the game. Returns false if pausing is not possible.
    pub fn pause(&mut self, world: &mut dyn PhysicsWorld) -> bool {
        if !self.config.pausable || self.state != GameState::Active {
            return false;
        }
        let handles: Vec<BodyHandle> = self.pieces().map(|p| p.handle).collect();
        for h in handles {
            if let Some(v) = world.velocity(h) {
                self.paused_velocities.insert(h, v);
                world.set_velocity(h, Velocity::ZERO);
            }
        }
        self.state = GameState::Paused;
        self.events.push(GameEvent::Paused);
        true
    }

    /// Restore snapshotted velocities and continue.
    pub fn resume(&mut self, world: &mut dyn PhysicsWorld) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        for (h, v) in self.paused_velocities.drain() {
            world.set_velocity(h, v);
        }
        self.state = GameState::Active;
        self.events.push(GameEvent::Resumed);
        true
    }

    pub fn toggle_pause(&mut self, world: &mut dyn PhysicsWorld) -> bool {
        match self.state {
            GameState::Active => self.pause(world),
            GameState::Paused => self.resume(world),
            GameState::GameOver => false,
        }
    }

    /// Tear down every piece and start over with fresh score and palette.
    pub fn restart(&mut self, now: Duration, world: &mut dyn PhysicsWorld) {
        let handles: Vec<BodyHandle> = self.pieces().map(|p| p.handle).collect();
        for h in handles {
            world.remove_body(h);
        }
        self.board.clear();
        self.falling = None;
        self.score.reset();
        self.paused_velocities.clear();
        self.check_in_progress = false;
        self.clearing = false;
        self.now = now;
        self.spawn_ready_at = now;
        self.state = GameState::Active;
        self.spawn_schedule.arm(now);
        self.check_schedule.arm(now);
        info!("session restarted");
        self.events.push(GameEvent::Restarted);
    }

    /// One presentation tick of score easing. Returns true while the readout is still moving.
    pub fn tick_presentation(&mut self) -> bool {
        self.score.tick_display()
    }
}
