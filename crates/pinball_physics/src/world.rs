//! Physics world and the fixed-step scheduler
//!
//! The world owns every ball, the static colliders and both broad-phase
//! indices. [`PhysicsWorld::update`] is called once per host frame with the
//! current wall-clock time and runs as many fixed-duration sub-steps as needed
//! to catch up. Each sub-step is split at collision times: find the earliest
//! impact over all balls, advance everything to it, resolve it and continue
//! with the remaining time.

use log::{debug, trace, warn};
use pinball_math::Vec3;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use slotmap::SlotMap;

use crate::ball::{Ball, BallKey, BallSnapshot};
use crate::bounds::Aabb;
use crate::collider::{Collider, ColliderId, ShapeFlags};
use crate::config::{ContactTolerances, PhysicsConfig, TableSettings};
use crate::event::{CollisionEvent, EventSink, HitEvent, HitTarget, Impact};
use crate::integrator::{Mover, StepContext};
use crate::material::PhysicsMaterial;
use crate::response::{self, BallImpact, ResponseContext};
use crate::shapes::{ball_ball_toi, HitPlane, HitShape, SweptSphere};
use crate::spatial::Bvh;
use crate::timers::{TimerId, Timers};

/// Squared center distance below which two balls count as coincident
const COINCIDENT_DISTANCE_SQUARED: f32 = 1.0e-8;

/// Lift applied to a ball sitting exactly on top of another
const COINCIDENT_LIFT: f32 = 1.0;

/// Downward velocity given to the lifted ball so the pair resolves normally
const COINCIDENT_KICK: f32 = 0.1;

/// Floor for the forced time quantum so a bad config cannot stall a sub-step
const MIN_STATIC_TIME: f32 = 1.0e-6;

/// Scheduler lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started; the next `update` only records the start time
    Idle,
    /// Started and waiting for the next frame
    Running,
    /// Inside `update`, running sub-steps
    Stepping,
}

/// Diagnostics of one scheduler invocation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Sub-steps executed
    pub substeps: u32,
    /// Real time dropped by the frame-skip safety valve
    pub skipped_us: u64,
    /// Inner iterations whose hit time was forced to the static quantum
    pub forced_static: u32,
}

/// Earliest hit found so far for one ball
struct HitSearch {
    limit: f32,
    best: Option<CollisionEvent>,
}

impl HitSearch {
    fn offer(&mut self, impact: Impact, target: HitTarget) {
        if impact.time <= self.limit {
            self.limit = impact.time;
            self.best = Some(CollisionEvent::new(impact, target));
        }
    }
}

/// The physics world containing the table geometry and all balls
pub struct PhysicsWorld {
    config: PhysicsConfig,
    table: TableSettings,
    gravity: Vec3,
    /// Slot 0 is the playfield, slot 1 the glass; the rest are indexed
    colliders: Vec<Collider>,
    static_index: Bvh<ColliderId>,
    static_index_dirty: bool,
    dynamic_index: Bvh<BallKey>,
    balls: SlotMap<BallKey, Ball>,
    next_ball_id: u32,
    timers: Timers,
    rng: Box<dyn RngCore + Send>,
    state: SchedulerState,
    start_us: u64,
    current_us: u64,
    physics_iterations: u64,
    swap_ball_handling: bool,
    static_first: bool,
    reverse_contacts: bool,
    // Scratch buffers reused across sub-steps
    ball_order: Vec<BallKey>,
    contacts: Vec<(BallKey, CollisionEvent)>,
    static_candidates: Vec<ColliderId>,
    dynamic_candidates: Vec<BallKey>,
}

impl PhysicsWorld {
    /// Create a world for a table, with a random source seeded from the config
    pub fn new(config: PhysicsConfig, table: TableSettings) -> Self {
        let playfield = Collider::new(HitShape::Plane(HitPlane::new(Vec3::Z, 0.0)))
            .with_material(table.playfield_material);
        let glass = Collider::new(HitShape::Plane(HitPlane::new(-Vec3::Z, -table.glass_height)))
            .with_material(PhysicsMaterial::GLASS);

        debug!(
            "Created physics world: table {}x{}, slope {} deg, seed {:#x}",
            table.right - table.left,
            table.bottom - table.top,
            table.slope_degrees,
            config.seed
        );

        Self {
            rng: Box::new(Pcg32::seed_from_u64(config.seed)),
            gravity: table.gravity_vector(),
            config,
            table,
            colliders: vec![playfield, glass],
            static_index: Bvh::new(),
            static_index_dirty: false,
            dynamic_index: Bvh::new(),
            balls: SlotMap::with_key(),
            next_ball_id: 0,
            timers: Timers::new(),
            state: SchedulerState::Idle,
            start_us: 0,
            current_us: 0,
            physics_iterations: 0,
            swap_ball_handling: false,
            static_first: false,
            reverse_contacts: false,
            ball_order: Vec::new(),
            contacts: Vec::new(),
            static_candidates: Vec::new(),
            dynamic_candidates: Vec::new(),
        }
    }

    /// Builder: replace the random source used for scatter
    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn table(&self) -> &TableSettings {
        &self.table
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Override gravity (for example while the table is nudged)
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Total sub-steps executed since creation
    pub fn physics_iterations(&self) -> u64 {
        self.physics_iterations
    }

    /// Physics time since `start`, in milliseconds
    pub fn physics_time_ms(&self) -> u64 {
        self.current_us.saturating_sub(self.start_us) / 1000
    }

    // --- Static geometry ---

    /// Register a static collider; the static index is rebuilt before the next sub-step
    pub fn add_collider(&mut self, collider: Collider) -> ColliderId {
        let id = ColliderId(self.colliders.len());
        self.colliders.push(collider);
        self.static_index_dirty = true;
        id
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id.0)
    }

    /// All colliders, playfield and glass first
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Enable or disable a collider; returns false for an unknown id
    pub fn set_collider_enabled(&mut self, id: ColliderId, enabled: bool) -> bool {
        match self.colliders.get_mut(id.0) {
            Some(collider) => {
                collider.flags.set(ShapeFlags::ENABLED, enabled);
                true
            }
            None => false,
        }
    }

    /// Build the static index from every collider except playfield and glass
    pub fn build_static_index(&mut self) {
        self.static_index.rebuild(
            self.colliders
                .iter()
                .enumerate()
                .skip(2)
                .map(|(i, collider)| (collider.bounds(), ColliderId(i))),
        );
        self.static_index_dirty = false;
        debug!(
            "Built static index: {} colliders, {} nodes",
            self.static_index.len(),
            self.static_index.node_count()
        );
    }

    /// Static colliders whose boxes overlap `bounds`
    pub fn query_static(&mut self, bounds: &Aabb) -> Vec<ColliderId> {
        if self.static_index_dirty {
            self.build_static_index();
        }
        let mut out = Vec::new();
        self.static_index.query(bounds, &mut out);
        out
    }

    // --- Balls ---

    /// Create a ball and insert it into the dynamic index
    pub fn create_ball(&mut self, position: Vec3, velocity: Vec3, radius: f32, mass: f32) -> BallKey {
        let id = self.next_ball_id;
        self.next_ball_id += 1;

        let mut ball = Ball::new(id, position, velocity, radius, mass);
        ball.update_bounds(self.config.phys_factor(), self.config.bbox_margin);
        let key = self.balls.insert(ball);
        self.rebuild_dynamic_index();

        debug!("Created ball {} at {:?} moving {:?}", id, position, velocity);
        key
    }

    /// Remove a ball from the world and the dynamic index
    pub fn destroy_ball(&mut self, key: BallKey) -> Option<Ball> {
        let ball = self.balls.remove(key)?;
        self.rebuild_dynamic_index();
        debug!("Destroyed ball {}", ball.id);
        Some(ball)
    }

    pub fn ball(&self, key: BallKey) -> Option<&Ball> {
        self.balls.get(key)
    }

    /// Mutable access; bounds are refreshed at the start of the next sub-step
    pub fn ball_mut(&mut self, key: BallKey) -> Option<&mut Ball> {
        self.balls.get_mut(key)
    }

    /// Freeze or release a ball; returns false for an unknown key
    pub fn set_frozen(&mut self, key: BallKey, frozen: bool) -> bool {
        match self.balls.get_mut(key) {
            Some(ball) => {
                ball.frozen = frozen;
                true
            }
            None => false,
        }
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn balls(&self) -> impl Iterator<Item = (BallKey, &Ball)> + '_ {
        self.balls.iter()
    }

    /// State of every ball for the rendering layer
    pub fn snapshots(&self) -> Vec<BallSnapshot> {
        self.balls.values().map(Ball::snapshot).collect()
    }

    /// Rebuild the dynamic index from the balls' current boxes
    pub fn rebuild_dynamic_index(&mut self) {
        self.dynamic_index
            .rebuild(self.balls.iter().map(|(key, ball)| (ball.bounds(), key)));
    }

    /// Balls whose indexed boxes overlap `bounds`
    pub fn query_dynamic(&mut self, bounds: &Aabb) -> Vec<BallKey> {
        let mut out = Vec::new();
        self.dynamic_index.query(bounds, &mut out);
        out
    }

    // --- Timers ---

    /// Register a timer firing every `interval_ms` of physics time
    pub fn add_timer(&mut self, interval_ms: u64) -> TimerId {
        let now = self.physics_time_ms();
        self.timers.add(interval_ms, now)
    }

    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(id)
    }

    // --- Scheduler ---

    /// Start the scheduler at wall-clock time `now_us`
    pub fn start(&mut self, now_us: u64) {
        self.start_us = now_us;
        self.current_us = now_us;
        self.state = SchedulerState::Running;
        debug!("Physics started at {} us", now_us);
    }

    pub fn stop(&mut self) {
        self.state = SchedulerState::Idle;
    }

    /// Advance physics time up to wall-clock time `now_us`
    ///
    /// The first call after creation or `stop` only starts the clock. When
    /// physics has fallen more than `max_lag_us` behind, the backlog is
    /// dropped and a single sub-step is run instead.
    pub fn update(&mut self, now_us: u64, sink: &mut dyn EventSink) -> FrameStats {
        let mut stats = FrameStats::default();
        if self.state == SchedulerState::Idle {
            self.start(now_us);
            return stats;
        }

        self.state = SchedulerState::Stepping;
        let step_us = self.config.step_time_us.max(1);

        let lag = now_us.saturating_sub(self.current_us);
        if lag > self.config.max_lag_us {
            let resume = now_us - step_us.min(now_us);
            stats.skipped_us = resume.saturating_sub(self.current_us);
            warn!(
                "Physics is {} us behind real time, skipping {} us",
                lag, stats.skipped_us
            );
            self.current_us = resume;
        }

        while self.current_us < now_us {
            if let Some(max_steps) = self.config.max_steps_per_frame {
                if stats.substeps >= max_steps {
                    break;
                }
            }
            self.advance(sink, &mut stats);
        }

        if stats.forced_static > 0 {
            warn!(
                "Forced {} static time steps in {} sub-steps",
                stats.forced_static, stats.substeps
            );
        }

        self.state = SchedulerState::Running;
        stats
    }

    /// Run exactly one sub-step regardless of wall-clock time
    pub fn step(&mut self, sink: &mut dyn EventSink) -> FrameStats {
        let mut stats = FrameStats::default();
        self.advance(sink, &mut stats);
        stats
    }

    /// Timers, velocity update, then the collision-split sub-step
    fn advance(&mut self, sink: &mut dyn EventSink, stats: &mut FrameStats) {
        let now_ms = self.physics_time_ms();
        self.timers.fire_due(now_ms, sink);

        let step_ctx = self.step_context();
        for ball in self.balls.values_mut() {
            ball.update_velocities(&step_ctx);
        }

        self.simulate_cycle(self.config.phys_factor(), sink, stats);

        self.current_us += self.config.step_time_us.max(1);
        self.physics_iterations += 1;
        stats.substeps += 1;
    }

    fn step_context(&self) -> StepContext {
        StepContext {
            gravity: self.gravity,
            phys_factor: self.config.phys_factor(),
            bounds_margin: self.config.bbox_margin,
        }
    }

    fn response_context(&self) -> ResponseContext {
        ResponseContext {
            gravity: self.gravity,
            ..ResponseContext::new(&self.config, &self.table)
        }
    }

    /// One sub-step of `dtime` internal time units
    fn simulate_cycle(&mut self, dtime: f32, sink: &mut dyn EventSink, stats: &mut FrameStats) {
        let step_ctx = self.step_context();
        let ctx = self.response_context();
        let static_time = self.config.static_time.max(MIN_STATIC_TIME);

        if self.static_index_dirty {
            self.build_static_index();
        }
        for ball in self.balls.values_mut() {
            ball.update_bounds(step_ctx.phys_factor, step_ctx.bounds_margin);
        }
        self.rebuild_dynamic_index();

        self.ball_order.clear();
        self.ball_order.extend(self.balls.keys());

        let mut static_counts = i64::from(self.config.static_counts);
        let mut remaining = dtime;

        while remaining > 0.0 {
            self.contacts.clear();
            let mut hit_time = remaining;

            for i in 0..self.ball_order.len() {
                let key = self.ball_order[i];
                let event = self.find_earliest_hit(key, remaining);
                if let Some(ball) = self.balls.get_mut(key) {
                    ball.pending = event;
                }
                if let Some(event) = event {
                    hit_time = hit_time.min(event.hit_time);
                }
            }

            if hit_time < static_time {
                static_counts -= 1;
                if static_counts < 0 {
                    static_counts = 0;
                    hit_time = static_time.min(remaining);
                    stats.forced_static += 1;
                    debug!("Stuck counter exhausted, forcing hit time {}", hit_time);
                }
            }
            trace!("Hit time {} of remaining {}", hit_time, remaining);

            for ball in self.balls.values_mut() {
                ball.update_displacements(hit_time, &step_ctx);
            }

            self.resolve_pending(hit_time, &ctx, sink);
            self.resolve_contacts(hit_time, &ctx);

            remaining -= hit_time;
            self.swap_ball_handling = !self.swap_ball_handling;
        }

        self.static_first = !self.static_first;
        self.reverse_contacts = !self.reverse_contacts;
    }

    /// Narrow phase for one ball; contacts are collected separately
    fn find_earliest_hit(&mut self, key: BallKey, remaining: f32) -> Option<CollisionEvent> {
        let ball = self.balls.get(key)?;
        if ball.frozen {
            return None;
        }
        let bounds = ball.bounds();
        let mut sphere = ball.swept();
        let tol = self.config.contact;
        let mut search = HitSearch {
            limit: remaining,
            best: None,
        };

        for id in [ColliderId::PLAYFIELD, ColliderId::GLASS] {
            test_collider(&self.colliders, id, key, &sphere, &tol, &mut search, &mut self.contacts);
        }

        self.static_candidates.clear();
        self.static_index.query(&bounds, &mut self.static_candidates);
        self.dynamic_candidates.clear();
        self.dynamic_index.query(&bounds, &mut self.dynamic_candidates);

        if self.static_first {
            self.test_static_candidates(key, &sphere, &tol, &mut search);
            self.test_ball_candidates(key, &mut sphere, &tol, &mut search);
        } else {
            self.test_ball_candidates(key, &mut sphere, &tol, &mut search);
            self.test_static_candidates(key, &sphere, &tol, &mut search);
        }

        search.best
    }

    fn test_static_candidates(&mut self, key: BallKey, sphere: &SweptSphere, tol: &ContactTolerances, search: &mut HitSearch) {
        for &id in &self.static_candidates {
            test_collider(&self.colliders, id, key, sphere, tol, search, &mut self.contacts);
        }
    }

    fn test_ball_candidates(&mut self, key: BallKey, sphere: &mut SweptSphere, tol: &ContactTolerances, search: &mut HitSearch) {
        let phys_factor = self.config.phys_factor();
        let margin = self.config.bbox_margin;

        for i in 0..self.dynamic_candidates.len() {
            let other_key = self.dynamic_candidates[i];
            if other_key == key {
                continue;
            }
            let Some(other) = self.balls.get(other_key) else {
                continue;
            };
            let other_sphere = other.swept();

            if (sphere.position - other_sphere.position).length_squared() < COINCIDENT_DISTANCE_SQUARED {
                if let Some(ball) = self.balls.get_mut(key) {
                    ball.position.z += COINCIDENT_LIFT;
                    ball.velocity.z -= COINCIDENT_KICK;
                    ball.update_bounds(phys_factor, margin);
                    *sphere = ball.swept();
                    warn!("Ball {} was coincident with another ball, lifted apart", ball.id);
                }
            }

            if let Some(impact) = ball_ball_toi(sphere, &other_sphere, search.limit, tol) {
                search.offer(impact, HitTarget::Ball(other_key));
            }
        }
    }

    /// Resolve every pending collision at or before `hit_time`
    fn resolve_pending(&mut self, hit_time: f32, ctx: &ResponseContext, sink: &mut dyn EventSink) {
        let phys_factor = self.config.phys_factor();
        let margin = self.config.bbox_margin;

        for i in 0..self.ball_order.len() {
            let key = self.ball_order[i];
            let Some(ball) = self.balls.get_mut(key) else {
                continue;
            };
            let Some(event) = ball.pending.filter(|e| e.hit_time <= hit_time) else {
                continue;
            };
            ball.pending = None;

            match event.target {
                HitTarget::Shape(id) => {
                    let Some(collider) = self.colliders.get(id.0) else {
                        continue;
                    };
                    let impact_speed = collider.resolve(ball, &event, ctx, &mut *self.rng);
                    ball.update_bounds(phys_factor, margin);

                    if impact_speed > 0.0 && collider.fires_event(impact_speed) {
                        sink.on_hit(&HitEvent {
                            ball: key,
                            ball_id: ball.id,
                            owner: collider.owner,
                            impact_speed,
                            event,
                        });
                    }
                }
                HitTarget::Ball(other_key) => {
                    let Some([moving, other]) = self.balls.get_disjoint_mut([key, other_key]) else {
                        continue;
                    };
                    let impact = response::collide_balls(moving, other, &event, self.swap_ball_handling, ctx);
                    moving.update_bounds(phys_factor, margin);
                    other.update_bounds(phys_factor, margin);

                    if let BallImpact::Resolved { impact_speed } = impact {
                        if impact.fires_event(ctx) {
                            sink.on_hit(&HitEvent {
                                ball: key,
                                ball_id: moving.id,
                                owner: None,
                                impact_speed,
                                event,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Resolve resting contacts, alternating direction every sub-step
    fn resolve_contacts(&mut self, dtime: f32, ctx: &ResponseContext) {
        let phys_factor = self.config.phys_factor();
        let margin = self.config.bbox_margin;
        let count = self.contacts.len();

        for n in 0..count {
            let i = if self.reverse_contacts { count - 1 - n } else { n };
            let (key, event) = self.contacts[i];
            let HitTarget::Shape(id) = event.target else {
                continue;
            };
            let (Some(ball), Some(collider)) = (self.balls.get_mut(key), self.colliders.get(id.0)) else {
                continue;
            };
            collider.contact(ball, &event, dtime, ctx);
            ball.update_bounds(phys_factor, margin);
        }
    }
}

fn test_collider(
    colliders: &[Collider],
    id: ColliderId,
    key: BallKey,
    sphere: &SweptSphere,
    tol: &ContactTolerances,
    search: &mut HitSearch,
    contacts: &mut Vec<(BallKey, CollisionEvent)>,
) {
    let Some(collider) = colliders.get(id.0) else {
        return;
    };
    let Some(impact) = collider.time_of_impact(sphere, search.limit, tol) else {
        return;
    };
    let target = HitTarget::Shape(id);
    if impact.is_contact {
        contacts.push((key, CollisionEvent::new(impact, target)));
    } else {
        search.offer(impact, target);
    }
}
