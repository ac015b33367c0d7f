//! Collision and contact response
//!
//! Impacts are resolved with an instantaneous restitution impulse plus a
//! Coulomb friction impulse at the contact point. Resting contacts get just
//! enough normal impulse to cancel gravity over the remaining time, plus
//! static or dynamic friction. Any non-finite impulse is dropped.

use pinball_math::Vec3;
use rand::{Rng, RngCore};

use crate::ball::Ball;
use crate::config::{ContactTolerances, PhysicsConfig, TableSettings};
use crate::event::CollisionEvent;
use crate::material::PhysicsMaterial;

/// Tangential slip speed below which contact friction is treated as static
const STATIC_SLIP_SPEED: f32 = 0.01;

/// Squared tangential speed below which there is nothing to rub against
const MIN_SLIP_SQUARED: f32 = 1.0e-6;

/// Un-embed pushes smaller than this are skipped
const MIN_UNEMBED: f32 = 1.0e-4;

/// Post-impact normal speed needed before scatter is applied
const SCATTER_MIN_SPEED: f32 = 1.0;

/// Scatter angles below this are treated as zero
const SCATTER_MIN_ANGLE: f32 = 1.0e-5;

/// Peak of `s (1 - s^2)` on `[-1, 1]` is `2 / (3 sqrt 3)`; this normalises it to 1
const SCATTER_SHAPE: f32 = 2.59808;

/// Everything the response functions read besides the bodies themselves
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResponseContext {
    pub gravity: Vec3,
    pub tolerances: ContactTolerances,
    pub embed_shot: f32,
    pub displacement_gain: f32,
    pub displacement_limit: f32,
    pub ball_ball_restitution: f32,
    pub ball_ball_event_speed: f32,
    pub hard_scatter: f32,
    pub difficulty: f32,
}

impl ResponseContext {
    pub fn new(config: &PhysicsConfig, table: &TableSettings) -> Self {
        Self {
            gravity: table.gravity_vector(),
            tolerances: config.contact,
            embed_shot: config.embed_shot,
            displacement_gain: config.displacement_gain,
            displacement_limit: config.displacement_limit,
            ball_ball_restitution: config.ball_ball_restitution,
            ball_ball_event_speed: config.ball_ball_event_speed,
            hard_scatter: config.hard_scatter,
            difficulty: table.difficulty,
        }
    }

    /// Approach speed along the normal, or `None` if the pair is separating
    ///
    /// Embedded pairs that are not approaching get a small fixed approach
    /// speed so the impulse pushes them apart.
    fn approach_speed(&self, normal_velocity: f32, distance: f32) -> Option<f32> {
        let low = self.tolerances.low_normal_velocity;
        if normal_velocity >= -low {
            if normal_velocity > low || distance >= 0.0 {
                return None;
            }
            return Some(-self.embed_shot);
        }
        Some(normal_velocity)
    }

    /// Displacement that undoes most of a penetration of `distance`
    fn unembed_distance(&self, distance: f32) -> Option<f32> {
        let push = -self.displacement_gain * distance;
        if push > MIN_UNEMBED {
            Some(push.min(self.displacement_limit))
        } else {
            None
        }
    }
}

/// Resolve an impact of `ball` against a static shape
///
/// Returns the impact speed (positive), or 0.0 if the ball was already
/// moving away and nothing happened.
pub fn collide_static(
    ball: &mut Ball,
    event: &CollisionEvent,
    material: &PhysicsMaterial,
    ctx: &ResponseContext,
    rng: &mut dyn RngCore,
) -> f32 {
    let normal = event.normal;
    let Some(dot) = ctx.approach_speed(normal.dot(ball.velocity), event.distance) else {
        return 0.0;
    };

    if let Some(push) = ctx.unembed_distance(event.distance) {
        ball.position += normal * push;
    }

    let reaction_impulse = ball.mass() * dot.abs();
    let elasticity = material.elasticity_at(dot);
    let delta = normal * (-(1.0 + elasticity) * dot);
    if delta.is_finite() {
        ball.velocity += delta;
    }

    if material.friction != 0.0 {
        apply_impact_friction(ball, normal, material.friction * reaction_impulse);
    }

    let mut scatter_angle = if material.scatter_angle < 0.0 {
        ctx.hard_scatter
    } else {
        material.scatter_angle
    };
    scatter_angle *= ctx.difficulty;
    let separating = normal.dot(ball.velocity);
    if separating > SCATTER_MIN_SPEED && scatter_angle > SCATTER_MIN_ANGLE {
        apply_scatter(ball, scatter_angle, rng);
    }

    -dot
}

/// Friction impulse for an impact, limited to `max_friction`
fn apply_impact_friction(ball: &mut Ball, normal: Vec3, max_friction: f32) {
    let surf_p = normal * -ball.radius();
    let surf_vel = ball.surface_velocity(surf_p);
    let tangent = surf_vel.reject(normal);
    let tangent_speed_sq = tangent.length_squared();
    if tangent_speed_sq <= MIN_SLIP_SQUARED {
        return;
    }

    let tangent = tangent / tangent_speed_sq.sqrt();
    let vt = surf_vel.dot(tangent);
    let cross = surf_p.cross(tangent);
    let kt = ball.inv_mass() + tangent.dot((cross / ball.inertia()).cross(surf_p));
    let jt = clamp_magnitude(-vt / kt, max_friction);
    if jt.is_finite() {
        ball.apply_surface_impulse(cross * jt, tangent * jt);
    }
}

/// Rotate the horizontal velocity by a random angle within `±scatter_angle`
///
/// The distribution `s (1 - s²)` favours angles near the middle of the
/// range over both zero and the extremes.
fn apply_scatter(ball: &mut Ball, scatter_angle: f32, rng: &mut dyn RngCore) {
    let s: f32 = rng.random_range(-1.0..=1.0);
    let angle = s * (1.0 - s * s) * SCATTER_SHAPE * scatter_angle;
    let (sin, cos) = angle.sin_cos();
    let vx = ball.velocity.x;
    let vy = ball.velocity.y;
    ball.velocity.x = vx * cos - vy * sin;
    ball.velocity.y = vy * cos + vx * sin;
}

/// Outcome of a ball-ball impact
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BallImpact {
    /// This ordering of the pair is handled from the other ball's event
    Deferred,
    /// Balls were already separating
    Separating,
    /// Impulse applied; carries the approach speed
    Resolved { impact_speed: f32 },
}

impl BallImpact {
    /// True if the impact is strong enough to report
    pub fn fires_event(&self, ctx: &ResponseContext) -> bool {
        matches!(self, BallImpact::Resolved { impact_speed } if *impact_speed > ctx.ball_ball_event_speed)
    }
}

/// Resolve an impact between `moving` (whose event this is) and `other`
///
/// Both balls of a pair usually detect the same impact; only one ordering,
/// chosen by ball id and `swap`, is resolved so the impulse is applied once.
/// A frozen `other` never generates an event of its own, so it is always
/// resolved here and takes none of the impulse.
pub fn collide_balls(
    moving: &mut Ball,
    other: &mut Ball,
    event: &CollisionEvent,
    swap: bool,
    ctx: &ResponseContext,
) -> BallImpact {
    let deferred = if swap {
        moving.id >= other.id
    } else {
        moving.id <= other.id
    };
    if deferred && !other.frozen {
        return BallImpact::Deferred;
    }

    let normal = event.normal;
    let relative = moving.velocity - other.velocity;
    let Some(dot) = ctx.approach_speed(relative.dot(normal), event.distance) else {
        return BallImpact::Separating;
    };

    if let Some(mut push) = ctx.unembed_distance(event.distance) {
        if !other.frozen {
            push *= 0.5;
            other.position -= normal * push;
        }
        moving.position += normal * push;
    }

    let other_inv_mass = if other.frozen { 0.0 } else { other.inv_mass() };
    let impulse = -(1.0 + ctx.ball_ball_restitution) * dot / (other_inv_mass + moving.inv_mass());
    if impulse.is_finite() {
        if !other.frozen {
            other.velocity -= normal * (impulse * other_inv_mass);
        }
        moving.velocity += normal * (impulse * moving.inv_mass());
    }

    BallImpact::Resolved { impact_speed: -dot }
}

/// Resolve a resting contact over `dtime`
pub fn resolve_contact(ball: &mut Ball, event: &CollisionEvent, material: &PhysicsMaterial, dtime: f32, ctx: &ResponseContext) {
    let normal = event.normal;
    let normal_velocity = ball.velocity.dot(normal);
    // An earlier impact this iteration may already have pushed the ball away
    if normal_velocity > ctx.tolerances.contact_velocity {
        return;
    }

    let external = ball.mass() * ctx.gravity.dot(normal);
    let normal_impulse = (-(normal_velocity * ball.mass() + external * dtime)).max(0.0);
    let delta = normal * (normal_impulse * ball.inv_mass());
    if delta.is_finite() {
        ball.velocity += delta;
    }

    apply_contact_friction(ball, normal, dtime, material.friction, ctx.gravity);
}

/// Limit `value` to `[-limit, limit]`; NaN passes through to the finiteness check
fn clamp_magnitude(value: f32, limit: f32) -> f32 {
    let limit = limit.abs();
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

/// Static friction when the contact point is not sliding, dynamic otherwise
fn apply_contact_friction(ball: &mut Ball, normal: Vec3, dtime: f32, friction: f32, gravity: Vec3) {
    let surf_p = normal * -ball.radius();
    let surf_vel = ball.surface_velocity(surf_p);
    let slip = surf_vel.reject(normal);
    let max_friction = friction * ball.mass() * -gravity.dot(normal);
    let slip_speed = slip.length();

    let (slip_dir, numer) = if slip_speed < STATIC_SLIP_SPEED {
        let surf_acc = ball.surface_acceleration(surf_p, gravity);
        let slip_acc = surf_acc.reject(normal);
        if slip_acc.length_squared() < MIN_SLIP_SQUARED {
            return;
        }
        let dir = slip_acc.normalized();
        (dir, -dir.dot(surf_acc))
    } else {
        let dir = slip / slip_speed;
        (dir, -dir.dot(surf_vel))
    };

    let cross = surf_p.cross(slip_dir);
    let denom = ball.inv_mass() + slip_dir.dot((cross / ball.inertia()).cross(surf_p));
    let fric = clamp_magnitude(numer / denom, max_friction);
    if fric.is_finite() {
        ball.apply_surface_impulse(cross * (dtime * fric), slip_dir * (dtime * fric));
    }
}
