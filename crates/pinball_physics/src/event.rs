//! Collision events and the outbound event stream
//!
//! A [`CollisionEvent`] is transient scratch data: it is produced by the
//! narrow phase, compared against other events of the same sub-step and
//! consumed by the resolver. Only [`HitEvent`]s leave the physics core.

use pinball_math::Vec3;

use crate::ball::BallKey;
use crate::collider::{ColliderId, ObjectHandle};
use crate::timers::TimerId;

/// What a ball ran into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    /// A static shape (playfield, glass or an indexed collider)
    Shape(ColliderId),
    /// Another ball
    Ball(BallKey),
}

/// Result of a time-of-impact test, before it is attributed to a target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// Time until the surfaces touch, within the remaining budget
    pub time: f32,
    /// Unit contact normal, pointing from the shape toward the ball
    pub normal: Vec3,
    /// Surface distance at the start of the test (negative = penetrating)
    pub distance: f32,
    /// Resting contact rather than a separating impact
    pub is_contact: bool,
    /// Normal velocity at detection time (used by contact resolution)
    pub normal_velocity: f32,
}

impl Impact {
    /// A collision at `time`
    pub fn collision(time: f32, normal: Vec3, distance: f32, normal_velocity: f32) -> Self {
        Self {
            time,
            normal,
            distance,
            is_contact: false,
            normal_velocity,
        }
    }

    /// A resting contact; its hit time is always zero
    pub fn contact(normal: Vec3, distance: f32, normal_velocity: f32) -> Self {
        Self {
            time: 0.0,
            normal,
            distance,
            is_contact: true,
            normal_velocity,
        }
    }

    /// True if the time is finite and inside `[0, budget]`
    pub fn is_within(&self, budget: f32) -> bool {
        self.time.is_finite() && self.time >= 0.0 && self.time <= budget
    }
}

/// A collision found for one ball during one sub-step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionEvent {
    /// Time-to-impact from the start of the current inner iteration
    pub hit_time: f32,
    /// Unit contact normal, pointing toward the ball
    pub normal: Vec3,
    /// Penetration/contact distance
    pub distance: f32,
    /// Contact (resting) vs. collision (impact)
    pub is_contact: bool,
    /// Normal velocity when the event was detected
    pub normal_velocity: f32,
    /// Shape or ball that was struck
    pub target: HitTarget,
}

impl CollisionEvent {
    /// Attribute an impact to its target
    pub fn new(impact: Impact, target: HitTarget) -> Self {
        Self {
            hit_time: impact.time,
            normal: impact.normal,
            distance: impact.distance,
            is_contact: impact.is_contact,
            normal_velocity: impact.normal_velocity,
            target,
        }
    }
}

/// Collision notification delivered to game logic
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitEvent {
    /// Ball that collided
    pub ball: BallKey,
    /// Public id of that ball
    pub ball_id: u32,
    /// Playfield element owning the struck shape, if any
    pub owner: Option<ObjectHandle>,
    /// Normal speed of the impact
    pub impact_speed: f32,
    /// Collision data as resolved
    pub event: CollisionEvent,
}

/// Everything the physics core reports during a scheduler invocation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhysicsEvent {
    /// A ball hit an event-firing shape or another ball
    Hit(HitEvent),
    /// An interval timer elapsed
    Timer(TimerId),
}

/// Receiver of events fired synchronously during a step
pub trait EventSink {
    /// Called from collision resolution for event-firing shapes and ball-ball impacts
    fn on_hit(&mut self, hit: &HitEvent);

    /// Called between sub-steps for each due timer
    fn on_timer(&mut self, _timer: TimerId) {}
}

impl EventSink for Vec<PhysicsEvent> {
    fn on_hit(&mut self, hit: &HitEvent) {
        self.push(PhysicsEvent::Hit(*hit));
    }

    fn on_timer(&mut self, timer: TimerId) {
        self.push(PhysicsEvent::Timer(timer));
    }
}

/// Sink that drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_hit(&mut self, _hit: &HitEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_budget() {
        let hit = Impact::collision(0.5, Vec3::Z, 1.0, -2.0);
        assert!(hit.is_within(1.0));
        assert!(!hit.is_within(0.25));

        let nan = Impact::collision(f32::NAN, Vec3::Z, 1.0, -2.0);
        assert!(!nan.is_within(1.0));

        let negative = Impact::collision(-0.1, Vec3::Z, 1.0, -2.0);
        assert!(!negative.is_within(1.0));
    }

    #[test]
    fn test_contact_has_zero_time() {
        let contact = Impact::contact(Vec3::Z, 0.01, -0.02);
        assert!(contact.is_contact);
        assert_eq!(contact.time, 0.0);
    }

    #[test]
    fn test_vec_sink_collects_timers() {
        let mut events: Vec<PhysicsEvent> = Vec::new();
        events.on_timer(TimerId(3));
        assert_eq!(events, vec![PhysicsEvent::Timer(TimerId(3))]);
    }
}
