//! Static colliders: a shape plus the data needed to respond to and report hits

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ball::Ball;
use crate::bounds::Aabb;
use crate::config::ContactTolerances;
use crate::event::{CollisionEvent, Impact};
use crate::material::PhysicsMaterial;
use crate::response::{self, ResponseContext};
use crate::shapes::{HitShape, SweptSphere};
use rand::RngCore;

/// Index of a collider in the world's collider table
///
/// The playfield and glass planes always occupy the first two slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub usize);

impl ColliderId {
    /// The playfield surface
    pub const PLAYFIELD: Self = Self(0);
    /// The glass cover
    pub const GLASS: Self = Self(1);
}

/// Opaque handle to a playfield element owned outside the physics core
///
/// Used only to attribute hit events; the physics core never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

bitflags! {
    /// Per-collider behavior switches
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ShapeFlags: u8 {
        /// Collider takes part in hit testing
        const ENABLED = 1 << 0;
        /// Hits above the threshold are reported to the event sink
        const FIRES_EVENTS = 1 << 1;
    }
}

impl Default for ShapeFlags {
    fn default() -> Self {
        ShapeFlags::ENABLED
    }
}

/// A static shape registered with the world
#[derive(Clone, Debug, PartialEq)]
pub struct Collider {
    /// Geometry
    pub shape: HitShape,
    /// Response parameters
    pub material: PhysicsMaterial,
    /// Minimum impact speed that fires an event
    pub threshold: f32,
    /// Enabled / event-firing switches
    pub flags: ShapeFlags,
    /// Playfield element to attribute hits to
    pub owner: Option<ObjectHandle>,
    bounds: Aabb,
}

impl Collider {
    /// Create an enabled, silent collider with the default material
    pub fn new(shape: HitShape) -> Self {
        Self {
            bounds: shape.bounds(),
            shape,
            material: PhysicsMaterial::default(),
            threshold: 0.0,
            flags: ShapeFlags::default(),
            owner: None,
        }
    }

    /// Builder: set the material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Builder: fire events at or above `threshold` impact speed
    pub fn with_events(mut self, threshold: f32) -> Self {
        self.flags |= ShapeFlags::FIRES_EVENTS;
        self.threshold = threshold;
        self
    }

    /// Builder: attribute hits to `owner`
    pub fn with_owner(mut self, owner: ObjectHandle) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Builder: replace all flags
    pub fn with_flags(mut self, flags: ShapeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Bounding box, computed once from the immutable shape
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.contains(ShapeFlags::ENABLED)
    }

    /// True if an impact of `impact_speed` should be reported
    pub fn fires_event(&self, impact_speed: f32) -> bool {
        self.flags.contains(ShapeFlags::FIRES_EVENTS) && impact_speed >= self.threshold
    }

    /// Time-of-impact test; disabled colliders never report a hit
    pub fn time_of_impact(&self, sphere: &SweptSphere, budget: f32, tol: &ContactTolerances) -> Option<Impact> {
        if !self.is_enabled() {
            return None;
        }
        self.shape.time_of_impact(sphere, budget, tol)
    }

    /// Resolve a collision against this collider; returns the impact speed
    pub fn resolve(&self, ball: &mut Ball, event: &CollisionEvent, ctx: &ResponseContext, rng: &mut dyn RngCore) -> f32 {
        response::collide_static(ball, event, &self.material, ctx, rng)
    }

    /// Resolve a resting contact against this collider
    pub fn contact(&self, ball: &mut Ball, event: &CollisionEvent, dtime: f32, ctx: &ResponseContext) {
        response::resolve_contact(ball, event, &self.material, dtime, ctx);
    }
}
