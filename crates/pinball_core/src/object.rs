//! Playfield object templates
//!
//! An [`ObjectTemplate`] groups the collision shapes of one named playfield
//! element (a wall, a bumper, a target) together with its material and event
//! behaviour. A [`BallSpawn`] describes a ball placed when the table starts.

use pinball_math::Vec3;
use pinball_physics::{Collider, HitShape, ObjectHandle, PhysicsMaterial, ShapeFlags};
use serde::{Deserialize, Serialize};

use crate::shapes::ShapeTemplate;
use crate::table_error::TableError;

fn default_enabled() -> bool {
    true
}

/// Serializable playfield element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    /// Unique name used to look the element up and to attribute hits
    pub name: String,
    /// Collision geometry of the element
    pub shapes: Vec<ShapeTemplate>,
    /// Surface material shared by all shapes
    #[serde(default)]
    pub material: PhysicsMaterial,
    /// Minimum impact speed that reports a hit; `None` never reports
    #[serde(default)]
    pub hit_threshold: Option<f32>,
    /// Whether the element collides at all when the table starts
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ObjectTemplate {
    /// Create a new object template with default material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shapes: Vec::new(),
            material: PhysicsMaterial::default(),
            hit_threshold: None,
            enabled: true,
        }
    }

    /// Add a shape to this object
    pub fn with_shape(mut self, shape: ShapeTemplate) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Set the surface material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Report hits at or above `threshold`
    pub fn with_hit_threshold(mut self, threshold: f32) -> Self {
        self.hit_threshold = Some(threshold);
        self
    }

    /// Start disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Flags shared by every collider of this object
    pub fn flags(&self) -> ShapeFlags {
        let mut flags = ShapeFlags::empty();
        flags.set(ShapeFlags::ENABLED, self.enabled);
        flags.set(ShapeFlags::FIRES_EVENTS, self.hit_threshold.is_some());
        flags
    }

    /// Convert this template into colliders owned by `owner`
    pub fn to_colliders(&self, owner: ObjectHandle) -> Result<Vec<Collider>, TableError> {
        let mut shapes: Vec<HitShape> = Vec::new();
        for shape in &self.shapes {
            shapes.extend(shape.create_shapes()?);
        }

        let threshold = self.hit_threshold.unwrap_or(0.0);
        Ok(shapes
            .into_iter()
            .map(|shape| {
                let mut collider = Collider::new(shape).with_material(self.material).with_owner(owner);
                if self.hit_threshold.is_some() {
                    collider = collider.with_events(threshold);
                }
                collider.with_flags(self.flags())
            })
            .collect())
    }
}

fn default_ball_radius() -> f32 {
    25.0
}

fn default_ball_mass() -> f32 {
    1.0
}

/// Ball placed on the table at start-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSpawn {
    /// Initial centre position
    pub position: Vec3,
    /// Initial velocity in units per time unit
    #[serde(default)]
    pub velocity: Vec3,
    /// Ball radius
    #[serde(default = "default_ball_radius")]
    pub radius: f32,
    /// Ball mass
    #[serde(default = "default_ball_mass")]
    pub mass: f32,
}

impl BallSpawn {
    /// A standard ball at rest
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            radius: default_ball_radius(),
            mass: default_ball_mass(),
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}
