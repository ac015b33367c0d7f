//! Simulation tuning and table parameters
//!
//! Every empirically tuned constant of the scheduler and the collision
//! response lives here so hosts can override it from configuration files.

use pinball_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::material::PhysicsMaterial;

/// Thresholds separating contacts from collisions in the time-of-impact tests
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactTolerances {
    /// Normal speeds at or below this magnitude count as resting contact
    pub contact_velocity: f32,
    /// Surface distance considered touching
    pub touch_distance: f32,
    /// Normal speed below which an approach is treated as receding
    pub low_normal_velocity: f32,
}

impl Default for ContactTolerances {
    fn default() -> Self {
        Self {
            contact_velocity: 0.099,
            touch_distance: 0.05,
            low_normal_velocity: 0.0001,
        }
    }
}

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Real time covered by one sub-step, in microseconds
    pub step_time_us: u64,
    /// Real time of one internal time unit (velocities are units per time unit)
    pub time_unit_us: u64,
    /// Hit times below this count towards the stuck counter
    pub static_time: f32,
    /// Near-zero hit times tolerated per sub-step before forcing `static_time`
    pub static_counts: u32,
    /// Lag behind real time beyond which the scheduler skips ahead
    pub max_lag_us: u64,
    /// Optional hard cap on sub-steps per scheduler invocation
    pub max_steps_per_frame: Option<u32>,
    /// Contact/collision thresholds
    pub contact: ContactTolerances,
    /// Approach speed given to an embedded ball that is not moving inwards
    pub embed_shot: f32,
    /// Fraction of penetration depth undone per collision
    pub displacement_gain: f32,
    /// Maximum un-embed displacement per collision
    pub displacement_limit: f32,
    /// Restitution of ball-ball impacts
    pub ball_ball_restitution: f32,
    /// Ball-ball impact speed above which a hit event fires
    pub ball_ball_event_speed: f32,
    /// Extra slack added to every ball bounding box
    pub bbox_margin: f32,
    /// Scatter angle (radians) used by materials with a negative scatter
    pub hard_scatter: f32,
    /// Seed of the default random source
    pub seed: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            step_time_us: 1000,
            time_unit_us: 10_000,
            static_time: 0.005,
            static_counts: 10,
            max_lag_us: 200_000,
            max_steps_per_frame: None,
            contact: ContactTolerances::default(),
            embed_shot: 0.05,
            displacement_gain: 0.9825,
            displacement_limit: 5.0,
            ball_ball_restitution: 0.8,
            ball_ball_event_speed: 0.25,
            bbox_margin: 0.05,
            hard_scatter: 0.0,
            seed: 0x5eed_0f_ba11,
        }
    }
}

impl PhysicsConfig {
    /// Internal time advanced by one sub-step
    pub fn phys_factor(&self) -> f32 {
        self.step_time_us as f32 / self.time_unit_us as f32
    }
}

/// Table-level physics parameters supplied by the table data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Playfield inclination in degrees
    pub slope_degrees: f32,
    /// Gravity magnitude in units per time unit squared
    pub gravity: f32,
    /// Global difficulty weighting of scatter (0 = none)
    pub difficulty: f32,
    /// Left edge of the playfield
    pub left: f32,
    /// Top edge of the playfield (far from the player)
    pub top: f32,
    /// Right edge of the playfield
    pub right: f32,
    /// Bottom edge of the playfield (near the player)
    pub bottom: f32,
    /// Height of the glass above the playfield
    pub glass_height: f32,
    /// Playfield surface material
    pub playfield_material: PhysicsMaterial,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            slope_degrees: 6.0,
            gravity: 1.81751,
            difficulty: 0.2,
            left: 0.0,
            top: 0.0,
            right: 1000.0,
            bottom: 2000.0,
            glass_height: 210.0,
            playfield_material: PhysicsMaterial::PLAYFIELD,
        }
    }
}

impl TableSettings {
    /// Gravity vector for the sloped table (z up, +y toward the player)
    pub fn gravity_vector(&self) -> Vec3 {
        let slope = self.slope_degrees.to_radians();
        Vec3::new(0.0, slope.sin() * self.gravity, -slope.cos() * self.gravity)
    }

    /// Volume between playfield and glass
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec3::new(self.left, self.top, 0.0),
            Vec3::new(self.right, self.bottom, self.glass_height),
        )
    }

    /// Flat, frictionless, gravity-free table (useful for isolated experiments)
    pub fn level_frictionless() -> Self {
        Self {
            slope_degrees: 0.0,
            gravity: 0.0,
            difficulty: 0.0,
            playfield_material: PhysicsMaterial::FRICTIONLESS,
            ..Self::default()
        }
    }
}
