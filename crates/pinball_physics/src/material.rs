//! Physical material properties for collision response

use serde::{Deserialize, Serialize};

/// Impact speed normalising the elasticity falloff curve
const FALLOFF_REFERENCE_SPEED: f32 = 18.53;

/// Physical material properties for collision response
///
/// Materials define how a ball bounces off a shape: how much normal speed
/// survives (elasticity), how that drops for harder hits (falloff), how much
/// the surface grips (friction) and how much random deflection it adds
/// (scatter).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterial {
    /// Coefficient of restitution at zero impact speed
    pub elasticity: f32,
    /// How fast elasticity drops with impact speed (0 = constant)
    pub elasticity_falloff: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Scatter angle in radians; negative means "use the table's global scatter"
    pub scatter_angle: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            elasticity: 0.3,
            elasticity_falloff: 0.0,
            friction: 0.3,
            scatter_angle: 0.0,
        }
    }
}

impl PhysicsMaterial {
    /// Playfield wood under clear coat
    pub const PLAYFIELD: Self = Self {
        elasticity: 0.25,
        elasticity_falloff: 0.0,
        friction: 0.075,
        scatter_angle: 0.0,
    };

    /// Rubber rings and posts: bouncy, soft at high speed
    pub const RUBBER: Self = Self {
        elasticity: 0.8,
        elasticity_falloff: 0.3,
        friction: 0.6,
        scatter_angle: 0.0,
    };

    /// Metal guides and ramps
    pub const METAL: Self = Self {
        elasticity: 0.3,
        elasticity_falloff: 0.0,
        friction: 0.15,
        scatter_angle: 0.0,
    };

    /// Plastic ramps and targets
    pub const PLASTIC: Self = Self {
        elasticity: 0.4,
        elasticity_falloff: 0.1,
        friction: 0.2,
        scatter_angle: 0.0,
    };

    /// Glass cover: barely any grip
    pub const GLASS: Self = Self {
        elasticity: 0.2,
        elasticity_falloff: 0.0,
        friction: 0.0,
        scatter_angle: 0.0,
    };

    /// Ideal surface with no friction and no scatter
    pub const FRICTIONLESS: Self = Self {
        elasticity: 0.8,
        elasticity_falloff: 0.0,
        friction: 0.0,
        scatter_angle: 0.0,
    };

    /// Create a new material
    ///
    /// Elasticity is clamped to [0.0, 1.0], falloff and friction to non-negative values.
    pub fn new(elasticity: f32, elasticity_falloff: f32, friction: f32, scatter_angle: f32) -> Self {
        Self {
            elasticity: elasticity.clamp(0.0, 1.0),
            elasticity_falloff: elasticity_falloff.max(0.0),
            friction: friction.max(0.0),
            scatter_angle,
        }
    }

    /// Elasticity for an impact with normal speed `normal_speed`
    ///
    /// `e / (1 + falloff * |v| / 18.53)`; a zero falloff leaves `e` unchanged.
    pub fn elasticity_at(&self, normal_speed: f32) -> f32 {
        if self.elasticity_falloff > 0.0 {
            self.elasticity / (1.0 + self.elasticity_falloff * normal_speed.abs() / FALLOFF_REFERENCE_SPEED)
        } else {
            self.elasticity
        }
    }
}
