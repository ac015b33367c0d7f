//! Motion integration for dynamic bodies

use pinball_math::{mat3, Vec3};

use crate::ball::Ball;

/// Per-sub-step parameters shared by every mover
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepContext {
    /// Gravity in units per time unit squared
    pub gravity: Vec3,
    /// Internal time covered by one sub-step
    pub phys_factor: f32,
    /// Safety margin added to broad-phase boxes
    pub bounds_margin: f32,
}

/// A body advanced by the scheduler
///
/// `update_velocities` runs once per sub-step, between sub-steps;
/// `update_displacements` runs once per inner iteration with the hit time.
pub trait Mover {
    fn update_displacements(&mut self, dtime: f32, ctx: &StepContext);
    fn update_velocities(&mut self, ctx: &StepContext);
}

impl Mover for Ball {
    fn update_displacements(&mut self, dtime: f32, ctx: &StepContext) {
        if self.frozen {
            return;
        }

        self.position += self.velocity * dtime;

        let skew = mat3::skew_symmetric(self.angular_velocity());
        let delta = mat3::mul(skew, self.orientation);
        self.orientation = mat3::orthonormalize(mat3::add_scaled(self.orientation, delta, dtime));

        self.update_bounds(ctx.phys_factor, ctx.bounds_margin);
    }

    fn update_velocities(&mut self, ctx: &StepContext) {
        if self.frozen {
            return;
        }

        self.velocity += ctx.gravity * ctx.phys_factor;
        self.update_bounds(ctx.phys_factor, ctx.bounds_margin);
    }
}
