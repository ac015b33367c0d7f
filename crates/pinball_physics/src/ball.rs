//! Ball: the only dynamic body of a pinball table

use bytemuck::{Pod, Zeroable};
use pinball_math::{mat3, Mat3, Vec3};
use slotmap::new_key_type;

use crate::bounds::Aabb;
use crate::event::CollisionEvent;
use crate::shapes::SweptSphere;

new_key_type! {
    /// Key to a ball in the physics world
    ///
    /// Generational: a key to a destroyed ball never resolves to a ball
    /// created later in the same slot.
    pub struct BallKey;
}

/// A solid sphere moving freely over the table
#[derive(Clone, Debug)]
pub struct Ball {
    /// Public id, assigned from a monotonically increasing counter
    pub id: u32,
    radius: f32,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    /// Center position
    pub position: Vec3,
    /// Orientation (columns are the rotated basis vectors)
    pub orientation: Mat3,
    /// Linear velocity in units per time unit
    pub velocity: Vec3,
    angular_momentum: Vec3,
    /// Derived as `angular_momentum / inertia`
    angular_velocity: Vec3,
    /// Frozen balls neither move nor receive impulses
    pub frozen: bool,
    /// Earliest collision found in the current inner iteration
    pub(crate) pending: Option<CollisionEvent>,
    bounds: Aabb,
}

impl Ball {
    /// Create a ball at rest orientation
    ///
    /// Non-positive radius or mass fall back to 1.0 so the derived inverse
    /// mass and inertia stay finite.
    pub fn new(id: u32, position: Vec3, velocity: Vec3, radius: f32, mass: f32) -> Self {
        let radius = if radius > 0.0 { radius } else { 1.0 };
        let mass = if mass > 0.0 { mass } else { 1.0 };
        let mut ball = Self {
            id,
            radius,
            mass,
            inv_mass: 1.0 / mass,
            inertia: solid_sphere_inertia(mass, radius),
            position,
            orientation: mat3::IDENTITY,
            velocity,
            angular_momentum: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            frozen: false,
            pending: None,
            bounds: Aabb::EMPTY,
        };
        ball.bounds = Aabb::from_center_half_extents(position, Vec3::splat(radius));
        ball
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Rotational inertia of a solid sphere: 2/5 m r²
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Change the radius; the caller must refresh the bounds before the next query
    pub fn set_radius(&mut self, radius: f32) {
        if radius > 0.0 {
            self.radius = radius;
            self.inertia = solid_sphere_inertia(self.mass, radius);
            self.angular_velocity = self.angular_momentum / self.inertia;
        }
    }

    pub fn set_mass(&mut self, mass: f32) {
        if mass > 0.0 {
            self.mass = mass;
            self.inv_mass = 1.0 / mass;
            self.inertia = solid_sphere_inertia(mass, self.radius);
            self.angular_velocity = self.angular_momentum / self.inertia;
        }
    }

    pub fn angular_momentum(&self) -> Vec3 {
        self.angular_momentum
    }

    /// Spin rate, kept in step with the angular momentum
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    pub fn set_angular_momentum(&mut self, angular_momentum: Vec3) {
        self.angular_momentum = angular_momentum;
        self.angular_velocity = angular_momentum / self.inertia;
    }

    /// Set the spin rate directly; the momentum follows from the inertia
    pub fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.set_angular_momentum(angular_velocity * self.inertia);
    }

    /// Broad-phase box covering one sub-step of travel
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Recompute the box from current position, speed and radius
    pub fn update_bounds(&mut self, phys_factor: f32, margin: f32) {
        let reach = self.velocity.length() * phys_factor + self.radius + margin;
        self.bounds = Aabb::from_center_half_extents(self.position, Vec3::splat(reach));
    }

    /// The ball as seen by time-of-impact tests
    pub fn swept(&self) -> SweptSphere {
        let velocity = if self.frozen { Vec3::ZERO } else { self.velocity };
        SweptSphere::new(self.position, velocity, self.radius)
    }

    /// Velocity of the surface point at offset `surf_p` from the center
    pub fn surface_velocity(&self, surf_p: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(surf_p)
    }

    /// Acceleration of the surface point at offset `surf_p` under `gravity`
    pub fn surface_acceleration(&self, surf_p: Vec3, gravity: Vec3) -> Vec3 {
        gravity + self.angular_velocity.cross(self.angular_velocity.cross(surf_p))
    }

    /// Apply a linear impulse and the matching angular impulse
    pub fn apply_surface_impulse(&mut self, angular_impulse: Vec3, impulse: Vec3) {
        self.velocity += impulse * self.inv_mass;
        self.angular_momentum += angular_impulse;
        self.angular_velocity = self.angular_momentum / self.inertia;
    }

    /// Copy of the state the rendering layer reads
    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            id: self.id,
            radius: self.radius,
            position: self.position,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            orientation: self.orientation,
        }
    }
}

fn solid_sphere_inertia(mass: f32, radius: f32) -> f32 {
    0.4 * mass * radius * radius
}

/// Plain-data view of a ball, laid out for direct upload to a GPU buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BallSnapshot {
    pub id: u32,
    pub radius: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub orientation: Mat3,
}
