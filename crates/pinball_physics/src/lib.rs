//! Pinball physics core
//!
//! This crate advances balls over a pinball table at a fixed internal step
//! rate, including:
//! - Collision primitives with continuous time-of-impact tests
//! - Static and dynamic bounding volume hierarchies for the broad phase
//! - Impulse-based collision and contact response with friction
//! - A sub-stepping scheduler that tracks wall-clock time

pub mod ball;
pub mod bounds;
pub mod collider;
pub mod config;
pub mod event;
pub mod integrator;
pub mod material;
pub mod response;
pub mod shapes;
pub mod spatial;
pub mod timers;
pub mod world;

// Re-export commonly used types
pub use ball::{Ball, BallKey, BallSnapshot};
pub use bounds::Aabb;
pub use collider::{Collider, ColliderId, ObjectHandle, ShapeFlags};
pub use config::{ContactTolerances, PhysicsConfig, TableSettings};
pub use event::{CollisionEvent, EventSink, HitEvent, HitTarget, Impact, NullSink, PhysicsEvent};
pub use integrator::{Mover, StepContext};
pub use material::PhysicsMaterial;
pub use shapes::{HitLine, HitLineZ, HitPlane, HitShape, HitSphere, HitTriangle, SweptSphere};
pub use spatial::Bvh;
pub use timers::TimerId;
pub use world::{FrameStats, PhysicsWorld, SchedulerState};
