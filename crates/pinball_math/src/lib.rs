//! 3D Mathematics Library
//!
//! This crate provides the vector and matrix types used by the pinball
//! physics core.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Mat3`] - 3x3 matrix for ball orientation
//!
//! ## Solvers
//!
//! - [`solve_quadratic`] - Real roots of a quadratic, used by swept-sphere tests

mod vec3;
pub mod mat3;
mod quadratic;

pub use vec3::Vec3;
pub use mat3::Mat3;
pub use quadratic::solve_quadratic;
