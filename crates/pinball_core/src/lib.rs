//! Table definitions for the pinball engine
//!
//! This crate turns table files into running physics worlds:
//!
//! - [`ShapeTemplate`] - Serializable collision geometry, including meshes
//! - [`ObjectTemplate`] - Named playfield element with material and hit events
//! - [`BallSpawn`] - Ball placed at start-up
//! - [`TableTemplate`] - Loadable/saveable table file
//! - [`TableValidator`] - Sanity checks for table files
//! - [`ActiveTable`] - Running table: physics world plus playfield registry
//! - [`Playfield`] - Named element registry that receives hit events

mod object;
mod playfield;
mod shapes;
mod table;
mod table_error;
mod table_validator;

pub use object::{BallSpawn, ObjectTemplate};
pub use playfield::{Playfield, PlayfieldObject};
pub use shapes::ShapeTemplate;
pub use table::{ActiveTable, TableTemplate};
pub use table_error::TableError;
pub use table_validator::{TableValidator, ValidationError};

// Re-export commonly used types for convenient access through pinball_core
pub use pinball_math::Vec3;
pub use pinball_physics::{
    BallKey, FrameStats, PhysicsConfig, PhysicsEvent, PhysicsMaterial, PhysicsWorld, TableSettings,
};
