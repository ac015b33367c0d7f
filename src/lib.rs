//! Headless pinball runner
//!
//! Library half of the `pinball` binary: configuration loading and the
//! system that ties wall-clock time to the physics scheduler.

pub mod config;
pub mod systems;
