//! # fdgd-types
//!
//! Shared vocabulary for finite-difference gradient descent: run
//! configuration, the error taxonomy and epoch trajectories.

pub mod config;
pub mod errors;
pub mod trajectory;

pub use config::*;
pub use errors::*;
pub use trajectory::*;
