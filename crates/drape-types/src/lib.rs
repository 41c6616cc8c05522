//! # drape-types
//!
//! Shared types, identifiers, error types, and simulation constants
//! for the Drape cloth solver.
//!
//! This crate has no domain logic. It defines the vocabulary that
//! the math, mesh, and solver crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{DrapeError, DrapeResult};
pub use ids::{ConstraintId, VertexId};
pub use scalar::Scalar;
