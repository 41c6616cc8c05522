//! # drape-mesh
//!
//! Cloth patch topology: an N×N vertex grid and the structural and
//! shear edge constraints connecting it.
//!
//! ## Key Types
//!
//! - [`Topology`]: grid indexing and the ordered constraint list.
//! - [`Constraint`]: one edge with its rest length.
//! - [`ConstraintKind`]: structural (axis-aligned) or shear (diagonal).

pub mod constraint;
pub mod topology;

pub use constraint::{Constraint, ConstraintKind};
pub use topology::Topology;
