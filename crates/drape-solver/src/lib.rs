//! # drape-solver
//!
//! Projective-dynamics cloth integration: system assembly, the
//! per-frame local/global loop, and pin enforcement.
//!
//! ## Key Types
//!
//! - [`Stepper`]: owns the assembled system and advances frames
//! - [`SystemBuilder`]: assembles `Y = M + dt²·L`, `J`, and initial vectors
//! - [`ClothState`]: interleaved position, prediction, and rhs buffers
//! - [`ClothConfig`] / [`SimulationConfig`]: patch and run-wide parameters

pub mod assembly;
pub mod config;
pub mod local;
pub mod state;
pub mod stepper;

pub use assembly::{AssembledSystem, SystemBuilder};
pub use config::{ClothConfig, DrapeConfig, GlobalSolverKind, SimulationConfig};
pub use state::ClothState;
pub use stepper::{FrameReport, Pin, Stepper};
