//! Scalar type alias for the simulation.
//!
//! The solver runs entirely on the CPU, so positions, matrices, and
//! residuals are kept in double precision. An absolute CG tolerance of
//! `1e-6` is not reliably reachable in `f32` on cloth-sized systems.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;
