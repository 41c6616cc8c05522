//! Physical constants and simulation defaults.

use crate::Scalar;

/// Gravitational acceleration magnitude (m/s²).
pub const GRAVITY: Scalar = 9.81;

/// Default simulation timestep (seconds). One frame at 60 Hz.
pub const DEFAULT_DT: Scalar = 1.0 / 60.0;

/// Default number of local/global iterations per frame.
pub const DEFAULT_LOCAL_ITERATIONS: u32 = 10;

/// Default momentum preservation blend.
///
/// `0.0` keeps full inertia, `1.0` discards all velocity every frame.
pub const DEFAULT_PRESERVATION: Scalar = 0.01;

/// Default absolute residual tolerance for the conjugate-gradient solve.
pub const DEFAULT_CG_TOLERANCE: Scalar = 1.0e-6;

/// Default per-vertex mass (kg).
pub const DEFAULT_VERTEX_MASS: Scalar = 1.0;

/// Edges shorter than this are treated as degenerate by the local step.
pub const DEGENERATE_LENGTH: Scalar = 1.0e-12;

/// Spatial dimension. Every vertex carries this many DOFs.
pub const DIM: usize = 3;

/// Index of the vertical axis in an interleaved position vector.
pub const VERTICAL_AXIS: usize = 1;
