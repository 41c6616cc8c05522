//! # drape-math
//!
//! Linear algebra for the Drape cloth solver.
//!
//! Provides:
//! - Re-exports of `glam` double-precision vector types
//! - Sparse CSR matrix assembled from summed triplets, with parallel SpMV
//! - Deterministic parallel reductions (dot, norm) and elementwise kernels
//! - Conjugate-gradient and sparse Cholesky solvers behind [`LinearSolver`]

pub mod cg;
pub mod cholesky;
pub mod reduce;
pub mod solver;
pub mod sparse;

pub use cg::{CgConfig, ConjugateGradient};
pub use cholesky::FaerCholesky;
pub use solver::{LinearSolver, SolveReport};
pub use sparse::{CsrMatrix, Triplet};

// Re-export glam types as the canonical vector types for Drape.
pub use glam::DVec3;
