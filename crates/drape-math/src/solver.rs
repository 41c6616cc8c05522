//! Linear solver interface for the global step.

use serde::{Deserialize, Serialize};

use drape_types::{DrapeResult, Scalar};

/// Outcome of one linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Iterations performed (0 for direct solvers and for an already-zero residual).
    pub iterations: usize,
    /// Final residual norm `‖b − A·x‖`.
    pub residual: Scalar,
    /// Whether the residual reached the solver's tolerance.
    pub converged: bool,
}

/// Trait for solvers of a fixed symmetric positive-definite system `A·x = b`.
///
/// The solver owns (a handle to) the immutable matrix. The right-hand side
/// is passed on every call, so callers may refill their rhs buffer between
/// solves without any aliasing between solver and caller state.
///
/// Implementations: [`ConjugateGradient`](crate::cg::ConjugateGradient),
/// [`FaerCholesky`](crate::cholesky::FaerCholesky).
pub trait LinearSolver: Send {
    /// Solve `A·x = rhs`, writing into `solution`.
    ///
    /// Both slices must have length [`dimension`](Self::dimension).
    fn solve(&self, rhs: &[Scalar], solution: &mut [Scalar]) -> DrapeResult<SolveReport>;

    /// Side length of the bound system matrix.
    fn dimension(&self) -> usize;

    /// Returns the solver's name.
    fn name(&self) -> &str;
}
