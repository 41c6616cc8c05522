//! Conjugate-gradient solver for the constant SPD system.
//!
//! Plain CG with no preconditioner and no restart:
//!
//! ```text
//! x₀ = 0, r₀ = b, p₀ = r₀
//! for k = 0, 1, 2, ...
//!     α  = (rₖ·rₖ) / (pₖ·A pₖ)
//!     x ← x + α pₖ
//!     rₖ₊₁ = rₖ − α A pₖ
//!     stop if ‖rₖ₊₁‖ < tol
//!     β  = (rₖ₊₁·rₖ₊₁) / (rₖ·rₖ)
//!     pₖ₊₁ = rₖ₊₁ + β pₖ
//! ```
//!
//! All inner products use [`reduce::dot`](crate::reduce::dot).
//!
//! ## Breakdown
//!
//! A right-hand side whose norm is already below the tolerance returns
//! `x = 0` after zero iterations instead of dividing `0 / 0`. A
//! non-positive or non-finite `p·Ap`, or a non-finite residual, returns
//! [`DrapeError::SolverBreakdown`]; for an SPD matrix and finite input
//! neither can happen.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use drape_types::constants::DEFAULT_CG_TOLERANCE;
use drape_types::error::ensure_len;
use drape_types::{DrapeError, DrapeResult, Scalar};

use crate::reduce;
use crate::solver::{LinearSolver, SolveReport};
use crate::sparse::CsrMatrix;

/// Stopping criteria for [`ConjugateGradient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgConfig {
    /// Absolute residual norm threshold.
    pub tolerance: Scalar,
    /// Iteration cap. `None` iterates until the tolerance is met.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_CG_TOLERANCE,
            max_iterations: None,
        }
    }
}

/// Conjugate-gradient solver bound to one system matrix.
pub struct ConjugateGradient {
    matrix: Arc<CsrMatrix>,
    config: CgConfig,
}

impl ConjugateGradient {
    /// Binds the solver to `matrix`, which must be square.
    ///
    /// The matrix is assumed SPD; that is not checked here.
    pub fn new(matrix: Arc<CsrMatrix>, config: CgConfig) -> DrapeResult<Self> {
        ensure_len("conjugate gradient matrix (cols vs rows)", matrix.rows, matrix.cols)?;
        if !(config.tolerance > 0.0) {
            return Err(DrapeError::InvalidConfig(format!(
                "CG tolerance must be positive, got {}",
                config.tolerance
            )));
        }
        Ok(Self { matrix, config })
    }

    /// Binds with the default tolerance and no iteration cap.
    pub fn with_defaults(matrix: Arc<CsrMatrix>) -> DrapeResult<Self> {
        Self::new(matrix, CgConfig::default())
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    pub fn config(&self) -> &CgConfig {
        &self.config
    }

    /// Solves into a freshly allocated vector.
    pub fn solve_new(&self, rhs: &[Scalar]) -> DrapeResult<(Vec<Scalar>, SolveReport)> {
        let mut x = vec![0.0; self.dimension()];
        let report = self.solve(rhs, &mut x)?;
        Ok((x, report))
    }

    fn breakdown(iteration: usize, reason: String) -> DrapeError {
        DrapeError::SolverBreakdown { iteration, reason }
    }
}

impl LinearSolver for ConjugateGradient {
    fn solve(&self, rhs: &[Scalar], x: &mut [Scalar]) -> DrapeResult<SolveReport> {
        let n = self.dimension();
        ensure_len("conjugate gradient rhs", n, rhs.len())?;
        ensure_len("conjugate gradient solution", n, x.len())?;

        let tol = self.config.tolerance;
        let max_iter = self.config.max_iterations.unwrap_or(usize::MAX);

        // x = 0, so r = b − A·x = b
        reduce::fill(x, 0.0);
        let mut r = rhs.to_vec();
        let mut r_sq = reduce::norm_sq(&r);
        if !r_sq.is_finite() {
            return Err(Self::breakdown(0, format!("non-finite right-hand side (‖b‖² = {r_sq})")));
        }
        if r_sq.sqrt() < tol {
            return Ok(SolveReport {
                iterations: 0,
                residual: r_sq.sqrt(),
                converged: true,
            });
        }

        let mut p = r.clone();
        let mut ap = vec![0.0; n];
        let mut iterations = 0;

        while iterations < max_iter {
            self.matrix.mul_vec_into(&p, &mut ap)?;
            let p_ap = reduce::dot(&p, &ap);
            if !(p_ap > 0.0) || !p_ap.is_finite() {
                return Err(Self::breakdown(
                    iterations,
                    format!("p·Ap = {p_ap}; matrix is not positive definite"),
                ));
            }

            let alpha = r_sq / p_ap;
            reduce::axpy(alpha, &p, x);
            // r now holds r_next
            reduce::axpy(-alpha, &ap, &mut r);
            iterations += 1;

            let r_next_sq = reduce::norm_sq(&r);
            if !r_next_sq.is_finite() {
                return Err(Self::breakdown(iterations, format!("non-finite residual ({r_next_sq})")));
            }
            if r_next_sq.sqrt() < tol {
                return Ok(SolveReport {
                    iterations,
                    residual: r_next_sq.sqrt(),
                    converged: true,
                });
            }

            let beta = r_next_sq / r_sq;
            reduce::xpby(&r, beta, &mut p);
            r_sq = r_next_sq;
        }

        Ok(SolveReport {
            iterations,
            residual: r_sq.sqrt(),
            converged: false,
        })
    }

    fn dimension(&self) -> usize {
        self.matrix.rows
    }

    fn name(&self) -> &str {
        "ConjugateGradient"
    }
}
