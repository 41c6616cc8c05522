//! Sparse Cholesky solver backed by `faer`.
//!
//! Implements [`LinearSolver`] with faer's supernodal LLᵀ factorization.
//! The cloth system matrix never changes after assembly, so one
//! factorization serves every global step of the simulation.
//!
//! ## Workflow
//! 1. `factorize(matrix)`: converts CSR→CSC, computes symbolic + numeric LLᵀ
//! 2. `solve(rhs, solution)`: forward/backward substitution (cached factorization)
//! 3. Repeat `solve()` with different RHS without re-factorizing

use std::sync::Arc;

use faer::Side;
use faer::linalg::solvers::Solve;
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};

use drape_types::error::ensure_len;
use drape_types::{DrapeError, DrapeResult, Scalar};

use crate::reduce;
use crate::solver::{LinearSolver, SolveReport};
use crate::sparse::CsrMatrix;

/// Sparse Cholesky (LLᵀ) solver using `faer`.
///
/// Keeps the source matrix so each solve can report its true residual.
pub struct FaerCholesky {
    /// Cached LLᵀ factorization.
    factorization: Option<Llt<usize, f64>>,
    /// Matrix the factorization was computed from.
    matrix: Option<Arc<CsrMatrix>>,
}

impl FaerCholesky {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            matrix: None,
        }
    }

    /// Creates and factorizes in one call.
    pub fn from_matrix(matrix: Arc<CsrMatrix>) -> DrapeResult<Self> {
        let mut solver = Self::new();
        solver.factorize(matrix)?;
        Ok(solver)
    }

    /// Convert the CSR matrix to faer's CSC format.
    fn csr_to_csc(matrix: &CsrMatrix) -> DrapeResult<SparseColMat<usize, f64>> {
        let triplets: Vec<Triplet<usize, usize, f64>> = matrix
            .triplets()
            .map(|(row, col, val)| Triplet { row, col, val })
            .collect();

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets)
            .map_err(|e| DrapeError::Factorization(format!("CSC construction failed: {e:?}")))
    }

    /// Factorize the matrix. Call once; the cloth system never changes.
    pub fn factorize(&mut self, matrix: Arc<CsrMatrix>) -> DrapeResult<()> {
        ensure_len("cholesky matrix (cols vs rows)", matrix.rows, matrix.cols)?;
        if matrix.rows == 0 {
            return Err(DrapeError::Factorization("cannot factorize an empty matrix".into()));
        }

        let csc = Self::csr_to_csc(&matrix)?;

        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| DrapeError::Factorization(format!("symbolic analysis failed: {e:?}")))?;

        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| DrapeError::Factorization(format!("numeric factorization failed: {e:?}")))?;

        self.factorization = Some(llt);
        self.matrix = Some(matrix);
        Ok(())
    }

    /// Returns true if the solver holds a valid factorization.
    pub fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}

impl Default for FaerCholesky {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for FaerCholesky {
    fn solve(&self, rhs: &[Scalar], solution: &mut [Scalar]) -> DrapeResult<SolveReport> {
        let (llt, matrix) = match (&self.factorization, &self.matrix) {
            (Some(llt), Some(matrix)) => (llt, matrix),
            _ => {
                return Err(DrapeError::Uninitialized(
                    "Cholesky solver not factorized. Call factorize() first.".into(),
                ));
            }
        };

        let n = matrix.rows;
        ensure_len("cholesky rhs", n, rhs.len())?;
        ensure_len("cholesky solution", n, solution.len())?;

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);

        // L Lᵀ x = b
        let sol = llt.solve(&rhs_mat);
        for (i, s) in solution.iter_mut().enumerate() {
            *s = sol[(i, 0)];
        }

        let mut residual = matrix.mul_vec(solution)?;
        reduce::axpy(-1.0, rhs, &mut residual);

        Ok(SolveReport {
            iterations: 0,
            residual: reduce::norm(&residual),
            converged: true,
        })
    }

    fn dimension(&self) -> usize {
        self.matrix.as_ref().map_or(0, |m| m.rows)
    }

    fn name(&self) -> &str {
        "FaerCholesky"
    }
}
