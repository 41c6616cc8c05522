//! Integration tests for drape-math.

use std::sync::Arc;

use drape_math::cg::{CgConfig, ConjugateGradient};
use drape_math::cholesky::FaerCholesky;
use drape_math::reduce;
use drape_math::solver::LinearSolver;
use drape_math::sparse::CsrMatrix;
use drape_types::DrapeError;

/// 1D Laplacian (2 on the diagonal, −1 off it) plus a diagonal shift.
fn shifted_laplacian(n: usize, shift: f64) -> CsrMatrix {
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push((i, i, 2.0 + shift));
        if i > 0 {
            triplets.push((i, i - 1, -1.0));
        }
        if i < n - 1 {
            triplets.push((i, i + 1, -1.0));
        }
    }
    CsrMatrix::from_triplets(n, n, &triplets).unwrap()
}

fn residual_norm(matrix: &CsrMatrix, x: &[f64], b: &[f64]) -> f64 {
    let mut ax = matrix.mul_vec(x).unwrap();
    reduce::axpy(-1.0, b, &mut ax);
    reduce::norm(&ax)
}

// ─── Sparse Matrix Tests ─────────────────────────────────────

#[test]
fn empty_csr() {
    let m = CsrMatrix::new(3, 3);
    assert_eq!(m.nnz(), 0);
    assert_eq!(m.rows, 3);
    assert_eq!(m.cols, 3);
    assert_eq!(m.row_ptr.len(), 4);
}

#[test]
fn csr_from_triplets() {
    let triplets = vec![(0, 0, 1.0), (1, 1, 1.0), (2, 2, 1.0)];
    let m = CsrMatrix::from_triplets(3, 3, &triplets).unwrap();
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.row_ptr, vec![0, 1, 2, 3]);
    assert_eq!(m.col_idx, vec![0, 1, 2]);
    assert_eq!(m.values, vec![1.0, 1.0, 1.0]);
}

#[test]
fn csr_from_triplets_unordered() {
    let triplets = vec![(0, 2, 3.0), (0, 0, 1.0), (0, 1, 2.0)];
    let m = CsrMatrix::from_triplets(1, 3, &triplets).unwrap();
    assert_eq!(m.col_idx, vec![0, 1, 2]);
    assert_eq!(m.values, vec![1.0, 2.0, 3.0]);
}

#[test]
fn csr_duplicates_are_summed() {
    let triplets = vec![(1, 1, 2.0), (0, 0, 1.0), (1, 1, 3.0), (1, 0, -1.0), (1, 1, 0.5)];
    let m = CsrMatrix::from_triplets(2, 2, &triplets).unwrap();
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.get(1, 1), 5.5);
    assert_eq!(m.get(1, 0), -1.0);
    assert_eq!(m.get(0, 1), 0.0);
}

#[test]
fn csr_insertion_order_irrelevant() {
    let forward = vec![(0, 0, 1.0), (0, 1, 2.0), (0, 1, 4.0), (1, 0, 3.0)];
    let mut reversed = forward.clone();
    reversed.reverse();
    let a = CsrMatrix::from_triplets(2, 2, &forward).unwrap();
    let b = CsrMatrix::from_triplets(2, 2, &reversed).unwrap();
    assert_eq!(a, b);
}

#[test]
fn csr_out_of_bounds_triplet_fails() {
    let result = CsrMatrix::from_triplets(2, 2, &[(2, 0, 1.0)]);
    assert!(matches!(result, Err(DrapeError::InvalidMesh(_))));
}

#[test]
fn csr_spmv() {
    // [1 2]   [1]   [5]
    // [0 3] · [2] = [6]
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]).unwrap();
    assert_eq!(m.mul_vec(&[1.0, 2.0]).unwrap(), vec![5.0, 6.0]);
}

#[test]
fn csr_spmv_rectangular() {
    // 2×3 · 3-vector
    let m = CsrMatrix::from_triplets(2, 3, &[(0, 2, 1.0), (1, 0, -2.0)]).unwrap();
    assert_eq!(m.mul_vec(&[1.0, 5.0, 7.0]).unwrap(), vec![7.0, -2.0]);
}

#[test]
fn csr_spmv_dimension_mismatch() {
    let m = CsrMatrix::identity(3);
    let err = m.mul_vec(&[1.0, 2.0]).unwrap_err();
    assert!(matches!(err, DrapeError::DimensionMismatch { expected: 3, actual: 2, .. }));
}

#[test]
fn csr_add_scaled() {
    let a = CsrMatrix::identity(2);
    let b = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 1.0)])
        .unwrap();
    let sum = a.add_scaled(&b, 0.5).unwrap();
    assert_eq!(sum.get(0, 0), 1.5);
    assert_eq!(sum.get(0, 1), -0.5);
    assert_eq!(sum.get(1, 1), 1.5);
    assert!(sum.is_symmetric(0.0));
}

#[test]
fn csr_add_scaled_mismatch_fails() {
    let a = CsrMatrix::identity(2);
    let b = CsrMatrix::identity(3);
    assert!(a.add_scaled(&b, 1.0).is_err());
}

#[test]
fn csr_symmetry_check() {
    let sym = shifted_laplacian(5, 0.0);
    assert!(sym.is_symmetric(0.0));

    let asym = CsrMatrix::from_triplets(2, 2, &[(0, 1, 1.0)]).unwrap();
    assert!(!asym.is_symmetric(1e-12));
}

#[test]
fn csr_diagonal() {
    let m = CsrMatrix::from_diagonal(&[1.0, 2.0, 3.0]);
    assert_eq!(m.diagonal(), vec![1.0, 2.0, 3.0]);
}

// ─── Reduction Tests ─────────────────────────────────────────

#[test]
fn dot_small() {
    assert_eq!(reduce::dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
}

#[test]
fn dot_spans_multiple_chunks() {
    let n = reduce::CHUNK * 3 + 17;
    let a = vec![1.0; n];
    let b = vec![2.0; n];
    assert_eq!(reduce::dot(&a, &b), 2.0 * n as f64);
}

#[test]
fn dot_is_bitwise_repeatable() {
    let n = reduce::CHUNK * 5 + 3;
    let a: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
    let b: Vec<f64> = (0..n).map(|i| (i as f64 * 1.13).cos()).collect();
    let first = reduce::dot(&a, &b);
    for _ in 0..10 {
        assert_eq!(reduce::dot(&a, &b).to_bits(), first.to_bits());
    }
}

#[test]
fn axpy_and_xpby() {
    let x = [1.0, 2.0];
    let mut y = [10.0, 20.0];
    reduce::axpy(2.0, &x, &mut y);
    assert_eq!(y, [12.0, 24.0]);

    reduce::xpby(&x, 0.5, &mut y);
    assert_eq!(y, [7.0, 14.0]);
}

#[test]
fn max_abs_diff_finds_largest() {
    assert_eq!(reduce::max_abs_diff(&[0.0, 1.0, -3.0], &[0.5, 1.0, 0.0]), 3.0);
}

// ─── Conjugate Gradient Tests ────────────────────────────────

#[test]
fn cg_diagonal_system() {
    let matrix = Arc::new(CsrMatrix::from_diagonal(&[1.0, 2.0, 3.0]));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let (x, report) = cg.solve_new(&[1.0, 2.0, 3.0]).unwrap();
    assert!(report.converged);
    assert!(report.iterations <= 3, "took {} iterations", report.iterations);
    for &xi in &x {
        assert!((xi - 1.0).abs() < 1e-6);
    }
}

#[test]
fn cg_identity_single_iteration() {
    let matrix = Arc::new(CsrMatrix::identity(6));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let b = [3.0, -7.0, 0.5, 2.0, 9.0, -1.25];
    let (x, report) = cg.solve_new(&b).unwrap();
    assert_eq!(report.iterations, 1);
    for (xi, bi) in x.iter().zip(&b) {
        assert!((xi - bi).abs() < 1e-12);
    }
}

#[test]
fn cg_laplacian_residual_below_tolerance() {
    let n = 100;
    let matrix = Arc::new(shifted_laplacian(n, 0.1));
    let cg = ConjugateGradient::with_defaults(Arc::clone(&matrix)).unwrap();

    let b: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin()).collect();
    let mut x = vec![0.0; n];
    let report = cg.solve(&b, &mut x).unwrap();

    assert!(report.converged);
    assert!(report.iterations <= n);
    assert!(residual_norm(&matrix, &x, &b) < 1e-6);
}

#[test]
fn cg_resets_initial_guess() {
    let matrix = Arc::new(CsrMatrix::from_diagonal(&[2.0, 4.0]));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let mut x = vec![1.0e6, -1.0e6];
    cg.solve(&[2.0, 4.0], &mut x).unwrap();
    assert!((x[0] - 1.0).abs() < 1e-6);
    assert!((x[1] - 1.0).abs() < 1e-6);
}

#[test]
fn cg_reads_rhs_at_call_time() {
    let matrix = Arc::new(CsrMatrix::from_diagonal(&[2.0, 2.0]));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let mut rhs = vec![2.0, 2.0];
    let (first, _) = cg.solve_new(&rhs).unwrap();
    rhs[0] = 8.0;
    let (second, _) = cg.solve_new(&rhs).unwrap();

    assert!((first[0] - 1.0).abs() < 1e-9);
    assert!((second[0] - 4.0).abs() < 1e-9);
}

#[test]
fn cg_zero_rhs_returns_zero_without_iterating() {
    let matrix = Arc::new(shifted_laplacian(4, 0.1));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let (x, report) = cg.solve_new(&[0.0; 4]).unwrap();
    assert_eq!(report.iterations, 0);
    assert!(report.converged);
    assert!(x.iter().all(|&v| v == 0.0));
}

#[test]
fn cg_iteration_cap_reports_not_converged() {
    let matrix = Arc::new(shifted_laplacian(50, 0.01));
    let config = CgConfig {
        tolerance: 1e-12,
        max_iterations: Some(2),
    };
    let cg = ConjugateGradient::new(matrix, config).unwrap();

    let (_, report) = cg.solve_new(&vec![1.0; 50]).unwrap();
    assert_eq!(report.iterations, 2);
    assert!(!report.converged);
}

#[test]
fn cg_indefinite_matrix_breaks_down() {
    let matrix = Arc::new(CsrMatrix::from_diagonal(&[-1.0, -1.0]));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let err = cg.solve_new(&[1.0, 1.0]).unwrap_err();
    assert!(matches!(err, DrapeError::SolverBreakdown { iteration: 0, .. }));
}

#[test]
fn cg_non_finite_rhs_breaks_down() {
    let matrix = Arc::new(CsrMatrix::identity(2));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();
    assert!(cg.solve_new(&[f64::NAN, 1.0]).is_err());
}

#[test]
fn cg_non_square_matrix_fails() {
    let matrix = Arc::new(CsrMatrix::new(2, 3));
    let result = ConjugateGradient::with_defaults(matrix);
    assert!(matches!(result, Err(DrapeError::DimensionMismatch { .. })));
}

#[test]
fn cg_rhs_length_mismatch_fails() {
    let matrix = Arc::new(CsrMatrix::identity(3));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();
    let mut x = vec![0.0; 3];
    assert!(cg.solve(&[1.0, 2.0], &mut x).is_err());
}

#[test]
fn cg_solution_length_mismatch_fails() {
    let matrix = Arc::new(CsrMatrix::identity(3));
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();
    let mut x = vec![0.0; 4];
    assert!(cg.solve(&[1.0, 2.0, 3.0], &mut x).is_err());
}

#[test]
fn cg_rejects_non_positive_tolerance() {
    let matrix = Arc::new(CsrMatrix::identity(2));
    let config = CgConfig {
        tolerance: 0.0,
        max_iterations: None,
    };
    assert!(ConjugateGradient::new(matrix, config).is_err());
}

#[test]
fn cg_config_serde_omits_unbounded_cap() {
    let json = serde_json::to_string(&CgConfig::default()).unwrap();
    assert!(!json.contains("max_iterations"));
    let recovered: CgConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, CgConfig::default());
}

// ─── FaerCholesky Tests ──────────────────────────────────────

#[test]
fn faer_identity_solve() {
    let matrix = Arc::new(CsrMatrix::identity(3));

    let mut solver = FaerCholesky::new();
    assert!(!solver.is_factorized());

    solver.factorize(matrix).unwrap();
    assert!(solver.is_factorized());

    let rhs = [3.0, 7.0, -2.0];
    let mut sol = [0.0; 3];
    let report = solver.solve(&rhs, &mut sol).unwrap();
    assert!(report.residual < 1e-12);

    for i in 0..3 {
        assert!(
            (sol[i] - rhs[i]).abs() < 1e-12,
            "sol[{i}] = {}, expected {}",
            sol[i],
            rhs[i]
        );
    }
}

#[test]
fn faer_factorize_then_multi_solve() {
    let matrix = Arc::new(CsrMatrix::from_diagonal(&[2.0, 3.0, 5.0]));
    let solver = FaerCholesky::from_matrix(matrix).unwrap();

    let mut sol1 = [0.0; 3];
    solver.solve(&[4.0, 9.0, 25.0], &mut sol1).unwrap();
    assert!((sol1[0] - 2.0).abs() < 1e-12);
    assert!((sol1[1] - 3.0).abs() < 1e-12);
    assert!((sol1[2] - 5.0).abs() < 1e-12);

    let mut sol2 = [0.0; 3];
    solver.solve(&[1.0, 1.0, 1.0], &mut sol2).unwrap();
    assert!((sol2[0] - 0.5).abs() < 1e-12);
    assert!((sol2[1] - 1.0 / 3.0).abs() < 1e-12);
    assert!((sol2[2] - 0.2).abs() < 1e-12);
}

#[test]
fn faer_agrees_with_cg() {
    let n = 64;
    let matrix = Arc::new(shifted_laplacian(n, 0.05));
    let b: Vec<f64> = (0..n).map(|i| 1.0 + (i % 7) as f64).collect();

    let cholesky = FaerCholesky::from_matrix(Arc::clone(&matrix)).unwrap();
    let cg = ConjugateGradient::with_defaults(matrix).unwrap();

    let mut direct = vec![0.0; n];
    cholesky.solve(&b, &mut direct).unwrap();
    let (iterative, _) = cg.solve_new(&b).unwrap();

    // ‖x_cg − x*‖ ≤ ‖r‖ / λ_min, with λ_min ≥ 0.05 here.
    assert!(reduce::max_abs_diff(&direct, &iterative) < 1e-4);
}

#[test]
fn faer_solve_before_factorize_fails() {
    let solver = FaerCholesky::new();
    let mut sol = [0.0; 3];
    assert!(matches!(
        solver.solve(&[1.0; 3], &mut sol),
        Err(DrapeError::Uninitialized(_))
    ));
}

#[test]
fn faer_non_square_fails() {
    let matrix = Arc::new(CsrMatrix::from_triplets(2, 3, &[(0, 0, 1.0)]).unwrap());
    let mut solver = FaerCholesky::new();
    assert!(solver.factorize(matrix).is_err());
}

#[test]
fn faer_empty_matrix_fails() {
    let mut solver = FaerCholesky::new();
    assert!(solver.factorize(Arc::new(CsrMatrix::new(0, 0))).is_err());
}
