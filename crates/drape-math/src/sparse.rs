//! Sparse matrix representation.
//!
//! Provides a CSR (Compressed Sparse Row) matrix assembled from
//! `(row, col, value)` triplets, plus the row-parallel matrix-vector
//! product used by the global step and the CG solver.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use drape_types::error::ensure_len;
use drape_types::{DrapeError, DrapeResult, Scalar};

/// A `(row, col, value)` entry. Duplicates are allowed before compression.
pub type Triplet = (usize, usize, Scalar);

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. Column indices within a
/// row are strictly increasing: every `(row, col)` appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<Scalar>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// `n×n` identity.
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![1.0; n])
    }

    /// Square diagonal matrix with the given diagonal.
    pub fn from_diagonal(diagonal: &[Scalar]) -> Self {
        let n = diagonal.len();
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: diagonal.to_vec(),
        }
    }

    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate `(row, col)` entries are summed. The order in which
    /// triplets are supplied does not matter.
    ///
    /// Returns `InvalidMesh` if a triplet lies outside `rows × cols`.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[Triplet]) -> DrapeResult<Self> {
        // Count entries per row
        let mut row_counts = vec![0usize; rows];
        for &(r, c, _) in triplets {
            if r >= rows || c >= cols {
                return Err(DrapeError::InvalidMesh(format!(
                    "Triplet ({r}, {c}) out of bounds for {rows}×{cols} matrix"
                )));
            }
            row_counts[r] += 1;
        }

        // Build row_ptr
        let mut row_ptr = vec![0usize; rows + 1];
        for i in 0..rows {
            row_ptr[i + 1] = row_ptr[i] + row_counts[i];
        }

        let mut entries = vec![(0usize, 0.0 as Scalar); row_ptr[rows]];
        let mut cursor = row_ptr[..rows].to_vec();
        for &(r, c, v) in triplets {
            entries[cursor[r]] = (c, v);
            cursor[r] += 1;
        }

        // Sort each row by column, then fold runs of equal columns.
        let mut out_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for i in 0..rows {
            let row = &mut entries[row_ptr[i]..row_ptr[i + 1]];
            row.sort_by_key(|&(c, _)| c);

            let row_start = col_idx.len();
            for &(c, v) in row.iter() {
                if col_idx.len() > row_start && col_idx[col_idx.len() - 1] == c {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            out_ptr[i + 1] = col_idx.len();
        }

        Ok(Self {
            rows,
            cols,
            row_ptr: out_ptr,
            col_idx,
            values,
        })
    }

    /// Iterates the stored entries as triplets, row-major.
    pub fn triplets(&self) -> impl Iterator<Item = Triplet> + '_ {
        (0..self.rows).flat_map(move |row| {
            (self.row_ptr[row]..self.row_ptr[row + 1])
                .map(move |idx| (row, self.col_idx[idx], self.values[idx]))
        })
    }

    /// Value at `(row, col)`, or zero if not stored.
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        if row >= self.rows {
            return 0.0;
        }
        let cols = &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]];
        match cols.binary_search(&col) {
            Ok(pos) => self.values[self.row_ptr[row] + pos],
            Err(_) => 0.0,
        }
    }

    /// Diagonal entries (length `min(rows, cols)`).
    pub fn diagonal(&self) -> Vec<Scalar> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// `self + alpha · other`. Both operands must share dimensions.
    pub fn add_scaled(&self, other: &CsrMatrix, alpha: Scalar) -> DrapeResult<CsrMatrix> {
        ensure_len("matrix sum (rows)", self.rows, other.rows)?;
        ensure_len("matrix sum (cols)", self.cols, other.cols)?;

        let triplets: Vec<Triplet> = self
            .triplets()
            .chain(other.triplets().map(|(r, c, v)| (r, c, alpha * v)))
            .collect();
        Self::from_triplets(self.rows, self.cols, &triplets)
    }

    /// Returns true if `|A[i,j] − A[j,i]| <= tol` for every stored entry.
    pub fn is_symmetric(&self, tol: Scalar) -> bool {
        self.is_square() && self.triplets().all(|(r, c, v)| (v - self.get(c, r)).abs() <= tol)
    }

    /// `out = A · x`, one row per parallel task.
    ///
    /// Each output row is accumulated sequentially over its stored entries,
    /// so the result does not depend on thread scheduling.
    pub fn mul_vec_into(&self, x: &[Scalar], out: &mut [Scalar]) -> DrapeResult<()> {
        ensure_len("spmv input", self.cols, x.len())?;
        ensure_len("spmv output", self.rows, out.len())?;

        out.par_iter_mut().enumerate().for_each(|(row, o)| {
            let mut sum = 0.0;
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                sum += self.values[idx] * x[self.col_idx[idx]];
            }
            *o = sum;
        });
        Ok(())
    }

    /// Allocating variant of [`mul_vec_into`](Self::mul_vec_into).
    pub fn mul_vec(&self, x: &[Scalar]) -> DrapeResult<Vec<Scalar>> {
        let mut out = vec![0.0; self.rows];
        self.mul_vec_into(x, &mut out)?;
        Ok(out)
    }

    /// Quadratic form `xᵀ A x`.
    pub fn quadratic_form(&self, x: &[Scalar]) -> DrapeResult<Scalar> {
        let ax = self.mul_vec(x)?;
        ensure_len("quadratic form", self.rows, x.len())?;
        Ok(crate::reduce::dot(x, &ax))
    }
}
