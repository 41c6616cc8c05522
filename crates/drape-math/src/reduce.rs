//! Deterministic parallel vector kernels.
//!
//! Every inner product and norm in the solver goes through [`dot`].
//! Inputs are split into fixed [`CHUNK`]-sized pieces, each piece is
//! summed sequentially on a rayon worker, and the per-chunk partials are
//! summed sequentially in chunk order. For a given length the summation
//! order is fixed, so results are bit-identical between runs regardless
//! of thread count.
//!
//! Elementwise kernels (`axpy`, `xpby`, `fill`) have no reduction and
//! run as plain parallel iterators.
//!
//! Callers validate lengths at their public boundary; the kernels only
//! `debug_assert!` them.

use rayon::prelude::*;

use drape_types::Scalar;

/// Reduction chunk length.
pub const CHUNK: usize = 1024;

/// `Σ aᵢ bᵢ`
pub fn dot(a: &[Scalar], b: &[Scalar]) -> Scalar {
    debug_assert_eq!(a.len(), b.len());
    let partials: Vec<Scalar> = a
        .par_chunks(CHUNK)
        .zip(b.par_chunks(CHUNK))
        .map(|(ca, cb)| ca.iter().zip(cb).map(|(x, y)| x * y).sum::<Scalar>())
        .collect();
    partials.iter().sum()
}

/// `Σ aᵢ²`
pub fn norm_sq(a: &[Scalar]) -> Scalar {
    dot(a, a)
}

/// Euclidean norm.
pub fn norm(a: &[Scalar]) -> Scalar {
    norm_sq(a).sqrt()
}

/// `y ← y + alpha · x`
pub fn axpy(alpha: Scalar, x: &[Scalar], y: &mut [Scalar]) {
    debug_assert_eq!(x.len(), y.len());
    y.par_iter_mut().zip(x.par_iter()).for_each(|(yi, xi)| *yi += alpha * xi);
}

/// `y ← x + beta · y`
pub fn xpby(x: &[Scalar], beta: Scalar, y: &mut [Scalar]) {
    debug_assert_eq!(x.len(), y.len());
    y.par_iter_mut().zip(x.par_iter()).for_each(|(yi, xi)| *yi = xi + beta * *yi);
}

/// `x ← value`
pub fn fill(x: &mut [Scalar], value: Scalar) {
    x.par_iter_mut().for_each(|xi| *xi = value);
}

/// `max |aᵢ − bᵢ|`
pub fn max_abs_diff(a: &[Scalar], b: &[Scalar]) -> Scalar {
    debug_assert_eq!(a.len(), b.len());
    a.par_iter()
        .zip(b.par_iter())
        .map(|(x, y)| (x - y).abs())
        .reduce(|| 0.0, Scalar::max)
}
