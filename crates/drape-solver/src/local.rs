//! Local step: per-constraint projection.
//!
//! Each constraint independently projects the current edge vector onto
//! its rest length. No constraint reads another constraint's output, so
//! the loop runs as one parallel pass over `d`.

use rayon::prelude::*;

use drape_math::DVec3;
use drape_mesh::Constraint;
use drape_types::constants::{DEGENERATE_LENGTH, DIM};
use drape_types::error::ensure_len;
use drape_types::{DrapeError, DrapeResult, Scalar};

/// Projection of one edge: `normalize(x_end − x_start) · rest_length`.
///
/// Returns `None` when the endpoints coincide (length below
/// [`DEGENERATE_LENGTH`]) or the edge is not finite.
#[inline]
pub fn project_edge(start: DVec3, end: DVec3, rest_length: Scalar) -> Option<DVec3> {
    let edge = end - start;
    let length = edge.length();
    if length < DEGENERATE_LENGTH || !length.is_finite() {
        return None;
    }
    Some(edge * (rest_length / length))
}

/// Fills `d` (length `3·C`) from positions `x` (length `3·V`).
///
/// Degenerate edges get `d = 0`, so they pull their endpoints together
/// instead of injecting NaN into the global step. Returns how many
/// constraints were degenerate.
pub fn local_step(constraints: &[Constraint], x: &[Scalar], d: &mut [Scalar]) -> DrapeResult<usize> {
    ensure_len("local step projections", constraints.len() * DIM, d.len())?;
    if x.len() % DIM != 0 {
        return Err(DrapeError::dimension(
            "local step positions",
            x.len() / DIM * DIM,
            x.len(),
        ));
    }
    let vertex_count = x.len() / DIM;
    if let Some(bad) = constraints
        .iter()
        .find(|c| c.start.index() >= vertex_count || c.end.index() >= vertex_count)
    {
        return Err(DrapeError::InvalidMesh(format!(
            "constraint {:?} -> {:?} references a vertex outside 0..{vertex_count}",
            bad.start, bad.end
        )));
    }

    let at = |i: usize| DVec3::new(x[i], x[i + 1], x[i + 2]);

    let degenerate = d
        .par_chunks_mut(DIM)
        .zip(constraints.par_iter())
        .map(|(out, c)| {
            let projected = project_edge(at(c.start.dof()), at(c.end.dof()), c.rest_length);
            let p = projected.unwrap_or(DVec3::ZERO);
            out[0] = p.x;
            out[1] = p.y;
            out[2] = p.z;
            usize::from(projected.is_none())
        })
        .sum::<usize>();

    Ok(degenerate)
}
