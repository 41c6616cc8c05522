//! Cloth state: flat DOF buffers for every per-vertex and per-constraint vector.
//!
//! This is the primary mutable data structure during simulation.
//! The stepper reads and writes these buffers each frame.

use rayon::prelude::*;

use drape_math::{reduce, DVec3};
use drape_mesh::Topology;
use drape_types::constants::{DIM, VERTICAL_AXIS};
use drape_types::{Scalar, VertexId};

/// Interleaved state vectors.
///
/// # Layout
///
/// Per-vertex vectors have length `3·V`, per-constraint vectors `3·C`.
/// Components of one entity are adjacent:
/// ```text
/// x: [x0, y0, z0, x1, y1, z1, ...]
/// d: [dx0, dy0, dz0, dx1, dy1, dz1, ...]
/// ```
#[derive(Debug, Clone)]
pub struct ClothState {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of edge constraints.
    pub constraint_count: usize,

    /// Current positions.
    pub x: Vec<Scalar>,
    /// Positions at the start of the previous frame.
    pub x_prev: Vec<Scalar>,
    /// Inertial prediction for the current frame.
    pub y: Vec<Scalar>,
    /// Constant external force per DOF.
    pub f_external: Vec<Scalar>,

    /// Projected constraint displacements from the latest local step.
    pub d: Vec<Scalar>,
    /// Right-hand side of the latest global step.
    pub b: Vec<Scalar>,
}

impl ClothState {
    /// Flat rest state for `topology`.
    ///
    /// Row index spans X and column index spans Z, both scaled to the
    /// patch size; Y is zero. `x_prev` copies `x`, so the cloth starts at
    /// rest. External force is `mass · gravity` on the vertical axis.
    pub fn flat(topology: &Topology, vertex_mass: Scalar, gravity: Scalar) -> Self {
        let n = topology.resolution();
        let spacing = topology.structural_rest_length();
        let vertex_count = topology.vertex_count();
        let constraint_count = topology.constraint_count();

        let mut x = vec![0.0; vertex_count * DIM];
        let mut f_external = vec![0.0; vertex_count * DIM];
        for row in 0..n {
            for col in 0..n {
                let dof = topology.vertex_id(row, col).dof();
                x[dof] = spacing * row as Scalar;
                x[dof + 2] = spacing * col as Scalar;
                f_external[dof + VERTICAL_AXIS] = vertex_mass * gravity;
            }
        }

        Self {
            vertex_count,
            constraint_count,
            x_prev: x.clone(),
            x,
            y: vec![0.0; vertex_count * DIM],
            f_external,
            d: vec![0.0; constraint_count * DIM],
            b: vec![0.0; vertex_count * DIM],
        }
    }

    /// Number of position DOFs (`3·V`).
    pub fn dof_count(&self) -> usize {
        self.x.len()
    }

    /// Inertial prediction: `y = (2 − p)·x − (1 − p)·x_prev`, then `x_prev ← x`.
    pub fn predict(&mut self, preservation: Scalar) {
        let keep = 2.0 - preservation;
        let drop = 1.0 - preservation;
        self.y
            .par_iter_mut()
            .zip(self.x_prev.par_iter_mut())
            .zip(self.x.par_iter())
            .for_each(|((y, prev), &x)| {
                *y = keep * x - drop * *prev;
                *prev = x;
            });
    }

    #[inline]
    pub fn position(&self, vertex: VertexId) -> DVec3 {
        let i = vertex.dof();
        DVec3::new(self.x[i], self.x[i + 1], self.x[i + 2])
    }

    #[inline]
    pub fn set_position(&mut self, vertex: VertexId, p: DVec3) {
        let i = vertex.dof();
        self.x[i] = p.x;
        self.x[i + 1] = p.y;
        self.x[i + 2] = p.z;
    }

    /// Largest per-vertex distance between `x` and `x_prev`.
    ///
    /// After a frame this is the largest displacement the frame produced.
    pub fn max_displacement(&self) -> Scalar {
        self.x
            .par_chunks(DIM)
            .zip(self.x_prev.par_chunks(DIM))
            .map(|(a, b)| {
                let dx = a[0] - b[0];
                let dy = a[1] - b[1];
                let dz = a[2] - b[2];
                (dx * dx + dy * dy + dz * dz).sqrt()
            })
            .reduce(|| 0.0, Scalar::max)
    }

    /// Spring energy `½ k Σ (|x_e − x_s| − rest)²` over all constraints.
    pub fn stretch_energy(&self, topology: &Topology, stiffness: Scalar) -> Scalar {
        let stretch: Vec<Scalar> = topology
            .constraints()
            .par_iter()
            .map(|c| {
                let len = (self.position(c.end) - self.position(c.start)).length();
                len - c.rest_length
            })
            .collect();
        0.5 * stiffness * reduce::norm_sq(&stretch)
    }

    /// Mean vertical coordinate.
    pub fn mean_height(&self) -> Scalar {
        let ones = vec![1.0; self.vertex_count];
        let heights: Vec<Scalar> = self.x.iter().skip(VERTICAL_AXIS).step_by(DIM).copied().collect();
        reduce::dot(&heights, &ones) / self.vertex_count as Scalar
    }
}
