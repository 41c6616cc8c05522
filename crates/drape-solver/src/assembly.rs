//! System assembly for the local/global integrator.
//!
//! Builds, once per run:
//! - `M`: diagonal mass matrix, `3V × 3V`
//! - `L`: stiffness-weighted graph Laplacian of the constraint graph,
//!   replicated on each axis, `3V × 3V`
//! - `Y = M + dt²·L`: the constant SPD system matrix
//! - `J`: projection matrix mapping per-constraint targets to vertex
//!   forces, `3V × 3C`
//!
//! and the right-hand side of each global step:
//!
//! ```text
//! b = M·y + dt²·(J·d) + dt²·f_ext
//! ```
//!
//! All matrices are accumulated as triplets and compressed to CSR,
//! which sums entries that land on the same coordinate.

use rayon::prelude::*;
use tracing::info;

use drape_math::sparse::{CsrMatrix, Triplet};
use drape_mesh::{Constraint, Topology};
use drape_types::constants::DIM;
use drape_types::error::ensure_len;
use drape_types::{DrapeError, DrapeResult, Scalar};

use crate::config::{ClothConfig, SimulationConfig};
use crate::state::ClothState;

/// Diagonal mass matrix: `mass` on each of the `3·vertex_count` DOFs.
pub fn assemble_mass_matrix(vertex_count: usize, mass: Scalar) -> CsrMatrix {
    CsrMatrix::from_diagonal(&vec![mass; vertex_count * DIM])
}

/// Stiffness Laplacian `L`.
///
/// For each constraint `(s, e)` and axis `a`:
/// `+k` at `(s,s)` and `(e,e)`, `−k` at `(s,e)` and `(e,s)`.
/// A vertex shared by several constraints accumulates all of them.
pub fn assemble_stiffness_matrix(
    vertex_count: usize,
    constraints: &[Constraint],
    stiffness: Scalar,
) -> DrapeResult<CsrMatrix> {
    let n = vertex_count * DIM;
    let mut triplets: Vec<Triplet> = Vec::with_capacity(constraints.len() * DIM * 4);

    for c in constraints {
        let s = c.start.dof();
        let e = c.end.dof();
        for axis in 0..DIM {
            triplets.push((s + axis, s + axis, stiffness));
            triplets.push((s + axis, e + axis, -stiffness));
            triplets.push((e + axis, e + axis, stiffness));
            triplets.push((e + axis, s + axis, -stiffness));
        }
    }

    CsrMatrix::from_triplets(n, n, &triplets)
}

/// Projection matrix `J` (`3V × 3C`).
///
/// Column block `3i..3i+3` belongs to constraint `i`: the start vertex's
/// rows get `−k` on the axis diagonal, the end vertex's rows get `+k`.
pub fn assemble_projection_matrix(
    vertex_count: usize,
    constraints: &[Constraint],
    stiffness: Scalar,
) -> DrapeResult<CsrMatrix> {
    let mut triplets: Vec<Triplet> = Vec::with_capacity(constraints.len() * DIM * 2);

    for (i, c) in constraints.iter().enumerate() {
        let col = i * DIM;
        let s = c.start.dof();
        let e = c.end.dof();
        for axis in 0..DIM {
            triplets.push((s + axis, col + axis, -stiffness));
            triplets.push((e + axis, col + axis, stiffness));
        }
    }

    CsrMatrix::from_triplets(vertex_count * DIM, constraints.len() * DIM, &triplets)
}

/// Global step right-hand side, written into `b`:
/// `b = mass·y + dt²·(J·d + f_ext)`.
///
/// With unit mass this is exactly `dt²·J·d + dt²·f_ext + y`.
pub fn assemble_rhs(
    projection: &CsrMatrix,
    d: &[Scalar],
    f_external: &[Scalar],
    y: &[Scalar],
    mass: Scalar,
    dt2: Scalar,
    b: &mut [Scalar],
) -> DrapeResult<()> {
    ensure_len("rhs external force", b.len(), f_external.len())?;
    ensure_len("rhs inertial prediction", b.len(), y.len())?;

    // b = J·d
    projection.mul_vec_into(d, b)?;

    b.par_iter_mut()
        .zip(f_external.par_iter())
        .zip(y.par_iter())
        .for_each(|((bi, &fi), &yi)| {
            *bi = dt2 * (*bi + fi) + mass * yi;
        });
    Ok(())
}

/// Everything the stepper needs from assembly.
#[derive(Debug, Clone)]
pub struct AssembledSystem {
    /// `Y = M + dt²·L`
    pub system_matrix: CsrMatrix,
    /// `J`
    pub projection: CsrMatrix,
    /// Initial vectors.
    pub state: ClothState,
}

/// Assembles the constant matrices and initial state from a finalized topology.
pub struct SystemBuilder<'a> {
    topology: &'a Topology,
    cloth: &'a ClothConfig,
    simulation: &'a SimulationConfig,
}

impl<'a> SystemBuilder<'a> {
    pub fn new(topology: &'a Topology, cloth: &'a ClothConfig, simulation: &'a SimulationConfig) -> Self {
        Self {
            topology,
            cloth,
            simulation,
        }
    }

    fn ensure_finalized(&self) -> DrapeResult<()> {
        if self.topology.is_finalized() {
            Ok(())
        } else {
            Err(DrapeError::InvalidMesh(
                "topology has no constraints; call generate_constraints() before assembly".into(),
            ))
        }
    }

    pub fn mass_matrix(&self) -> CsrMatrix {
        assemble_mass_matrix(self.topology.vertex_count(), self.cloth.vertex_mass)
    }

    pub fn stiffness_matrix(&self) -> DrapeResult<CsrMatrix> {
        self.ensure_finalized()?;
        assemble_stiffness_matrix(
            self.topology.vertex_count(),
            self.topology.constraints(),
            self.cloth.stiffness,
        )
    }

    pub fn projection_matrix(&self) -> DrapeResult<CsrMatrix> {
        self.ensure_finalized()?;
        assemble_projection_matrix(
            self.topology.vertex_count(),
            self.topology.constraints(),
            self.cloth.stiffness,
        )
    }

    /// `Y = M + dt²·L`
    pub fn system_matrix(&self) -> DrapeResult<CsrMatrix> {
        let laplacian = self.stiffness_matrix()?;
        self.mass_matrix().add_scaled(&laplacian, self.simulation.dt_squared())
    }

    pub fn initial_state(&self) -> ClothState {
        ClothState::flat(self.topology, self.cloth.vertex_mass, self.simulation.gravity)
    }

    /// Runs the full assembly.
    pub fn build(&self) -> DrapeResult<AssembledSystem> {
        self.ensure_finalized()?;

        let system_matrix = self.system_matrix()?;
        let projection = self.projection_matrix()?;
        let state = self.initial_state();

        info!(
            vertices = self.topology.vertex_count(),
            constraints = self.topology.constraint_count(),
            system_nnz = system_matrix.nnz(),
            projection_nnz = projection.nnz(),
            "assembled cloth system"
        );

        Ok(AssembledSystem {
            system_matrix,
            projection,
            state,
        })
    }
}
