//! Grid topology for a square cloth patch.
//!
//! Vertices sit on an N×N grid with `index(row, col) = row·N + col`.
//! Constraints are generated once, in a fixed order, and never change:
//! the system matrix assembled from them is valid for the whole run.

use serde::{Deserialize, Serialize};

use drape_types::{DrapeError, DrapeResult, Scalar, VertexId};

use crate::constraint::{Constraint, ConstraintKind};

/// Vertex grid and edge constraints of an N×N cloth patch.
///
/// Built in two phases: [`Topology::new`] fixes the grid, and
/// [`generate_constraints`](Topology::generate_constraints) finalizes it.
/// [`Topology::grid`] does both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// Vertices per side (N).
    resolution: usize,
    /// Physical side length of the patch.
    size: Scalar,
    constraints: Vec<Constraint>,
}

impl Topology {
    /// Creates an unfinalized N×N grid spanning `size` along each side.
    ///
    /// Requires `resolution >= 2` (otherwise the cell spacing is undefined)
    /// and a positive, finite `size`.
    pub fn new(resolution: usize, size: Scalar) -> DrapeResult<Self> {
        if resolution < 2 {
            return Err(DrapeError::InvalidConfig(format!(
                "Grid resolution must be at least 2, got {resolution}"
            )));
        }
        if !(size > 0.0) || !size.is_finite() {
            return Err(DrapeError::InvalidConfig(format!(
                "Cloth size must be positive, got {size}"
            )));
        }
        if resolution
            .checked_mul(resolution)
            .map_or(true, |n| n > u32::MAX as usize)
        {
            return Err(DrapeError::InvalidConfig(format!(
                "Grid resolution {resolution} exceeds the vertex index range"
            )));
        }

        Ok(Self {
            resolution,
            size,
            constraints: Vec::new(),
        })
    }

    /// Creates a grid and generates its constraints.
    pub fn grid(resolution: usize, size: Scalar) -> DrapeResult<Self> {
        let mut topology = Self::new(resolution, size)?;
        topology.generate_constraints();
        Ok(topology)
    }

    /// Generates the structural and shear constraints.
    ///
    /// Cells are visited row-major. Each cell emits, in order, the edge to
    /// its right neighbor, its lower neighbor, its lower-right diagonal, and
    /// its lower-left diagonal, skipping neighbors outside the grid. Every
    /// edge is emitted exactly once, from its lower-index endpoint.
    ///
    /// Calling this again regenerates the same list.
    pub fn generate_constraints(&mut self) {
        let n = self.resolution;
        let structural = self.structural_rest_length();
        let shear = self.shear_rest_length();

        let mut constraints = Vec::with_capacity(Self::expected_constraint_count(n));
        for row in 0..n {
            for col in 0..n {
                let here = self.vertex_id(row, col);
                if col + 1 < n {
                    let right = self.vertex_id(row, col + 1);
                    constraints.push(Constraint::new(here, right, structural, ConstraintKind::Structural));
                }
                if row + 1 < n {
                    let down = self.vertex_id(row + 1, col);
                    constraints.push(Constraint::new(here, down, structural, ConstraintKind::Structural));
                }
                if row + 1 < n && col + 1 < n {
                    let diag = self.vertex_id(row + 1, col + 1);
                    constraints.push(Constraint::new(here, diag, shear, ConstraintKind::Shear));
                }
                if row + 1 < n && col >= 1 {
                    let anti = self.vertex_id(row + 1, col - 1);
                    constraints.push(Constraint::new(here, anti, shear, ConstraintKind::Shear));
                }
            }
        }

        self.constraints = constraints;
    }

    /// True once constraints have been generated.
    pub fn is_finalized(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// `2·N·(N−1)` structural plus `2·(N−1)²` shear edges.
    pub fn expected_constraint_count(resolution: usize) -> usize {
        let n = resolution;
        let m = n.saturating_sub(1);
        2 * n * m + 2 * m * m
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.resolution + col
    }

    #[inline]
    pub fn vertex_id(&self, row: usize, col: usize) -> VertexId {
        VertexId(self.index(row, col) as u32)
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.resolution, index % self.resolution)
    }

    /// Whether `(row, col)` lies on the grid.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.resolution && col < self.resolution
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn size(&self) -> Scalar {
        self.size
    }

    pub fn vertex_count(&self) -> usize {
        self.resolution * self.resolution
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Cell spacing, `size / (N − 1)`.
    pub fn structural_rest_length(&self) -> Scalar {
        self.size / (self.resolution - 1) as Scalar
    }

    /// Diagonal of one cell, `√2 · spacing`.
    pub fn shear_rest_length(&self) -> Scalar {
        std::f64::consts::SQRT_2 * self.structural_rest_length()
    }
}
