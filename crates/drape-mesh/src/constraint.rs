//! Edge constraints.

use serde::{Deserialize, Serialize};

use drape_types::{Scalar, VertexId};

/// Which grid neighbor an edge connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Horizontal or vertical neighbor. Rest length is one cell spacing.
    Structural,
    /// Diagonal neighbor. Rest length is √2 cell spacings.
    Shear,
}

/// A distance constraint between two vertices.
///
/// `start` is always the lower vertex index; the local step projects
/// along `x[end] − x[start]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub start: VertexId,
    pub end: VertexId,
    /// Target distance between `start` and `end`.
    pub rest_length: Scalar,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(start: VertexId, end: VertexId, rest_length: Scalar, kind: ConstraintKind) -> Self {
        Self {
            start,
            end,
            rest_length,
            kind,
        }
    }
}
