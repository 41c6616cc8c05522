//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers keep vertex indices and constraint indices from
//! being mixed up when both index into flat DOF vectors.

use serde::{Deserialize, Serialize};

use crate::constants::DIM;

/// Index of a cloth vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Index of an edge constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub u32);

impl VertexId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Offset of this vertex's first DOF in an interleaved vector.
    #[inline]
    pub fn dof(self) -> usize {
        self.index() * DIM
    }
}

impl ConstraintId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn dof(self) -> usize {
        self.index() * DIM
    }
}

impl From<u32> for VertexId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for ConstraintId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}
