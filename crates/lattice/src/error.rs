//! Errors raised when building a control lattice.

use geometry::GeometryError;

/// Errors that can occur when constructing a [`crate::ControlLattice`]
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error("Lattice subdivisions must be at least 1 per axis, got {l}x{m}x{n}")]
    InvalidSubdivisions { l: usize, m: usize, n: usize },
}
