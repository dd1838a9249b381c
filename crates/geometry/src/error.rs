//! Errors raised when a mesh buffer violates its invariants.

/// Errors that can occur when building or consuming a [`crate::MeshBuffer`]
///
/// Every variant describes malformed input geometry, which callers treat as
/// fatal.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Mesh has no position data")]
    NoPositions,
    #[error("Position buffer length {0} is not a multiple of 3")]
    MisalignedPositions(usize),
    #[error("Index buffer length {0} is not a multiple of 3")]
    MisalignedIndices(usize),
    #[error("Non-indexed mesh has {0} vertices, which is not a multiple of 3")]
    IncompleteTriangle(usize),
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("Attribute '{name}' has {actual} values, expected {expected}")]
    AttributeLengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

