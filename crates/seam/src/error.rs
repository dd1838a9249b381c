//! Errors surfaced by the seam-repair crate.

use geometry::GeometryError;

/// Errors that can occur during seam repair
///
/// Only malformed input is an error; every recoverable condition is reported
/// as a [`crate::Diagnostic`] instead.
#[derive(Debug, thiserror::Error)]
pub enum SeamError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error("Boolean evaluation failed: {0}")]
    Boolean(String),
}
