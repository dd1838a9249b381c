//! Seam repair for Cordwain.
//!
//! This crate turns the raw result of a boolean subtraction into a
//! fillet-smoothed, hole-free mesh along the cut:
//! - Vertex merging and iterative boundary welding
//! - Seam detection from sharp dihedral and open boundary edges, filtered to
//!   the surface of the subtracted tool mesh
//! - Adaptive edge splitting inside the fillet zone
//! - Distance-weighted Laplacian smoothing with a smoothstep falloff
//! - Degenerate-face cleanup and boundary-hole closing
//!
//! # Architecture
//!
//! [`pipeline::smooth_seam`] runs every stage over a call-local
//! [`mesh::WorkMesh`]; the input buffers are never modified. Each stage lives
//! in its own module so it can be tested in isolation.
//!
//! Every early exit returns a valid mesh. The only error is an input with no
//! position data.

pub mod boolean;
pub mod cleanup;
pub mod detect;
pub mod error;
pub mod field;
pub mod holes;
pub mod mesh;
pub mod pipeline;
pub mod smooth;
pub mod split;
pub mod types;
pub mod weld;

pub use boolean::{BooleanEvaluator, BooleanOp, subtract_and_smooth};
pub use error::SeamError;
pub use pipeline::{smooth_seam, smooth_seam_with_report};
pub use types::{
    Diagnostic, PipelineStage, SeamOptions, SeamOutcome, SeamRepairConfig, SeamReport, SeamSegment,
};
