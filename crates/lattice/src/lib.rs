//! Free-form deformation for Cordwain.
//!
//! This crate warps a mesh through a 3D grid of control points:
//! - Bernstein-blended trivariate deformation over the mesh bounding box
//! - Per-point sculpting that commutes with later rigid transforms
//! - Reset to the undeformed lattice
//! - Synchronous change notifications for visualizers
//!
//! # Caller contract
//!
//! [`ControlLattice`] is not internally synchronized. Mutations
//! (`move_control_point`, `update_transform`, `reset`) and reads of the
//! control points must be serialized by the owner, typically by treating one
//! drag gesture as a single transaction on the UI thread.

pub mod bernstein;
pub mod error;
pub mod lattice;
pub mod types;

pub use error::LatticeError;
pub use lattice::ControlLattice;
pub use types::{LatticeEvent, SubscriptionId};
