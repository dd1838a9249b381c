//! Cordwain geometry - mesh buffers and geometric queries
//!
//! This crate provides the data shared by every part of the engine:
//! - [`MeshBuffer`] - Indexed or non-indexed triangle mesh with flat buffers
//! - [`Aabb`] - Axis-aligned bounding boxes
//! - [`normals`] - Vertex and face normal computation
//! - [`weld`] - Position-only vertex merging
//! - [`query`] - Closest-point and distance queries
//! - [`primitives`] - Builders for simple closed meshes

pub mod aabb;
pub mod error;
pub mod normals;
pub mod primitives;
pub mod query;
pub mod types;
pub mod weld;

pub use aabb::Aabb;
pub use error::GeometryError;
pub use normals::{compute_vertex_normals, triangle_area, triangle_cross, triangle_normal};
pub use primitives::cuboid;
pub use query::{closest_point_on_segment, closest_point_on_triangle, point_segment_distance};
pub use types::MeshBuffer;
pub use weld::merge_vertices;
