//! Seam detection.
//!
//! The seam is the set of vertices where the subtracted tool cut the shell:
//! sharp creases and open edges that lie on the tool surface.

use geometry::{Aabb, closest_point_on_triangle};
use glam::Vec3;

use crate::mesh::{EdgeTable, WorkMesh};
use crate::types::SeamSegment;

/// Mark vertices adjacent to a sharp or open edge.
///
/// An edge with one incident face is open. An edge with two faces is sharp
/// when the angle between their normals exceeds `angle_degrees`. Edges with
/// more than two faces are non-manifold and never count as sharp.
pub fn detect_sharp_vertices(mesh: &WorkMesh, angle_degrees: f32) -> Vec<bool> {
    let cos_threshold = angle_degrees.to_radians().cos();
    let normals: Vec<Vec3> = mesh.faces.iter().map(|f| mesh.face_normal(f)).collect();

    let mut sharp = vec![false; mesh.vertex_count()];
    for ((a, b), faces) in EdgeTable::build(&mesh.faces).iter() {
        let is_sharp = match faces {
            [_] => true,
            [f0, f1] => normals[*f0 as usize].dot(normals[*f1 as usize]) < cos_threshold,
            _ => false,
        };
        if is_sharp {
            sharp[a as usize] = true;
            sharp[b as usize] = true;
        }
    }
    sharp
}

/// Keep only candidates within `tolerance` of a tool triangle.
///
/// Triangles are rejected by bounding box before the exact closest-point
/// test. An empty tool keeps nothing.
pub fn filter_near_surface(
    positions: &[Vec3],
    candidates: &[bool],
    tool_triangles: &[[Vec3; 3]],
    tolerance: f32,
) -> Vec<bool> {
    let mut near = vec![false; positions.len()];
    let Some(tool_bounds) = Aabb::from_points(tool_triangles.iter().flatten().copied()) else {
        return near;
    };
    let tool_bounds = tool_bounds.expanded(tolerance);

    let triangle_bounds: Vec<Aabb> = tool_triangles
        .iter()
        .filter_map(|tri| Aabb::from_points(tri.iter().copied()))
        .map(|b| b.expanded(tolerance))
        .collect();

    for (v, p) in positions.iter().enumerate() {
        if !candidates[v] || !tool_bounds.contains_point(*p) {
            continue;
        }
        near[v] = tool_triangles
            .iter()
            .zip(&triangle_bounds)
            .filter(|(_, bounds)| bounds.contains_point(*p))
            .any(|([a, b, c], _)| {
                closest_point_on_triangle(*p, *a, *b, *c).distance(*p) <= tolerance
            });
    }
    near
}

/// Seam segments of a mesh
#[derive(Debug, Clone, Default)]
pub struct SeamSegments {
    pub segments: Vec<SeamSegment>,
    /// No edge joined two seam vertices; every seam vertex is a point segment
    pub point_fallback: bool,
}

/// Collect every unique face edge whose endpoints are both seam vertices.
///
/// If there is none, each seam vertex becomes a point segment.
pub fn collect_seam_segments(mesh: &WorkMesh) -> SeamSegments {
    let segments: Vec<SeamSegment> = EdgeTable::build(&mesh.faces)
        .iter()
        .filter(|((a, b), _)| mesh.seam[*a as usize] && mesh.seam[*b as usize])
        .map(|((a, b), _)| {
            SeamSegment::new(mesh.positions[a as usize], mesh.positions[b as usize])
        })
        .collect();

    if !segments.is_empty() {
        return SeamSegments {
            segments,
            point_fallback: false,
        };
    }

    SeamSegments {
        segments: mesh
            .positions
            .iter()
            .zip(&mesh.seam)
            .filter(|(_, seam)| **seam)
            .map(|(p, _)| SeamSegment::point(*p))
            .collect(),
        point_fallback: true,
    }
}
