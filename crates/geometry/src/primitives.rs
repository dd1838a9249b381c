//! Builders for simple closed meshes.

use glam::Vec3;

use crate::types::MeshBuffer;

/// Triangles of a cuboid whose corner `i` has bit 0 = x, bit 1 = y, bit 2 = z.
///
/// Counter-clockwise when viewed from outside.
const CUBOID_TRIANGLES: [[u32; 3]; 12] = [
    [0, 2, 3], [0, 3, 1], // -Z
    [4, 5, 7], [4, 7, 6], // +Z
    [0, 1, 5], [0, 5, 4], // -Y
    [2, 6, 7], [2, 7, 3], // +Y
    [0, 4, 6], [0, 6, 2], // -X
    [1, 3, 7], [1, 7, 5], // +X
];

/// Closed, indexed box spanning `min` to `max` with 8 vertices and 12 triangles.
pub fn cuboid(min: Vec3, max: Vec3) -> MeshBuffer {
    let corners: Vec<Vec3> = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        })
        .collect();

    let mut mesh = MeshBuffer::from_triangles(&corners, &CUBOID_TRIANGLES).unwrap_or_default();
    mesh.compute_vertex_normals();
    mesh
}
