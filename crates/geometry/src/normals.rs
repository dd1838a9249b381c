//! Vertex and face normal computation.

use glam::Vec3;

use crate::types::MeshBuffer;

/// Unnormalized cross product of a triangle's edges.
///
/// Its length is twice the triangle area.
pub fn triangle_cross(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Unit normal of a counter-clockwise triangle, zero if degenerate.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    triangle_cross(a, b, c).normalize_or_zero()
}

/// Area of a triangle.
pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    triangle_cross(a, b, c).length() * 0.5
}

/// Compute per-vertex normals.
///
/// Face normals are accumulated unnormalized, so larger faces weigh more.
/// For a triangle soup every vertex belongs to one face and receives that
/// face's normal. Vertices referenced by no face get a zero normal.
pub fn compute_vertex_normals(mesh: &MeshBuffer) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; mesh.vertex_count()];

    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let face = triangle_cross(mesh.position(a), mesh.position(b), mesh.position(c));
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_normal_ccw() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(n, Vec3::Z);
        assert_eq!(triangle_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0), Vec3::ZERO);
    }

    #[test]
    fn test_triangle_area() {
        assert!((triangle_area(Vec3::ZERO, Vec3::X, Vec3::Y) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_compute_vertex_normals_flat_quad() {
        let mesh = MeshBuffer::from_triangles(
            &[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let normals = compute_vertex_normals(&mesh);
        assert!(normals.iter().all(|n| n.abs_diff_eq(Vec3::Z, 1e-6)));
    }
}
