//! Call-local indexed mesh the pipeline stages operate on.
//!
//! Positions, faces and per-vertex seam flags are kept side by side so every
//! weld or compaction remaps the seam flags together with the geometry.

use std::collections::HashMap;

use geometry::{Aabb, MeshBuffer, triangle_cross};
use glam::Vec3;

/// Undirected edge key with the smaller index first
pub type EdgeKey = (u32, u32);

/// Normalize an edge to its undirected key.
#[inline]
pub fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// Directed edges of a face in winding order: `(v0,v1)`, `(v1,v2)`, `(v2,v0)`
#[inline]
pub fn face_edges(face: &[u32; 3]) -> [(u32, u32); 3] {
    [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])]
}

/// Indexed triangle mesh with seam flags
#[derive(Debug, Clone, Default)]
pub struct WorkMesh {
    pub positions: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    /// Per-vertex seam flag, always `positions.len()` long
    pub seam: Vec<bool>,
}

impl WorkMesh {
    /// Copy positions and triangles out of a buffer. No vertex is a seam vertex.
    pub fn from_buffer(buffer: &MeshBuffer) -> Self {
        let positions = buffer.position_vec();
        let seam = vec![false; positions.len()];
        Self {
            positions,
            faces: buffer.triangles().collect(),
            seam,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn seam_count(&self) -> usize {
        self.seam.iter().filter(|&&s| s).count()
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, position: Vec3, seam: bool) -> u32 {
        self.positions.push(position);
        self.seam.push(seam);
        (self.positions.len() - 1) as u32
    }

    /// Unnormalized face normal (cross product of two edges)
    pub fn face_cross(&self, face: &[u32; 3]) -> Vec3 {
        triangle_cross(
            self.positions[face[0] as usize],
            self.positions[face[1] as usize],
            self.positions[face[2] as usize],
        )
    }

    pub fn face_normal(&self, face: &[u32; 3]) -> Vec3 {
        self.face_cross(face).normalize_or_zero()
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Bounding-box diagonal, zero for an empty mesh
    pub fn extent(&self) -> f32 {
        self.bounding_box().map(|b| b.diagonal()).unwrap_or(0.0)
    }

    /// Drop vertices no face references and renumber the rest.
    ///
    /// Returns the number of vertices removed.
    pub fn compact(&mut self) -> usize {
        let mut used = vec![false; self.positions.len()];
        for face in &self.faces {
            for &v in face {
                used[v as usize] = true;
            }
        }

        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut positions = Vec::with_capacity(self.positions.len());
        let mut seam = Vec::with_capacity(self.positions.len());
        for (old, keep) in used.iter().enumerate() {
            if *keep {
                remap[old] = positions.len() as u32;
                positions.push(self.positions[old]);
                seam.push(self.seam[old]);
            }
        }

        let removed = self.positions.len() - positions.len();
        if removed > 0 {
            for face in &mut self.faces {
                for v in face.iter_mut() {
                    *v = remap[*v as usize];
                }
            }
            self.positions = positions;
            self.seam = seam;
        }
        removed
    }

    /// Indexed buffer of the current geometry (positions only)
    pub fn to_indexed_buffer(&self) -> MeshBuffer {
        let triangles: Vec<[u32; 3]> = self.faces.clone();
        // Faces only ever reference existing vertices.
        MeshBuffer::from_triangles(&self.positions, &triangles).unwrap_or_default()
    }

    /// Non-indexed buffer with per-vertex normals, the pipeline's output form
    pub fn to_soup_buffer(&self) -> MeshBuffer {
        self.to_indexed_buffer()
            .to_non_indexed()
            .with_computed_normals()
    }
}

/// Faces incident to every undirected edge, in first-seen order
#[derive(Debug, Default)]
pub struct EdgeTable {
    keys: Vec<EdgeKey>,
    faces: HashMap<EdgeKey, Vec<u32>>,
}

impl EdgeTable {
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut table = Self {
            keys: Vec::with_capacity(faces.len() * 3 / 2),
            faces: HashMap::with_capacity(faces.len() * 3 / 2),
        };
        for (f, face) in faces.iter().enumerate() {
            for (a, b) in face_edges(face) {
                let key = edge_key(a, b);
                let incident = table.faces.entry(key).or_insert_with(|| {
                    table.keys.push(key);
                    Vec::with_capacity(2)
                });
                incident.push(f as u32);
            }
        }
        table
    }

    /// All edges in first-seen order with their incident faces
    pub fn iter(&self) -> impl Iterator<Item = (EdgeKey, &[u32])> + '_ {
        self.keys
            .iter()
            .map(|key| (*key, self.faces.get(key).map(Vec::as_slice).unwrap_or(&[])))
    }

    pub fn faces_of(&self, key: EdgeKey) -> &[u32] {
        self.faces.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges with exactly one incident face
    pub fn boundary_edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_quad() -> WorkMesh {
        WorkMesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            faces: vec![[0, 1, 2], [0, 2, 3]],
            seam: vec![false; 4],
        }
    }

    #[test]
    fn test_edge_table_boundary() {
        let mesh = create_test_quad();
        let table = EdgeTable::build(&mesh.faces);
        assert_eq!(table.len(), 5);
        assert_eq!(table.boundary_edges().count(), 4);
        assert_eq!(table.faces_of(edge_key(2, 0)), &[0, 1]);
    }

    #[test]
    fn test_compact_remaps_faces_and_seam() {
        let mut mesh = create_test_quad();
        mesh.positions.insert(0, Vec3::splat(9.0));
        mesh.seam = vec![false, false, false, true, false];
        for face in &mut mesh.faces {
            for v in face.iter_mut() {
                *v += 1;
            }
        }

        assert_eq!(mesh.compact(), 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.seam, vec![false, false, true, false]);
    }

    #[test]
    fn test_to_soup_buffer_has_normals() {
        let soup = create_test_quad().to_soup_buffer();
        assert!(!soup.is_indexed());
        assert_eq!(soup.vertex_count(), 6);
        let normals = soup.normals().unwrap();
        assert!((normals[2] - 1.0).abs() < 1e-6);
    }
}
