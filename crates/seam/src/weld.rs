//! Iterative boundary welding.
//!
//! Boolean results often leave the two sides of the cut as separate sheets
//! whose boundary vertices nearly coincide. Welding joins boundary vertices
//! within a tolerance and then cleans the faces the merge collapsed.

use tracing::{debug, trace};

use crate::cleanup::clean_faces;
use crate::mesh::{EdgeTable, WorkMesh};

/// Union-find over vertex indices.
///
/// The smaller index always becomes the root, so the surviving vertex of a
/// weld group is the earliest one and keeps its exact position.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Join the sets of `a` and `b`; false if they were already joined
    fn union(&mut self, a: u32, b: u32) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        if ra < rb {
            self.parent[rb as usize] = ra;
        } else {
            self.parent[ra as usize] = rb;
        }
        true
    }
}

/// Summary of a [`weld_and_clean`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeldOutcome {
    /// Passes run
    pub passes: usize,
    /// Vertex pairs joined over all passes
    pub welds: usize,
    /// Faces removed by the cleanup after each pass
    pub faces_removed: usize,
    /// Unreferenced vertices dropped by the final compaction
    pub vertices_compacted: usize,
    /// The last allowed pass still merged vertices
    pub cap_reached: bool,
}

/// Join boundary vertices closer than `tolerance`.
///
/// Boundary vertices are those on an edge with exactly one incident face.
/// Candidates are found with a sweep along x. Faces are remapped to the
/// surviving vertex and seam flags are OR-ed into it; merged-away vertices
/// stay in the position array until the mesh is compacted.
///
/// Returns the number of vertex pairs joined.
pub fn weld_boundary_vertices(mesh: &mut WorkMesh, tolerance: f32) -> usize {
    let table = EdgeTable::build(&mesh.faces);
    let mut is_boundary = vec![false; mesh.vertex_count()];
    for (a, b) in table.boundary_edges() {
        is_boundary[a as usize] = true;
        is_boundary[b as usize] = true;
    }

    let mut boundary: Vec<u32> = (0..mesh.vertex_count() as u32)
        .filter(|&v| is_boundary[v as usize])
        .collect();
    if boundary.len() < 2 {
        return 0;
    }
    // Stable sort keeps index order among equal x for determinism.
    boundary.sort_by(|&a, &b| {
        mesh.positions[a as usize]
            .x
            .total_cmp(&mesh.positions[b as usize].x)
    });

    let mut sets = UnionFind::new(mesh.vertex_count());
    let mut welds = 0;
    for (i, &a) in boundary.iter().enumerate() {
        let pa = mesh.positions[a as usize];
        for &b in &boundary[i + 1..] {
            let pb = mesh.positions[b as usize];
            if pb.x - pa.x > tolerance {
                break;
            }
            if pa.distance(pb) <= tolerance && sets.union(a, b) {
                welds += 1;
            }
        }
    }

    if welds == 0 {
        return 0;
    }

    for v in 0..mesh.vertex_count() as u32 {
        let root = sets.find(v);
        if root != v && mesh.seam[v as usize] {
            mesh.seam[root as usize] = true;
        }
    }
    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = sets.find(*v);
        }
    }

    trace!("weld_boundary_vertices: {} welds among {} boundary vertices", welds, boundary.len());
    welds
}

/// Weld and clean until a pass merges nothing, at most `max_passes` times,
/// then compact the mesh.
pub fn weld_and_clean(
    mesh: &mut WorkMesh,
    tolerance: f32,
    max_passes: usize,
    area_epsilon: f32,
) -> WeldOutcome {
    let mut outcome = WeldOutcome::default();
    let mut converged = false;

    for _ in 0..max_passes {
        let welds = weld_boundary_vertices(mesh, tolerance);
        let cleaned = clean_faces(mesh, area_epsilon);
        outcome.passes += 1;
        outcome.welds += welds;
        outcome.faces_removed += cleaned.total();
        if welds == 0 {
            converged = true;
            break;
        }
    }
    outcome.cap_reached = !converged && max_passes > 0;
    outcome.vertices_compacted = mesh.compact();

    debug!(
        "weld_and_clean: {} welds, {} faces removed in {} passes (tolerance {:.6})",
        outcome.welds, outcome.faces_removed, outcome.passes, tolerance
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Two triangles of a unit quad that do not share vertex indices; the
    /// shared diagonal is duplicated with a small offset.
    fn create_split_quad(offset: f32) -> WorkMesh {
        WorkMesh {
            positions: vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(offset, 0.0, 0.0),
                Vec3::new(1.0 + offset, 1.0, 0.0),
                Vec3::Y,
            ],
            faces: vec![[0, 1, 2], [3, 4, 5]],
            seam: vec![false, false, false, true, false, false],
        }
    }

    #[test]
    fn test_union_find_lower_root() {
        let mut sets = UnionFind::new(4);
        assert!(sets.union(3, 1));
        assert!(sets.union(1, 2));
        assert!(!sets.union(2, 3));
        assert_eq!(sets.find(3), 1);
        assert_eq!(sets.find(2), 1);
        assert_eq!(sets.find(0), 0);
    }

    #[test]
    fn test_weld_reduces_vertex_count() {
        let mut mesh = create_split_quad(1e-4);
        let before = mesh.vertex_count();
        let outcome = weld_and_clean(&mut mesh, 5e-4, 3, 1e-10);

        assert_eq!(outcome.welds, 2);
        assert!(!outcome.cap_reached);
        assert!(mesh.vertex_count() < before);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        for &[a, b, c] in &mesh.faces {
            assert!(a != b && b != c && c != a);
        }
        // Vertex 3 carried the seam flag into its root, vertex 0
        assert!(mesh.seam[0]);
        assert_eq!(mesh.positions[0], Vec3::ZERO);
    }

    #[test]
    fn test_weld_respects_tolerance() {
        let mut mesh = create_split_quad(0.01);
        let outcome = weld_and_clean(&mut mesh, 5e-4, 3, 1e-10);
        assert_eq!(outcome.welds, 0);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_weld_ignores_interior_vertices() {
        // Vertex 0 is interior and sits within tolerance of every rim vertex
        let mut mesh = WorkMesh {
            positions: vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::NEG_X,
                Vec3::NEG_Y,
            ],
            faces: vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]],
            seam: vec![false; 5],
        };
        assert_eq!(weld_boundary_vertices(&mut mesh, 1.2), 0);
    }
}
