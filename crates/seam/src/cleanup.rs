//! Face cleanup: degenerate, duplicate and zero-area triangles.

use std::collections::HashSet;

use crate::mesh::WorkMesh;

/// Faces removed by one [`clean_faces`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub degenerate: usize,
    pub duplicate: usize,
    pub zero_area: usize,
}

impl CleanupStats {
    pub fn total(&self) -> usize {
        self.degenerate + self.duplicate + self.zero_area
    }
}

impl std::ops::AddAssign for CleanupStats {
    fn add_assign(&mut self, other: Self) {
        self.degenerate += other.degenerate;
        self.duplicate += other.duplicate;
        self.zero_area += other.zero_area;
    }
}

/// Remove faces that reference the same vertex twice.
pub fn remove_degenerate_faces(mesh: &mut WorkMesh) -> usize {
    let before = mesh.faces.len();
    mesh.faces
        .retain(|&[a, b, c]| a != b && b != c && c != a);
    before - mesh.faces.len()
}

/// Remove faces whose vertex set repeats an earlier face, keeping the first.
///
/// Winding is ignored: `[0,1,2]` and `[2,1,0]` are duplicates.
pub fn remove_duplicate_faces(mesh: &mut WorkMesh) -> usize {
    let before = mesh.faces.len();
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(before);
    mesh.faces.retain(|face| {
        let mut key = *face;
        key.sort_unstable();
        seen.insert(key)
    });
    before - mesh.faces.len()
}

/// Remove faces whose cross-product length is below `epsilon`.
pub fn remove_zero_area_faces(mesh: &mut WorkMesh, epsilon: f32) -> usize {
    let before = mesh.faces.len();
    let positions = &mesh.positions;
    mesh.faces.retain(|face| {
        let cross = (positions[face[1] as usize] - positions[face[0] as usize])
            .cross(positions[face[2] as usize] - positions[face[0] as usize]);
        cross.length() >= epsilon
    });
    before - mesh.faces.len()
}

/// Run all three removals in order.
pub fn clean_faces(mesh: &mut WorkMesh, area_epsilon: f32) -> CleanupStats {
    let stats = CleanupStats {
        degenerate: remove_degenerate_faces(mesh),
        duplicate: remove_duplicate_faces(mesh),
        zero_area: remove_zero_area_faces(mesh, area_epsilon),
    };
    if stats.total() > 0 {
        tracing::debug!(
            "clean_faces: removed {} degenerate, {} duplicate, {} zero-area faces",
            stats.degenerate,
            stats.duplicate,
            stats.zero_area
        );
    }
    stats
}
