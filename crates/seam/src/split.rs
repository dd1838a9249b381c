//! Adaptive edge splitting inside the fillet zone.
//!
//! Smoothing needs enough vertices across the fillet to bend the surface.
//! Every edge near the seam that is longer than the target length gets a
//! midpoint, and each face is rebuilt from the midpoints on its edges:
//!
//! ```text
//!   one split        two splits        three splits
//!       C                C                  C
//!      /|\              / \                / \
//!     / | \            /   M2            MCA--MBC
//!    /  |  \          /  / | \           / \  / \
//!   A---M---B        A--M1---B          A--MAB---B
//! ```
//!
//! Midpoints are shared through a per-pass edge map, so both faces of an
//! edge use the same new vertex and the mesh stays watertight.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::field::{distance_to_segments, segment_bounds};
use crate::mesh::{EdgeKey, WorkMesh, edge_key, face_edges};
use crate::types::SeamSegment;

/// Parameters for one split stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitParams {
    /// An edge is a candidate when one endpoint lies within this distance of the seam
    pub zone_radius: f32,
    /// Edges at or below this length are left alone
    pub target_length: f32,
    pub max_passes: usize,
    /// No midpoint is created once the mesh has this many vertices
    pub vertex_cap: usize,
}

/// Summary of a [`split_fillet_zone`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOutcome {
    pub passes: usize,
    pub midpoints: usize,
    /// Splitting stopped because the vertex cap was hit
    pub vertex_cap_reached: bool,
    /// The last allowed pass still created midpoints
    pub pass_cap_reached: bool,
}

/// Split long edges near the seam until none remain or a cap is hit.
pub fn split_fillet_zone(
    mesh: &mut WorkMesh,
    segments: &[SeamSegment],
    params: &SplitParams,
) -> SplitOutcome {
    let mut outcome = SplitOutcome::default();
    let Some(bounds) = segment_bounds(segments) else {
        return outcome;
    };
    let bounds = bounds.expanded(params.zone_radius);

    for _ in 0..params.max_passes {
        let near: Vec<bool> = mesh
            .positions
            .iter()
            .map(|&p| {
                bounds.contains_point(p) && distance_to_segments(p, segments) <= params.zone_radius
            })
            .collect();

        let mut midpoints: HashMap<EdgeKey, u32> = HashMap::new();
        'faces: for f in 0..mesh.faces.len() {
            for (a, b) in face_edges(&mesh.faces[f]) {
                let key = edge_key(a, b);
                if midpoints.contains_key(&key) || !(near[a as usize] || near[b as usize]) {
                    continue;
                }
                let pa = mesh.positions[a as usize];
                let pb = mesh.positions[b as usize];
                if pa.distance(pb) <= params.target_length {
                    continue;
                }
                if mesh.vertex_count() >= params.vertex_cap {
                    outcome.vertex_cap_reached = true;
                    break 'faces;
                }
                let seam = mesh.seam[a as usize] && mesh.seam[b as usize];
                let m = mesh.add_vertex((pa + pb) * 0.5, seam);
                midpoints.insert(key, m);
            }
        }

        if midpoints.is_empty() {
            break;
        }
        outcome.passes += 1;
        outcome.midpoints += midpoints.len();
        rebuild_faces(mesh, &midpoints);
        trace!(
            "split_fillet_zone: pass {} added {} midpoints",
            outcome.passes,
            midpoints.len()
        );

        if outcome.vertex_cap_reached {
            break;
        }
        if outcome.passes == params.max_passes {
            outcome.pass_cap_reached = true;
        }
    }

    debug!(
        "split_fillet_zone: {} midpoints in {} passes ({} vertices)",
        outcome.midpoints,
        outcome.passes,
        mesh.vertex_count()
    );
    outcome
}

/// Replace every face touching a split edge with its subdivision.
fn rebuild_faces(mesh: &mut WorkMesh, midpoints: &HashMap<EdgeKey, u32>) {
    let mut faces = Vec::with_capacity(mesh.faces.len() * 2);
    for face in &mesh.faces {
        let mids = face_edges(face).map(|(a, b)| midpoints.get(&edge_key(a, b)).copied());
        subdivide_face(*face, mids, &mut faces);
    }
    mesh.faces = faces;
}

/// Subdivide one face given the midpoints of its edges `v0v1`, `v1v2`, `v2v0`.
///
/// Winding is preserved.
fn subdivide_face(face: [u32; 3], mids: [Option<u32>; 3], out: &mut Vec<[u32; 3]>) {
    match mids {
        [None, None, None] => out.push(face),
        [Some(mab), Some(mbc), Some(mca)] => {
            let [a, b, c] = face;
            out.extend([[a, mab, mca], [mab, b, mbc], [mca, mbc, c], [mab, mbc, mca]]);
        }
        _ => {
            let split_count = mids.iter().filter(|m| m.is_some()).count();
            if split_count == 1 {
                // Rotate so the split edge is a-b
                let Some(i) = mids.iter().position(Option::is_some) else {
                    return;
                };
                let (a, b, c) = (face[i], face[(i + 1) % 3], face[(i + 2) % 3]);
                let Some(m) = mids[i] else { return };
                out.extend([[a, m, c], [m, b, c]]);
            } else {
                // Rotate so the unsplit edge is c-a
                let Some(u) = mids.iter().position(Option::is_none) else {
                    return;
                };
                let (a, b, c) = (face[(u + 1) % 3], face[(u + 2) % 3], face[u]);
                let (Some(m1), Some(m2)) = (mids[(u + 1) % 3], mids[(u + 2) % 3]) else {
                    return;
                };
                out.extend([[m1, b, m2], [a, m1, m2], [a, m2, c]]);
            }
        }
    }
}
