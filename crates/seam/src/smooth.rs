//! Weighted Laplacian smoothing over vertex adjacency.

use glam::Vec3;

use crate::mesh::face_edges;

/// Neighbour lists per vertex, sorted and without duplicates
pub fn build_adjacency(vertex_count: usize, faces: &[[u32; 3]]) -> Vec<Vec<u32>> {
    let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
    for face in faces {
        for (a, b) in face_edges(face) {
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
        }
    }
    for neighbors in &mut adjacency {
        neighbors.sort_unstable();
        neighbors.dedup();
    }
    adjacency
}

/// Move every weighted vertex toward the average of its neighbours.
///
/// Each iteration reads from a snapshot of the previous positions, so the
/// result does not depend on vertex order. The per-iteration step is
/// `weight * lambda * (average - position)`, clamped to `max_step` in
/// length. Vertices with zero weight or no neighbours never move.
///
/// Returns the number of vertices that can move.
pub fn laplacian_smooth(
    positions: &mut [Vec3],
    adjacency: &[Vec<u32>],
    weights: &[f32],
    lambda: f32,
    max_step: f32,
    iterations: u32,
) -> usize {
    let active: Vec<u32> = (0..positions.len() as u32)
        .filter(|&v| weights[v as usize] > 0.0 && !adjacency[v as usize].is_empty())
        .collect();
    if active.is_empty() {
        return 0;
    }

    let mut snapshot = positions.to_vec();
    for _ in 0..iterations {
        snapshot.copy_from_slice(positions);
        for &v in &active {
            let neighbors = &adjacency[v as usize];
            let sum: Vec3 = neighbors.iter().map(|&n| snapshot[n as usize]).sum();
            let average = sum / neighbors.len() as f32;

            let current = snapshot[v as usize];
            let step = ((average - current) * (weights[v as usize] * lambda)).clamp_length_max(max_step);
            positions[v as usize] = current + step;
        }
    }
    active.len()
}
