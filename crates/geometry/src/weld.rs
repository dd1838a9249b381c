//! Position-only vertex merging.
//!
//! Triangle soups coming out of a boolean evaluator duplicate every vertex
//! per face. Merging positionally identical vertices turns the soup into an
//! indexed mesh whose shared edges can be found by index.

use std::collections::HashMap;

use crate::types::MeshBuffer;

/// Merge vertices whose positions quantize to the same grid cell.
///
/// Positions are snapped to a grid of size `tolerance`; the first vertex
/// seen in a cell becomes the canonical one and keeps its exact position.
/// All attributes other than position are dropped. The result is always
/// indexed and contains only the canonical vertices.
pub fn merge_vertices(mesh: &MeshBuffer, tolerance: f32) -> MeshBuffer {
    let tolerance = tolerance.max(f32::EPSILON);
    let quantize = |p: &[f32; 3]| -> [i64; 3] {
        [
            (p[0] / tolerance).round() as i64,
            (p[1] / tolerance).round() as i64,
            (p[2] / tolerance).round() as i64,
        ]
    };

    let mut cell_to_canonical: HashMap<[i64; 3], u32> = HashMap::new();
    let mut canonical_map: Vec<u32> = Vec::with_capacity(mesh.vertex_count());
    let mut positions: Vec<f32> = Vec::new();

    for p in mesh.vertices() {
        let next = (positions.len() / 3) as u32;
        let canonical = *cell_to_canonical.entry(quantize(p)).or_insert_with(|| {
            positions.extend_from_slice(p);
            next
        });
        canonical_map.push(canonical);
    }

    let indices: Vec<u32> = mesh
        .triangles()
        .flatten()
        .map(|i| canonical_map[i as usize])
        .collect();

    let merged = mesh.vertex_count() - positions.len() / 3;
    if merged > 0 {
        tracing::debug!(
            "merge_vertices: merged {} duplicate vertices ({} unique of {} total)",
            merged,
            positions.len() / 3,
            mesh.vertex_count()
        );
    }

    // Indices were remapped from a valid buffer, so the layout invariants hold.
    MeshBuffer::new(positions, Some(indices)).unwrap_or_default()
}
