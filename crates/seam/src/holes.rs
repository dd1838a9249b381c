//! Boundary-loop tracing and hole filling.

use std::collections::HashMap;

use glam::Vec3;
use tracing::{debug, warn};

use crate::mesh::{EdgeKey, WorkMesh, edge_key, face_edges};

/// Summary of a [`close_boundary_holes`] run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoleOutcome {
    pub holes_filled: usize,
    pub faces_added: usize,
    pub faces_flipped: usize,
    /// Vertex counts of loops that were traced but left open
    pub skipped: Vec<usize>,
}

/// A boundary edge in the winding of its only face
#[derive(Debug, Clone, Copy)]
struct BoundaryEdge {
    from: u32,
    to: u32,
}

/// Fill every closable boundary loop.
///
/// Boundary edges are traced edge by edge in their face winding. Where a
/// vertex has several unused outgoing edges the one that turns least is
/// followed. A loop is accepted when it returns to its start vertex, or
/// when it dead-ends within `close_distance` of the start. Loops longer
/// than `max_vertices` are left open.
///
/// Triangles are filled with the winding opposite to the traced direction
/// so they agree with the surrounding faces. A new face that still runs a
/// boundary edge in the same direction as the face owning it is flipped.
/// Orientation is decided by edge direction only, so fills meeting their
/// neighbours at a sharp angle keep their winding.
pub fn close_boundary_holes(
    mesh: &mut WorkMesh,
    close_distance: f32,
    max_vertices: usize,
) -> HoleOutcome {
    let mut outcome = HoleOutcome::default();

    let mut counts: HashMap<EdgeKey, usize> = HashMap::new();
    for face in &mesh.faces {
        for (a, b) in face_edges(face) {
            *counts.entry(edge_key(a, b)).or_insert(0) += 1;
        }
    }

    let mut edges: Vec<BoundaryEdge> = Vec::new();
    for face in &mesh.faces {
        for (from, to) in face_edges(face) {
            if counts.get(&edge_key(from, to)) == Some(&1) {
                edges.push(BoundaryEdge { from, to });
            }
        }
    }
    if edges.is_empty() {
        return outcome;
    }

    let mut outgoing: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut owner: HashMap<EdgeKey, BoundaryEdge> = HashMap::with_capacity(edges.len());
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
        owner.insert(edge_key(e.from, e.to), *e);
    }

    let mut used = vec![false; edges.len()];
    let mut new_faces: Vec<[u32; 3]> = Vec::new();

    for start_edge in 0..edges.len() {
        if used[start_edge] {
            continue;
        }
        used[start_edge] = true;

        let start = edges[start_edge].from;
        let mut current = edges[start_edge].to;
        let mut direction = mesh.positions[current as usize] - mesh.positions[start as usize];
        let mut ring = vec![start];
        let mut closed = false;

        loop {
            if current == start {
                closed = true;
                break;
            }
            ring.push(current);
            if ring.len() > max_vertices {
                break;
            }

            let origin = mesh.positions[current as usize];
            let next = outgoing.get(&current).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .filter(|&e| !used[e])
                    .map(|e| {
                        let heading = mesh.positions[edges[e].to as usize] - origin;
                        (e, turn_angle(direction, heading))
                    })
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(e, _)| e)
            });

            match next {
                Some(e) => {
                    used[e] = true;
                    direction = mesh.positions[edges[e].to as usize] - origin;
                    current = edges[e].to;
                }
                None => {
                    closed = ring.len() >= 3
                        && origin.distance(mesh.positions[start as usize]) <= close_distance;
                    break;
                }
            }
        }

        if !closed || ring.len() < 3 || ring.len() > max_vertices {
            if ring.len() >= 3 {
                outcome.skipped.push(ring.len());
            }
            continue;
        }

        let first_new = new_faces.len();
        triangulate_loop(mesh, &ring, &mut new_faces);
        outcome.faces_flipped += orient_fill(&mut new_faces[first_new..], &owner);
        outcome.holes_filled += 1;
    }

    outcome.faces_added = new_faces.len();
    mesh.faces.extend(new_faces);

    if !outcome.skipped.is_empty() {
        warn!(
            "close_boundary_holes: left {} boundary loops open",
            outcome.skipped.len()
        );
    }
    if outcome.holes_filled > 0 {
        debug!(
            "close_boundary_holes: filled {} holes with {} faces ({} flipped)",
            outcome.holes_filled, outcome.faces_added, outcome.faces_flipped
        );
    }
    outcome
}

/// Angle between the incoming and outgoing direction; zero means straight on.
fn turn_angle(incoming: Vec3, outgoing: Vec3) -> f32 {
    let a = incoming.normalize_or_zero();
    let b = outgoing.normalize_or_zero();
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Triangulate a traced loop against its direction.
///
/// Three vertices become a single triangle; longer loops are fanned around
/// a new centroid vertex.
fn triangulate_loop(mesh: &mut WorkMesh, ring: &[u32], out: &mut Vec<[u32; 3]>) {
    if let [a, b, c] = *ring {
        out.push([a, c, b]);
        return;
    }

    let centroid = ring
        .iter()
        .map(|&v| mesh.positions[v as usize])
        .sum::<Vec3>()
        / ring.len() as f32;
    let center = mesh.add_vertex(centroid, false);
    for i in 0..ring.len() {
        let next = ring[(i + 1) % ring.len()];
        out.push([center, next, ring[i]]);
    }
}

/// Flip filled faces that share a boundary edge with its owner in the same
/// direction. Returns the number flipped.
fn orient_fill(fill: &mut [[u32; 3]], owner: &HashMap<EdgeKey, BoundaryEdge>) -> usize {
    let mut flipped = 0;
    for face in fill.iter_mut() {
        let clashes = face_edges(face).iter().any(|&(a, b)| {
            owner
                .get(&edge_key(a, b))
                .is_some_and(|edge| edge.from == a && edge.to == b)
        });
        if clashes {
            face.swap(1, 2);
            flipped += 1;
        }
    }
    flipped
}
