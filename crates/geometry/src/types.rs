//! The mesh buffer shared between the lattice, the seam pipeline and callers.

use glam::{Mat3, Mat4, Vec3};

use crate::aabb::Aabb;
use crate::error::GeometryError;
use crate::normals;

/// Triangle mesh stored as flat buffers
///
/// Positions hold 3 floats per vertex. When `indices` is `None`, every 3
/// consecutive vertices form a triangle. Normals and colors are optional
/// per-vertex attributes with the same layout as positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    positions: Vec<f32>,
    indices: Option<Vec<u32>>,
    normals: Option<Vec<f32>>,
    colors: Option<Vec<f32>>,
}

impl MeshBuffer {
    /// Build a mesh buffer, validating the index and layout invariants.
    ///
    /// An empty position buffer is accepted here; consumers that need
    /// geometry call [`MeshBuffer::require_positions`].
    pub fn new(positions: Vec<f32>, indices: Option<Vec<u32>>) -> Result<Self, GeometryError> {
        let mesh = Self {
            positions,
            indices,
            normals: None,
            colors: None,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Build an indexed mesh from vertex positions and triangles.
    pub fn from_triangles(positions: &[Vec3], triangles: &[[u32; 3]]) -> Result<Self, GeometryError> {
        let flat = positions.iter().flat_map(|p| p.to_array()).collect();
        let indices = triangles.iter().flatten().copied().collect();
        Self::new(flat, Some(indices))
    }

    /// Build a non-indexed mesh (triangle soup) from vertex positions.
    pub fn from_soup(positions: &[Vec3]) -> Result<Self, GeometryError> {
        let flat = positions.iter().flat_map(|p| p.to_array()).collect();
        Self::new(flat, None)
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<f32>) -> Result<Self, GeometryError> {
        check_attribute("normal", self.positions.len(), normals.len())?;
        self.normals = Some(normals);
        Ok(self)
    }

    /// Attach per-vertex colors (3 floats per vertex).
    pub fn with_colors(mut self, colors: Vec<f32>) -> Result<Self, GeometryError> {
        check_attribute("color", self.positions.len(), colors.len())?;
        self.colors = Some(colors);
        Ok(self)
    }

    /// Check every invariant of the buffer layout.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.positions.len() % 3 != 0 {
            return Err(GeometryError::MisalignedPositions(self.positions.len()));
        }
        let vertex_count = self.vertex_count();

        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(GeometryError::MisalignedIndices(indices.len()));
                }
                if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(GeometryError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(GeometryError::IncompleteTriangle(vertex_count));
                }
            }
        }

        if let Some(normals) = &self.normals {
            check_attribute("normal", self.positions.len(), normals.len())?;
        }
        if let Some(colors) = &self.colors {
            check_attribute("color", self.positions.len(), colors.len())?;
        }
        Ok(())
    }

    /// Fail with [`GeometryError::NoPositions`] if the mesh has no vertices.
    pub fn require_positions(&self) -> Result<(), GeometryError> {
        if self.positions.is_empty() {
            return Err(GeometryError::NoPositions);
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Flat position buffer
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Positions viewed as one `[x, y, z]` array per vertex
    pub fn vertices(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Index buffer, if the mesh is indexed
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Per-vertex normals, if present
    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    /// Per-vertex colors, if present
    pub fn colors(&self) -> Option<&[f32]> {
        self.colors.as_deref()
    }

    /// Whether the mesh carries an index buffer
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    /// Whether the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of vertex `index`
    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_array(self.vertices()[index])
    }

    /// All positions as `Vec3`
    pub fn position_vec(&self) -> Vec<Vec3> {
        self.vertices().iter().map(|&p| Vec3::from_array(p)).collect()
    }

    /// Overwrite every position from `Vec3` values.
    ///
    /// The vertex count must not change.
    pub fn set_positions(&mut self, positions: &[Vec3]) {
        debug_assert_eq!(positions.len(), self.vertex_count());
        for (dst, src) in self.positions.chunks_exact_mut(3).zip(positions) {
            dst.copy_from_slice(&src.to_array());
        }
    }

    /// Iterate triangles as vertex index triples.
    ///
    /// Non-indexed meshes yield `[3k, 3k+1, 3k+2]`.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let count = self.triangle_count();
        (0..count).map(move |t| match &self.indices {
            Some(indices) => [indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]],
            None => {
                let base = (t * 3) as u32;
                [base, base + 1, base + 2]
            }
        })
    }

    /// Corner positions of every triangle
    pub fn triangle_positions(&self) -> Vec<[Vec3; 3]> {
        self.triangles()
            .map(|[a, b, c]| {
                [
                    self.position(a as usize),
                    self.position(b as usize),
                    self.position(c as usize),
                ]
            })
            .collect()
    }

    /// Bounding box of all positions, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices().iter().map(|&p| Vec3::from_array(p)))
    }

    // ========================================================================
    // Derived buffers
    // ========================================================================

    /// Copy with every non-position attribute stripped
    pub fn position_only(&self) -> Self {
        Self {
            positions: self.positions.clone(),
            indices: self.indices.clone(),
            normals: None,
            colors: None,
        }
    }

    /// Copy with positions mapped through `matrix`.
    ///
    /// Normals are mapped by the inverse-transpose and renormalized.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut out = self.clone();
        for p in out.positions.chunks_exact_mut(3) {
            let q = matrix.transform_point3(Vec3::new(p[0], p[1], p[2]));
            p.copy_from_slice(&q.to_array());
        }
        if let Some(normals) = out.normals.as_mut() {
            let normal_matrix = Mat3::from_mat4(*matrix).inverse().transpose();
            for n in normals.chunks_exact_mut(3) {
                let m = (normal_matrix * Vec3::new(n[0], n[1], n[2])).normalize_or_zero();
                n.copy_from_slice(&m.to_array());
            }
        }
        out
    }

    /// Expand into a triangle soup, one vertex per triangle corner.
    ///
    /// Attributes are expanded alongside positions.
    pub fn to_non_indexed(&self) -> Self {
        let Some(indices) = &self.indices else {
            return self.clone();
        };

        let expand = |src: &[f32]| -> Vec<f32> {
            indices
                .iter()
                .flat_map(|&i| {
                    let base = i as usize * 3;
                    [src[base], src[base + 1], src[base + 2]]
                })
                .collect()
        };

        Self {
            positions: expand(&self.positions),
            indices: None,
            normals: self.normals.as_deref().map(expand),
            colors: self.colors.as_deref().map(expand),
        }
    }

    /// Recompute per-vertex normals in place.
    pub fn compute_vertex_normals(&mut self) {
        let normals = normals::compute_vertex_normals(self);
        self.normals = Some(normals.iter().flat_map(|n| n.to_array()).collect());
    }

    /// Copy with recomputed per-vertex normals
    pub fn with_computed_normals(&self) -> Self {
        let mut out = self.clone();
        out.compute_vertex_normals();
        out
    }
}

fn check_attribute(name: &'static str, expected: usize, actual: usize) -> Result<(), GeometryError> {
    if expected != actual {
        return Err(GeometryError::AttributeLengthMismatch {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}
