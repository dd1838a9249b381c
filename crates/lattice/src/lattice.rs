//! The control lattice and its deformation.
//!
//! ## Point sets
//!
//! The lattice keeps three parallel arrays of `(l+1)(m+1)(n+1)` points:
//! - **local**: the deformation basis in the mesh's own frame
//! - **working**: local points mapped through the current transform; the
//!   mesh deforms toward these
//! - **initial**: an immutable snapshot of the local points, used by `reset`
//!
//! A sculpt edit writes the working point directly and stores the
//! inverse-transformed position as the local point, so a later
//! `update_transform` rebuilds the working points with the sculpt intact.
//!
//! ## Deformation
//!
//! Each vertex's parametric coordinates `(s, t, u)` in the bounding box are
//! computed once from its undeformed position. The deformed position is the
//! Bernstein-weighted blend of the working points, mapped back into the
//! mesh's local frame by the inverse of the current transform.

use cordwain_config::LatticeConfig;
use geometry::{Aabb, MeshBuffer};
use glam::{Mat4, Vec3};
use tracing::{debug, error, warn};

use crate::bernstein::bernstein_weights_into;
use crate::error::LatticeError;
use crate::types::{LatticeEvent, SubscriptionId};

/// Parametric coordinates within this distance of 0 or 1 snap to the bound.
const PARAMETRIC_SNAP_EPSILON: f32 = 1e-6;

/// Determinant magnitude below which a transform is treated as singular.
const SINGULAR_DETERMINANT: f32 = 1e-12;

type Listener = Box<dyn FnMut(&LatticeEvent) + Send>;

/// Free-form deformation lattice over one mesh.
///
/// Created once per editing session; rebuild it when the subdivision counts
/// change.
pub struct ControlLattice {
    /// Subdivisions along x, y and z (`l`, `m`, `n`)
    subdivisions: [usize; 3],
    /// Bounding box of the undeformed mesh
    bounds: Aabb,
    /// The undeformed mesh, attributes included
    original: MeshBuffer,
    /// Cached `(s, t, u)` per vertex of `original`
    parametric: Vec<Vec3>,
    local_points: Vec<Vec3>,
    working_points: Vec<Vec3>,
    initial_points: Vec<Vec3>,
    transform: Mat4,
    /// Latest deformed mesh
    mesh: MeshBuffer,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ControlLattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLattice")
            .field("subdivisions", &self.subdivisions)
            .field("bounds", &self.bounds)
            .field("vertex_count", &self.original.vertex_count())
            .field("transform", &self.transform)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl ControlLattice {
    /// Build an evenly spaced lattice over the mesh's bounding box.
    ///
    /// Fails with [`LatticeError::InvalidGeometry`] if the mesh has no
    /// positions, and with [`LatticeError::InvalidSubdivisions`] if any
    /// count is zero.
    pub fn new(mesh: &MeshBuffer, l: usize, m: usize, n: usize) -> Result<Self, LatticeError> {
        mesh.require_positions()?;
        mesh.validate()?;
        if l == 0 || m == 0 || n == 0 {
            return Err(LatticeError::InvalidSubdivisions { l, m, n });
        }

        let bounds = mesh.bounding_box().ok_or(geometry::GeometryError::NoPositions)?;
        let size = bounds.size();
        let degenerate = degenerate_axes(size);
        if degenerate.iter().any(|&d| d) {
            warn!(
                "ControlLattice: degenerate bounding box size {:?}, flat axes {:?} use parametric 0",
                size, degenerate
            );
        }

        let mut local_points = Vec::with_capacity((l + 1) * (m + 1) * (n + 1));
        for i in 0..=l {
            for j in 0..=m {
                for k in 0..=n {
                    let fraction = Vec3::new(
                        i as f32 / l as f32,
                        j as f32 / m as f32,
                        k as f32 / n as f32,
                    );
                    local_points.push(bounds.min + size * fraction);
                }
            }
        }

        let parametric = mesh
            .vertices()
            .iter()
            .map(|&p| parametric_coordinates(Vec3::from_array(p), &bounds))
            .collect();

        debug!(
            "ControlLattice: {}x{}x{} lattice ({} points) over {} vertices",
            l,
            m,
            n,
            local_points.len(),
            mesh.vertex_count()
        );

        Ok(Self {
            subdivisions: [l, m, n],
            bounds,
            original: mesh.clone(),
            parametric,
            working_points: local_points.clone(),
            initial_points: local_points.clone(),
            local_points,
            transform: Mat4::IDENTITY,
            mesh: mesh.with_computed_normals(),
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Build a lattice using the subdivisions of a [`LatticeConfig`].
    pub fn from_config(mesh: &MeshBuffer, config: &LatticeConfig) -> Result<Self, LatticeError> {
        let [l, m, n] = config.subdivisions;
        Self::new(mesh, l as usize, m as usize, n as usize)
    }

    // ========================================================================
    // Deformation
    // ========================================================================

    /// Compute the deformed mesh from the current working points.
    ///
    /// Always starts from the undeformed positions, so repeated calls without
    /// a mutation in between return identical buffers. Normals are recomputed.
    pub fn deform(&self) -> MeshBuffer {
        if self.is_at_rest() {
            return self.original.with_computed_normals();
        }

        let [l, m, n] = self.subdivisions;
        let inverse = self.inverse_transform();

        let mut ws = Vec::with_capacity(l + 1);
        let mut wt = Vec::with_capacity(m + 1);
        let mut wu = Vec::with_capacity(n + 1);

        let positions: Vec<Vec3> = self
            .parametric
            .iter()
            .map(|stu| {
                bernstein_weights_into(l, stu.x, &mut ws);
                bernstein_weights_into(m, stu.y, &mut wt);
                bernstein_weights_into(n, stu.z, &mut wu);

                let mut blended = Vec3::ZERO;
                let mut total_weight = 0.0f32;
                for (i, &bi) in ws.iter().enumerate() {
                    for (j, &bj) in wt.iter().enumerate() {
                        let bij = bi * bj;
                        if bij == 0.0 {
                            continue;
                        }
                        for (k, &bk) in wu.iter().enumerate() {
                            let weight = bij * bk;
                            blended += self.working_points[self.point_index(i, j, k)] * weight;
                            total_weight += weight;
                        }
                    }
                }

                if total_weight != 0.0 {
                    blended /= total_weight;
                }

                match inverse {
                    Some(inv) => inv.transform_point3(blended),
                    None => blended,
                }
            })
            .collect();

        let mut out = self.original.clone();
        out.set_positions(&positions);
        out.compute_vertex_normals();
        out
    }

    /// Replace the lattice transform and rebuild the working points from the
    /// local points, keeping every sculpt edit.
    pub fn update_transform(&mut self, matrix: Mat4) {
        self.transform = matrix;
        self.working_points = self
            .local_points
            .iter()
            .map(|&p| matrix.transform_point3(p))
            .collect();
        self.refresh(LatticeEvent::TransformUpdated);
    }

    /// Sculpt one control point to a world-space position.
    ///
    /// Out-of-range indices and non-finite positions are ignored and return
    /// `false`; this never fails mid-gesture.
    pub fn move_control_point(&mut self, i: usize, j: usize, k: usize, world_position: Vec3) -> bool {
        let [l, m, n] = self.subdivisions;
        if i > l || j > m || k > n {
            debug!(
                "move_control_point: ({}, {}, {}) outside {}x{}x{} lattice, ignoring",
                i, j, k, l, m, n
            );
            return false;
        }
        if !world_position.is_finite() {
            error!(
                "move_control_point: non-finite position {:?} for ({}, {}, {})",
                world_position, i, j, k
            );
            return false;
        }

        let index = self.point_index(i, j, k);
        self.working_points[index] = world_position;
        self.local_points[index] = if self.transform == Mat4::IDENTITY {
            world_position
        } else {
            match self.inverse_transform() {
                Some(inv) => inv.transform_point3(world_position),
                None => world_position,
            }
        };

        self.refresh(LatticeEvent::ControlPointMoved { i, j, k });
        true
    }

    /// Restore the initial lattice and identity transform, returning the mesh
    /// to its undeformed shape.
    pub fn reset(&mut self) {
        self.local_points = self.initial_points.clone();
        self.working_points = self.initial_points.clone();
        self.transform = Mat4::IDENTITY;
        self.refresh(LatticeEvent::Reset);
    }

    fn refresh(&mut self, event: LatticeEvent) {
        self.mesh = self.deform();
        self.notify(&event);
    }

    /// Whether the lattice still matches its initial snapshot untransformed.
    fn is_at_rest(&self) -> bool {
        self.transform == Mat4::IDENTITY && self.working_points == self.initial_points
    }

    /// Inverse of the current transform; `None` for identity or singular.
    fn inverse_transform(&self) -> Option<Mat4> {
        if self.transform == Mat4::IDENTITY {
            return None;
        }
        if self.transform.determinant().abs() < SINGULAR_DETERMINANT {
            warn!(
                "ControlLattice: singular transform {:?}, skipping inverse",
                self.transform
            );
            return None;
        }
        Some(self.transform.inverse())
    }

    // ========================================================================
    // Subscribers
    // ========================================================================

    /// Register a callback invoked after every mutating operation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&LatticeEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: &LatticeEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Latest deformed mesh
    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }

    /// The undeformed mesh the lattice was built over
    pub fn original_mesh(&self) -> &MeshBuffer {
        &self.original
    }

    /// Subdivisions `[l, m, n]`
    pub fn subdivisions(&self) -> [usize; 3] {
        self.subdivisions
    }

    /// Bounding box of the undeformed mesh
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Current lattice transform
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Per-axis flags for zero-thickness bounding box axes
    pub fn degenerate_axes(&self) -> [bool; 3] {
        degenerate_axes(self.bounds.size())
    }

    /// Working control points in world space
    pub fn working_points(&self) -> &[Vec3] {
        &self.working_points
    }

    /// Local control points in the mesh frame
    pub fn local_points(&self) -> &[Vec3] {
        &self.local_points
    }

    /// Working position of control point `(i, j, k)`
    pub fn control_point(&self, i: usize, j: usize, k: usize) -> Option<Vec3> {
        let [l, m, n] = self.subdivisions;
        if i > l || j > m || k > n {
            return None;
        }
        Some(self.working_points[self.point_index(i, j, k)])
    }

    /// Flat index of control point `(i, j, k)`
    pub fn point_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [_, m, n] = self.subdivisions;
        (i * (m + 1) + j) * (n + 1) + k
    }

    /// Segments joining axis-adjacent working points, for drawing the cage.
    pub fn lattice_edges(&self) -> Vec<(Vec3, Vec3)> {
        let [l, m, n] = self.subdivisions;
        let mut edges = Vec::with_capacity(
            l * (m + 1) * (n + 1) + (l + 1) * m * (n + 1) + (l + 1) * (m + 1) * n,
        );
        for i in 0..=l {
            for j in 0..=m {
                for k in 0..=n {
                    let p = self.working_points[self.point_index(i, j, k)];
                    if i < l {
                        edges.push((p, self.working_points[self.point_index(i + 1, j, k)]));
                    }
                    if j < m {
                        edges.push((p, self.working_points[self.point_index(i, j + 1, k)]));
                    }
                    if k < n {
                        edges.push((p, self.working_points[self.point_index(i, j, k + 1)]));
                    }
                }
            }
        }
        edges
    }
}

fn degenerate_axes(size: Vec3) -> [bool; 3] {
    size.to_array().map(|s| s.abs() <= f32::EPSILON)
}

/// Normalized `(s, t, u)` of `p` inside `bounds`.
///
/// Zero-size axes and non-finite results map to 0; values within
/// [`PARAMETRIC_SNAP_EPSILON`] of a bound snap to it.
pub fn parametric_coordinates(p: Vec3, bounds: &Aabb) -> Vec3 {
    let size = bounds.size();
    let axis = |value: f32, min: f32, extent: f32| -> f32 {
        if extent.abs() <= f32::EPSILON {
            return 0.0;
        }
        let t = (value - min) / extent;
        if !t.is_finite() {
            return 0.0;
        }
        if t.abs() < PARAMETRIC_SNAP_EPSILON {
            0.0
        } else if (t - 1.0).abs() < PARAMETRIC_SNAP_EPSILON {
            1.0
        } else {
            t.clamp(0.0, 1.0)
        }
    };
    Vec3::new(
        axis(p.x, bounds.min.x, size.x),
        axis(p.y, bounds.min.y, size.y),
        axis(p.z, bounds.min.z, size.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::cuboid;
    use std::sync::{Arc, Mutex};

    const EPS: f32 = 1e-5;

    fn unit_cube() -> MeshBuffer {
        cuboid(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    fn assert_positions_close(a: &MeshBuffer, b: &MeshBuffer, eps: f32) {
        assert_eq!(a.vertex_count(), b.vertex_count());
        for v in 0..a.vertex_count() {
            assert!(
                a.position(v).abs_diff_eq(b.position(v), eps),
                "vertex {v}: {:?} vs {:?}",
                a.position(v),
                b.position(v)
            );
        }
    }

    #[test]
    fn test_new_rejects_empty_mesh() {
        let result = ControlLattice::new(&MeshBuffer::default(), 2, 2, 2);
        assert!(matches!(result, Err(LatticeError::InvalidGeometry(_))));
    }

    #[test]
    fn test_new_rejects_zero_subdivisions() {
        let result = ControlLattice::new(&unit_cube(), 2, 0, 2);
        assert!(matches!(
            result,
            Err(LatticeError::InvalidSubdivisions { l: 2, m: 0, n: 2 })
        ));
    }

    #[test]
    fn test_grid_spans_bounds() {
        let lattice = ControlLattice::new(&unit_cube(), 2, 3, 4).unwrap();
        assert_eq!(lattice.working_points().len(), 3 * 4 * 5);
        assert_eq!(lattice.control_point(0, 0, 0), Some(Vec3::splat(-1.0)));
        assert_eq!(lattice.control_point(2, 3, 4), Some(Vec3::splat(1.0)));
        assert_eq!(lattice.control_point(1, 0, 0), Some(Vec3::new(0.0, -1.0, -1.0)));
        assert_eq!(lattice.control_point(3, 0, 0), None);
    }

    #[test]
    fn test_identity_deform() {
        let mesh = unit_cube();
        let lattice = ControlLattice::new(&mesh, 3, 3, 3).unwrap();
        assert_positions_close(&lattice.deform(), &mesh, EPS);
    }

    #[test]
    fn test_transformed_lattice_deform_matches_blend() {
        // Exercise the blend path (not the at-rest shortcut) with a pure
        // translation: the mesh stays in place in its local frame.
        let mesh = unit_cube();
        let mut lattice = ControlLattice::new(&mesh, 2, 2, 2).unwrap();
        lattice.update_transform(Mat4::from_translation(Vec3::new(3.0, 0.0, -2.0)));
        assert_positions_close(lattice.mesh(), &mesh, EPS);
    }

    #[test]
    fn test_deform_is_idempotent() {
        let mut lattice = ControlLattice::new(&unit_cube(), 2, 2, 2).unwrap();
        lattice.move_control_point(1, 1, 1, Vec3::new(0.3, 0.2, 0.1));
        let first = lattice.deform();
        let second = lattice.deform();
        assert_eq!(first, second);
    }

    #[test]
    fn test_move_out_of_range_is_noop() {
        let mut lattice = ControlLattice::new(&unit_cube(), 2, 2, 2).unwrap();
        let before = lattice.mesh().clone();
        assert!(!lattice.move_control_point(5, 0, 0, Vec3::ONE));
        assert!(!lattice.move_control_point(0, 0, 0, Vec3::new(f32::NAN, 0.0, 0.0)));
        assert_eq!(lattice.mesh(), &before);
    }

    #[test]
    fn test_corner_control_point_moves_corner_vertex() {
        let mut lattice = ControlLattice::new(&unit_cube(), 2, 2, 2).unwrap();
        assert!(lattice.move_control_point(2, 2, 2, Vec3::splat(1.5)));
        // Vertex 7 is the (+1, +1, +1) corner
        assert!(lattice.mesh().position(7).abs_diff_eq(Vec3::splat(1.5), EPS));
        assert!(lattice.mesh().position(0).abs_diff_eq(Vec3::splat(-1.0), EPS));
    }

    #[test]
    fn test_sculpt_survives_transform() {
        let mesh = unit_cube();
        let mut lattice = ControlLattice::new(&mesh, 2, 2, 2).unwrap();
        let transform = Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::new(1.0, 2.0, 0.0));
        lattice.update_transform(transform);

        let target = transform.transform_point3(Vec3::splat(1.5));
        lattice.move_control_point(2, 2, 2, target);
        let sculpted = lattice.mesh().clone();
        assert!(sculpted.position(7).abs_diff_eq(Vec3::splat(1.5), 1e-4));

        // Re-applying the same transform rebuilds working points from the
        // sculpted local points and reproduces the shape.
        lattice.update_transform(transform);
        assert_positions_close(lattice.mesh(), &sculpted, 1e-4);

        // The local point holds the sculpt in the mesh frame.
        let index = lattice.point_index(2, 2, 2);
        assert!(lattice.local_points()[index].abs_diff_eq(Vec3::splat(1.5), 1e-4));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mesh = unit_cube();
        let mut lattice = ControlLattice::new(&mesh, 2, 2, 2).unwrap();
        let before = lattice.mesh().clone();

        lattice.update_transform(Mat4::from_scale(Vec3::splat(2.0)));
        lattice.move_control_point(0, 0, 0, Vec3::splat(-4.0));
        lattice.move_control_point(2, 1, 2, Vec3::new(3.0, 0.0, 3.0));
        lattice.reset();

        assert_eq!(lattice.transform(), Mat4::IDENTITY);
        assert_eq!(lattice.working_points(), lattice.local_points());
        assert_eq!(lattice.mesh().positions(), before.positions());
    }

    #[test]
    fn test_degenerate_axis_maps_to_zero() {
        let plane = MeshBuffer::from_triangles(
            &[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0), Vec3::Z],
            &[[0, 2, 1], [0, 3, 2]],
        )
        .unwrap();
        let mut lattice = ControlLattice::new(&plane, 2, 2, 2).unwrap();
        assert_eq!(lattice.degenerate_axes(), [false, true, false]);

        let stu = parametric_coordinates(Vec3::new(0.5, 0.0, 0.5), &lattice.bounds());
        assert_eq!(stu.y, 0.0);

        // Interior control points carry no weight at the plane's corners.
        lattice.move_control_point(1, 0, 1, Vec3::new(0.5, 1.0, 0.5));
        let raised = lattice
            .mesh()
            .vertices()
            .iter()
            .map(|p| p[1])
            .fold(0.0f32, f32::max);
        assert_eq!(raised, 0.0);
        lattice.move_control_point(2, 0, 2, Vec3::new(1.0, 1.0, 1.0));
        assert!(lattice.mesh().position(2).abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), EPS));
    }

    #[test]
    fn test_parametric_snaps_near_bounds() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let stu = parametric_coordinates(Vec3::new(1e-8, 1.0 - 1e-8, 0.5), &bounds);
        assert_eq!(stu.x, 0.0);
        assert_eq!(stu.y, 1.0);
        assert!((stu.z - 0.5).abs() < EPS);
    }

    #[test]
    fn test_subscribers_notified_and_unsubscribed() {
        let mut lattice = ControlLattice::new(&unit_cube(), 2, 2, 2).unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = lattice.subscribe(move |event| sink.lock().unwrap().push(*event));

        lattice.update_transform(Mat4::IDENTITY);
        lattice.move_control_point(1, 2, 1, Vec3::new(0.0, 1.5, 0.0));
        lattice.reset();
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                LatticeEvent::TransformUpdated,
                LatticeEvent::ControlPointMoved { i: 1, j: 2, k: 1 },
                LatticeEvent::Reset,
            ]
        );

        assert!(lattice.unsubscribe(id));
        assert!(!lattice.unsubscribe(id));
        lattice.reset();
        assert_eq!(events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_lattice_edges_count() {
        let lattice = ControlLattice::new(&unit_cube(), 2, 2, 2).unwrap();
        // 3 axes * (2 segments * 3 * 3 lines)
        assert_eq!(lattice.lattice_edges().len(), 54);
    }
}
