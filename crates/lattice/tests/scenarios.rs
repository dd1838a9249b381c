//! End-to-end lattice scenarios.

use geometry::{MeshBuffer, cuboid};
use glam::{Mat4, Quat, Vec3};
use lattice::ControlLattice;

/// Box spanning [-1, 1]^3 whose top face is a fan around a center vertex.
///
/// Corner vertices sit on lattice corners, where every interior control
/// point has zero Bernstein weight; the center vertex gives the top face a
/// sample the top-center control point actually influences.
fn cube_with_top_center() -> MeshBuffer {
    let mut positions = cuboid(Vec3::splat(-1.0), Vec3::splat(1.0)).position_vec();
    positions.push(Vec3::new(0.0, 1.0, 0.0));
    let triangles = [
        [0, 2, 3], [0, 3, 1], // -Z
        [4, 5, 7], [4, 7, 6], // +Z
        [0, 1, 5], [0, 5, 4], // -Y
        [2, 6, 8], [6, 7, 8], [7, 3, 8], [3, 2, 8], // +Y fan
        [0, 4, 6], [0, 6, 2], // -X
        [1, 3, 7], [1, 7, 5], // +X
    ];
    MeshBuffer::from_triangles(&positions, &triangles).unwrap()
}

#[test]
fn test_top_center_control_point_raises_top_face() {
    let mesh = cube_with_top_center();
    let mut lattice = ControlLattice::new(&mesh, 2, 2, 2).unwrap();

    let top_center = lattice.control_point(1, 2, 1).unwrap();
    assert_eq!(top_center, Vec3::new(0.0, 1.0, 0.0));
    assert!(lattice.move_control_point(1, 2, 1, top_center + Vec3::new(0.0, 0.5, 0.0)));

    let deformed = lattice.deform();
    for v in 0..deformed.vertex_count() {
        let before = mesh.position(v);
        let after = deformed.position(v);
        if before.y == -1.0 {
            assert_eq!(after.y, -1.0, "bottom vertex {v} moved");
        } else {
            assert!(after.y >= before.y, "top vertex {v} lowered");
        }
    }

    // B(2,1,0.5) * B(2,2,1) * B(2,1,0.5) = 0.25 of the 0.5 lift
    let center = deformed.position(8);
    assert!((center.y - 1.125).abs() < 1e-5);
    assert!(center.x.abs() < 1e-5 && center.z.abs() < 1e-5);
}

#[test]
fn test_transform_round_trip_restores_positions() {
    let mesh = cube_with_top_center();
    let mut lattice = ControlLattice::new(&mesh, 3, 2, 4).unwrap();
    let transform = Mat4::from_scale_rotation_translation(
        Vec3::new(1.5, 0.5, 2.0),
        Quat::from_rotation_z(1.1),
        Vec3::new(-3.0, 4.0, 0.25),
    );

    lattice.update_transform(transform);
    lattice.update_transform(transform.inverse() * transform);
    let restored = lattice.mesh();
    for v in 0..mesh.vertex_count() {
        assert!(restored.position(v).abs_diff_eq(mesh.position(v), 1e-4));
    }
}

#[test]
fn test_sculpt_then_reset_is_exact() {
    let mesh = cube_with_top_center();
    let mut lattice = ControlLattice::new(&mesh, 2, 2, 2).unwrap();
    let pristine = lattice.mesh().positions().to_vec();

    for (i, j, k) in [(0, 0, 0), (1, 2, 1), (2, 1, 0), (1, 1, 1)] {
        let p = lattice.control_point(i, j, k).unwrap();
        lattice.move_control_point(i, j, k, p + Vec3::new(0.2, -0.3, 0.4));
    }
    assert_ne!(lattice.mesh().positions(), pristine.as_slice());

    lattice.reset();
    assert_eq!(lattice.mesh().positions(), pristine.as_slice());
}

#[test]
fn test_rigid_move_keeps_local_shape() {
    let mesh = cube_with_top_center();
    let mut lattice = ControlLattice::new(&mesh, 2, 2, 2).unwrap();
    lattice.move_control_point(1, 2, 1, Vec3::new(0.0, 1.5, 0.0));
    let sculpted = lattice.mesh().clone();

    // Moving the owning object moves the lattice with it; the local-frame
    // mesh keeps the sculpted shape.
    lattice.update_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
    for v in 0..mesh.vertex_count() {
        assert!(lattice.mesh().position(v).abs_diff_eq(sculpted.position(v), 1e-4));
    }
}
