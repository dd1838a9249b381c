//! Seam repair pipeline orchestration.
//!
//! The stages run in a fixed order over a call-local [`WorkMesh`]:
//! 1. Merge coincident vertices of the raw result
//! 2. Weld open boundaries and clean collapsed faces
//! 3. Detect sharp vertices and keep those on the tool surface
//! 4. Collect seam segments
//! 5. Bridge split when the radius is small relative to the mesh
//! 6. Fillet split around the seam
//! 7. Re-weld and clean
//! 8. Vertex adjacency
//! 9. Distance field from the seam
//! 10. Smoothstep fillet weights
//! 11. Weighted Laplacian smoothing
//! 12. Final face cleanup
//! 13. Boundary hole closing
//! 14. De-index and compute normals
//!
//! Every early exit returns the input mesh with normals.

use geometry::{MeshBuffer, merge_vertices};
use tracing::{debug, info, warn};

use crate::cleanup::{clean_faces, remove_degenerate_faces, remove_duplicate_faces};
use crate::detect::{collect_seam_segments, detect_sharp_vertices, filter_near_surface};
use crate::error::SeamError;
use crate::field::{distance_field, falloff_weights};
use crate::holes::close_boundary_holes;
use crate::mesh::WorkMesh;
use crate::smooth::{build_adjacency, laplacian_smooth};
use crate::split::{SplitParams, split_fillet_zone};
use crate::types::{
    Diagnostic, PipelineStage, SeamOptions, SeamOutcome, SeamRepairConfig, SeamReport,
};
use crate::weld::{WeldOutcome, weld_and_clean};

/// Repair the seam of a boolean-subtraction result.
///
/// `result` is the raw boolean output; `tool` is the subtracted mesh in the
/// same space. Returns a non-indexed mesh with per-vertex normals.
pub fn smooth_seam(
    result: &MeshBuffer,
    tool: &MeshBuffer,
    options: &SeamOptions,
) -> Result<MeshBuffer, SeamError> {
    smooth_seam_with_report(result, tool, options, &SeamRepairConfig::default())
        .map(|outcome| outcome.mesh)
}

/// [`smooth_seam`] with explicit heuristics, returning the run report too.
pub fn smooth_seam_with_report(
    result: &MeshBuffer,
    tool: &MeshBuffer,
    options: &SeamOptions,
    config: &SeamRepairConfig,
) -> Result<SeamOutcome, SeamError> {
    result.require_positions()?;
    result.validate()?;

    let mut report = SeamReport::default();
    let passthrough = |report: SeamReport| SeamOutcome {
        mesh: result.with_computed_normals(),
        report,
    };

    if !(options.strength > 0.0) || !(options.radius > 0.0) {
        debug!(
            "smooth_seam: nothing to do (strength {}, radius {})",
            options.strength, options.radius
        );
        return Ok(passthrough(report));
    }

    // 1. Merge
    let extent = result.bounding_box().map(|b| b.diagonal()).unwrap_or(0.0);
    let merged = merge_vertices(result, config.merge_tolerance(extent));
    report.vertices_merged = result.vertex_count() - merged.vertex_count();
    let mut mesh = WorkMesh::from_buffer(&merged);

    // 2. Boundary weld
    let weld_tolerance = config.weld_tolerance(extent);
    let reweld = |mesh: &mut WorkMesh| {
        weld_and_clean(mesh, weld_tolerance, config.max_weld_passes, config.zero_area_epsilon)
    };
    let weld = reweld(&mut mesh);
    record_weld(&mut report, &weld, PipelineStage::BoundaryWeld);
    if mesh.face_count() == 0 {
        warn!("smooth_seam: no faces left after merging");
        report.diagnostics.push(Diagnostic::NothingToRepair);
        return Ok(passthrough(report));
    }

    // 3. Detection
    let sharp = detect_sharp_vertices(&mesh, config.sharp_angle_degrees);
    report.sharp_vertices = sharp.iter().filter(|&&s| s).count();
    if report.sharp_vertices == 0 {
        info!("smooth_seam: no sharp edges, returning input");
        report.diagnostics.push(Diagnostic::NoSeamDetected);
        return Ok(passthrough(report));
    }

    let tool_triangles = tool.triangle_positions();
    let near = filter_near_surface(
        &mesh.positions,
        &sharp,
        &tool_triangles,
        config.surface_tolerance,
    );
    if near.iter().any(|&n| n) {
        mesh.seam = near;
    } else {
        warn!(
            "smooth_seam: no sharp vertex on the tool surface, using all {}",
            report.sharp_vertices
        );
        report.diagnostics.push(Diagnostic::SurfaceFilterFallback {
            sharp_vertices: report.sharp_vertices,
        });
        mesh.seam = sharp;
    }
    report.seam_vertices = mesh.seam_count();

    // 4. Segments
    let found = collect_seam_segments(&mesh);
    if found.point_fallback {
        report.diagnostics.push(Diagnostic::PointSegmentsFallback {
            seam_vertices: report.seam_vertices,
        });
    }
    let segments = found.segments;
    report.seam_segments = segments.len();

    // 5. Bridge split
    let bridge_radius = config.narrow_zone_ratio * extent;
    if options.radius < bridge_radius {
        let params = SplitParams {
            zone_radius: bridge_radius * config.split_zone_factor,
            target_length: config.target_edge_length(bridge_radius),
            max_passes: 1,
            vertex_cap: mesh.vertex_count() * config.split_vertex_cap_factor,
        };
        let split = split_fillet_zone(&mut mesh, &segments, &params);
        report.bridge_split = true;
        report.midpoints_created += split.midpoints;
        if split.vertex_cap_reached {
            report.diagnostics.push(Diagnostic::IterationCapReached {
                stage: PipelineStage::BridgeSplit,
            });
        }
        let weld = reweld(&mut mesh);
        record_weld(&mut report, &weld, PipelineStage::BridgeSplit);
    }

    // 6. Fillet split
    let target = config.target_edge_length(options.radius);
    let params = SplitParams {
        zone_radius: options.radius * config.split_zone_factor,
        target_length: target,
        max_passes: config.max_split_passes,
        vertex_cap: mesh.vertex_count() * config.split_vertex_cap_factor,
    };
    let split = split_fillet_zone(&mut mesh, &segments, &params);
    report.midpoints_created += split.midpoints;
    if split.vertex_cap_reached || split.pass_cap_reached {
        report.diagnostics.push(Diagnostic::IterationCapReached {
            stage: PipelineStage::FilletSplit,
        });
    }

    // 7. Re-weld
    let weld = reweld(&mut mesh);
    record_weld(&mut report, &weld, PipelineStage::ReWeld);

    // 8-11. Smoothing
    let adjacency = build_adjacency(mesh.vertex_count(), &mesh.faces);
    let zone = options.radius * config.distance_zone_factor;
    let distances = distance_field(&mesh.positions, &segments, zone);
    let weights = falloff_weights(&distances, options.radius);
    report.iterations = config.iteration_count(options);
    report.weighted_vertices = laplacian_smooth(
        &mut mesh.positions,
        &adjacency,
        &weights,
        config.lambda(options.strength),
        target * config.max_step_ratio,
        report.iterations,
    );

    // 12. Cleanup
    report.faces_removed += clean_faces(&mut mesh, config.zero_area_epsilon).total();

    // 13. Holes
    let close_distance = extent * config.hole_close_ratio;
    let holes = close_boundary_holes(&mut mesh, close_distance, config.max_hole_vertices);
    report.holes_filled = holes.holes_filled;
    report.faces_flipped = holes.faces_flipped;
    report.diagnostics.extend(
        holes
            .skipped
            .iter()
            .map(|&vertices| Diagnostic::HoleSkipped { vertices }),
    );
    report.faces_removed += remove_degenerate_faces(&mut mesh) + remove_duplicate_faces(&mut mesh);

    // 14. Output
    info!(
        "smooth_seam: {} seam vertices, {} smoothed over {} iterations, {} holes filled ({} triangles)",
        report.seam_vertices,
        report.weighted_vertices,
        report.iterations,
        report.holes_filled,
        mesh.face_count()
    );
    Ok(SeamOutcome {
        mesh: mesh.to_soup_buffer(),
        report,
    })
}

fn record_weld(report: &mut SeamReport, weld: &WeldOutcome, stage: PipelineStage) {
    report.boundary_welds += weld.welds;
    report.faces_removed += weld.faces_removed;
    if weld.cap_reached {
        report.diagnostics.push(Diagnostic::IterationCapReached { stage });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::cuboid;
    use glam::Vec3;

    #[test]
    fn test_zero_strength_returns_input() {
        let result = cuboid(Vec3::ZERO, Vec3::ONE);
        let tool = cuboid(Vec3::X, Vec3::new(2.0, 1.0, 1.0));
        let out = smooth_seam(&result, &tool, &SeamOptions::new(0.0, 0.1)).unwrap();
        assert_eq!(out.positions(), result.positions());
        assert_eq!(out.indices(), result.indices());
        assert!(out.normals().is_some());
    }

    #[test]
    fn test_zero_radius_returns_input() {
        let result = cuboid(Vec3::ZERO, Vec3::ONE);
        let out = smooth_seam(&result, &MeshBuffer::default(), &SeamOptions::new(0.5, 0.0)).unwrap();
        assert_eq!(out.positions(), result.positions());
    }

    #[test]
    fn test_nan_strength_returns_input() {
        let result = cuboid(Vec3::ZERO, Vec3::ONE);
        let tool = cuboid(Vec3::X, Vec3::new(2.0, 1.0, 1.0));
        let out = smooth_seam(&result, &tool, &SeamOptions::new(f32::NAN, 0.1)).unwrap();
        assert_eq!(out.positions(), result.positions());
        assert!(out.positions().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_result_is_an_error() {
        let tool = cuboid(Vec3::ZERO, Vec3::ONE);
        let err = smooth_seam(&MeshBuffer::default(), &tool, &SeamOptions::default());
        assert!(matches!(err, Err(SeamError::InvalidGeometry(_))));
    }

    #[test]
    fn test_fully_degenerate_result_has_nothing_to_repair() {
        let sliver = MeshBuffer::from_soup(&[Vec3::ZERO, Vec3::ZERO, Vec3::ZERO]).unwrap();
        let outcome = smooth_seam_with_report(
            &sliver,
            &MeshBuffer::default(),
            &SeamOptions::default(),
            &SeamRepairConfig::default(),
        )
        .unwrap();
        assert!(outcome.report.has(&Diagnostic::NothingToRepair));
        assert_eq!(outcome.mesh.positions(), sliver.positions());
    }

    #[test]
    fn test_surface_filter_fallback_without_tool_contact() {
        let result = cuboid(Vec3::ZERO, Vec3::ONE);
        let far_tool = cuboid(Vec3::splat(10.0), Vec3::splat(11.0));
        let outcome = smooth_seam_with_report(
            &result,
            &far_tool,
            &SeamOptions::new(0.5, 0.2),
            &SeamRepairConfig::default(),
        )
        .unwrap();
        assert!(outcome.report.has(&Diagnostic::SurfaceFilterFallback { sharp_vertices: 8 }));
        assert_eq!(outcome.report.seam_vertices, 8);
        assert!(!outcome.mesh.is_indexed());
    }
}
