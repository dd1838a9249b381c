//! Seam repair types: user options, pipeline heuristics and the run report.

use cordwain_config::{DEFAULT_SEAM_RADIUS, DEFAULT_SEAM_STRENGTH, SeamSliderConfig};
use geometry::{MeshBuffer, point_segment_distance};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// User-facing options for one seam repair run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeamOptions {
    /// Smoothing strength (0.0 to 1.0). Zero disables the pipeline.
    pub strength: f32,
    /// Fillet radius in world units
    pub radius: f32,
    /// Laplacian iteration count; derived from the radius when `None`
    pub iterations: Option<u32>,
}

impl Default for SeamOptions {
    fn default() -> Self {
        Self {
            strength: DEFAULT_SEAM_STRENGTH,
            radius: DEFAULT_SEAM_RADIUS,
            iterations: None,
        }
    }
}

impl SeamOptions {
    /// Options with the given strength and radius and derived iterations
    pub fn new(strength: f32, radius: f32) -> Self {
        Self {
            strength,
            radius,
            iterations: None,
        }
    }

    /// Options taken from the seam sliders, clamped to their ranges.
    pub fn from_sliders(sliders: &SeamSliderConfig) -> Self {
        Self::new(sliders.clamped_strength(), sliders.clamped_radius())
    }

    /// Same options with an explicit iteration count.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }
}

/// Numeric heuristics of the seam-repair pipeline.
///
/// Values are configurable and should not be treated as magic numbers.
/// Ratios are relative to the bounding-box diagonal of the raw input mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeamRepairConfig {
    /// Lower bound of the vertex-merge tolerance
    pub merge_tolerance_min: f32,
    /// Vertex-merge tolerance as a fraction of mesh extent
    pub merge_tolerance_ratio: f32,
    /// Lower bound of the boundary-weld tolerance
    pub weld_tolerance_min: f32,
    /// Boundary-weld tolerance as a fraction of mesh extent
    pub weld_tolerance_ratio: f32,
    /// Maximum weld/clean passes per weld stage
    pub max_weld_passes: usize,
    /// Faces whose cross-product length falls below this are removed
    pub zero_area_epsilon: f32,
    /// Dihedral angle (degrees) above which an interior edge is sharp
    pub sharp_angle_degrees: f32,
    /// Maximum distance from the tool surface for a seam vertex
    pub surface_tolerance: f32,
    /// Radius below this fraction of extent triggers the bridge split
    pub narrow_zone_ratio: f32,
    /// Split zone as a multiple of the fillet radius
    pub split_zone_factor: f32,
    /// Target edge length is `radius / target_edge_divisor`
    pub target_edge_divisor: f32,
    /// Lower bound of the target edge length
    pub min_target_edge: f32,
    /// Maximum passes of the fillet split
    pub max_split_passes: usize,
    /// Splitting stops once the vertex count reaches this multiple of the
    /// count before the split stage
    pub split_vertex_cap_factor: usize,
    /// Distance field is evaluated within this multiple of the radius
    pub distance_zone_factor: f32,
    /// Derived iteration count per unit of radius
    pub iterations_per_unit_radius: f32,
    /// Lower bound of the derived iteration count
    pub min_iterations: u32,
    /// Upper bound of the derived iteration count
    pub max_iterations: u32,
    /// Laplacian factor at zero strength
    pub base_lambda: f32,
    /// Laplacian factor added at full strength
    pub strength_lambda: f32,
    /// Per-iteration step clamp as a fraction of the target edge length
    pub max_step_ratio: f32,
    /// Spatial closure distance for boundary loops as a fraction of extent
    pub hole_close_ratio: f32,
    /// Boundary loops longer than this are left open
    pub max_hole_vertices: usize,
}

impl Default for SeamRepairConfig {
    fn default() -> Self {
        Self {
            merge_tolerance_min: 1e-4,
            merge_tolerance_ratio: 2e-4,
            weld_tolerance_min: 5e-4,
            weld_tolerance_ratio: 3e-3,
            max_weld_passes: 3,
            zero_area_epsilon: 1e-10,
            sharp_angle_degrees: 25.0,
            surface_tolerance: 0.015,
            narrow_zone_ratio: 0.15,
            split_zone_factor: 1.2,
            target_edge_divisor: 12.0,
            min_target_edge: 0.003,
            max_split_passes: 8,
            split_vertex_cap_factor: 5,
            distance_zone_factor: 1.3,
            iterations_per_unit_radius: 120.0,
            min_iterations: 20,
            max_iterations: 150,
            base_lambda: 0.4,
            strength_lambda: 0.4,
            max_step_ratio: 0.4,
            hole_close_ratio: 3e-3,
            max_hole_vertices: 200,
        }
    }
}

impl SeamRepairConfig {
    /// Vertex-merge tolerance for a mesh of the given extent
    pub fn merge_tolerance(&self, extent: f32) -> f32 {
        self.merge_tolerance_min.max(extent * self.merge_tolerance_ratio)
    }

    /// Boundary-weld tolerance for a mesh of the given extent
    pub fn weld_tolerance(&self, extent: f32) -> f32 {
        self.weld_tolerance_min.max(extent * self.weld_tolerance_ratio)
    }

    /// Target edge length inside a zone of the given radius
    pub fn target_edge_length(&self, radius: f32) -> f32 {
        (radius / self.target_edge_divisor).max(self.min_target_edge)
    }

    /// Iteration count for `options`.
    pub fn iteration_count(&self, options: &SeamOptions) -> u32 {
        options.iterations.unwrap_or_else(|| {
            let derived = (options.radius * self.iterations_per_unit_radius).floor() as u32;
            derived.clamp(self.min_iterations, self.max_iterations)
        })
    }

    /// Laplacian factor for a strength in 0.0..=1.0.
    ///
    /// Strength is clamped to the slider range first, so the factor never
    /// exceeds `base_lambda + strength_lambda`.
    pub fn lambda(&self, strength: f32) -> f32 {
        self.base_lambda + self.strength_lambda * strength.clamp(0.0, 1.0)
    }
}

/// A seam segment; `p0 == p1` marks a point segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeamSegment {
    pub p0: Vec3,
    pub p1: Vec3,
}

impl SeamSegment {
    pub fn new(p0: Vec3, p1: Vec3) -> Self {
        Self { p0, p1 }
    }

    /// Degenerate segment at a single seam vertex
    pub fn point(p: Vec3) -> Self {
        Self { p0: p, p1: p }
    }

    pub fn is_point(&self) -> bool {
        self.p0 == self.p1
    }

    /// Distance from `p` to the segment
    pub fn distance(&self, p: Vec3) -> f32 {
        point_segment_distance(p, self.p0, self.p1)
    }
}

/// Pipeline stages that can report a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    BoundaryWeld,
    BridgeSplit,
    FilletSplit,
    ReWeld,
}

/// Recoverable conditions met during a run.
///
/// None of these abort the pipeline; they explain an early exit or a
/// fallback taken along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// No faces survived merging and cleanup
    NothingToRepair,
    /// No sharp or open edge was found
    NoSeamDetected,
    /// No sharp vertex lies on the tool surface; all sharp vertices were used
    SurfaceFilterFallback { sharp_vertices: usize },
    /// No face edge joins two seam vertices; seam vertices became points
    PointSegmentsFallback { seam_vertices: usize },
    /// A split or weld loop stopped at its pass or vertex-count cap
    IterationCapReached { stage: PipelineStage },
    /// A boundary loop could not be closed and was left open
    HoleSkipped { vertices: usize },
}

/// Counters collected over one seam repair run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeamReport {
    /// Vertices removed by the initial merge
    pub vertices_merged: usize,
    /// Boundary vertex pairs joined across all weld stages
    pub boundary_welds: usize,
    /// Faces removed by every cleanup step
    pub faces_removed: usize,
    /// Vertices adjacent to a sharp or open edge
    pub sharp_vertices: usize,
    /// Vertices kept as seam after the surface filter
    pub seam_vertices: usize,
    /// Segments the distance field is measured against
    pub seam_segments: usize,
    /// Whether the bridge split ran
    pub bridge_split: bool,
    /// Midpoints inserted by both split stages
    pub midpoints_created: usize,
    /// Vertices with a non-zero fillet weight
    pub weighted_vertices: usize,
    /// Laplacian iterations run
    pub iterations: u32,
    /// Boundary loops filled
    pub holes_filled: usize,
    /// Filled faces flipped to match their neighbour
    pub faces_flipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl SeamReport {
    /// Whether the run recorded `diagnostic`
    pub fn has(&self, diagnostic: &Diagnostic) -> bool {
        self.diagnostics.contains(diagnostic)
    }
}

/// Repaired mesh together with the report of the run
#[derive(Debug, Clone)]
pub struct SeamOutcome {
    pub mesh: MeshBuffer,
    pub report: SeamReport,
}
