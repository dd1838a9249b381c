//! Shared configuration for Cordwain
//!
//! This crate provides the single source of truth for the user-facing
//! defaults of the geometry engine: lattice subdivision counts and the seam
//! slider ranges. The numeric heuristics of the seam-repair pipeline itself
//! live next to the pipeline in `seam::SeamRepairConfig`.

use serde::{Deserialize, Serialize};

/// Default lattice subdivision count per axis
pub const DEFAULT_SUBDIVISIONS: u32 = 3;

/// Smallest subdivision count the editing UI offers
pub const MIN_UI_SUBDIVISIONS: u32 = 2;

/// Largest subdivision count the editing UI offers
pub const MAX_UI_SUBDIVISIONS: u32 = 6;

/// Default seam fillet radius in world units
pub const DEFAULT_SEAM_RADIUS: f32 = 0.05;

/// Default seam smoothing strength (0.0 to 1.0)
pub const DEFAULT_SEAM_STRENGTH: f32 = 0.5;

/// Lattice configuration for a mesh-editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Subdivisions along x, y and z (`l`, `m`, `n`)
    pub subdivisions: [u32; 3],
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            subdivisions: [DEFAULT_SUBDIVISIONS; 3],
        }
    }
}

impl LatticeConfig {
    /// Create a lattice config with the given per-axis subdivisions
    pub fn new(l: u32, m: u32, n: u32) -> Self {
        Self {
            subdivisions: [l, m, n],
        }
    }

    /// Same config with every axis clamped to the range the UI exposes.
    ///
    /// The lattice itself accepts any count of at least 1; only the editing
    /// surface restricts it.
    pub fn clamped_for_ui(&self) -> Self {
        Self {
            subdivisions: self
                .subdivisions
                .map(|s| s.clamp(MIN_UI_SUBDIVISIONS, MAX_UI_SUBDIVISIONS)),
        }
    }

    /// Number of control points the lattice will hold
    pub fn control_point_count(&self) -> usize {
        self.subdivisions
            .iter()
            .map(|&s| s as usize + 1)
            .product()
    }
}

/// Slider defaults and ranges for the seam smoothing action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeamSliderConfig {
    /// Fillet radius in world units
    pub radius: f32,
    /// Smoothing strength
    pub strength: f32,
    /// Smallest radius the slider offers
    pub min_radius: f32,
    /// Largest radius the slider offers
    pub max_radius: f32,
}

impl Default for SeamSliderConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SEAM_RADIUS,
            strength: DEFAULT_SEAM_STRENGTH,
            min_radius: 0.005,
            max_radius: 0.5,
        }
    }
}

impl SeamSliderConfig {
    /// Radius clamped to the slider range
    pub fn clamped_radius(&self) -> f32 {
        self.radius.clamp(self.min_radius, self.max_radius)
    }

    /// Strength clamped to 0.0..=1.0
    pub fn clamped_strength(&self) -> f32 {
        self.strength.clamp(0.0, 1.0)
    }
}
