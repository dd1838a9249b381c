//! Distance from the seam and the fillet weight derived from it.

use geometry::Aabb;
use glam::Vec3;

use crate::types::SeamSegment;

/// Bounding box of every segment endpoint
pub fn segment_bounds(segments: &[SeamSegment]) -> Option<Aabb> {
    Aabb::from_points(segments.iter().flat_map(|s| [s.p0, s.p1]))
}

/// Distance from `p` to the nearest segment, `+inf` when there are none
pub fn distance_to_segments(p: Vec3, segments: &[SeamSegment]) -> f32 {
    segments
        .iter()
        .map(|s| s.distance(p))
        .fold(f32::INFINITY, f32::min)
}

/// Distance from each position to the nearest seam segment.
///
/// Only positions inside the segment bounds expanded by `zone` are measured;
/// all others get `+inf`.
pub fn distance_field(positions: &[Vec3], segments: &[SeamSegment], zone: f32) -> Vec<f32> {
    let Some(bounds) = segment_bounds(segments) else {
        return vec![f32::INFINITY; positions.len()];
    };
    let bounds = bounds.expanded(zone);

    positions
        .iter()
        .map(|&p| {
            if bounds.contains_point(p) {
                distance_to_segments(p, segments)
            } else {
                f32::INFINITY
            }
        })
        .collect()
}

/// Smoothstep fillet weight: 1 on the seam, 0 at `radius` and beyond.
///
/// With `t = 1 - d/radius` the weight is `t²(3 - 2t)`.
pub fn fillet_weight(distance: f32, radius: f32) -> f32 {
    if !(distance < radius) || radius <= 0.0 {
        return 0.0;
    }
    let t = (1.0 - distance / radius).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Fillet weights for a whole distance field
pub fn falloff_weights(distances: &[f32], radius: f32) -> Vec<f32> {
    distances.iter().map(|&d| fillet_weight(d, radius)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fillet_weight_profile() {
        assert_eq!(fillet_weight(0.0, 0.1), 1.0);
        assert_eq!(fillet_weight(0.1, 0.1), 0.0);
        assert_eq!(fillet_weight(0.5, 0.1), 0.0);
        assert_eq!(fillet_weight(f32::INFINITY, 0.1), 0.0);
        assert!((fillet_weight(0.05, 0.1) - 0.5).abs() < 1e-6);
        // Monotonically decreasing
        let mut last = 1.0;
        for i in 1..=10 {
            let w = fillet_weight(i as f32 * 0.01, 0.1);
            assert!(w <= last);
            last = w;
        }
    }

    #[test]
    fn test_distance_field_outside_zone_is_infinite() {
        let segments = [SeamSegment::new(Vec3::ZERO, Vec3::X)];
        let positions = [
            Vec3::new(0.5, 0.1, 0.0),
            Vec3::new(0.5, 5.0, 0.0),
            Vec3::new(-0.1, 0.0, 0.0),
        ];
        let field = distance_field(&positions, &segments, 0.2);
        assert!((field[0] - 0.1).abs() < 1e-6);
        assert_eq!(field[1], f32::INFINITY);
        assert!((field[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_distance_field_without_segments() {
        let field = distance_field(&[Vec3::ZERO], &[], 1.0);
        assert_eq!(field, vec![f32::INFINITY]);
    }
}
