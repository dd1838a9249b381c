//! Boolean evaluation seam.
//!
//! Constructive solid geometry is supplied by the caller through
//! [`BooleanEvaluator`]; this crate only prepares the operands and repairs
//! the subtraction result.

use geometry::MeshBuffer;
use glam::Mat4;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SeamError;
use crate::pipeline::smooth_seam_with_report;
use crate::types::{SeamOptions, SeamOutcome, SeamRepairConfig};

/// Boolean operation between two solids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    Subtract,
    Union,
    Intersect,
}

/// External CSG engine.
///
/// Both operands are given in world space. The result may be indexed or a
/// triangle soup.
pub trait BooleanEvaluator {
    fn evaluate(&self, a: &MeshBuffer, b: &MeshBuffer, op: BooleanOp) -> Result<MeshBuffer, SeamError>;
}

/// Subtract `tool` from `minuend` and repair the seam of the result.
///
/// Both meshes are moved to world space with their transforms, reduced to
/// positions, then handed to the evaluator. The world-space tool is what the
/// seam filter measures against.
pub fn subtract_and_smooth(
    evaluator: &dyn BooleanEvaluator,
    minuend: &MeshBuffer,
    minuend_transform: &Mat4,
    tool: &MeshBuffer,
    tool_transform: &Mat4,
    options: &SeamOptions,
) -> Result<SeamOutcome, SeamError> {
    minuend.require_positions()?;
    tool.require_positions()?;

    let minuend_world = minuend.position_only().transformed(minuend_transform);
    let tool_world = tool.position_only().transformed(tool_transform);

    let raw = evaluator.evaluate(&minuend_world, &tool_world, BooleanOp::Subtract)?;
    info!(
        "subtract_and_smooth: boolean result has {} triangles",
        raw.triangle_count()
    );
    smooth_seam_with_report(&raw, &tool_world, options, &SeamRepairConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::cuboid;
    use glam::Vec3;
    use std::cell::RefCell;

    /// Returns a fixed mesh and records the operands it saw
    struct RecordingEvaluator {
        result: MeshBuffer,
        seen: RefCell<Vec<(MeshBuffer, MeshBuffer, BooleanOp)>>,
    }

    impl BooleanEvaluator for RecordingEvaluator {
        fn evaluate(&self, a: &MeshBuffer, b: &MeshBuffer, op: BooleanOp) -> Result<MeshBuffer, SeamError> {
            self.seen.borrow_mut().push((a.clone(), b.clone(), op));
            Ok(self.result.clone())
        }
    }

    struct FailingEvaluator;

    impl BooleanEvaluator for FailingEvaluator {
        fn evaluate(&self, _: &MeshBuffer, _: &MeshBuffer, _: BooleanOp) -> Result<MeshBuffer, SeamError> {
            Err(SeamError::Boolean("non-manifold operand".to_string()))
        }
    }

    #[test]
    fn test_operands_are_world_space() {
        let evaluator = RecordingEvaluator {
            result: cuboid(Vec3::ZERO, Vec3::ONE),
            seen: RefCell::new(Vec::new()),
        };
        let shell = cuboid(Vec3::ZERO, Vec3::ONE);
        let tool = cuboid(Vec3::ZERO, Vec3::ONE);
        let shift = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));

        subtract_and_smooth(
            &evaluator,
            &shell,
            &Mat4::IDENTITY,
            &tool,
            &shift,
            &SeamOptions::default(),
        )
        .unwrap();

        let seen = evaluator.seen.borrow();
        assert_eq!(seen.len(), 1);
        let (a, b, op) = &seen[0];
        assert_eq!(*op, BooleanOp::Subtract);
        assert!(a.normals().is_none());
        assert_eq!(a.position(0), Vec3::ZERO);
        assert_eq!(b.position(0), Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_evaluator_error_propagates() {
        let shell = cuboid(Vec3::ZERO, Vec3::ONE);
        let result = subtract_and_smooth(
            &FailingEvaluator,
            &shell,
            &Mat4::IDENTITY,
            &shell,
            &Mat4::IDENTITY,
            &SeamOptions::default(),
        );
        assert!(matches!(result, Err(SeamError::Boolean(_))));
    }

    #[test]
    fn test_empty_operand_is_rejected() {
        let shell = cuboid(Vec3::ZERO, Vec3::ONE);
        let result = subtract_and_smooth(
            &FailingEvaluator,
            &shell,
            &Mat4::IDENTITY,
            &MeshBuffer::default(),
            &Mat4::IDENTITY,
            &SeamOptions::default(),
        );
        assert!(matches!(result, Err(SeamError::InvalidGeometry(_))));
    }
}
