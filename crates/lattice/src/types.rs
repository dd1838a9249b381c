//! Event and handle types for lattice subscribers.

use serde::{Deserialize, Serialize};

/// Change emitted to subscribers after a mutating lattice operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatticeEvent {
    /// The lattice transform was replaced and the working points rebuilt
    TransformUpdated,
    /// A single control point was sculpted
    ControlPointMoved { i: usize, j: usize, k: usize },
    /// The lattice was restored to its initial snapshot
    Reset,
}

/// Token returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);
