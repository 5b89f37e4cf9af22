//! Inter-frame force exchanges.

use kin_types::FrameId;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bidirectional force relation between two frames (e.g. a contact force).
///
/// An active exchange contributes six generalized coordinates to `q`: the
/// world-space point of application followed by the world-space force vector.
/// Constraint features treat both as decision variables, which is why they
/// live in `q` next to the joint coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceExchange {
    /// First frame of the pair (force `-f` acts on it).
    pub a: FrameId,
    /// Second frame of the pair (force `+f` acts on it).
    pub b: FrameId,
    /// World-space point of application.
    pub position: Point3<f64>,
    /// World-space force exerted by `a` on `b`.
    pub force: Vector3<f64>,
    pub(crate) q_index: usize,
}

impl ForceExchange {
    /// Coordinates contributed to `q`: 3 for the point of application plus 3
    /// for the force vector.
    pub const DOF: usize = 6;

    /// Create a zero-force exchange between two frames.
    #[must_use]
    pub fn new(a: FrameId, b: FrameId) -> Self {
        Self {
            a,
            b,
            position: Point3::origin(),
            force: Vector3::zeros(),
            q_index: 0,
        }
    }

    /// Start of this exchange's slice in `q` (valid while the owning scene's
    /// DOF index cache is fresh). Point of application occupies
    /// `q_index..q_index+3`, the force `q_index+3..q_index+6`.
    #[must_use]
    pub const fn q_index(&self) -> usize {
        self.q_index
    }

    /// Whether this exchange connects the given (unordered) pair.
    #[must_use]
    pub fn connects(&self, x: FrameId, y: FrameId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}
