//! Bridge error types.

use kin_model::JointKind;
use kin_types::{BodyKind, FrameId, KinError};
use thiserror::Error;

/// Errors surfaced while building or synchronizing with a physics engine.
///
/// Build-time variants are modeling errors: the scene cannot be represented
/// in the target engine and must be fixed, not retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    /// A frame id already has a registered actor.
    #[error("frame {frame} already has a registered actor")]
    DuplicateActor {
        /// The doubly-registered frame.
        frame: FrameId,
    },

    /// The operation needs an actor the frame does not have.
    #[error("frame {frame} has no registered actor")]
    NoActor {
        /// The actorless frame.
        frame: FrameId,
    },

    /// Articulated-chain construction hit an unimplemented joint type.
    #[error("unimplemented joint type '{kind}' in articulated chain")]
    UnsupportedJointKind {
        /// The offending joint kind.
        kind: JointKind,
    },

    /// The collision shape builder has no mapping for this shape kind.
    #[error("collision shape '{kind}' is not implemented")]
    UnsupportedShape {
        /// `ShapeGeometry::kind_name` of the offending shape.
        kind: &'static str,
    },

    /// Actors only transition between kinematic and dynamic after build.
    #[error("cannot change object type from {from} to {to}")]
    UnsupportedKindTransition {
        /// Current actor kind.
        from: BodyKind,
        /// Requested kind.
        to: BodyKind,
    },

    /// Parent/joint bookkeeping broke down during articulated-chain build.
    #[error("inconsistent articulated chain: {reason}")]
    InconsistentChain {
        /// What went wrong.
        reason: String,
    },

    /// A convex hull could not be built from the mesh vertices.
    #[error("degenerate mesh on frame {frame}: no convex hull from {vertices} vertices")]
    DegenerateMesh {
        /// The frame owning the mesh.
        frame: FrameId,
        /// Number of vertices supplied.
        vertices: usize,
    },

    /// A frame cannot be relocated to its center of mass.
    #[error("cannot recenter frame {frame}: {reason}")]
    CannotRecenter {
        /// The frame that resisted relocation.
        frame: FrameId,
        /// Why (attached shape or incompatible joint).
        reason: &'static str,
    },

    /// Soft-body construction was requested with soft bodies disabled.
    #[error("frame {frame} is soft but soft bodies are disabled")]
    SoftBodiesDisabled {
        /// The soft frame.
        frame: FrameId,
    },

    /// An underlying model operation failed.
    #[error(transparent)]
    Model(#[from] KinError),
}

impl BridgeError {
    /// Create an inconsistent-chain error.
    #[must_use]
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentChain {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BridgeError::UnsupportedJointKind {
            kind: JointKind::Ball,
        };
        assert!(err.to_string().contains("ball"));

        let err = BridgeError::UnsupportedKindTransition {
            from: BodyKind::Static,
            to: BodyKind::Dynamic,
        };
        assert!(err.to_string().contains("static"));

        let err: BridgeError = KinError::frame_not_found("x").into();
        assert!(err.to_string().contains('x'));
    }
}
