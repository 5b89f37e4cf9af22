//! Error types for frame-graph model operations.

use thiserror::Error;

use crate::FrameId;

/// Errors surfaced by the frame-graph model and its consumers.
///
/// These are modeling/programming errors, not transient conditions: there is
/// no retry story, callers are expected to fix the model or the call site.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinError {
    /// The frame graph contains a cycle (or an edit would create one).
    #[error("frame graph contains a cycle through {frame}")]
    StructuralCycle {
        /// A frame on the offending cycle.
        frame: FrameId,
    },

    /// A state vector has the wrong dimension.
    #[error("{what} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        /// Which vector was mis-sized ("joint state", "frame state", ...).
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },

    /// Lookup of a frame by name failed.
    #[error("no frame named '{name}'")]
    FrameNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// A frame name is already taken.
    #[error("frame name '{name}' already exists")]
    DuplicateFrameName {
        /// The clashing name.
        name: String,
    },

    /// An operation does not support this shape kind.
    #[error("shape kind '{kind}' is not implemented here")]
    UnsupportedShape {
        /// `ShapeGeometry::kind_name` of the offending shape.
        kind: &'static str,
    },

    /// A contact feature was asked for a pair without a proxy.
    #[error("no collision proxy between {a} and {b}")]
    MissingProxy {
        /// First frame of the pair.
        a: FrameId,
        /// Second frame of the pair.
        b: FrameId,
    },

    /// A contact feature was asked for a pair without a force exchange.
    #[error("no force exchange between {a} and {b}")]
    MissingForceExchange {
        /// First frame of the pair.
        a: FrameId,
        /// Second frame of the pair.
        b: FrameId,
    },

    /// An operation required a shape the frame does not carry.
    #[error("frame {frame} has no shape")]
    MissingShape {
        /// The shapeless frame.
        frame: FrameId,
    },

    /// Mass properties are not physically plausible.
    #[error("invalid inertia: {reason}")]
    InvalidInertia {
        /// Description of what's wrong.
        reason: String,
    },
}

impl KinError {
    /// Create an invalid-inertia error.
    #[must_use]
    pub fn invalid_inertia(reason: impl Into<String>) -> Self {
        Self::InvalidInertia {
            reason: reason.into(),
        }
    }

    /// Create a frame-not-found error.
    #[must_use]
    pub fn frame_not_found(name: impl Into<String>) -> Self {
        Self::FrameNotFound { name: name.into() }
    }

    /// Create a joint-state dimension error.
    #[must_use]
    pub fn joint_dim_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: "joint state",
            expected,
            actual,
        }
    }

    /// Check if this is a structural error (cycle or dimension mismatch).
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::StructuralCycle { .. } | Self::DimensionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KinError::StructuralCycle {
            frame: FrameId::new(3),
        };
        assert!(err.to_string().contains("Frame(3)"));
        assert!(err.is_structural());

        let err = KinError::frame_not_found("gripper");
        assert!(err.to_string().contains("gripper"));
        assert!(!err.is_structural());
    }
}
