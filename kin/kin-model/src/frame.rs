//! Frame nodes of the kinematic forest.

use kin_types::{FrameId, Inertia, Pose, ShapeGeometry};

use crate::joint::Joint;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-frame contact material overrides, read by bridges when building
/// actors. `None` means "use the bridge default".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceParams {
    /// Friction coefficient override.
    pub friction: Option<f64>,
    /// Restitution override.
    pub restitution: Option<f64>,
}

/// A node in the kinematic forest.
///
/// A frame owns its relative pose, an optional joint/shape/inertia, and the
/// list of its children; the parent link is a plain id back-reference.
/// All structural mutation goes through the owning [`Scene`](crate::Scene) so
/// the scene can keep its derived caches in sync.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    pub(crate) id: FrameId,
    pub(crate) name: String,
    /// Pose relative to the parent (world pose for roots).
    pub(crate) rel: Pose,
    /// Cached world pose; valid while the scene's pose cache is fresh.
    pub(crate) world: Pose,
    pub(crate) joint: Option<Joint>,
    pub(crate) shape: Option<ShapeGeometry>,
    pub(crate) inertia: Option<Inertia>,
    pub(crate) surface: SurfaceParams,
    pub(crate) parent: Option<FrameId>,
    pub(crate) children: Vec<FrameId>,
}

impl Frame {
    pub(crate) fn new(id: FrameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rel: Pose::identity(),
            world: Pose::identity(),
            joint: None,
            shape: None,
            inertia: None,
            surface: SurfaceParams::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Stable id of this frame.
    #[must_use]
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Unique name of this frame.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pose relative to the parent frame (world pose for roots).
    #[must_use]
    pub fn relative_pose(&self) -> Pose {
        self.rel
    }

    /// The joint connecting this frame to its parent, if any.
    #[must_use]
    pub fn joint(&self) -> Option<&Joint> {
        self.joint.as_ref()
    }

    /// The shape attached to this frame, if any.
    #[must_use]
    pub fn shape(&self) -> Option<&ShapeGeometry> {
        self.shape.as_ref()
    }

    /// The mass properties of this frame, if any.
    #[must_use]
    pub fn inertia(&self) -> Option<&Inertia> {
        self.inertia.as_ref()
    }

    /// Contact material overrides.
    #[must_use]
    pub fn surface(&self) -> SurfaceParams {
        self.surface
    }

    /// Parent frame id, `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }

    /// Child frame ids.
    #[must_use]
    pub fn children(&self) -> &[FrameId] {
        &self.children
    }

    /// Whether this frame is connected to its parent articulately
    /// (a joint with at least one DOF).
    #[must_use]
    pub fn has_articulated_joint(&self) -> bool {
        self.joint.is_some_and(|j| !j.kind.is_rigid())
    }
}
