//! Joints: the articulated connections between a frame and its parent.
//!
//! A joint owns no transform of its own. It *is* the rule that maps a slice
//! of generalized coordinates to the owning frame's relative pose (and back).
//! Fixed mounting offsets are modeled as separate rigidly-attached parent
//! frames, so a joint-bearing frame's relative pose is purely the joint
//! transform.

use kin_types::Pose;
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A local coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Local X.
    X,
    /// Local Y.
    Y,
    /// Local Z.
    Z,
}

impl Axis {
    /// Unit vector of this axis.
    #[must_use]
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }
}

/// Kind of joint, determining DOF count and coordinate mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointKind {
    /// Zero-DOF connection. Frames joined only through rigid joints form one
    /// rigid-body group.
    Rigid,
    /// One rotational DOF about a local axis.
    Hinge(Axis),
    /// One translational DOF along a local axis.
    Prismatic(Axis),
    /// Three rotational DOF, parameterized by a unit quaternion (4 coords).
    Ball,
    /// Full 6-DOF floating connection, parameterized by position plus unit
    /// quaternion (7 coords).
    Free,
}

impl JointKind {
    /// Number of generalized coordinates this joint contributes to `q`.
    ///
    /// Quaternion-parameterized joints count coordinates, not tangent
    /// dimensions: `Ball` is 4 and `Free` is 7.
    #[must_use]
    pub const fn dof(self) -> usize {
        match self {
            Self::Rigid => 0,
            Self::Hinge(_) | Self::Prismatic(_) => 1,
            Self::Ball => 4,
            Self::Free => 7,
        }
    }

    /// Whether this is the zero-DOF rigid connection.
    #[must_use]
    pub const fn is_rigid(self) -> bool {
        matches!(self, Self::Rigid)
    }
}

impl std::fmt::Display for JointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rigid => write!(f, "rigid"),
            Self::Hinge(a) => write!(f, "hinge{a:?}"),
            Self::Prismatic(a) => write!(f, "prismatic{a:?}"),
            Self::Ball => write!(f, "ball"),
            Self::Free => write!(f, "free"),
        }
    }
}

/// A joint attached to a frame.
///
/// `q_index` is assigned by the scene's DOF indexing pass and is only
/// meaningful while that cache is fresh.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Joint {
    /// The joint kind.
    pub kind: JointKind,
    /// Whether the joint currently contributes coordinates to `q`.
    pub active: bool,
    /// Start of this joint's slice in `q` (index cache).
    pub(crate) q_index: usize,
}

impl Joint {
    /// Create an active joint of the given kind.
    #[must_use]
    pub fn new(kind: JointKind) -> Self {
        Self {
            kind,
            active: true,
            q_index: 0,
        }
    }

    /// DOF count of this joint.
    #[must_use]
    pub const fn dof(&self) -> usize {
        self.kind.dof()
    }

    /// Start of this joint's coordinate slice in `q`.
    ///
    /// Valid only after the owning scene's `ensure_indexed_dofs`.
    #[must_use]
    pub const fn q_index(&self) -> usize {
        self.q_index
    }

    /// Map a coordinate slice (length `self.dof()`) to a relative pose.
    ///
    /// Quaternion coordinates are normalized on the way in; an all-zero
    /// quaternion falls back to identity.
    #[must_use]
    pub fn pose_from_q(&self, q: &[f64]) -> Pose {
        debug_assert_eq!(q.len(), self.dof());
        match self.kind {
            JointKind::Rigid => Pose::identity(),
            JointKind::Hinge(axis) => Pose::new(
                Point3::origin(),
                UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_unchecked(axis.unit()), q[0]),
            ),
            JointKind::Prismatic(axis) => Pose::from_position(Point3::from(axis.unit() * q[0])),
            JointKind::Ball => Pose::new(Point3::origin(), unit_quat(q[0], q[1], q[2], q[3])),
            JointKind::Free => Pose::new(
                Point3::new(q[0], q[1], q[2]),
                unit_quat(q[3], q[4], q[5], q[6]),
            ),
        }
    }

    /// Extract the coordinate slice from a relative pose, writing into `out`.
    ///
    /// Inverse of [`Joint::pose_from_q`] for poses reachable by this joint;
    /// for single-axis joints any off-axis component of the pose is ignored.
    pub fn q_from_pose(&self, pose: &Pose, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.dof());
        match self.kind {
            JointKind::Rigid => {}
            JointKind::Hinge(axis) => {
                let q = pose.rotation.quaternion();
                let sin_half = q.imag().dot(&axis.unit());
                out[0] = 2.0 * sin_half.atan2(q.w);
            }
            JointKind::Prismatic(axis) => {
                out[0] = pose.position.coords.dot(&axis.unit());
            }
            JointKind::Ball => {
                let q = pose.rotation.quaternion();
                out.copy_from_slice(&[q.w, q.i, q.j, q.k]);
            }
            JointKind::Free => {
                let q = pose.rotation.quaternion();
                out[..3].copy_from_slice(pose.position.coords.as_slice());
                out[3..].copy_from_slice(&[q.w, q.i, q.j, q.k]);
            }
        }
    }
}

fn unit_quat(w: f64, x: f64, y: f64, z: f64) -> UnitQuaternion<f64> {
    let q = Quaternion::new(w, x, y, z);
    if q.norm_squared() < 1e-24 {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::from_quaternion(q)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_dof_counts() {
        assert_eq!(JointKind::Rigid.dof(), 0);
        assert_eq!(JointKind::Hinge(Axis::X).dof(), 1);
        assert_eq!(JointKind::Prismatic(Axis::Z).dof(), 1);
        assert_eq!(JointKind::Ball.dof(), 4);
        assert_eq!(JointKind::Free.dof(), 7);
    }

    #[test]
    fn test_hinge_roundtrip() {
        let j = Joint::new(JointKind::Hinge(Axis::Z));
        for angle in [-PI + 0.1, -FRAC_PI_2, 0.0, 0.7, FRAC_PI_2] {
            let pose = j.pose_from_q(&[angle]);
            let mut out = [0.0];
            j.q_from_pose(&pose, &mut out);
            assert_relative_eq!(out[0], angle, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_prismatic_roundtrip() {
        let j = Joint::new(JointKind::Prismatic(Axis::Y));
        let pose = j.pose_from_q(&[0.25]);
        assert_relative_eq!(pose.position.y, 0.25, epsilon = 1e-12);
        let mut out = [0.0];
        j.q_from_pose(&pose, &mut out);
        assert_relative_eq!(out[0], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_free_roundtrip() {
        let j = Joint::new(JointKind::Free);
        let q = [1.0, -2.0, 0.5, 0.9238795325112867, 0.0, 0.3826834323650898, 0.0];
        let pose = j.pose_from_q(&q);
        let mut out = [0.0; 7];
        j.q_from_pose(&pose, &mut out);
        for (a, b) in out.iter().zip(q.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_degenerate_quaternion_is_identity() {
        let j = Joint::new(JointKind::Ball);
        let pose = j.pose_from_q(&[0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(pose.rotation.angle(), 0.0, epsilon = 1e-12);
    }
}
