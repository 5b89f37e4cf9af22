//! Rigid transforms and spatial velocities.
//!
//! [`Pose`] is a position plus unit-quaternion orientation; [`Twist`] is a
//! linear/angular velocity pair. Frame-graph code composes poses along
//! parent chains, so composition and relative-pose helpers live here.

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a frame.
///
/// # Example
///
/// ```
/// use kin_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion};
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position of the frame origin.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from an isometry.
    #[must_use]
    pub fn from_isometry(iso: Isometry3<f64>) -> Self {
        Self {
            position: Point3::from(iso.translation.vector),
            rotation: iso.rotation,
        }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Compose two poses: `self ∘ other` (apply `other` in `self`'s frame).
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Compute the inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Express `self` relative to `base`: `base⁻¹ ∘ self`.
    ///
    /// If both poses are world poses, the result is `self`'s pose in `base`'s
    /// local frame.
    #[must_use]
    pub fn relative_to(&self, base: &Self) -> Self {
        base.inverse().compose(self)
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Linear and angular velocity of a frame, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity (rad/s).
    pub angular: Vector3<f64>,
}

impl Twist {
    /// Create a twist with specified linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// Zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Create a twist with linear velocity only.
    #[must_use]
    pub fn linear(v: Vector3<f64>) -> Self {
        Self {
            linear: v,
            angular: Vector3::zeros(),
        }
    }

    /// Create a twist with angular velocity only.
    #[must_use]
    pub fn angular(omega: Vector3<f64>) -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: omega,
        }
    }

    /// Velocity of a point offset from the frame origin: `v + ω × r`.
    #[must_use]
    pub fn velocity_at_point(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(offset)
    }

    /// Check if the twist contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_roundtrip() {
        let pose = Pose::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(pose.transform_point(&p).coords, p.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_then_translation() {
        let pose = Pose::new(
            Point3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2),
        );
        let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(world.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(world.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let pose = Pose::new(
            Point3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let round = pose.compose(&pose.inverse());
        assert_relative_eq!(round.position.coords, Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(round.rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_to() {
        let a = Pose::from_position(Point3::new(3.0, 0.0, 0.0));
        let b = Pose::from_position(Point3::new(1.0, 0.0, 0.0));
        let rel = a.relative_to(&b);
        assert_relative_eq!(rel.position.x, 2.0, epsilon = 1e-12);
        // b ∘ rel == a
        let back = b.compose(&rel);
        assert_relative_eq!(back.position.coords, a.position.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_isometry_roundtrip() {
        let pose = Pose::new(
            Point3::new(-1.0, 0.5, 2.0),
            UnitQuaternion::from_euler_angles(0.3, -0.2, 0.1),
        );
        let back = Pose::from_isometry(pose.to_isometry());
        assert_relative_eq!(back.position.coords, pose.position.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_twist_velocity_at_point() {
        let twist = Twist::angular(Vector3::new(0.0, 0.0, 1.0));
        let v = twist.velocity_at_point(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }
}
