//! Mass properties and body classification.

use nalgebra::{Matrix3, Vector3};

use crate::{KinError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a body participates in simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyKind {
    /// Immovable; never updated by the simulator.
    Static,
    /// Pose driven externally, pushed into the simulator each step.
    Kinematic,
    /// Fully simulated rigid body.
    #[default]
    Dynamic,
    /// Deformable node-mesh body; only its vertices are simulated.
    Soft,
}

impl std::fmt::Display for BodyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Kinematic => write!(f, "kinematic"),
            Self::Dynamic => write!(f, "dynamic"),
            Self::Soft => write!(f, "soft"),
        }
    }
}

/// Mass properties of a frame.
///
/// `com` is the center-of-mass offset from the frame origin in local
/// coordinates; `tensor` is the inertia tensor about the center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inertia {
    /// Body classification used by bridges.
    pub kind: BodyKind,
    /// Total mass in kg.
    pub mass: f64,
    /// Center of mass offset from the frame origin, local coordinates.
    pub com: Vector3<f64>,
    /// Inertia tensor about the center of mass (kg·m²).
    pub tensor: Matrix3<f64>,
}

impl Inertia {
    /// Create mass properties with given values.
    #[must_use]
    pub const fn new(kind: BodyKind, mass: f64, com: Vector3<f64>, tensor: Matrix3<f64>) -> Self {
        Self {
            kind,
            mass,
            com,
            tensor,
        }
    }

    /// Dynamic point mass at the frame origin.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            mass,
            com: Vector3::zeros(),
            tensor: Matrix3::zeros(),
        }
    }

    /// Dynamic solid sphere: `I = (2/5) m r²`.
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            kind: BodyKind::Dynamic,
            mass,
            com: Vector3::zeros(),
            tensor: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// Dynamic solid box with the given half-extents.
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;
        Self {
            kind: BodyKind::Dynamic,
            mass,
            com: Vector3::zeros(),
            tensor: Matrix3::from_diagonal(&Vector3::new(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            )),
        }
    }

    /// Change the body kind, keeping mass properties.
    #[must_use]
    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Combine with another inertia expressed in the same local frame.
    ///
    /// Masses add, the center of mass is mass-weighted, and both tensors are
    /// transported to the combined center via the parallel-axis theorem.
    /// Rotational alignment of `other` must already be folded into its
    /// `com`/`tensor` by the caller.
    #[must_use]
    pub fn combined_with(&self, other: &Self) -> Self {
        let mass = self.mass + other.mass;
        if mass <= 0.0 {
            return *self;
        }
        let com = (self.com * self.mass + other.com * other.mass) / mass;
        let tensor = parallel_axis(&self.tensor, self.mass, &(self.com - com))
            + parallel_axis(&other.tensor, other.mass, &(other.com - com));
        Self {
            kind: self.kind,
            mass,
            com,
            tensor,
        }
    }

    /// True for kinds the simulator integrates (dynamic or soft).
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic | BodyKind::Soft)
    }

    /// Validate that the mass properties are physically plausible.
    pub fn validate(&self) -> Result<()> {
        if self.mass < 0.0 || !self.mass.is_finite() {
            return Err(KinError::invalid_inertia("mass must be finite and >= 0"));
        }
        if !self.com.iter().all(|x| x.is_finite()) {
            return Err(KinError::invalid_inertia("center of mass must be finite"));
        }
        let eigenvalues = self.tensor.symmetric_eigenvalues();
        if eigenvalues.iter().any(|&e| e < -1e-10) {
            return Err(KinError::invalid_inertia(
                "inertia tensor must be positive semi-definite",
            ));
        }
        Ok(())
    }
}

/// Transport an inertia tensor by `offset` away from its center of mass.
fn parallel_axis(tensor: &Matrix3<f64>, mass: f64, offset: &Vector3<f64>) -> Matrix3<f64> {
    let d2 = offset.norm_squared();
    tensor + mass * (Matrix3::identity() * d2 - offset * offset.transpose())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_inertia() {
        let i = Inertia::sphere(1.0, 1.0);
        assert_relative_eq!(i.tensor[(0, 0)], 0.4, epsilon = 1e-12);
        assert!(i.validate().is_ok());
    }

    #[test]
    fn test_box_inertia() {
        // 1x1x1 box, mass 12 => diagonal entries all 2
        let i = Inertia::box_shape(12.0, Vector3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(i.tensor[(0, 0)], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_combined_mass_and_com() {
        let a = Inertia::point_mass(1.0);
        let mut b = Inertia::point_mass(3.0);
        b.com = Vector3::new(4.0, 0.0, 0.0);

        let c = a.combined_with(&b);
        assert_relative_eq!(c.mass, 4.0, epsilon = 1e-12);
        assert_relative_eq!(c.com.x, 3.0, epsilon = 1e-12);
        // Two point masses 3 and 1 units from the combined COM.
        assert_relative_eq!(c.tensor[(1, 1)], 1.0 * 9.0 + 3.0 * 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_negative_mass() {
        let mut i = Inertia::point_mass(1.0);
        i.mass = -1.0;
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_body_kind_display() {
        assert_eq!(BodyKind::Kinematic.to_string(), "kinematic");
        assert_eq!(BodyKind::Soft.to_string(), "soft");
    }
}
