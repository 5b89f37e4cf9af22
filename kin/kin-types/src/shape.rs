//! Shape primitives attached to frames.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometry of a shape attached to a frame.
///
/// The model accepts every variant; downstream consumers support subsets.
/// The collision shape builder handles `Sphere`, `Box` and `ConvexMesh` and
/// rejects the rest, and `Marker` never contributes collision or inertia.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeGeometry {
    /// Sphere with given radius.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
    },
    /// Box with half-extents along each local axis.
    Box {
        /// Half-extents of the box.
        half_extents: Vector3<f64>,
    },
    /// Capsule along the local Z-axis.
    Capsule {
        /// Half-length of the cylindrical portion.
        half_length: f64,
        /// Cap/cylinder radius.
        radius: f64,
    },
    /// Cylinder along the local Z-axis, flat caps.
    Cylinder {
        /// Half-length along Z.
        half_length: f64,
        /// Cylinder radius.
        radius: f64,
    },
    /// Convex point cloud in local coordinates.
    ///
    /// Doubles as the node mesh of soft bodies: soft-body pulls write the
    /// simulated node positions back into `vertices`.
    ConvexMesh {
        /// Vertices of the hull / node mesh.
        vertices: Vec<Point3<f64>>,
    },
    /// Visualization-only marker, never collides.
    Marker {
        /// Display size.
        size: f64,
    },
}

impl ShapeGeometry {
    /// Create a sphere.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box from half-extents.
    #[must_use]
    pub fn box_shape(half_extents: Vector3<f64>) -> Self {
        Self::Box { half_extents }
    }

    /// Create a convex mesh from vertices.
    #[must_use]
    pub fn convex_mesh(vertices: Vec<Point3<f64>>) -> Self {
        Self::ConvexMesh { vertices }
    }

    /// Short lower-case name used in errors and reports.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
            Self::Capsule { .. } => "capsule",
            Self::Cylinder { .. } => "cylinder",
            Self::ConvexMesh { .. } => "mesh",
            Self::Marker { .. } => "marker",
        }
    }

    /// Whether the shape participates in collision at all.
    #[must_use]
    pub fn collidable(&self) -> bool {
        !matches!(self, Self::Marker { .. })
    }

    /// Radius of a sphere bounding the shape, centered at the shape origin.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Box { half_extents } => half_extents.norm(),
            Self::Capsule {
                half_length,
                radius,
            } => half_length + radius,
            Self::Cylinder {
                half_length,
                radius,
            } => half_length.hypot(*radius),
            Self::ConvexMesh { vertices } => {
                vertices.iter().map(|v| v.coords.norm()).fold(0.0, f64::max)
            }
            Self::Marker { .. } => 0.0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_radius() {
        assert_relative_eq!(ShapeGeometry::sphere(2.0).bounding_radius(), 2.0);
        assert_relative_eq!(
            ShapeGeometry::box_shape(Vector3::new(1.0, 0.0, 0.0)).bounding_radius(),
            1.0
        );
        let mesh = ShapeGeometry::convex_mesh(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 4.0),
        ]);
        assert_relative_eq!(mesh.bounding_radius(), 5.0);
    }

    #[test]
    fn test_marker_never_collides() {
        assert!(!ShapeGeometry::Marker { size: 0.1 }.collidable());
        assert!(ShapeGeometry::sphere(1.0).collidable());
    }
}
