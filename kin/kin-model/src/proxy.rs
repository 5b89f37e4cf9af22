//! Collision proxies and the analytic distance queries behind them.
//!
//! A proxy is a transient candidate pair: two shaped frames, their witness
//! points, the contact normal and the signed separation. Proxies are
//! recomputed on demand by [`Scene::ensure_proxies`](crate::Scene::ensure_proxies)
//! and never persisted structurally.

use kin_types::{FrameId, KinError, Pose, Result, ShapeGeometry};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A candidate collision pair with computed separation.
///
/// `distance` is negative when the shapes penetrate. `normal` points from
/// `a`'s surface towards `b`'s.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Proxy {
    /// First frame of the pair.
    pub a: FrameId,
    /// Second frame of the pair.
    pub b: FrameId,
    /// Closest point on `a`'s shape, world coordinates.
    pub witness_a: Point3<f64>,
    /// Closest point on `b`'s shape, world coordinates.
    pub witness_b: Point3<f64>,
    /// Contact normal from `a` towards `b`, world coordinates.
    pub normal: Vector3<f64>,
    /// Signed separation (negative = penetration).
    pub distance: f64,
}

impl Proxy {
    /// Whether this proxy connects the given (unordered) pair.
    #[must_use]
    pub fn connects(&self, x: FrameId, y: FrameId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

/// Result of a narrow-phase distance query between two posed shapes.
pub(crate) struct PairDistance {
    pub witness_a: Point3<f64>,
    pub witness_b: Point3<f64>,
    pub normal: Vector3<f64>,
    pub distance: f64,
}

/// Distance between two posed shapes.
///
/// Sphere–sphere and sphere–box are exact; every other combination falls
/// back to the conservative bounding-sphere separation.
pub(crate) fn shape_distance(
    shape_a: &ShapeGeometry,
    pose_a: &Pose,
    shape_b: &ShapeGeometry,
    pose_b: &Pose,
) -> PairDistance {
    match (shape_a, shape_b) {
        (ShapeGeometry::Sphere { radius: ra }, ShapeGeometry::Sphere { radius: rb }) => {
            sphere_sphere(pose_a.position, *ra, pose_b.position, *rb)
        }
        (ShapeGeometry::Sphere { radius }, ShapeGeometry::Box { half_extents }) => {
            sphere_box(pose_a.position, *radius, pose_b, half_extents)
        }
        (ShapeGeometry::Box { half_extents }, ShapeGeometry::Sphere { radius }) => {
            flip(sphere_box(pose_b.position, *radius, pose_a, half_extents))
        }
        _ => sphere_sphere(
            pose_a.position,
            shape_a.bounding_radius(),
            pose_b.position,
            shape_b.bounding_radius(),
        ),
    }
}

fn flip(d: PairDistance) -> PairDistance {
    PairDistance {
        witness_a: d.witness_b,
        witness_b: d.witness_a,
        normal: -d.normal,
        distance: d.distance,
    }
}

fn sphere_sphere(ca: Point3<f64>, ra: f64, cb: Point3<f64>, rb: f64) -> PairDistance {
    let delta = cb - ca;
    let dist = delta.norm();
    // Coincident centers: pick an arbitrary but deterministic normal.
    let normal = if dist > 1e-12 {
        delta / dist
    } else {
        Vector3::z()
    };
    PairDistance {
        witness_a: ca + normal * ra,
        witness_b: cb - normal * rb,
        normal,
        distance: dist - ra - rb,
    }
}

/// Sphere vs box, with the sphere in the `a` slot of the result.
fn sphere_box(
    center: Point3<f64>,
    radius: f64,
    box_pose: &Pose,
    half_extents: &Vector3<f64>,
) -> PairDistance {
    let local = box_pose.inverse_transform_point(&center);
    let clamped = Point3::new(
        local.x.clamp(-half_extents.x, half_extents.x),
        local.y.clamp(-half_extents.y, half_extents.y),
        local.z.clamp(-half_extents.z, half_extents.z),
    );

    let (surface_local, normal_local, center_to_surface) = if clamped == local {
        // Center inside the box: push out through the nearest face.
        let mut best_axis = 0;
        let mut best_depth = f64::INFINITY;
        for axis in 0..3 {
            let depth = half_extents[axis] - local[axis].abs();
            if depth < best_depth {
                best_depth = depth;
                best_axis = axis;
            }
        }
        let mut n = Vector3::zeros();
        n[best_axis] = local[best_axis].signum();
        let mut s = local;
        s[best_axis] = half_extents[best_axis] * n[best_axis];
        (s, n, -best_depth)
    } else {
        let out = local - clamped;
        let len = out.norm();
        (clamped, out / len, len)
    };

    let witness_box = box_pose.transform_point(&surface_local);
    let normal = box_pose.transform_vector(&normal_local);
    PairDistance {
        witness_a: center - normal * radius,
        witness_b: witness_box,
        normal: -normal,
        distance: center_to_surface - radius,
    }
}

/// Signed distance of a world point to a posed shape, with the outward
/// gradient in world coordinates.
///
/// Supported for spheres and boxes; other kinds return
/// [`KinError::UnsupportedShape`].
pub fn point_signed_distance(
    shape: &ShapeGeometry,
    pose: &Pose,
    point: &Point3<f64>,
) -> Result<(f64, Vector3<f64>)> {
    match shape {
        ShapeGeometry::Sphere { radius } => {
            let delta = point - pose.position;
            let dist = delta.norm();
            let grad = if dist > 1e-12 {
                delta / dist
            } else {
                Vector3::z()
            };
            Ok((dist - radius, grad))
        }
        ShapeGeometry::Box { half_extents } => {
            let local = pose.inverse_transform_point(point);
            let outside = Vector3::new(
                (local.x.abs() - half_extents.x).max(0.0),
                (local.y.abs() - half_extents.y).max(0.0),
                (local.z.abs() - half_extents.z).max(0.0),
            );
            if outside.norm_squared() > 0.0 {
                let dist = outside.norm();
                let grad_local = Vector3::new(
                    outside.x * local.x.signum(),
                    outside.y * local.y.signum(),
                    outside.z * local.z.signum(),
                ) / dist;
                Ok((dist, pose.transform_vector(&grad_local)))
            } else {
                let mut best_axis = 0;
                let mut best_depth = f64::INFINITY;
                for axis in 0..3 {
                    let depth = half_extents[axis] - local[axis].abs();
                    if depth < best_depth {
                        best_depth = depth;
                        best_axis = axis;
                    }
                }
                let mut grad_local = Vector3::zeros();
                grad_local[best_axis] = local[best_axis].signum();
                Ok((-best_depth, pose.transform_vector(&grad_local)))
            }
        }
        other => Err(KinError::UnsupportedShape {
            kind: other.kind_name(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_sphere_separated() {
        let d = sphere_sphere(
            Point3::origin(),
            1.0,
            Point3::new(4.0, 0.0, 0.0),
            1.0,
        );
        assert_relative_eq!(d.distance, 2.0, epsilon = 1e-12);
        assert_relative_eq!(d.witness_a.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(d.witness_b.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(d.normal.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_sphere_penetrating() {
        let d = sphere_sphere(
            Point3::origin(),
            1.0,
            Point3::new(1.5, 0.0, 0.0),
            1.0,
        );
        assert_relative_eq!(d.distance, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_box_face() {
        let box_pose = Pose::identity();
        let d = sphere_box(
            Point3::new(3.0, 0.0, 0.0),
            0.5,
            &box_pose,
            &Vector3::new(1.0, 1.0, 1.0),
        );
        assert_relative_eq!(d.distance, 1.5, epsilon = 1e-12);
        // Normal points from the sphere (slot a) towards the box (slot b).
        assert_relative_eq!(d.normal.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(d.witness_a.x, 2.5, epsilon = 1e-12);
        assert_relative_eq!(d.witness_b.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_center_inside_box() {
        let d = sphere_box(
            Point3::new(0.8, 0.0, 0.0),
            0.1,
            &Pose::identity(),
            &Vector3::new(1.0, 2.0, 2.0),
        );
        // Center is 0.2 inside the +X face, minus the radius.
        assert_relative_eq!(d.distance, -0.2 - 0.1, epsilon = 1e-12);
        assert_relative_eq!(d.normal.x, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_signed_distance_box() {
        let shape = ShapeGeometry::box_shape(Vector3::new(1.0, 1.0, 1.0));
        let (d, g) =
            point_signed_distance(&shape, &Pose::identity(), &Point3::new(2.0, 0.0, 0.0))
                .unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.x, 1.0, epsilon = 1e-12);

        let (d_in, g_in) =
            point_signed_distance(&shape, &Pose::identity(), &Point3::new(0.5, 0.0, 0.0))
                .unwrap();
        assert_relative_eq!(d_in, -0.5, epsilon = 1e-12);
        assert_relative_eq!(g_in.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_signed_distance_unsupported() {
        let shape = ShapeGeometry::Capsule {
            half_length: 1.0,
            radius: 0.2,
        };
        assert!(point_signed_distance(&shape, &Pose::identity(), &Point3::origin()).is_err());
    }
}
