//! Contact constraint features.
//!
//! Residual/Jacobian pairs consumed by downstream constrained optimizers:
//!
//! - [`force_is_normal`] - deviation of an exchanged force from the contact
//!   normal
//! - [`force_is_complementary`] - classical complementarity ("no force at
//!   positive separation")
//! - [`poa_in_intersection`] - inequality keeping the point of application
//!   inside the shape intersection
//! - [`contact_sos`] - stacked smooth penalty for soft formulations
//! - [`contact_velocity`] - velocity-order feature over a two-scene tuple
//!
//! Every feature is a stateless function of the current scene(s): it
//! recomputes whatever caches it needs but never mutates model semantics.
//! Contact normals and witness points come from the pair's proxy and are
//! treated as locally constant with respect to `q`; the configuration
//! dependence enters through the witness-point kinematics and the force
//! DOFs.

#![doc(html_root_url = "https://docs.rs/kin-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

use kin_model::{Jacobian, Proxy, Scene};
use kin_types::{FrameId, KinError, Result};
use nalgebra::{DMatrix, DVector, Matrix3};

/// A feature value with its Jacobian with respect to `q`.
#[derive(Debug, Clone)]
pub struct FeatureEval {
    /// Residual vector.
    pub y: DVector<f64>,
    /// Jacobian of `y` with respect to the scene's generalized coordinates
    /// (for tuple features: the stacked coordinates of both scenes).
    pub jac: Jacobian,
}

impl FeatureEval {
    /// Dimension of the residual.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.y.len()
    }
}

fn proxy_for(scene: &mut Scene, a: FrameId, b: FrameId) -> Result<Proxy> {
    scene.ensure_proxies()?;
    scene
        .proxy_between(a, b)
        .copied()
        .ok_or(KinError::MissingProxy { a, b })
}

fn exchange_for(scene: &Scene, a: FrameId, b: FrameId) -> Result<kin_model::ForceExchange> {
    scene
        .force_between(a, b)
        .copied()
        .ok_or(KinError::MissingForceExchange { a, b })
}

/// Deviation of the exchanged force from the contact normal (3 components).
///
/// Zero iff the force between `a` and `b` is aligned with the proxy normal:
/// `y = (I − n nᵀ) f`.
pub fn force_is_normal(scene: &mut Scene, a: FrameId, b: FrameId) -> Result<FeatureEval> {
    // Index before copying the exchange: its q slice moves with reindexing.
    let dim = scene.joint_dim()?;
    let proxy = proxy_for(scene, a, b)?;
    let fx = exchange_for(scene, a, b)?;

    let n = proxy.normal;
    let tangent_proj = Matrix3::identity() - n * n.transpose();
    let y = DVector::from_column_slice((tangent_proj * fx.force).as_slice());

    let mut jac = DMatrix::zeros(3, dim);
    let fcol = fx.q_index() + 3;
    jac.view_mut((0, fcol), (3, 3)).copy_from(&tangent_proj);

    Ok(FeatureEval {
        y,
        jac: Jacobian::from_dense(scene.jacobian_mode(), jac),
    })
}

/// Complementarity residual (3 components): `y = d(q) · f`.
///
/// Its zero set enforces "no force at positive separation": the residual
/// vanishes when either the force is zero or the witness-point separation
/// `d(q) = nᵀ (p_a(q) − p_b(q))` is.
pub fn force_is_complementary(scene: &mut Scene, a: FrameId, b: FrameId) -> Result<FeatureEval> {
    let dim = scene.joint_dim()?;
    let proxy = proxy_for(scene, a, b)?;
    let fx = exchange_for(scene, a, b)?;
    let n = proxy.normal;

    // Witness points as material points of their frames.
    let la = scene
        .world_pose(a)?
        .inverse_transform_point(&proxy.witness_a);
    let lb = scene
        .world_pose(b)?
        .inverse_transform_point(&proxy.witness_b);
    let (pa, jac_a) = scene.kinematics_pos(a, Some(la.coords))?;
    let (pb, jac_b) = scene.kinematics_pos(b, Some(lb.coords))?;
    let d = n.dot(&(pb - pa));

    let y = DVector::from_column_slice((fx.force * d).as_slice());

    // ∇d = nᵀ (J_pb − J_pa), a single row over q.
    let diff = jac_b.to_dense() - jac_a.to_dense();
    let mut jac = DMatrix::zeros(3, dim);
    for c in 0..dim {
        let g = n.x * diff[(0, c)] + n.y * diff[(1, c)] + n.z * diff[(2, c)];
        for (r, f) in fx.force.iter().enumerate() {
            jac[(r, c)] = f * g;
        }
    }
    let fcol = fx.q_index() + 3;
    for k in 0..3 {
        jac[(k, fcol + k)] += d;
    }

    Ok(FeatureEval {
        y,
        jac: Jacobian::from_dense(scene.jacobian_mode(), jac),
    })
}

/// Inequality residual (2 components) keeping the point of application
/// inside the intersection of the two shapes.
///
/// Row `k` is the signed distance of the POA to shape `k`; both rows are
/// nonpositive iff the POA lies within the geometric intersection region.
pub fn poa_in_intersection(scene: &mut Scene, a: FrameId, b: FrameId) -> Result<FeatureEval> {
    let dim = scene.joint_dim()?;
    let fx = exchange_for(scene, a, b)?;
    let poa = fx.position;

    let mut y = DVector::zeros(2);
    let mut jac = DMatrix::zeros(2, dim);
    for (row, id) in [a, b].into_iter().enumerate() {
        let world = scene.world_pose(id)?;
        let shape = scene
            .frame(id)
            .and_then(|f| f.shape().cloned())
            .ok_or(KinError::MissingShape { frame: id })?;
        let (sd, grad) = kin_model::point_signed_distance(&shape, &world, &poa)?;
        y[row] = sd;

        // The POA itself is a decision variable...
        for k in 0..3 {
            jac[(row, fx.q_index() + k)] = grad[k];
        }
        // ...and the shape moves with its frame.
        let local = world.inverse_transform_point(&poa);
        let (_, frame_jac) = scene.kinematics_pos(id, Some(local.coords))?;
        let dense = frame_jac.to_dense();
        for c in 0..dim {
            jac[(row, c)] -= grad.x * dense[(0, c)] + grad.y * dense[(1, c)] + grad.z * dense[(2, c)];
        }
    }

    Ok(FeatureEval {
        y,
        jac: Jacobian::from_dense(scene.jacobian_mode(), jac),
    })
}

/// Stacked smooth penalty combining [`force_is_normal`] and
/// [`force_is_complementary`] (6 components), for sum-of-squares soft
/// constraint formulations.
pub fn contact_sos(scene: &mut Scene, a: FrameId, b: FrameId) -> Result<FeatureEval> {
    let normal = force_is_normal(scene, a, b)?;
    let compl = force_is_complementary(scene, a, b)?;
    let dim = normal.jac.ncols();

    let mut y = DVector::zeros(6);
    y.rows_mut(0, 3).copy_from(&normal.y);
    y.rows_mut(3, 3).copy_from(&compl.y);

    let mut jac = DMatrix::zeros(6, dim);
    jac.view_mut((0, 0), (3, dim)).copy_from(&normal.jac.to_dense());
    jac.view_mut((3, 0), (3, dim)).copy_from(&compl.jac.to_dense());

    Ok(FeatureEval {
        y,
        jac: Jacobian::from_dense(scene.jacobian_mode(), jac),
    })
}

/// Velocity-order feature over a `(previous, current)` configuration tuple.
///
/// `y = (Δ_current − Δ_previous) / τ` where `Δ = p_a − p_b` tracks the
/// witness points of the current proxy as material points in both
/// configurations. The Jacobian is `[−J_prev | J_curr] / τ` over the stacked
/// coordinates of both scenes. The two scenes must share frame topology
/// (the same model at consecutive time steps).
pub fn contact_velocity(
    prev: &mut Scene,
    curr: &mut Scene,
    a: FrameId,
    b: FrameId,
    tau: f64,
) -> Result<FeatureEval> {
    let proxy = proxy_for(curr, a, b)?;
    let la = curr
        .world_pose(a)?
        .inverse_transform_point(&proxy.witness_a);
    let lb = curr
        .world_pose(b)?
        .inverse_transform_point(&proxy.witness_b);

    let (pa_c, ja_c) = curr.kinematics_pos(a, Some(la.coords))?;
    let (pb_c, jb_c) = curr.kinematics_pos(b, Some(lb.coords))?;
    let (pa_p, ja_p) = prev.kinematics_pos(a, Some(la.coords))?;
    let (pb_p, jb_p) = prev.kinematics_pos(b, Some(lb.coords))?;

    let delta_c = pa_c - pb_c;
    let delta_p = pa_p - pb_p;
    let y = DVector::from_column_slice(((delta_c - delta_p) / tau).as_slice());

    let dim_p = ja_p.ncols();
    let dim_c = ja_c.ncols();
    let mut jac = DMatrix::zeros(3, dim_p + dim_c);
    jac.view_mut((0, 0), (3, dim_p))
        .copy_from(&((ja_p.to_dense() - jb_p.to_dense()) / -tau));
    jac.view_mut((0, dim_p), (3, dim_c))
        .copy_from(&((ja_c.to_dense() - jb_c.to_dense()) / tau));

    Ok(FeatureEval {
        y,
        jac: Jacobian::from_dense(curr.jacobian_mode(), jac),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kin_model::ShapeGeometry;
    use kin_types::Pose;
    use nalgebra::{Point3, Vector3};

    /// Two free spheres along X with a force exchange between them.
    fn sphere_pair(gap: f64) -> (Scene, FrameId, FrameId) {
        let mut scene = Scene::new();
        let a = scene
            .add_object("a", None, ShapeGeometry::sphere(1.0), Pose::identity())
            .unwrap();
        let b = scene
            .add_object(
                "b",
                None,
                ShapeGeometry::sphere(1.0),
                Pose::from_position(Point3::new(2.0 + gap, 0.0, 0.0)),
            )
            .unwrap();
        scene.add_force_exchange(a, b);
        (scene, a, b)
    }

    #[test]
    fn test_aligned_force_has_zero_normal_residual() {
        let (mut scene, a, b) = sphere_pair(0.05);
        // Proxy normal is +X; an X-aligned force leaves no tangential part.
        scene.force_between_mut(a, b).unwrap().force = Vector3::new(2.5, 0.0, 0.0);
        let eval = force_is_normal(&mut scene, a, b).unwrap();
        assert_relative_eq!(eval.y.norm(), 0.0, epsilon = 1e-12);

        scene.force_between_mut(a, b).unwrap().force = Vector3::new(2.5, 1.0, 0.0);
        let eval = force_is_normal(&mut scene, a, b).unwrap();
        assert_relative_eq!(eval.y[1], 1.0, epsilon = 1e-12);
        assert_eq!(eval.jac.nrows(), 3);
    }

    #[test]
    fn test_complementarity_zero_cases() {
        // Separated pair, zero force: residual is zero.
        let (mut scene, a, b) = sphere_pair(0.05);
        let eval = force_is_complementary(&mut scene, a, b).unwrap();
        assert_relative_eq!(eval.y.norm(), 0.0, epsilon = 1e-12);

        // Nonzero force at positive separation: residual scales with both.
        scene.force_between_mut(a, b).unwrap().force = Vector3::new(4.0, 0.0, 0.0);
        let eval = force_is_complementary(&mut scene, a, b).unwrap();
        assert_relative_eq!(eval.y[0], 0.05 * 4.0, epsilon = 1e-12);

        // Touching pair carries force freely.
        let (mut scene, a, b) = sphere_pair(0.0);
        scene.force_between_mut(a, b).unwrap().force = Vector3::new(4.0, 0.0, 0.0);
        let eval = force_is_complementary(&mut scene, a, b).unwrap();
        assert_relative_eq!(eval.y.norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_poa_inside_and_outside_intersection() {
        // Overlapping spheres: their surfaces cross near x = 1.
        let (mut scene, a, b) = sphere_pair(-0.4);
        scene.force_between_mut(a, b).unwrap().position = Point3::new(0.8, 0.0, 0.0);
        let eval = poa_in_intersection(&mut scene, a, b).unwrap();
        assert!(eval.y[0] <= 0.0, "inside shape a: {}", eval.y[0]);
        assert!(eval.y[1] <= 0.0, "inside shape b: {}", eval.y[1]);

        scene.force_between_mut(a, b).unwrap().position = Point3::new(-1.5, 0.0, 0.0);
        let eval = poa_in_intersection(&mut scene, a, b).unwrap();
        assert!(eval.y.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_sos_stacks_residuals() {
        let (mut scene, a, b) = sphere_pair(0.1);
        scene.force_between_mut(a, b).unwrap().force = Vector3::new(1.0, 2.0, 0.0);
        let eval = contact_sos(&mut scene, a, b).unwrap();
        assert_eq!(eval.dim(), 6);
        let normal = force_is_normal(&mut scene, a, b).unwrap();
        assert_relative_eq!(eval.y.rows(0, 3).norm(), normal.y.norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_velocity_feature_zero_for_identical_tuple() {
        let (mut scene, a, b) = sphere_pair(0.05);
        let mut prev = scene.clone();
        let eval = contact_velocity(&mut prev, &mut scene, a, b, 0.01).unwrap();
        assert_relative_eq!(eval.y.norm(), 0.0, epsilon = 1e-12);
        // Stacked over both configurations' coordinates.
        assert_eq!(eval.jac.ncols(), 12);
    }

    #[test]
    fn test_missing_exchange_is_an_error() {
        let mut scene = Scene::new();
        let a = scene
            .add_object("a", None, ShapeGeometry::sphere(1.0), Pose::identity())
            .unwrap();
        let b = scene
            .add_object(
                "b",
                None,
                ShapeGeometry::sphere(1.0),
                Pose::from_position(Point3::new(2.05, 0.0, 0.0)),
            )
            .unwrap();
        let err = force_is_normal(&mut scene, a, b).unwrap_err();
        assert!(matches!(err, KinError::MissingForceExchange { .. }));
    }
}
