//! Articulated frame-graph model with lazily-synchronized derived state.
//!
//! This crate provides the authoritative model of an articulated scene: a
//! forest of named coordinate frames carrying joints, shapes, inertias and
//! inter-frame forces, plus the derived views a consumer needs — active-DOF
//! index ranges, the generalized coordinate vector `q`, world poses,
//! Jacobians and collision proxies.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Scene                              │
//! │  frames (arena) · forces · proxies · q · dirty bits         │
//! └────────────┬───────────────────────────┬────────────────────┘
//!              │ ensure_indexed_dofs /     │ kinematics_pos/vec/quat
//!              │ ensure_q / ensure_poses   │ fwd_propagate_velocities
//!              ▼                           ▼
//!      derived caches                Jacobians ([`Jacobian`])
//! ```
//!
//! Derived state is guarded by explicit per-cache dirty bits; structural
//! edits invalidate, the next read recomputes. Nothing here integrates or
//! solves — bridges push this model into an external simulator and pull the
//! results back.
//!
//! # Example
//!
//! ```
//! use kin_model::{JointKind, Scene};
//! use kin_types::Pose;
//! use nalgebra::Point3;
//! use std::f64::consts::FRAC_PI_2;
//!
//! let mut scene = Scene::new();
//! let base = scene.add_frame("base", None).unwrap();
//! let mount = scene.add_frame("mount", Some(base)).unwrap();
//! scene.set_relative_pose(mount, Pose::from_position(Point3::new(0.0, 0.0, 1.0)));
//! let elbow = scene.add_frame("elbow", Some(mount)).unwrap();
//! scene.set_joint(elbow, Some(JointKind::Hinge(kin_model::Axis::X)));
//! let tip = scene.add_frame("tip", Some(elbow)).unwrap();
//! scene.set_relative_pose(tip, Pose::from_position(Point3::new(0.0, 1.0, 0.0)));
//!
//! scene.set_joint_state(&[FRAC_PI_2]).unwrap();
//! let pose = scene.world_pose(tip).unwrap();
//! assert!((pose.position.z - 2.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/kin-model/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,   // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
)]

mod force;
mod frame;
mod jacobian;
mod joint;
mod kinematics;
mod proxy;
mod scene;

pub use force::ForceExchange;
pub use frame::{Frame, SurfaceParams};
pub use jacobian::{Jacobian, JacobianMode};
pub use joint::{Axis, Joint, JointKind};
pub use proxy::{point_signed_distance, Proxy};
pub use scene::Scene;

// Re-export the shared foundation for convenience.
pub use kin_types::{BodyKind, FrameId, Inertia, KinError, Pose, Result, ShapeGeometry, Twist};

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DVector, Point3, Vector3};
    use std::f64::consts::FRAC_PI_2;

    /// base → mount(+Z) → elbow [hingeX] → tip(+Y), optionally with masses.
    fn hinge_chain() -> (Scene, FrameId, FrameId, FrameId) {
        let mut scene = Scene::new();
        let base = scene.add_frame("base", None).unwrap();
        let mount = scene.add_frame("mount", Some(base)).unwrap();
        scene.set_relative_pose(mount, Pose::from_position(Point3::new(0.0, 0.0, 1.0)));
        let elbow = scene.add_frame("elbow", Some(mount)).unwrap();
        scene.set_joint(elbow, Some(JointKind::Hinge(Axis::X)));
        let tip = scene.add_frame("tip", Some(elbow)).unwrap();
        scene.set_relative_pose(tip, Pose::from_position(Point3::new(0.0, 1.0, 0.0)));
        (scene, base, elbow, tip)
    }

    #[test]
    fn test_hinge_rotates_tip() {
        let (mut scene, _, _, tip) = hinge_chain();
        // Rest pose first.
        let rest = scene.world_pose(tip).unwrap();
        assert_relative_eq!(rest.position.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rest.position.z, 1.0, epsilon = 1e-12);

        scene.set_joint_state(&[FRAC_PI_2]).unwrap();
        let pose = scene.world_pose(tip).unwrap();
        // +Y arm rotated 90° about +X points along +Z.
        assert_relative_eq!(pose.position.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_q_dimension_invariant() {
        let (mut scene, _, elbow, tip) = hinge_chain();
        assert_eq!(scene.joint_dim().unwrap(), 1);

        scene.set_joint(tip, Some(JointKind::Free));
        assert_eq!(scene.joint_dim().unwrap(), 8);

        let base = scene.frame_id("base").unwrap();
        scene.add_force_exchange(base, tip);
        assert_eq!(scene.joint_dim().unwrap(), 14);
        assert_eq!(scene.joint_state().unwrap().len(), 14);

        // Deselect the hinge: its DOF disappears from q.
        scene.select_joints(&[elbow], true);
        assert_eq!(scene.joint_dim().unwrap(), 13);
        assert_eq!(scene.joint_state().unwrap().len(), 13);
    }

    #[test]
    fn test_top_sort_parents_first() {
        let (scene, ..) = hinge_chain();
        let order = scene.calc_top_sort().unwrap();
        assert_eq!(order.len(), scene.frame_count());
        let position: hashbrown::HashMap<FrameId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        for frame in scene.frames() {
            if let Some(p) = frame.parent() {
                assert!(position[&p] < position[&frame.id()]);
            }
        }
    }

    #[test]
    fn test_attach_rejects_cycle() {
        let (mut scene, base, _, tip) = hinge_chain();
        let err = scene.attach(tip, base).unwrap_err();
        assert!(matches!(err, KinError::StructuralCycle { .. }));
        assert!(scene.check_consistency());
    }

    #[test]
    fn test_attach_preserves_world_pose() {
        let mut scene = Scene::new();
        let a = scene.add_frame("a", None).unwrap();
        scene.set_relative_pose(a, Pose::from_position(Point3::new(1.0, 0.0, 0.0)));
        let b = scene.add_frame("b", None).unwrap();
        scene.set_relative_pose(b, Pose::from_position(Point3::new(0.0, 5.0, 0.0)));

        let before = scene.world_pose(b).unwrap();
        scene.attach(a, b).unwrap();
        let after = scene.world_pose(b).unwrap();
        assert_relative_eq!(
            before.position.coords,
            after.position.coords,
            epsilon = 1e-12
        );
        assert_eq!(scene.frame(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_links_partition() {
        let (mut scene, base, elbow, tip) = hinge_chain();
        let reps = scene.links();
        // Everything above the hinge is one group, the hinge subtree another.
        assert_eq!(reps, vec![base, elbow]);
        let group = scene.rigid_group(base);
        assert!(group.contains(&base));
        assert!(!group.contains(&elbow));
        assert!(scene.rigid_group(elbow).contains(&tip));

        // A rigid joint does not split a group.
        scene.set_joint(tip, Some(JointKind::Rigid));
        assert_eq!(scene.links(), vec![base, elbow]);
    }

    #[test]
    fn test_compound_inertia_and_recentering() {
        let mut scene = Scene::new();
        let rep = scene.add_frame("rep", None).unwrap();
        let heavy = scene.add_frame("heavy", Some(rep)).unwrap();
        scene.set_relative_pose(heavy, Pose::from_position(Point3::new(2.0, 0.0, 0.0)));
        scene.set_inertia(heavy, Some(Inertia::sphere(3.0, 0.5)));
        let light = scene.add_frame("light", Some(rep)).unwrap();
        scene.set_relative_pose(light, Pose::from_position(Point3::new(-2.0, 0.0, 0.0)));
        scene.set_inertia(light, Some(Inertia::sphere(1.0, 0.5)));

        let compound = scene.compound_inertia(rep).unwrap().unwrap();
        assert_relative_eq!(compound.mass, 4.0, epsilon = 1e-12);
        assert_relative_eq!(compound.com.x, 1.0, epsilon = 1e-12);

        // Relocate the representative to the COM; children stay put in world.
        let heavy_before = scene.world_pose(heavy).unwrap();
        let light_before = scene.world_pose(light).unwrap();
        scene.set_inertia(rep, Some(compound));
        scene.shift_origin(rep, compound.com).unwrap();

        let rep_inertia = *scene.frame(rep).unwrap().inertia().unwrap();
        assert_relative_eq!(rep_inertia.com.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rep_inertia.mass, 4.0, epsilon = 1e-12);
        assert_relative_eq!(scene.world_pose(rep).unwrap().position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            scene.world_pose(heavy).unwrap().position.coords,
            heavy_before.position.coords,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            scene.world_pose(light).unwrap().position.coords,
            light_before.position.coords,
            epsilon = 1e-12
        );
    }

    fn finite_difference_jacobian(
        scene: &mut Scene,
        tip: FrameId,
        offset: Option<Vector3<f64>>,
        q0: &[f64],
    ) -> nalgebra::DMatrix<f64> {
        let h = 1e-6;
        let n = q0.len();
        let mut jac = nalgebra::DMatrix::zeros(3, n);
        for k in 0..n {
            let mut qp = q0.to_vec();
            qp[k] += h;
            scene.set_joint_state(&qp).unwrap();
            let (pp, _) = scene.kinematics_pos(tip, offset).unwrap();
            let mut qm = q0.to_vec();
            qm[k] -= h;
            scene.set_joint_state(&qm).unwrap();
            let (pm, _) = scene.kinematics_pos(tip, offset).unwrap();
            for row in 0..3 {
                jac[(row, k)] = (pp[row] - pm[row]) / (2.0 * h);
            }
        }
        scene.set_joint_state(q0).unwrap();
        jac
    }

    #[test]
    fn test_position_jacobian_matches_finite_differences() {
        let mut scene = Scene::new();
        let base = scene.add_frame("base", None).unwrap();
        let j1 = scene.add_frame("j1", Some(base)).unwrap();
        scene.set_joint(j1, Some(JointKind::Hinge(Axis::X)));
        let l1 = scene.add_frame("l1", Some(j1)).unwrap();
        scene.set_relative_pose(l1, Pose::from_position(Point3::new(0.0, 0.8, 0.0)));
        let j2 = scene.add_frame("j2", Some(l1)).unwrap();
        scene.set_joint(j2, Some(JointKind::Hinge(Axis::Z)));
        let l2 = scene.add_frame("l2", Some(j2)).unwrap();
        scene.set_relative_pose(l2, Pose::from_position(Point3::new(0.4, 0.3, 0.0)));
        let j3 = scene.add_frame("j3", Some(l2)).unwrap();
        scene.set_joint(j3, Some(JointKind::Prismatic(Axis::Y)));
        let tip = scene.add_frame("tip", Some(j3)).unwrap();
        scene.set_relative_pose(tip, Pose::from_position(Point3::new(0.0, 0.2, 0.1)));

        let q0 = [0.3, -0.7, 0.25];
        scene.set_joint_state(&q0).unwrap();
        let offset = Some(Vector3::new(0.05, 0.1, -0.02));
        let (_, jac) = scene.kinematics_pos(tip, offset).unwrap();
        let analytic = jac.to_dense();
        let numeric = finite_difference_jacobian(&mut scene, tip, offset, &q0);
        assert_relative_eq!(analytic, numeric, epsilon = 1e-5);
    }

    #[test]
    fn test_vector_jacobian_matches_finite_differences() {
        let (mut scene, _, _, tip) = hinge_chain();
        let q0 = [0.4];
        scene.set_joint_state(&q0).unwrap();
        let v = Vector3::new(0.0, 1.0, 0.0);
        let (_, jac) = scene.kinematics_vec(tip, v).unwrap();
        let analytic = jac.to_dense();

        let h = 1e-6;
        scene.set_joint_state(&[q0[0] + h]).unwrap();
        let (vp, _) = scene.kinematics_vec(tip, v).unwrap();
        scene.set_joint_state(&[q0[0] - h]).unwrap();
        let (vm, _) = scene.kinematics_vec(tip, v).unwrap();
        for row in 0..3 {
            assert_relative_eq!(
                analytic[(row, 0)],
                (vp[row] - vm[row]) / (2.0 * h),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_jacobian_representations_agree() {
        let (mut scene, _, _, tip) = hinge_chain();
        scene.set_joint_state(&[0.6]).unwrap();
        let (_, dense) = scene.kinematics_pos(tip, None).unwrap();
        let reference = dense.to_dense();
        for mode in [JacobianMode::Sparse, JacobianMode::RowShifted] {
            scene.set_jacobian_mode(mode);
            let (_, jac) = scene.kinematics_pos(tip, None).unwrap();
            assert_relative_eq!(jac.to_dense(), reference, epsilon = 1e-12);
        }
        scene.set_jacobian_mode(JacobianMode::Suppressed);
        let (_, jac) = scene.kinematics_pos(tip, None).unwrap();
        assert_eq!((jac.nrows(), jac.ncols()), (3, 1));
    }

    #[test]
    fn test_velocity_propagation_hinge() {
        let (mut scene, _, elbow, tip) = hinge_chain();
        let qdot = DVector::from_column_slice(&[2.0]);
        let twists = scene.fwd_propagate_velocities(&qdot).unwrap();

        let tw_elbow = twists[elbow.index()];
        assert_relative_eq!(tw_elbow.angular.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(tw_elbow.linear.norm(), 0.0, epsilon = 1e-12);

        // Tip sits 1m along +Y from the axis: v = ω × r = (2,0,0) × (0,1,0).
        let tw_tip = twists[tip.index()];
        assert_relative_eq!(tw_tip.linear.z, 2.0, epsilon = 1e-12);
        assert_relative_eq!(tw_tip.angular.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_set_joint_state_rejects_bad_dimension() {
        let (mut scene, ..) = hinge_chain();
        let err = scene.set_joint_state(&[0.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            KinError::DimensionMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_proxies_between_groups_only() {
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
        // Same rigid group as `a`: never proxied against it.
        scene
            .add_object(
                "a_sub",
                Some(a),
                ShapeGeometry::sphere(0.1),
                Pose::from_position(Point3::new(0.5, 0.0, 0.0)),
            )
            .unwrap();

        scene.ensure_proxies().unwrap();
        let proxy = *scene.proxy_between(a, b).unwrap();
        assert_relative_eq!(proxy.distance, 0.05, epsilon = 1e-12);
        assert!(scene
            .proxies()
            .iter()
            .all(|p| !(p.connects(a, scene.frame_id("a_sub").unwrap()))));

        // Penetration shows up in the total.
        scene.set_relative_pose(b, Pose::from_position(Point3::new(1.9, 0.0, 0.0)));
        assert_relative_eq!(scene.total_penetration().unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_prune_and_consistency() {
        let (mut scene, ..) = hinge_chain();
        let lonely = scene.add_frame("lonely", None).unwrap();
        assert!(scene.frame(lonely).is_some());
        // Both the lonely root and the bare tip leaf go away.
        let removed = scene.prune_useless_frames();
        assert_eq!(removed, 2);
        assert!(scene.frame_by_name("lonely").is_none());
        assert!(scene.frame_by_name("tip").is_none());
        assert!(scene.check_consistency());
        assert!(scene.frame_by_name("elbow").is_some());
    }

    #[test]
    fn test_select_joints_complement() {
        let (mut scene, _, elbow, tip) = hinge_chain();
        scene.set_joint(tip, Some(JointKind::Hinge(Axis::Z)));
        scene.select_joints(&[elbow], false);
        assert_eq!(scene.joint_dim().unwrap(), 1);
        scene.select_joints(&[elbow], true);
        assert_eq!(scene.joint_dim().unwrap(), 1);
        let tip_joint = scene.frame(tip).unwrap().joint().unwrap();
        assert!(tip_joint.active);
    }

    #[test]
    fn test_frame_state_roundtrip() {
        let (mut scene, ..) = hinge_chain();
        scene.set_joint_state(&[0.3]).unwrap();
        let state = scene.frame_state().unwrap();
        scene.set_frame_state(&state).unwrap();
        let again = scene.frame_state().unwrap();
        for (a, b) in state.iter().zip(again.iter()) {
            assert_relative_eq!(a.position.coords, b.position.coords, epsilon = 1e-12);
        }
        // q is re-derivable from the written poses.
        let q = scene.joint_state().unwrap();
        assert_relative_eq!(q[0], 0.3, epsilon = 1e-12);
    }
}
