//! Integration tests for the rapier bridge: build classification, the
//! push/pull synchronization contract, and object-type transitions.

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use kin_bridge::{BridgeError, BridgeOptions, PhysicsEngine, RapierBridge, VelocityTable};
use kin_model::{Axis, JointKind, Scene};
use kin_types::{BodyKind, FrameId, Inertia, Pose, ShapeGeometry, Twist};
use nalgebra::{Point3, Vector3};

fn dynamic_box(scene: &mut Scene, name: &str, position: Point3<f64>) -> FrameId {
    let half = Vector3::new(0.5, 0.5, 0.5);
    let id = scene
        .add_object(
            name,
            None,
            ShapeGeometry::box_shape(half),
            Pose::from_position(position),
        )
        .unwrap();
    scene.set_inertia(id, Some(Inertia::box_shape(1.0, half)));
    id
}

#[test]
fn classification_static_kinematic_dynamic() {
    let mut scene = Scene::new();
    // Shape, no joint, no inertia anywhere: static.
    let wall = scene
        .add_object(
            "wall",
            None,
            ShapeGeometry::box_shape(Vector3::new(1.0, 1.0, 1.0)),
            Pose::from_position(Point3::new(5.0, 0.0, 1.0)),
        )
        .unwrap();

    // Joint + shape, no inertia in the subtree: kinematic.
    let arm = scene
        .add_object(
            "arm",
            None,
            ShapeGeometry::box_shape(Vector3::new(0.2, 0.2, 0.2)),
            Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
        )
        .unwrap();
    scene.set_joint(arm, Some(JointKind::Hinge(Axis::X)));

    // Same structure plus a co-located massive child: dynamic.
    let tool = scene
        .add_object(
            "tool",
            None,
            ShapeGeometry::box_shape(Vector3::new(0.2, 0.2, 0.2)),
            Pose::from_position(Point3::new(0.0, 3.0, 1.0)),
        )
        .unwrap();
    scene.set_joint(tool, Some(JointKind::Hinge(Axis::X)));
    let mass = scene.add_frame("tool_mass", Some(tool)).unwrap();
    scene.set_inertia(mass, Some(Inertia::sphere(2.0, 0.1)));

    let bridge = RapierBridge::new(&mut scene, BridgeOptions::default()).unwrap();
    assert_eq!(bridge.body_kind(wall), Some(BodyKind::Static));
    assert_eq!(bridge.body_kind(arm), Some(BodyKind::Kinematic));
    assert_eq!(bridge.body_kind(tool), Some(BodyKind::Dynamic));
    assert_eq!(bridge.body_kind(mass), None);
    assert_eq!(bridge.actor_count(), 3);
}

#[test]
fn push_pull_roundtrip_without_step() {
    let mut scene = Scene::new();
    let cube = dynamic_box(&mut scene, "cube", Point3::new(0.0, 0.0, 2.0));
    let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap();

    // Move the model, push, pull right back: the pose must survive losslessly.
    scene
        .set_world_pose(cube, Pose::from_position(Point3::new(1.5, -0.5, 4.0)))
        .unwrap();
    bridge.push_full_state(&mut scene, None).unwrap();
    // Model-side pose scrambled on purpose; pull must restore it.
    scene
        .set_world_pose(cube, Pose::from_position(Point3::new(9.0, 9.0, 9.0)))
        .unwrap();
    bridge.pull_dynamic_states(&mut scene, None).unwrap();

    let pose = scene.world_pose(cube).unwrap();
    assert_relative_eq!(
        pose.position.coords,
        Vector3::new(1.5, -0.5, 4.0),
        epsilon = 1e-9
    );
}

#[test]
fn constant_velocity_drift() {
    let mut scene = Scene::new();
    let cube = dynamic_box(&mut scene, "cube", Point3::new(0.0, 0.0, 5.0));
    let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap();

    let mut velocities = VelocityTable::new(scene.frame_count());
    velocities.set(cube, Twist::linear(Vector3::new(1.0, 0.0, 0.0)));
    bridge.push_full_state(&mut scene, Some(&velocities)).unwrap();

    for _ in 0..100 {
        bridge.step(0.01);
    }

    let mut out = VelocityTable::default();
    bridge
        .pull_dynamic_states(&mut scene, Some(&mut out))
        .unwrap();
    let pose = scene.world_pose(cube).unwrap();
    // One second at 1 m/s along +X, within solver/substep tolerance.
    assert!(
        (pose.position.x - 1.0).abs() < 1e-2,
        "drifted to x = {}",
        pose.position.x
    );
    assert_relative_eq!(pose.position.z, 5.0, epsilon = 1e-6);
    assert_relative_eq!(out.get(cube).linear.x, 1.0, epsilon = 1e-6);
}

#[test]
fn change_body_kind_is_idempotent() {
    let mut scene = Scene::new();
    let cube = dynamic_box(&mut scene, "cube", Point3::new(0.0, 0.0, 2.0));
    let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap();

    bridge
        .change_body_kind(cube, BodyKind::Kinematic, None)
        .unwrap();
    assert_eq!(bridge.body_kind(cube), Some(BodyKind::Kinematic));
    // Second identical request: logged no-op, no state change.
    bridge
        .change_body_kind(cube, BodyKind::Kinematic, None)
        .unwrap();
    assert_eq!(bridge.body_kind(cube), Some(BodyKind::Kinematic));

    // And back to dynamic with a seeded velocity.
    bridge
        .change_body_kind(cube, BodyKind::Dynamic, Some(Vector3::new(0.5, 0.0, 0.0)))
        .unwrap();
    assert_eq!(bridge.body_kind(cube), Some(BodyKind::Dynamic));

    // Static is not a legal post-build transition.
    let err = bridge
        .change_body_kind(cube, BodyKind::Static, None)
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedKindTransition { .. }));
}

#[test]
fn change_body_kind_without_actor_fails() {
    let mut scene = Scene::new();
    let cube = dynamic_box(&mut scene, "cube", Point3::new(0.0, 0.0, 2.0));
    let sub = scene.add_frame("sub", Some(cube)).unwrap();
    let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap();

    let err = bridge
        .change_body_kind(sub, BodyKind::Kinematic, None)
        .unwrap_err();
    assert!(matches!(err, BridgeError::NoActor { .. }));
}

#[test]
fn multibody_rejects_unsupported_joint_kind() {
    let mut scene = Scene::new();
    let base = scene.add_frame("base", None).unwrap();
    scene.set_inertia(base, Some(Inertia::sphere(1.0, 0.2)));
    scene.set_shape(base, Some(ShapeGeometry::sphere(0.2)));
    let joint = scene.add_frame("joint", Some(base)).unwrap();
    scene.set_joint(joint, Some(JointKind::Hinge(Axis::Y)));
    let link = scene.add_frame("link", Some(joint)).unwrap();
    scene.set_relative_pose(link, Pose::from_position(Point3::new(0.0, 0.5, 0.0)));
    scene.set_inertia(link, Some(Inertia::sphere(1.0, 0.2)));
    scene.set_shape(link, Some(ShapeGeometry::sphere(0.2)));

    let options = BridgeOptions {
        enable_multibody: true,
        ..BridgeOptions::zero_gravity()
    };
    let err = RapierBridge::new(&mut scene, options).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnsupportedJointKind {
            kind: JointKind::Hinge(Axis::Y)
        }
    ));
}

#[test]
fn multibody_builds_hinge_x_chain() {
    let mut scene = Scene::new();
    let base = scene.add_frame("base", None).unwrap();
    scene.set_inertia(base, Some(Inertia::sphere(1.0, 0.2)));
    scene.set_shape(base, Some(ShapeGeometry::sphere(0.2)));
    let joint = scene.add_frame("joint", Some(base)).unwrap();
    scene.set_joint(joint, Some(JointKind::Hinge(Axis::X)));
    let link = scene.add_frame("link", Some(joint)).unwrap();
    scene.set_relative_pose(link, Pose::from_position(Point3::new(0.0, 0.5, 0.0)));
    scene.set_inertia(link, Some(Inertia::sphere(1.0, 0.2)));
    scene.set_shape(link, Some(ShapeGeometry::sphere(0.2)));

    let options = BridgeOptions {
        enable_multibody: true,
        ..BridgeOptions::zero_gravity()
    };
    let bridge = RapierBridge::new(&mut scene, options).unwrap();
    assert_eq!(bridge.body_kind(base), Some(BodyKind::Dynamic));
    assert_eq!(bridge.body_kind(link), Some(BodyKind::Dynamic));
    assert!(bridge.supports_joint(JointKind::Hinge(Axis::X)));
    assert!(!bridge.supports_joint(JointKind::Hinge(Axis::Y)));
    assert!(!bridge.supports_joint(JointKind::Ball));
}

#[test]
fn build_recenters_group_onto_compound_com() {
    let mut scene = Scene::new();
    // Representative without shape or inertia; two massive shaped children.
    let rep = scene.add_frame("rep", None).unwrap();
    let a = scene
        .add_object(
            "a",
            Some(rep),
            ShapeGeometry::sphere(0.3),
            Pose::from_position(Point3::new(2.0, 0.0, 0.0)),
        )
        .unwrap();
    scene.set_inertia(a, Some(Inertia::sphere(3.0, 0.3)));
    let b = scene
        .add_object(
            "b",
            Some(rep),
            ShapeGeometry::sphere(0.3),
            Pose::from_position(Point3::new(-2.0, 0.0, 0.0)),
        )
        .unwrap();
    scene.set_inertia(b, Some(Inertia::sphere(1.0, 0.3)));

    let a_before = scene.world_pose(a).unwrap();
    let b_before = scene.world_pose(b).unwrap();

    let bridge = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap();
    assert_eq!(bridge.body_kind(rep), Some(BodyKind::Dynamic));

    // Total mass preserved, COM zeroed, children numerically unmoved.
    let inertia = *scene.frame(rep).unwrap().inertia().unwrap();
    assert_relative_eq!(inertia.mass, 4.0, epsilon = 1e-12);
    assert_relative_eq!(inertia.com.norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(
        scene.world_pose(rep).unwrap().position.x,
        1.0,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        scene.world_pose(a).unwrap().position.coords,
        a_before.position.coords,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        scene.world_pose(b).unwrap().position.coords,
        b_before.position.coords,
        epsilon = 1e-12
    );
}

#[test]
fn soft_rope_builds_and_pulls_vertices() {
    let mut scene = Scene::new();
    let rope = scene
        .add_object(
            "rope",
            None,
            ShapeGeometry::convex_mesh(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, -0.2),
                Point3::new(0.0, 0.0, -0.4),
                Point3::new(0.0, 0.0, -0.6),
            ]),
            Pose::from_position(Point3::new(0.0, 0.0, 2.0)),
        )
        .unwrap();
    scene.set_inertia(rope, Some(Inertia::point_mass(0.4).with_kind(BodyKind::Soft)));

    let options = BridgeOptions {
        enable_soft_bodies: true,
        ..BridgeOptions::zero_gravity()
    };
    let mut bridge = RapierBridge::new(&mut scene, options).unwrap();
    assert_eq!(bridge.body_kind(rope), Some(BodyKind::Soft));

    // No step: pulled node positions reproduce the authored vertices.
    let mut velocities = VelocityTable::default();
    bridge
        .pull_dynamic_states(&mut scene, Some(&mut velocities))
        .unwrap();
    let frame = scene.frame(rope).unwrap();
    let Some(ShapeGeometry::ConvexMesh { vertices }) = frame.shape() else {
        panic!("rope lost its mesh");
    };
    assert_eq!(vertices.len(), 4);
    assert_relative_eq!(vertices[1].z, -0.2, epsilon = 1e-9);
    // Soft actors contribute no velocity.
    assert_relative_eq!(velocities.get(rope).linear.norm(), 0.0, epsilon = 1e-12);
}

#[test]
fn soft_without_option_is_rejected() {
    let mut scene = Scene::new();
    let rope = scene
        .add_object(
            "rope",
            None,
            ShapeGeometry::convex_mesh(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, -0.2),
            ]),
            Pose::identity(),
        )
        .unwrap();
    scene.set_inertia(rope, Some(Inertia::point_mass(0.1).with_kind(BodyKind::Soft)));

    let err = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap_err();
    assert!(matches!(err, BridgeError::SoftBodiesDisabled { .. }));
}

#[test]
fn kinematic_push_tracks_commanded_pose() {
    let mut scene = Scene::new();
    let arm = scene
        .add_object(
            "arm",
            None,
            ShapeGeometry::box_shape(Vector3::new(0.2, 0.2, 0.2)),
            Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
        )
        .unwrap();
    scene.set_joint(arm, Some(JointKind::Free));

    let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::zero_gravity()).unwrap();
    assert_eq!(bridge.body_kind(arm), Some(BodyKind::Kinematic));

    scene
        .set_world_pose(arm, Pose::from_position(Point3::new(0.0, 1.0, 1.0)))
        .unwrap();
    bridge.push_kinematic_states(&mut scene).unwrap();
    bridge.step(0.02);

    let body = bridge
        .bodies()
        .iter()
        .find(|(_, b)| b.is_kinematic())
        .map(|(_, b)| *b.position())
        .unwrap();
    assert_relative_eq!(body.translation.vector.y, 1.0, epsilon = 1e-9);
}
