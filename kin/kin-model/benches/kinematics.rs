//! Kinematics hot-path benchmarks: joint-state writes and Jacobian queries
//! on a serial hinge chain.

use criterion::{criterion_group, criterion_main, Criterion};
use kin_model::{Axis, FrameId, JointKind, Pose, Scene};
use nalgebra::Point3;
use std::hint::black_box;

fn serial_chain(links: usize) -> (Scene, FrameId) {
    let mut scene = Scene::new();
    let mut parent = scene.add_frame("base", None).expect("unique name");
    let mut tip = parent;
    for i in 0..links {
        let joint = scene
            .add_frame(&format!("j{i}"), Some(parent))
            .expect("unique name");
        scene.set_joint(joint, Some(JointKind::Hinge(Axis::X)));
        let link = scene
            .add_frame(&format!("l{i}"), Some(joint))
            .expect("unique name");
        scene.set_relative_pose(link, Pose::from_position(Point3::new(0.0, 0.3, 0.0)));
        parent = link;
        tip = link;
    }
    (scene, tip)
}

fn bench_kinematics(c: &mut Criterion) {
    let links = 16;
    let (mut scene, tip) = serial_chain(links);
    let q: Vec<f64> = (0..links).map(|i| 0.1 * i as f64).collect();
    scene.set_joint_state(&q).expect("dimension matches");

    c.bench_function("set_joint_state_16_links", |b| {
        b.iter(|| scene.set_joint_state(black_box(&q)))
    });

    c.bench_function("kinematics_pos_16_links", |b| {
        b.iter(|| {
            scene.set_joint_state(black_box(&q)).expect("valid q");
            scene.kinematics_pos(tip, None).expect("valid frame")
        })
    });
}

criterion_group!(benches, bench_kinematics);
criterion_main!(benches);
