//! Physics-engine synchronization bridge.
//!
//! This crate connects the frame-graph model (`kin-model`) to an external
//! rigid-body simulator. The model stays authoritative for structure; the
//! engine owns integration, contacts and constraints. The bridge translates
//! between the two every step.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PhysicsEngine (trait)                │
//! │  step · push_kinematic/full · pull_dynamic · change_kind │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ implemented by
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                       RapierBridge                       │
//! │  build protocol: links → recenter → classify → actors    │
//! │  dense FrameId → actor map, articulated chains, ropes    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Actor life cycle
//!
//! `unattached → {static | kinematic | dynamic | soft}` at build time; the
//! only legal transition afterwards is `kinematic ↔ dynamic` via
//! [`PhysicsEngine::change_body_kind`]. Tearing down the whole bridge (drop)
//! is the only way back.
//!
//! # Example
//!
//! ```
//! use kin_bridge::{BridgeOptions, PhysicsEngine, RapierBridge};
//! use kin_model::Scene;
//! use kin_types::{Inertia, Pose, ShapeGeometry};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut scene = Scene::new();
//! let cube = scene
//!     .add_object(
//!         "cube",
//!         None,
//!         ShapeGeometry::box_shape(Vector3::new(0.5, 0.5, 0.5)),
//!         Pose::from_position(Point3::new(0.0, 0.0, 3.0)),
//!     )
//!     .unwrap();
//! scene.set_inertia(cube, Some(Inertia::box_shape(1.0, Vector3::new(0.5, 0.5, 0.5))));
//!
//! let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::default()).unwrap();
//! bridge.push_full_state(&mut scene, None).unwrap();
//! bridge.step(0.01);
//! bridge.pull_dynamic_states(&mut scene, None).unwrap();
//! assert!(scene.world_pose(cube).unwrap().position.z < 3.0);
//! ```

#![doc(html_root_url = "https://docs.rs/kin-bridge/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod engine;
mod error;
mod rapier;
mod shape;

pub use engine::{BridgeOptions, PhysicsEngine, VelocityTable};
pub use error::BridgeError;
pub use rapier::RapierBridge;
pub use shape::{build_collision_shape, build_group_shape};
