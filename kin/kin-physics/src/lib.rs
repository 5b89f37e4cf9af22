//! Unified API for the `kin` articulated-scene stack.
//!
//! This crate re-exports the complete stack:
//!
//! - [`kin_types`] - foundational data types (poses, inertia, shapes, errors)
//! - [`kin_model`] - the frame-graph scene with its derived caches
//! - [`kin_contact`] - contact constraint features
//! - [`kin_bridge`] - physics-engine bridge and rapier backend
//!
//! # Quick Start
//!
//! ```
//! use kin_physics::prelude::*;
//! use nalgebra::{Point3, Vector3};
//!
//! // Model a falling crate over a ground plane.
//! let mut scene = Scene::new();
//! let cube = scene
//!     .add_object(
//!         "crate",
//!         None,
//!         ShapeGeometry::box_shape(Vector3::new(0.5, 0.5, 0.5)),
//!         Pose::from_position(Point3::new(0.0, 0.0, 3.0)),
//!     )
//!     .unwrap();
//! scene.set_inertia(cube, Some(Inertia::box_shape(1.0, Vector3::new(0.5, 0.5, 0.5))));
//!
//! // Hand it to the simulator and run a quarter second.
//! let mut bridge = RapierBridge::new(&mut scene, BridgeOptions::default()).unwrap();
//! bridge.push_full_state(&mut scene, None).unwrap();
//! for _ in 0..25 {
//!     bridge.step(0.01);
//! }
//! bridge.pull_dynamic_states(&mut scene, None).unwrap();
//! assert!(scene.world_pose(cube).unwrap().position.z < 3.0);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 kin-physics (this crate)                │
//! │                Unified API / re-exports                 │
//! └─────────────────────────────────────────────────────────┘
//!                             │
//!          ┌──────────────────┼──────────────────┐
//!          ▼                  ▼                  ▼
//! ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//! │  kin-contact  │  │  kin-bridge   │  │   (your I/O)  │
//! │   features    │  │ rapier bridge │  │  viz, import  │
//! └───────┬───────┘  └───────┬───────┘  └───────┬───────┘
//!         └──────────────────┼──────────────────┘
//!                            ▼
//!                  ┌───────────────┐
//!                  │   kin-model   │
//!                  │  Scene, q, J  │
//!                  └───────┬───────┘
//!                          ▼
//!                  ┌───────────────┐
//!                  │   kin-types   │
//!                  │  data structs │
//!                  └───────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/kin-physics/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

pub use kin_bridge;
pub use kin_contact;
pub use kin_model;
pub use kin_types;

// Re-export nalgebra for convenience.
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// ```
/// use kin_physics::prelude::*;
/// ```
pub mod prelude {
    // Foundation
    pub use kin_types::{
        BodyKind, FrameId, Inertia, KinError, Pose, ShapeGeometry, Twist,
    };

    // Scene and kinematics
    pub use kin_model::{
        Axis, ForceExchange, Frame, Jacobian, JacobianMode, Joint, JointKind, Proxy, Scene,
        SurfaceParams,
    };

    // Contact features
    pub use kin_contact::{
        contact_sos, contact_velocity, force_is_complementary, force_is_normal,
        poa_in_intersection, FeatureEval,
    };

    // Bridge
    pub use kin_bridge::{
        BridgeError, BridgeOptions, PhysicsEngine, RapierBridge, VelocityTable,
    };
}
