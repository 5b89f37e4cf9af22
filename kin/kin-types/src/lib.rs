//! Core types for articulated frame-graph models.
//!
//! This crate provides the foundational types shared by the `kin` stack:
//!
//! - [`Pose`] / [`Twist`] - rigid transforms and spatial velocities
//! - [`Inertia`] / [`BodyKind`] - mass properties and body classification
//! - [`ShapeGeometry`] - collision/visual shape primitives
//! - [`FrameId`] - stable arena index of a frame in a scene
//! - [`KinError`] - shared error type for model operations
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no tree structure, no caches and
//! no engine state. They're the common language between:
//!
//! - The frame-graph model (`kin-model`)
//! - Contact feature evaluation (`kin-contact`)
//! - Physics-engine bridges (`kin-bridge`)
//! - Import/export and visualization collaborators
//!
//! # Coordinate System
//!
//! Right-handed, Z-up by default. Gravity direction is a bridge option, not a
//! property of these types.
//!
//! # Example
//!
//! ```
//! use kin_types::{Pose, Twist};
//! use nalgebra::{Point3, Vector3};
//!
//! let pose = Pose::from_position(Point3::new(0.0, 0.0, 1.0));
//! let twist = Twist::linear(Vector3::new(1.0, 0.0, 0.0));
//!
//! assert_eq!(pose.transform_point(&Point3::origin()).z, 1.0);
//! assert!(twist.angular.norm() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/kin-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,   // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,       // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,     // Error docs added where non-obvious
)]

mod error;
mod id;
mod inertia;
mod pose;
mod shape;

pub use error::KinError;
pub use id::FrameId;
pub use inertia::{BodyKind, Inertia};
pub use pose::{Pose, Twist};
pub use shape::ShapeGeometry;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, KinError>;
