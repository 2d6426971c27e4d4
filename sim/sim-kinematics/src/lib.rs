//! Kinematic robot model and floating-base differentiation.
//!
//! This crate holds the generalized-coordinate side of a coupled simulation:
//!
//! - [`RobotModel`] - An arena of joints (each carrying one rigid body) with
//!   a floating base, per-joint position/velocity/acceleration/effort and
//!   cached world transforms
//! - [`differentiator`] - Pure functions that recover a body-frame twist and a
//!   spatial acceleration from two successive base poses
//!
//! Joint IDs are handed out in insertion order and a joint can only be added
//! under an existing parent, so iterating the arena visits every parent before
//! its children.
//!
//! # Example
//!
//! ```
//! use sim_kinematics::{JointSpec, RigidBody, RobotModel};
//! use sim_types::{JointAxis, MassProperties};
//! use nalgebra::{Isometry3, Vector3};
//!
//! let base = RigidBody::new("torso", MassProperties::sphere(5.0, 0.2));
//! let mut robot = RobotModel::new("pendulum", JointSpec::floating("root", base)).unwrap();
//!
//! let link = RigidBody::new("link", MassProperties::point_mass(1.0));
//! let hinge = JointSpec::revolute("hinge", JointAxis::y(), link)
//!     .with_offset(Isometry3::translation(0.0, 0.0, -0.5));
//! let id = robot.add_joint(robot.root(), hinge).unwrap();
//!
//! robot.update_frames();
//! let frame = robot.body_world_transform(id).unwrap();
//! assert!((frame.translation.vector - Vector3::new(0.0, 0.0, -0.5)).norm() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-kinematics/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

pub mod differentiator;
mod error;
mod model;

pub use differentiator::{Differentiated, PoseSample, TwistSample};
pub use error::ModelError;
pub use model::{FloatingBaseState, Joint, JointSpec, RigidBody, RobotModel};

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
