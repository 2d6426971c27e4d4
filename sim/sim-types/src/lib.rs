//! Core types for coupled robot simulation.
//!
//! This crate provides the data shared by the kinematic model, the physics
//! kernel boundary and the coupling layer:
//!
//! - [`Pose`], [`Twist`], [`SpatialAcceleration`] - Rigid body motion
//! - [`Wrench`] - Force/torque pairs
//! - [`JointState`], [`JointType`], [`JointCommand`] - Articulated joints
//! - [`SimulationConfig`] - Fixed timestep, gravity
//! - [`SensorReading`] - Post-update sensor output
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no physics and no integration.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{Pose, Twist};
//! use nalgebra::{Point3, UnitQuaternion, Vector3};
//!
//! let pose = Pose::from_position_rotation(
//!     Point3::new(0.0, 0.0, 1.0),
//!     UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5),
//! );
//! let body_twist = Twist::linear(Vector3::new(1.0, 0.0, 0.0));
//! let world_twist = body_twist.rotated(&pose.rotation);
//!
//! assert!((world_twist.linear.norm() - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod config;
mod dynamics;
mod error;
mod joint;
mod sensor;
mod wrench;

pub use body::{MassProperties, Pose, SpatialAcceleration, Twist};
pub use config::SimulationConfig;
pub use dynamics::{Gravity, JointCommand, JointCommandType};
pub use error::SimError;
pub use joint::{JointAxis, JointId, JointLimits, JointState, JointType};
pub use sensor::{SensorData, SensorId, SensorReading, SensorType};
pub use wrench::Wrench;

// Re-export math types for convenience
pub use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

/// Result type for simulation data validation.
pub type Result<T> = std::result::Result<T, SimError>;
