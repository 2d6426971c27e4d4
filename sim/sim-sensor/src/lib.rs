//! Sensors for coupled robot simulation.
//!
//! Every sensor implements [`TickSensor`](sim_coupling::TickSensor) and is
//! updated once per tick, after the pull phase, from the post-update state:
//!
//! - [`Imu`] - Accelerometer and gyroscope on a floating base, fed by the
//!   reconstructed base twist and spatial acceleration
//! - [`ForceTorqueSensor`] - 6-axis wrench on a body, fed by the wrench
//!   accumulator
//! - [`TouchSensor`] - Contact flag from the accumulated force on a body
//!
//! # Layer 0
//!
//! No rendering or engine dependencies. Usable in headless training loops,
//! hardware-in-the-loop rigs, and analysis tools.
//!
//! # Example
//!
//! ```
//! use sim_coupling::Simulation;
//! use sim_kernel::ReferenceKernel;
//! use sim_kinematics::{JointSpec, RigidBody, RobotModel};
//! use sim_sensor::{Imu, ImuConfig};
//! use sim_types::{MassProperties, SensorId, SimulationConfig};
//!
//! let robot = RobotModel::new(
//!     "rover",
//!     JointSpec::floating("root", RigidBody::new("base", MassProperties::point_mass(1.0))),
//! )
//! .unwrap();
//!
//! let mut sim = Simulation::new(ReferenceKernel::default(), SimulationConfig::default()).unwrap();
//! let id = sim.add_robot(robot).unwrap();
//! let imu = sim.add_sensor(Imu::new(SensorId::new(1), id, ImuConfig::default()));
//!
//! sim.run(10).unwrap();
//! assert!(sim.reading(imu).is_some());
//! ```

#![doc(html_root_url = "https://docs.rs/sim-sensor/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod error;
mod force_torque;
mod imu;
mod touch;

use nalgebra::{UnitQuaternion, Vector3};
use sim_coupling::{BodyRef, SensorContext};
use sim_types::SensorId;

pub use error::SensorError;
pub use force_torque::{ForceTorqueReading, ForceTorqueSensor, ForceTorqueSensorConfig};
pub use imu::{Imu, ImuConfig, ImuReading};
pub use touch::{TouchReading, TouchSensor, TouchSensorConfig};

/// Result type for sensor configuration.
pub type Result<T> = std::result::Result<T, SensorError>;

/// World orientation of the body a sensor is mounted on.
fn body_rotation(
    ctx: &SensorContext<'_>,
    sensor: SensorId,
    body: BodyRef,
) -> Result<UnitQuaternion<f64>> {
    let model = ctx.robot(body.robot).ok_or(SensorError::UnknownRobot {
        sensor,
        robot: body.robot,
    })?;
    model
        .body_world_transform(body.joint)
        .map(|iso| iso.rotation)
        .map_err(|_| SensorError::UnknownBody { sensor, body })
}

/// Scale a vector down to `max` magnitude.
fn saturate(v: Vector3<f64>, max: f64) -> Vector3<f64> {
    let magnitude = v.norm();
    if magnitude > max && magnitude > 0.0 {
        v * (max / magnitude)
    } else {
        v
    }
}
