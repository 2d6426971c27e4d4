//! Unified API for coupled articulated-robot simulation.
//!
//! This crate re-exports the complete stack:
//!
//! - [`sim_types`] - Core data types (poses, twists, wrenches, joints, config)
//! - [`sim_kinematics`] - Robot model in generalized coordinates, twist differentiator
//! - [`sim_kernel`] - Physics-kernel boundary and the reference kernel
//! - [`sim_coupling`] - Topology, link adapters, wrench accumulator, tick orchestrator
//! - [`sim_sensor`] - IMU, force/torque and touch sensors
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Headless RL training environments
//! - Hardware robot control systems
//! - Analysis and planning tools
//!
//! # Quick Start
//!
//! ```
//! use sim_physics::prelude::*;
//!
//! // A floating torso with one hinged arm.
//! let mut robot = RobotModel::new(
//!     "arm",
//!     JointSpec::floating("root", RigidBody::new("torso", MassProperties::sphere(2.0, 0.1))),
//! )
//! .unwrap();
//! let elbow = robot
//!     .add_joint(
//!         robot.root(),
//!         JointSpec::revolute(
//!             "elbow",
//!             JointAxis::y(),
//!             RigidBody::new("forearm", MassProperties::point_mass(0.5)),
//!         ),
//!     )
//!     .unwrap();
//!
//! let mut sim = Simulation::new(ReferenceKernel::default(), SimulationConfig::default()).unwrap();
//! let id = sim.add_robot(robot).unwrap();
//!
//! let mut controller = JointCommandController::new();
//! controller.set_command(JointCommand::effort(elbow, 0.1));
//! sim.add_controller(id, controller).unwrap();
//! let imu = sim.add_sensor(Imu::new(SensorId::new(1), id, ImuConfig::default()));
//!
//! sim.run(100).unwrap();
//!
//! let base = sim.robot(id).unwrap().base();
//! println!("Base height after 100 ticks: {:.3} m", base.pose.position.z);
//! assert!(sim.reading(imu).is_some());
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      sim-physics (this crate)                   │
//! │                     Unified API / re-exports                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//!                    ┌─────────────┴─────────────┐
//!                    ▼                           ▼
//!          ┌─────────────────┐         ┌─────────────────┐
//!          │   sim-sensor    │────────▶│  sim-coupling   │
//!          │ IMU, F/T, touch │         │ push/step/pull  │
//!          └─────────────────┘         └────────┬────────┘
//!                                               │
//!                         ┌─────────────────────┴─────┐
//!                         ▼                           ▼
//!               ┌─────────────────┐         ┌─────────────────┐
//!               │ sim-kinematics  │         │   sim-kernel    │
//!               │  RobotModel     │         │ PhysicsKernel   │
//!               └────────┬────────┘         └────────┬────────┘
//!                        └─────────────┬─────────────┘
//!                                      ▼
//!                            ┌─────────────────┐
//!                            │    sim-types    │
//!                            │  Data structs   │
//!                            └─────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/sim-physics/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use sim_coupling;
pub use sim_kernel;
pub use sim_kinematics;
pub use sim_sensor;
pub use sim_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// ```
/// use sim_physics::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core types from sim-types
    // ========================================================================

    // Motion
    pub use sim_types::{MassProperties, Pose, SpatialAcceleration, Twist, Wrench};

    // Joints
    pub use sim_types::{JointAxis, JointId, JointLimits, JointState, JointType};

    // Commands
    pub use sim_types::{JointCommand, JointCommandType};

    // Configuration
    pub use sim_types::{Gravity, SimulationConfig};

    // Sensor output
    pub use sim_types::{SensorData, SensorId, SensorReading, SensorType};

    // Errors
    pub use sim_types::SimError;

    // ========================================================================
    // Robot model from sim-kinematics
    // ========================================================================

    pub use sim_kinematics::{
        differentiator, FloatingBaseState, Joint, JointSpec, ModelError, RigidBody, RobotModel,
    };

    // ========================================================================
    // Kernel boundary from sim-kernel
    // ========================================================================

    pub use sim_kernel::{
        BaseDescriptor, KernelError, LinkHandle, LinkIndex, MultibodyId, PhysicsKernel,
        ReferenceKernel, RevoluteJointDescriptor,
    };

    // ========================================================================
    // Coupling from sim-coupling
    // ========================================================================

    pub use sim_coupling::{
        BodyRef, Controller, CouplingError, JointCommandController, LinkAdapter, RobotId,
        SensorContext, Simulation, TickReport, TickSensor, Topology, WrenchAccumulator,
    };

    // ========================================================================
    // Sensors from sim-sensor
    // ========================================================================

    pub use sim_sensor::{
        ForceTorqueSensor, ForceTorqueSensorConfig, Imu, ImuConfig, SensorError, TouchSensor,
        TouchSensorConfig,
    };

    // ========================================================================
    // Math types from nalgebra
    // ========================================================================

    pub use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _pose = Pose::identity();
        let _mass = MassProperties::sphere(1.0, 0.5);
        let _config = SimulationConfig::default();
        let _kernel = ReferenceKernel::default();
    }

    #[test]
    fn test_basic_simulation() {
        let robot = RobotModel::new(
            "ball",
            JointSpec::floating("root", RigidBody::new("ball", MassProperties::sphere(1.0, 0.5))),
        )
        .unwrap();

        let mut sim =
            Simulation::new(ReferenceKernel::default(), SimulationConfig::default()).unwrap();
        let id = sim.add_robot(robot).unwrap();
        let report = sim.run(10).unwrap();

        assert_eq!(report.tick, 10);
        let base = sim.robot(id).unwrap().base();
        assert!(base.pose.position.z < 0.0, "body should have fallen");
        sim.check_finite().unwrap();
    }
}
