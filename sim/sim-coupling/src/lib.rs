//! Coupling between a generalized-coordinate robot model and a physics kernel.
//!
//! The kernel advances rigid-multibody state in its own representation; the
//! robot stack works in generalized coordinates. Every tick this crate copies
//! state one way into the kernel (push), lets it step, and copies it back
//! (pull), reconstructing the floating-base twist and spatial acceleration the
//! kernel does not report.
//!
//! # Components
//!
//! - [`Topology`] - Joint names to kernel link indices, parents first
//! - [`LinkAdapter`] - Per-joint push/pull (root and revolute variants)
//! - [`WrenchAccumulator`] - Constraint wrenches collected during pull
//! - [`Controller`] - Commanded efforts before push
//! - [`TickSensor`] - Readings after pull
//! - [`Simulation`] - The tick orchestrator
//!
//! # Example
//!
//! ```
//! use sim_coupling::{JointCommandController, Simulation};
//! use sim_kernel::ReferenceKernel;
//! use sim_kinematics::{JointSpec, RigidBody, RobotModel};
//! use sim_types::{JointAxis, JointCommand, MassProperties, SimulationConfig};
//!
//! let body = |n: &str| RigidBody::new(n, MassProperties::point_mass(1.0));
//! let mut robot = RobotModel::new("arm", JointSpec::floating("root", body("base"))).unwrap();
//! let shoulder = robot
//!     .add_joint(robot.root(), JointSpec::revolute("shoulder", JointAxis::z(), body("upper")))
//!     .unwrap();
//!
//! let config = SimulationConfig::with_timestep(0.01).zero_gravity();
//! let mut sim = Simulation::new(ReferenceKernel::default(), config).unwrap();
//! let id = sim.add_robot(robot).unwrap();
//!
//! let mut controller = JointCommandController::new();
//! controller.set_command(JointCommand::position(shoulder, 0.5));
//! sim.add_controller(id, controller).unwrap();
//!
//! sim.run(50).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/sim-coupling/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod adapter;
mod controller;
mod error;
mod orchestrator;
mod sensor;
mod topology;
mod wrench;

pub use adapter::{LinkAdapter, RevoluteAdapter, RootAdapter};
pub use controller::{Controller, JointCommandController};
pub use error::CouplingError;
pub use orchestrator::{Simulation, TickReport};
pub use sensor::{SensorContext, TickSensor};
pub use topology::{Topology, TopologyEntry};
pub use wrench::{BodyRef, FramedWrench, RobotId, WrenchAccumulator};

/// Result type for coupling operations.
pub type Result<T> = std::result::Result<T, CouplingError>;
