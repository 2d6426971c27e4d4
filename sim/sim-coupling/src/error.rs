//! Error types for the coupling layer.

use sim_kernel::KernelError;
use sim_kinematics::ModelError;
use sim_types::{JointType, SensorId, SimError};
use thiserror::Error;

use crate::wrench::BodyRef;
use crate::RobotId;

/// Errors raised while registering or ticking coupled robots.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CouplingError {
    /// A child joint has a type the kernel boundary cannot express.
    #[error("joint {joint} has unsupported type {kind} (only revolute children are supported)")]
    UnsupportedJoint {
        /// Joint name.
        joint: String,
        /// Its type.
        kind: JointType,
    },

    /// The root joint is not a 6-DOF floating joint.
    #[error("root joint {joint} must be floating, found {kind}")]
    NonFloatingRoot {
        /// Root joint name.
        joint: String,
        /// Its type.
        kind: JointType,
    },

    /// Two joints share a name.
    #[error("duplicate joint name in topology: {0}")]
    DuplicateJointName(String),

    /// No link index was assigned to a joint.
    #[error("no link index for joint {0}")]
    MissingLinkIndex(String),

    /// A wrench was added in a different frame than the entry already holds.
    #[error("wrench frame mismatch for {0}")]
    FrameMismatch(BodyRef),

    /// The robot ID is not registered.
    #[error("unknown robot: {0}")]
    UnknownRobot(RobotId),

    /// A sensor failed to update.
    #[error("sensor {sensor} failed: {reason}")]
    Sensor {
        /// Sensor that failed.
        sensor: SensorId,
        /// What went wrong.
        reason: String,
    },

    /// Invalid simulation data or configuration.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// Robot model error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Physics kernel error.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl CouplingError {
    /// Create a sensor error.
    #[must_use]
    pub fn sensor(sensor: SensorId, reason: impl Into<String>) -> Self {
        Self::Sensor {
            sensor,
            reason: reason.into(),
        }
    }

    /// Whether this error comes from robot setup (fatal, not retried).
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::UnsupportedJoint { .. }
            | Self::NonFloatingRoot { .. }
            | Self::DuplicateJointName(_)
            | Self::MissingLinkIndex(_) => true,
            Self::Sim(err) => err.is_config_error(),
            _ => false,
        }
    }
}
