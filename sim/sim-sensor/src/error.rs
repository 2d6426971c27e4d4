//! Sensor errors.

use sim_coupling::{BodyRef, CouplingError, RobotId};
use sim_types::SensorId;
use thiserror::Error;

/// Errors raised while configuring or updating a sensor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    /// The sensor is attached to a robot the simulation does not have.
    #[error("{sensor}: unknown robot {robot}")]
    UnknownRobot {
        /// Sensor that failed.
        sensor: SensorId,
        /// Missing robot.
        robot: RobotId,
    },

    /// The sensor is attached to a body the robot does not have.
    #[error("{sensor}: {} has no joint {}", body.robot, body.joint)]
    UnknownBody {
        /// Sensor that failed.
        sensor: SensorId,
        /// Missing body.
        body: BodyRef,
    },

    /// Invalid sensor configuration.
    #[error("{sensor}: invalid configuration: {reason}")]
    InvalidConfig {
        /// Sensor that failed.
        sensor: SensorId,
        /// Description of the problem.
        reason: String,
    },
}

impl SensorError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(sensor: SensorId, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            sensor,
            reason: reason.into(),
        }
    }

    /// The sensor that raised the error.
    #[must_use]
    pub fn sensor(&self) -> SensorId {
        match self {
            Self::UnknownRobot { sensor, .. }
            | Self::UnknownBody { sensor, .. }
            | Self::InvalidConfig { sensor, .. } => *sensor,
        }
    }
}

impl From<SensorError> for CouplingError {
    fn from(err: SensorError) -> Self {
        Self::sensor(err.sensor(), err.to_string())
    }
}
