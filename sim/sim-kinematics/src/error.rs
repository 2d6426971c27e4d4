//! Error types for robot model construction.

use sim_types::{JointId, SimError};
use thiserror::Error;

/// Errors that can occur while building or querying a robot model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A joint with this name already exists.
    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    /// A joint ID does not belong to this model.
    #[error("unknown joint: {0}")]
    UnknownJoint(JointId),

    /// No joint has this name.
    #[error("joint not found: {0}")]
    JointNotFound(String),

    /// The joint does not carry a single scalar coordinate.
    #[error("joint {name} is {kind}, expected a one-DOF joint")]
    NotScalarJoint {
        /// Name of the joint.
        name: String,
        /// Its joint type.
        kind: sim_types::JointType,
    },

    /// Body data failed validation.
    #[error(transparent)]
    Invalid(#[from] SimError),
}

impl ModelError {
    /// Create a joint-not-found error.
    #[must_use]
    pub fn joint_not_found(name: impl Into<String>) -> Self {
        Self::JointNotFound(name.into())
    }
}
