//! Dynamics types: joint commands and gravity.

use crate::JointId;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A command to a joint actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointCommand {
    /// The joint to command.
    pub joint: JointId,
    /// The command type and value.
    pub command: JointCommandType,
}

impl JointCommand {
    /// Create a position command.
    #[must_use]
    pub fn position(joint: JointId, target: f64) -> Self {
        Self {
            joint,
            command: JointCommandType::Position(target),
        }
    }

    /// Create a velocity command.
    #[must_use]
    pub fn velocity(joint: JointId, target: f64) -> Self {
        Self {
            joint,
            command: JointCommandType::Velocity(target),
        }
    }

    /// Create a torque command.
    #[must_use]
    pub fn effort(joint: JointId, value: f64) -> Self {
        Self {
            joint,
            command: JointCommandType::Effort(value),
        }
    }

    /// Create a full PD command with feedforward torque.
    #[must_use]
    pub fn pd_control(
        joint: JointId,
        position: f64,
        velocity: f64,
        kp: f64,
        kd: f64,
        feedforward: f64,
    ) -> Self {
        Self {
            joint,
            command: JointCommandType::PdControl {
                position,
                velocity,
                kp,
                kd,
                feedforward,
            },
        }
    }
}

/// Types of commands that can be sent to joints.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointCommandType {
    /// Target position (servo mode, default gains).
    Position(f64),

    /// Target velocity (default gain).
    Velocity(f64),

    /// Direct torque.
    Effort(f64),

    /// Full PD control with gains and feedforward.
    PdControl {
        /// Target position.
        position: f64,
        /// Target velocity.
        velocity: f64,
        /// Position gain (stiffness).
        kp: f64,
        /// Velocity gain (damping).
        kd: f64,
        /// Feedforward torque.
        feedforward: f64,
    },

    /// Passive joint.
    Disable,
}

impl JointCommandType {
    /// Default stiffness for [`JointCommandType::Position`].
    pub const DEFAULT_KP: f64 = 100.0;
    /// Default damping for position and velocity commands.
    pub const DEFAULT_KD: f64 = 10.0;

    /// Compute the effort for this command given the current joint state.
    ///
    /// `effort = kp * (target_pos - pos) + kd * (target_vel - vel) + feedforward`
    #[must_use]
    pub fn compute_effort(&self, current_position: f64, current_velocity: f64) -> f64 {
        match *self {
            Self::PdControl {
                position,
                velocity,
                kp,
                kd,
                feedforward,
            } => kp * (position - current_position) + kd * (velocity - current_velocity) + feedforward,
            Self::Position(target) => {
                Self::DEFAULT_KP * (target - current_position) - Self::DEFAULT_KD * current_velocity
            }
            Self::Velocity(target) => Self::DEFAULT_KD * (target - current_velocity),
            Self::Effort(e) => e,
            Self::Disable => 0.0,
        }
    }
}

/// Gravity configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration due to gravity (m/s²), in the inertial frame.
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity (9.81 m/s² in -Z direction).
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Zero gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub fn custom(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }

    /// Gravitational force on a mass.
    #[must_use]
    pub fn force_on_mass(&self, mass: f64) -> Vector3<f64> {
        self.acceleration * mass
    }
}
