//! Joint types for articulated bodies.
//!
//! Joints connect rigid bodies and constrain their relative motion. The
//! coupling layer supports a floating 6-DOF root and one-DOF revolute
//! children; the other kinds exist so that robot descriptions can name them
//! and be rejected with a useful error.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a joint (and the body it carries) in a robot model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(pub usize);

impl JointId {
    /// Create a new joint ID.
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for JointId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Type of joint constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    /// Fixed joint - no relative motion allowed.
    Fixed,
    /// Revolute joint - rotation around a single axis.
    Revolute,
    /// Prismatic joint - translation along a single axis.
    Prismatic,
    /// Spherical joint - rotation around all axes (ball joint).
    Spherical,
    /// Free joint - 6 DOF (floating base).
    Free,
}

impl JointType {
    /// Get the number of degrees of freedom for this joint type.
    #[must_use]
    pub const fn dof(self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Revolute | Self::Prismatic => 1,
            Self::Spherical => 3,
            Self::Free => 6,
        }
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Revolute => write!(f, "revolute"),
            Self::Prismatic => write!(f, "prismatic"),
            Self::Spherical => write!(f, "spherical"),
            Self::Free => write!(f, "free"),
        }
    }
}

/// Position, velocity and effort limits for a one-DOF joint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Minimum position (radians for revolute joints).
    pub position_min: f64,
    /// Maximum position.
    pub position_max: f64,
    /// Maximum velocity magnitude.
    pub velocity_max: f64,
    /// Maximum effort (torque) magnitude.
    pub effort_max: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl JointLimits {
    /// Create limits with specified bounds.
    #[must_use]
    pub fn new(position_min: f64, position_max: f64, velocity_max: f64, effort_max: f64) -> Self {
        Self {
            position_min,
            position_max,
            velocity_max,
            effort_max,
        }
    }

    /// Create unlimited joint limits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            position_min: f64::NEG_INFINITY,
            position_max: f64::INFINITY,
            velocity_max: f64::INFINITY,
            effort_max: f64::INFINITY,
        }
    }

    /// Create symmetric position limits around zero.
    #[must_use]
    pub fn symmetric(position_range: f64, velocity_max: f64, effort_max: f64) -> Self {
        Self {
            position_min: -position_range,
            position_max: position_range,
            velocity_max,
            effort_max,
        }
    }

    /// Check if a position is within limits.
    #[must_use]
    pub fn position_in_range(&self, position: f64) -> bool {
        position >= self.position_min && position <= self.position_max
    }

    /// Clamp an effort to be within limits.
    #[must_use]
    pub fn clamp_effort(&self, effort: f64) -> f64 {
        effort.clamp(-self.effort_max, self.effort_max)
    }

    /// Check if position limits are bounded (not infinite).
    #[must_use]
    pub fn has_position_limits(&self) -> bool {
        self.position_min.is_finite() && self.position_max.is_finite()
    }
}

/// Generalized-coordinate state of a one-DOF joint.
///
/// `effort` is what controllers command; `applied_effort` is what the physics
/// kernel reports it actually applied during the last step.
///
/// # Example
///
/// ```
/// use sim_types::JointState;
///
/// let state = JointState::new(0.5, 0.1);
/// assert_eq!(state.position, 0.5);
/// assert_eq!(state.acceleration, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointState {
    /// Joint angle (rad).
    pub position: f64,
    /// Joint rate (rad/s).
    pub velocity: f64,
    /// Joint acceleration (rad/s²).
    pub acceleration: f64,
    /// Commanded torque (Nm).
    pub effort: f64,
    /// Torque the kernel applied in the last step (Nm).
    pub applied_effort: f64,
}

impl JointState {
    /// Create a joint state with the given position and velocity.
    #[must_use]
    pub fn new(position: f64, velocity: f64) -> Self {
        Self {
            position,
            velocity,
            ..Self::default()
        }
    }

    /// Create a joint state at the given position with zero velocity.
    #[must_use]
    pub fn at_position(position: f64) -> Self {
        Self::new(position, 0.0)
    }

    /// Check if the state contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }
}

/// Axis of a one-DOF joint, in the joint's own frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointAxis {
    /// Unit axis direction.
    pub direction: Vector3<f64>,
}

impl Default for JointAxis {
    fn default() -> Self {
        Self::z()
    }
}

impl JointAxis {
    /// Create a joint axis along the given direction (will be normalized).
    ///
    /// A degenerate direction falls back to +Z.
    #[must_use]
    pub fn new(direction: Vector3<f64>) -> Self {
        let norm = direction.norm();
        if norm < 1e-10 {
            Self::z()
        } else {
            Self {
                direction: direction / norm,
            }
        }
    }

    /// X-axis.
    #[must_use]
    pub fn x() -> Self {
        Self {
            direction: Vector3::x(),
        }
    }

    /// Y-axis.
    #[must_use]
    pub fn y() -> Self {
        Self {
            direction: Vector3::y(),
        }
    }

    /// Z-axis.
    #[must_use]
    pub fn z() -> Self {
        Self {
            direction: Vector3::z(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_joint_id() {
        let id = JointId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(id.to_string(), "Joint(42)");
    }

    #[test]
    fn test_joint_type_dof() {
        assert_eq!(JointType::Fixed.dof(), 0);
        assert_eq!(JointType::Revolute.dof(), 1);
        assert_eq!(JointType::Spherical.dof(), 3);
        assert_eq!(JointType::Free.dof(), 6);
        assert_eq!(JointType::Prismatic.to_string(), "prismatic");
    }

    #[test]
    fn test_joint_limits_clamp_effort() {
        let limits = JointLimits::symmetric(1.0, 5.0, 10.0);
        assert_relative_eq!(limits.clamp_effort(25.0), 10.0);
        assert_relative_eq!(limits.clamp_effort(-25.0), -10.0);
        assert!(limits.has_position_limits());
        assert!(!JointLimits::unlimited().has_position_limits());
    }

    #[test]
    fn test_joint_state_defaults() {
        let state = JointState::new(1.0, 2.0);
        assert_eq!(state.position, 1.0);
        assert_eq!(state.velocity, 2.0);
        assert_eq!(state.effort, 0.0);
        assert!(state.is_finite());
    }

    #[test]
    fn test_joint_axis_normalizes() {
        let axis = JointAxis::new(Vector3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(axis.direction, Vector3::new(1.0, 1.0, 0.0).normalize());
        assert_eq!(JointAxis::new(Vector3::zeros()), JointAxis::z());
    }
}
