//! Controllers: compute commanded efforts before the push phase.

use hashbrown::HashMap;
use sim_kinematics::RobotModel;
use sim_types::{JointCommand, JointCommandType, JointId};
use tracing::warn;

use crate::Result;

/// Computes commanded joint efforts from the pre-physics state.
pub trait Controller {
    /// Write commanded efforts into `model`.
    fn compute(&mut self, model: &mut RobotModel, time: f64) -> Result<()>;

    /// Name for logging.
    fn name(&self) -> &str {
        "controller"
    }
}

/// Applies per-joint [`JointCommand`]s, clamped to each joint's effort limit.
///
/// Joints without a command are left untouched.
///
/// # Example
///
/// ```
/// use sim_coupling::{Controller, JointCommandController};
/// use sim_kinematics::{JointSpec, RigidBody, RobotModel};
/// use sim_types::{JointAxis, JointCommand, MassProperties};
///
/// let body = |n: &str| RigidBody::new(n, MassProperties::point_mass(1.0));
/// let mut robot = RobotModel::new("r", JointSpec::floating("root", body("base"))).unwrap();
/// let hinge = robot
///     .add_joint(robot.root(), JointSpec::revolute("hinge", JointAxis::z(), body("link")))
///     .unwrap();
///
/// let mut controller = JointCommandController::new();
/// controller.set_command(JointCommand::effort(hinge, 2.5));
/// controller.compute(&mut robot, 0.0).unwrap();
/// assert_eq!(robot.joint_state(hinge).unwrap().effort, 2.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JointCommandController {
    commands: HashMap<JointId, JointCommandType>,
}

impl JointCommandController {
    /// Create a controller with no commands.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the command for a joint.
    pub fn set_command(&mut self, command: JointCommand) {
        self.commands.insert(command.joint, command.command);
    }

    /// Remove the command for a joint.
    pub fn clear_command(&mut self, joint: JointId) -> Option<JointCommandType> {
        self.commands.remove(&joint)
    }

    /// Current command for a joint.
    #[must_use]
    pub fn command(&self, joint: JointId) -> Option<&JointCommandType> {
        self.commands.get(&joint)
    }

    /// Number of commanded joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no joint is commanded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Controller for JointCommandController {
    fn compute(&mut self, model: &mut RobotModel, _time: f64) -> Result<()> {
        for (&joint, command) in &self.commands {
            let limits = match model.joint(joint) {
                Some(j) => j.limits,
                None => {
                    warn!(%joint, "command for unknown joint ignored");
                    continue;
                }
            };
            let state = model.joint_state_mut(joint)?;
            let effort = command.compute_effort(state.position, state.velocity);
            state.effort = limits.clamp_effort(effort);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "joint-command"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::CouplingError;
    use approx::assert_relative_eq;
    use sim_kinematics::{JointSpec, RigidBody};
    use sim_types::{JointAxis, JointLimits, MassProperties};

    fn robot() -> (RobotModel, JointId) {
        let body = |n: &str| RigidBody::new(n, MassProperties::point_mass(1.0));
        let mut model = RobotModel::new("r", JointSpec::floating("root", body("b"))).unwrap();
        let hinge = model
            .add_joint(
                model.root(),
                JointSpec::revolute("hinge", JointAxis::z(), body("l"))
                    .with_limits(JointLimits::symmetric(3.0, 10.0, 5.0))
                    .with_state(0.2, 0.0),
            )
            .unwrap();
        (model, hinge)
    }

    #[test]
    fn test_pd_command() {
        let (mut model, hinge) = robot();
        let mut controller = JointCommandController::new();
        controller.set_command(JointCommand::pd_control(hinge, 0.25, 0.0, 40.0, 1.0, 0.5));
        controller.compute(&mut model, 0.0).unwrap();
        assert_relative_eq!(model.joint_state(hinge).unwrap().effort, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_effort_clamped_to_limit() {
        let (mut model, hinge) = robot();
        let mut controller = JointCommandController::new();
        controller.set_command(JointCommand::position(hinge, 1.0));
        controller.compute(&mut model, 0.0).unwrap();
        assert_eq!(model.joint_state(hinge).unwrap().effort, 5.0);
    }

    #[test]
    fn test_command_on_root_fails() {
        let (mut model, _) = robot();
        let mut controller = JointCommandController::new();
        controller.set_command(JointCommand::effort(model.root(), 1.0));
        let err = controller.compute(&mut model, 0.0).unwrap_err();
        assert!(matches!(err, CouplingError::Model(_)));
    }

    #[test]
    fn test_clear_command() {
        let (_, hinge) = robot();
        let mut controller = JointCommandController::new();
        controller.set_command(JointCommand::velocity(hinge, 1.0));
        assert_eq!(controller.len(), 1);
        assert!(controller.clear_command(hinge).is_some());
        assert!(controller.is_empty());
    }
}
