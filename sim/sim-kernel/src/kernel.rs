//! The physics-kernel trait.

use nalgebra::{Isometry3, Vector3};

use crate::descriptor::{BaseDescriptor, RevoluteJointDescriptor};
use crate::handle::{LinkHandle, MultibodyId};
use crate::Result;

/// A rigid-multibody physics kernel.
///
/// The kernel owns physics state in its own representation. Link-addressed
/// operations take a [`LinkHandle`]; joint operations on the base fail with
/// [`KernelError::NoJointCoordinate`](crate::KernelError::NoJointCoordinate).
///
/// All vectors and transforms are in the world frame unless stated otherwise.
/// Collider transforms are centre-of-mass frames.
///
/// Torques passed to [`add_joint_torque`](Self::add_joint_torque) accumulate
/// until the next [`step_simulation`](Self::step_simulation), which consumes
/// and clears them.
pub trait PhysicsKernel {
    /// Register a new multibody from its base.
    fn create_multibody(&mut self, base: &BaseDescriptor) -> Result<MultibodyId>;

    /// Append a revolute link. Links must arrive in slot order.
    fn setup_revolute_joint(
        &mut self,
        multibody: MultibodyId,
        joint: &RevoluteJointDescriptor,
    ) -> Result<()>;

    /// Finish building a multibody. No links can be added afterwards.
    fn finalize_multibody(&mut self, multibody: MultibodyId) -> Result<()>;

    /// Remove a multibody and everything attached to it.
    fn remove_multibody(&mut self, multibody: MultibodyId) -> Result<()>;

    /// Set gravity for all multibodies.
    fn set_gravity(&mut self, gravity: Vector3<f64>);

    /// Set a joint coordinate.
    fn set_joint_position(&mut self, link: LinkHandle, position: f64) -> Result<()>;

    /// Set a joint rate.
    fn set_joint_velocity(&mut self, link: LinkHandle, velocity: f64) -> Result<()>;

    /// Add to the joint torque accumulator.
    fn add_joint_torque(&mut self, link: LinkHandle, torque: f64) -> Result<()>;

    /// Joint coordinate.
    fn joint_position(&self, link: LinkHandle) -> Result<f64>;

    /// Joint rate.
    fn joint_velocity(&self, link: LinkHandle) -> Result<f64>;

    /// Motor torque applied to the joint during the last step.
    fn joint_applied_torque(&self, link: LinkHandle) -> Result<f64>;

    /// Overwrite a collider's world transform.
    fn set_collider_world_transform(
        &mut self,
        link: LinkHandle,
        transform: &Isometry3<f64>,
    ) -> Result<()>;

    /// World transform of a collider.
    fn collider_world_transform(&self, link: LinkHandle) -> Result<Isometry3<f64>>;

    /// Constraint force the joint exerted on the link during the last step.
    fn constraint_force(&self, link: LinkHandle) -> Result<Vector3<f64>>;

    /// Constraint torque the joint exerted on the link during the last step.
    fn constraint_torque(&self, link: LinkHandle) -> Result<Vector3<f64>>;

    /// Set the base collider's linear velocity.
    fn set_base_world_velocity(
        &mut self,
        multibody: MultibodyId,
        velocity: &Vector3<f64>,
    ) -> Result<()>;

    /// Set the base angular velocity.
    fn set_base_world_angular_velocity(
        &mut self,
        multibody: MultibodyId,
        angular_velocity: &Vector3<f64>,
    ) -> Result<()>;

    /// Linear velocity of the base collider origin.
    fn base_world_velocity(&self, multibody: MultibodyId) -> Result<Vector3<f64>>;

    /// Base angular velocity.
    fn base_world_angular_velocity(&self, multibody: MultibodyId) -> Result<Vector3<f64>>;

    /// Advance every multibody by one fixed step.
    fn step_simulation(&mut self, dt: f64) -> Result<()>;
}
