//! Link adapters: copy state between the robot model and the kernel.
//!
//! Each joint of a registered robot has one adapter. Adapters hold IDs and
//! handles only; the model and kernel are passed in per call. `push_state`
//! writes model state into the kernel before a step, `pull_state` reads it
//! back after.

use nalgebra::{Isometry3, Translation3, Vector3};
use sim_kernel::{LinkHandle, LinkIndex, MultibodyId, PhysicsKernel};
use sim_kinematics::differentiator::{self, PoseSample};
use sim_kinematics::RobotModel;
use sim_types::{JointId, Pose, SpatialAcceleration, Twist, Wrench};
use tracing::debug;

use crate::wrench::{BodyRef, FramedWrench, RobotId, WrenchAccumulator};
use crate::Result;

/// Adapter for the floating base.
#[derive(Debug, Clone, PartialEq)]
pub struct RootAdapter {
    robot: RobotId,
    joint: JointId,
    multibody: MultibodyId,
    step: u64,
    pushed: Option<(PoseSample, Twist)>,
}

impl RootAdapter {
    /// Create a root adapter.
    #[must_use]
    pub fn new(robot: RobotId, joint: JointId, multibody: MultibodyId) -> Self {
        Self {
            robot,
            joint,
            multibody,
            step: 0,
            pushed: None,
        }
    }

    /// Tick counter of the last pulled sample.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.step
    }

    fn push_state<K: PhysicsKernel + ?Sized>(
        &mut self,
        model: &RobotModel,
        kernel: &mut K,
    ) -> Result<()> {
        let base = model.base();
        let com = model
            .joint(self.joint)
            .map_or_else(Vector3::zeros, |j| j.body.mass_properties.center_of_mass);
        let handle = LinkHandle::base(self.multibody);

        let collider = base.pose.to_isometry() * Translation3::from(com);
        kernel.set_collider_world_transform(handle, &collider)?;

        let rotation = base.pose.rotation;
        let angular = rotation * base.twist.angular;
        let linear = rotation * base.twist.velocity_at_point(&com);
        kernel.set_base_world_velocity(self.multibody, &linear)?;
        kernel.set_base_world_angular_velocity(self.multibody, &angular)?;

        self.pushed = Some((
            PoseSample::new(rotation, base.pose.position, self.step),
            base.twist,
        ));
        Ok(())
    }

    fn pull_state<K: PhysicsKernel + ?Sized>(
        &mut self,
        model: &mut RobotModel,
        kernel: &K,
        dt: f64,
    ) -> Result<()> {
        let com = model
            .joint(self.joint)
            .map_or_else(Vector3::zeros, |j| j.body.mass_properties.center_of_mass);
        let handle = LinkHandle::base(self.multibody);

        let collider = kernel.collider_world_transform(handle)?;
        let body: Isometry3<f64> = collider * Translation3::from(-com);
        let rotation = body.rotation;

        let angular =
            rotation.inverse_transform_vector(&kernel.base_world_angular_velocity(self.multibody)?);
        let collider_velocity =
            rotation.inverse_transform_vector(&kernel.base_world_velocity(self.multibody)?);
        let reported = Twist::new(angular, collider_velocity - angular.cross(&com));

        self.step += 1;
        let current = PoseSample::new(rotation, body.translation.vector.into(), self.step);

        let (twist, acceleration) = match self.pushed.take() {
            Some((prev_pose, prev_twist)) => {
                let out = differentiator::differentiate(&prev_pose, &prev_twist, &current, dt);
                (out.twist, out.acceleration)
            }
            None => {
                debug!(robot = %self.robot, "base pulled without a prior push");
                (reported, SpatialAcceleration::zero())
            }
        };

        let base = model.base_mut();
        base.pose = Pose::from_isometry(&body);
        base.twist = twist;
        base.acceleration = acceleration;
        base.reported_twist = reported;
        Ok(())
    }
}

/// Adapter for a revolute link.
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteAdapter {
    robot: RobotId,
    joint: JointId,
    handle: LinkHandle,
}

impl RevoluteAdapter {
    /// Create a revolute adapter.
    #[must_use]
    pub fn new(robot: RobotId, joint: JointId, handle: LinkHandle) -> Self {
        Self {
            robot,
            joint,
            handle,
        }
    }

    fn push_state<K: PhysicsKernel + ?Sized>(
        &mut self,
        model: &RobotModel,
        kernel: &mut K,
    ) -> Result<()> {
        let collider = model.com_world_transform(self.joint)?;
        kernel.set_collider_world_transform(self.handle, &collider)?;

        let state = model.joint_state(self.joint)?;
        kernel.set_joint_position(self.handle, state.position)?;
        kernel.set_joint_velocity(self.handle, state.velocity)?;
        kernel.add_joint_torque(self.handle, state.effort)?;
        Ok(())
    }

    fn pull_state<K: PhysicsKernel + ?Sized>(
        &mut self,
        model: &mut RobotModel,
        kernel: &K,
        wrenches: &mut WrenchAccumulator,
        dt: f64,
    ) -> Result<()> {
        let position = kernel.joint_position(self.handle)?;
        let velocity = kernel.joint_velocity(self.handle)?;
        let applied = kernel.joint_applied_torque(self.handle)?;

        let state = model.joint_state_mut(self.joint)?;
        state.acceleration = (velocity - state.velocity) / dt;
        state.position = position;
        state.velocity = velocity;
        state.applied_effort = applied;

        let wrench = Wrench::new(
            kernel.constraint_force(self.handle)?,
            kernel.constraint_torque(self.handle)?,
        );
        wrenches.add(
            BodyRef::new(self.robot, self.joint),
            FramedWrench::world(wrench),
        )?;
        Ok(())
    }
}

/// One joint's adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkAdapter {
    /// The floating base.
    Root(RootAdapter),
    /// A revolute link.
    Revolute(RevoluteAdapter),
}

impl LinkAdapter {
    /// Joint mirrored by this adapter.
    #[must_use]
    pub fn joint(&self) -> JointId {
        match self {
            Self::Root(a) => a.joint,
            Self::Revolute(a) => a.joint,
        }
    }

    /// Kernel link index.
    #[must_use]
    pub fn link_index(&self) -> LinkIndex {
        match self {
            Self::Root(_) => LinkIndex::BASE,
            Self::Revolute(a) => a.handle.link,
        }
    }

    /// Kernel handle of the collider.
    #[must_use]
    pub fn handle(&self) -> LinkHandle {
        match self {
            Self::Root(a) => LinkHandle::base(a.multibody),
            Self::Revolute(a) => a.handle,
        }
    }

    /// Write model state into the kernel.
    ///
    /// Joint torque is added to the kernel's accumulator, so pushing twice
    /// before a step applies it twice.
    pub fn push_state<K: PhysicsKernel + ?Sized>(
        &mut self,
        model: &RobotModel,
        kernel: &mut K,
    ) -> Result<()> {
        match self {
            Self::Root(a) => a.push_state(model, kernel),
            Self::Revolute(a) => a.push_state(model, kernel),
        }
    }

    /// Read kernel state back into the model.
    pub fn pull_state<K: PhysicsKernel + ?Sized>(
        &mut self,
        model: &mut RobotModel,
        kernel: &K,
        wrenches: &mut WrenchAccumulator,
        dt: f64,
    ) -> Result<()> {
        match self {
            Self::Root(a) => a.pull_state(model, kernel, dt),
            Self::Revolute(a) => a.pull_state(model, kernel, wrenches, dt),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion};
    use sim_kernel::{BaseDescriptor, ReferenceKernel, RevoluteJointDescriptor};
    use sim_kinematics::{JointSpec, RigidBody};
    use sim_types::{JointAxis, MassProperties};

    struct Rig {
        model: RobotModel,
        kernel: ReferenceKernel,
        root: LinkAdapter,
        hinge: LinkAdapter,
        hinge_id: JointId,
    }

    fn rig() -> Rig {
        let base_mass = MassProperties::sphere(2.0, 0.1).with_center_of_mass(Vector3::new(0.0, 0.0, 0.1));
        let mut model =
            RobotModel::new("r", JointSpec::floating("root", RigidBody::new("b", base_mass))).unwrap();
        let hinge_id = model
            .add_joint(
                model.root(),
                JointSpec::revolute(
                    "hinge",
                    JointAxis::y(),
                    RigidBody::new(
                        "l",
                        MassProperties::point_mass(1.0).with_center_of_mass(Vector3::new(0.5, 0.0, 0.0)),
                    ),
                ),
            )
            .unwrap();

        let mut kernel = ReferenceKernel::new(Vector3::zeros());
        let mb = kernel
            .create_multibody(
                &BaseDescriptor::floating(2.0, Vector3::new(0.1, 0.1, 0.1))
                    .with_transform(Isometry3::translation(0.0, 0.0, 0.1)),
            )
            .unwrap();
        kernel
            .setup_revolute_joint(
                mb,
                &RevoluteJointDescriptor {
                    index: LinkIndex::new(0),
                    mass: 1.0,
                    inertia_diagonal: Vector3::zeros(),
                    parent_index: LinkIndex::BASE,
                    rotation_from_parent: UnitQuaternion::identity(),
                    axis: Vector3::y(),
                    parent_pivot_offset: Vector3::new(0.0, 0.0, -0.1),
                    child_pivot_offset: Vector3::new(0.5, 0.0, 0.0),
                    disable_parent_collision: true,
                },
            )
            .unwrap();
        kernel.finalize_multibody(mb).unwrap();

        let robot = RobotId::new(0);
        Rig {
            root: LinkAdapter::Root(RootAdapter::new(robot, model.root(), mb)),
            hinge: LinkAdapter::Revolute(RevoluteAdapter::new(
                robot,
                hinge_id,
                LinkHandle::new(mb, LinkIndex::new(0)),
            )),
            model,
            kernel,
            hinge_id,
        }
    }

    #[test]
    fn test_revolute_round_trip() {
        let mut rig = rig();
        {
            let state = rig.model.joint_state_mut(rig.hinge_id).unwrap();
            state.position = 0.4;
            state.velocity = -1.25;
        }
        rig.model.update_frames();

        rig.hinge.push_state(&rig.model, &mut rig.kernel).unwrap();
        let mut wrenches = WrenchAccumulator::new();
        rig.hinge
            .pull_state(&mut rig.model, &rig.kernel, &mut wrenches, 0.01)
            .unwrap();

        let state = rig.model.joint_state(rig.hinge_id).unwrap();
        assert_eq!(state.position, 0.4);
        assert_eq!(state.velocity, -1.25);
        assert_eq!(state.acceleration, 0.0);
        assert_eq!(wrenches.len(), 1);
    }

    #[test]
    fn test_revolute_collider_matches_kernel_kinematics() {
        let mut rig = rig();
        rig.model.joint_state_mut(rig.hinge_id).unwrap().position = 0.7;
        rig.model.update_frames();

        let handle = rig.hinge.handle();
        rig.root.push_state(&rig.model, &mut rig.kernel).unwrap();
        rig.hinge.push_state(&rig.model, &mut rig.kernel).unwrap();
        rig.kernel.step_simulation(1e-3).unwrap();

        // Zero gravity and torque: the kernel's own kinematics reproduce the
        // collider the adapter wrote.
        let expected = rig.model.com_world_transform(rig.hinge_id).unwrap();
        let actual = rig.kernel.collider_world_transform(handle).unwrap();
        assert_relative_eq!(
            actual.translation.vector,
            expected.translation.vector,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_revolute_acceleration_from_velocity_change() {
        let mut rig = rig();
        rig.model.set_effort(rig.hinge_id, 0.5).unwrap();
        rig.model.update_frames();

        let dt = 0.01;
        rig.root.push_state(&rig.model, &mut rig.kernel).unwrap();
        rig.hinge.push_state(&rig.model, &mut rig.kernel).unwrap();
        rig.kernel.step_simulation(dt).unwrap();
        let mut wrenches = WrenchAccumulator::new();
        rig.hinge
            .pull_state(&mut rig.model, &rig.kernel, &mut wrenches, dt)
            .unwrap();

        // Point mass at 0.5 m: I = 0.25, so q̈ = 0.5 / 0.25.
        let state = rig.model.joint_state(rig.hinge_id).unwrap();
        assert_relative_eq!(state.acceleration, 2.0, epsilon = 1e-9);
        assert_relative_eq!(state.applied_effort, 0.5);
    }

    #[test]
    fn test_root_push_writes_world_velocities() {
        let mut rig = rig();
        {
            let base = rig.model.base_mut();
            base.pose = Pose::from_position_rotation(
                Point3::new(1.0, 0.0, 0.0),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
            );
            base.twist = Twist::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        }
        rig.model.update_frames();
        rig.root.push_state(&rig.model, &mut rig.kernel).unwrap();

        let mb = rig.root.handle().multibody;
        // ω × com = (1,0,0) × (0,0,0.1) = (0,-0.1,0), then a quarter turn about Z.
        assert_relative_eq!(
            rig.kernel.base_world_velocity(mb).unwrap(),
            Vector3::new(0.1, 1.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            rig.kernel.base_world_angular_velocity(mb).unwrap(),
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_root_round_trip_reports_pushed_twist() {
        let mut rig = rig();
        let pose = Pose::from_position_rotation(
            Point3::new(0.0, 2.0, 1.0),
            UnitQuaternion::from_euler_angles(0.2, -0.1, 0.4),
        );
        let twist = Twist::new(Vector3::new(0.1, 0.2, 0.3), Vector3::new(1.0, 0.0, -0.5));
        {
            let base = rig.model.base_mut();
            base.pose = pose;
            base.twist = twist;
        }
        rig.root.push_state(&rig.model, &mut rig.kernel).unwrap();
        let mut wrenches = WrenchAccumulator::new();
        rig.root
            .pull_state(&mut rig.model, &rig.kernel, &mut wrenches, 0.01)
            .unwrap();

        let base = rig.model.base();
        assert_relative_eq!(base.pose.position, pose.position, epsilon = 1e-12);
        assert_relative_eq!(base.reported_twist.angular, twist.angular, epsilon = 1e-12);
        assert_relative_eq!(base.reported_twist.linear, twist.linear, epsilon = 1e-12);
        // No step: the differentiated twist is zero.
        assert_relative_eq!(base.twist.linear, Vector3::zeros(), epsilon = 1e-9);
        assert!(wrenches.is_empty());
    }

    #[test]
    fn test_root_pull_differentiates_free_flight() {
        let mut rig = rig();
        rig.model.base_mut().twist = Twist::linear(Vector3::new(0.0, 0.0, 3.0));
        rig.model.update_frames();

        let dt = 0.01;
        rig.root.push_state(&rig.model, &mut rig.kernel).unwrap();
        rig.kernel.step_simulation(dt).unwrap();
        let mut wrenches = WrenchAccumulator::new();
        rig.root
            .pull_state(&mut rig.model, &rig.kernel, &mut wrenches, dt)
            .unwrap();

        let base = rig.model.base();
        assert_relative_eq!(base.pose.position.z, 0.03, epsilon = 1e-12);
        assert_relative_eq!(base.twist.linear, Vector3::new(0.0, 0.0, 3.0), epsilon = 1e-9);
        assert_relative_eq!(base.acceleration.linear, Vector3::zeros(), epsilon = 1e-6);
        assert_eq!(rig.root.link_index(), LinkIndex::BASE);
    }
}
