//! Robot model: joint arena, floating base and forward kinematics.

use hashbrown::HashMap;
use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use sim_types::{
    JointAxis, JointId, JointLimits, JointState, JointType, MassProperties, Pose,
    SpatialAcceleration, Twist,
};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::Result;

/// A rigid body carried by a joint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Body name.
    pub name: String,
    /// Mass, centre of mass (in the body frame) and inertia.
    pub mass_properties: MassProperties,
}

impl RigidBody {
    /// Create a new rigid body.
    #[must_use]
    pub fn new(name: impl Into<String>, mass_properties: MassProperties) -> Self {
        Self {
            name: name.into(),
            mass_properties,
        }
    }
}

/// Description of a joint to add to a [`RobotModel`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointSpec {
    /// Unique joint name.
    pub name: String,
    /// Joint kind.
    pub joint_type: JointType,
    /// Joint frame relative to the parent body frame, at zero position.
    pub offset_from_parent: Isometry3<f64>,
    /// Motion axis in the joint frame.
    pub axis: JointAxis,
    /// Joint limits.
    pub limits: JointLimits,
    /// Body carried by the joint.
    pub body: RigidBody,
    /// Initial joint state.
    pub initial_state: JointState,
}

impl JointSpec {
    /// Create a joint spec of any type.
    #[must_use]
    pub fn new(name: impl Into<String>, joint_type: JointType, body: RigidBody) -> Self {
        Self {
            name: name.into(),
            joint_type,
            offset_from_parent: Isometry3::identity(),
            axis: JointAxis::z(),
            limits: JointLimits::default(),
            body,
            initial_state: JointState::default(),
        }
    }

    /// A 6-DOF floating root joint.
    #[must_use]
    pub fn floating(name: impl Into<String>, body: RigidBody) -> Self {
        Self::new(name, JointType::Free, body)
    }

    /// A revolute joint rotating about `axis`.
    #[must_use]
    pub fn revolute(name: impl Into<String>, axis: JointAxis, body: RigidBody) -> Self {
        Self::new(name, JointType::Revolute, body).with_axis(axis)
    }

    /// Set the offset from the parent body frame.
    #[must_use]
    pub fn with_offset(mut self, offset: Isometry3<f64>) -> Self {
        self.offset_from_parent = offset;
        self
    }

    /// Set the motion axis.
    #[must_use]
    pub fn with_axis(mut self, axis: JointAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Set the joint limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the initial joint position and velocity.
    #[must_use]
    pub fn with_state(mut self, position: f64, velocity: f64) -> Self {
        self.initial_state = JointState::new(position, velocity);
        self
    }
}

/// A joint in the model arena together with the body it carries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Joint {
    /// Joint name.
    pub name: String,
    /// Joint kind.
    pub joint_type: JointType,
    /// Parent joint, `None` for the root.
    pub parent: Option<JointId>,
    /// Child joints in insertion order.
    pub children: Vec<JointId>,
    /// Joint frame relative to the parent body frame, at zero position.
    pub offset_from_parent: Isometry3<f64>,
    /// Motion axis in the joint frame.
    pub axis: JointAxis,
    /// Joint limits.
    pub limits: JointLimits,
    /// Body carried by the joint.
    pub body: RigidBody,
    /// Generalized-coordinate state. Unused for the floating root.
    pub state: JointState,
    world_transform: Isometry3<f64>,
}

impl Joint {
    /// World transform of the body frame (the frame after the joint motion),
    /// as of the last [`RobotModel::update_frames`].
    #[must_use]
    pub fn world_transform(&self) -> &Isometry3<f64> {
        &self.world_transform
    }

    /// Transform produced by the joint coordinate alone.
    #[must_use]
    pub fn motion_transform(&self) -> Isometry3<f64> {
        let axis = Unit::new_normalize(self.axis.direction);
        match self.joint_type {
            JointType::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&axis, self.state.position),
            ),
            JointType::Prismatic => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * self.state.position),
                UnitQuaternion::identity(),
            ),
            JointType::Fixed | JointType::Spherical | JointType::Free => Isometry3::identity(),
        }
    }

    /// Whether the joint carries one scalar coordinate.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.joint_type.dof() == 1
    }
}

/// State of the floating base (the root body).
///
/// `twist` and `acceleration` are expressed in the base body frame. They are
/// recovered by differentiating successive poses; `reported_twist` is the
/// kernel's own velocity readout in the same frame, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloatingBaseState {
    /// World pose of the base body frame.
    pub pose: Pose,
    /// Body-frame twist.
    pub twist: Twist,
    /// Body-frame spatial acceleration.
    pub acceleration: SpatialAcceleration,
    /// Kernel-reported twist rotated into the body frame.
    pub reported_twist: Twist,
}

impl FloatingBaseState {
    /// Base at rest at `pose`.
    #[must_use]
    pub fn at_pose(pose: Pose) -> Self {
        Self {
            pose,
            ..Self::default()
        }
    }

    /// Check for `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite()
            && self.twist.is_finite()
            && self.acceleration.is_finite()
            && self.reported_twist.is_finite()
    }
}

/// A kinematic tree of joints with a floating base.
#[derive(Debug, Clone)]
pub struct RobotModel {
    name: String,
    joints: Vec<Joint>,
    by_name: HashMap<String, JointId>,
    base: FloatingBaseState,
}

impl RobotModel {
    /// Create a model from its root joint.
    ///
    /// The root is not required to be floating here; the coupling layer
    /// rejects non-floating roots when the robot is registered.
    pub fn new(name: impl Into<String>, root: JointSpec) -> Result<Self> {
        let mut model = Self {
            name: name.into(),
            joints: Vec::new(),
            by_name: HashMap::new(),
            base: FloatingBaseState::default(),
        };
        model.push_joint(None, root)?;
        model.update_frames();
        Ok(model)
    }

    /// Add a joint under `parent`. Returns the new joint's ID.
    pub fn add_joint(&mut self, parent: JointId, spec: JointSpec) -> Result<JointId> {
        if parent.index() >= self.joints.len() {
            return Err(ModelError::UnknownJoint(parent));
        }
        let id = self.push_joint(Some(parent), spec)?;
        self.joints[parent.index()].children.push(id);
        Ok(id)
    }

    fn push_joint(&mut self, parent: Option<JointId>, spec: JointSpec) -> Result<JointId> {
        if self.by_name.contains_key(&spec.name) {
            return Err(ModelError::DuplicateJoint(spec.name));
        }
        spec.body.mass_properties.validate()?;

        let id = JointId::new(self.joints.len());
        self.by_name.insert(spec.name.clone(), id);
        self.joints.push(Joint {
            name: spec.name,
            joint_type: spec.joint_type,
            parent,
            children: Vec::new(),
            offset_from_parent: spec.offset_from_parent,
            axis: spec.axis,
            limits: spec.limits,
            body: spec.body,
            state: spec.initial_state,
            world_transform: Isometry3::identity(),
        });
        Ok(id)
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ID of the root joint.
    #[must_use]
    pub fn root(&self) -> JointId {
        JointId::new(0)
    }

    /// Number of joints, root included.
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Total number of generalized velocity coordinates.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.joints.iter().map(|j| j.joint_type.dof()).sum()
    }

    /// All joints in arena order (parents before children).
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Get a joint by ID.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.index())
    }

    /// Get a mutable joint by ID.
    pub fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.get_mut(id.index())
    }

    /// Look up a joint ID by name.
    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<JointId> {
        self.by_name.get(name).copied()
    }

    /// Children of a joint.
    #[must_use]
    pub fn children(&self, id: JointId) -> &[JointId] {
        self.joints
            .get(id.index())
            .map_or(&[], |joint| joint.children.as_slice())
    }

    /// Floating-base state.
    #[must_use]
    pub fn base(&self) -> &FloatingBaseState {
        &self.base
    }

    /// Mutable floating-base state.
    pub fn base_mut(&mut self) -> &mut FloatingBaseState {
        &mut self.base
    }

    /// State of a one-DOF joint.
    pub fn joint_state(&self, id: JointId) -> Result<&JointState> {
        let joint = self.joint(id).ok_or(ModelError::UnknownJoint(id))?;
        if !joint.is_scalar() {
            return Err(ModelError::NotScalarJoint {
                name: joint.name.clone(),
                kind: joint.joint_type,
            });
        }
        Ok(&joint.state)
    }

    /// Mutable state of a one-DOF joint.
    pub fn joint_state_mut(&mut self, id: JointId) -> Result<&mut JointState> {
        let joint = self
            .joints
            .get_mut(id.index())
            .ok_or(ModelError::UnknownJoint(id))?;
        if !joint.is_scalar() {
            return Err(ModelError::NotScalarJoint {
                name: joint.name.clone(),
                kind: joint.joint_type,
            });
        }
        Ok(&mut joint.state)
    }

    /// Set the commanded effort of a one-DOF joint.
    pub fn set_effort(&mut self, id: JointId, effort: f64) -> Result<()> {
        self.joint_state_mut(id)?.effort = effort;
        Ok(())
    }

    /// Joint positions of all one-DOF joints, in arena order.
    #[must_use]
    pub fn positions(&self) -> Vec<f64> {
        self.joints
            .iter()
            .filter(|j| j.is_scalar())
            .map(|j| j.state.position)
            .collect()
    }

    /// Recompute every body's world transform from the base pose and the
    /// joint coordinates.
    pub fn update_frames(&mut self) {
        let base_iso = self.base.pose.to_isometry();
        for i in 0..self.joints.len() {
            let joint = &self.joints[i];
            let local = joint.offset_from_parent * joint.motion_transform();
            let world = match joint.parent {
                Some(parent) => self.joints[parent.index()].world_transform * local,
                None if joint.joint_type == JointType::Free => base_iso,
                None => local,
            };
            self.joints[i].world_transform = world;
        }
        debug!(robot = %self.name, joints = self.joints.len(), "frames updated");
    }

    /// World transform of a body frame.
    pub fn body_world_transform(&self, id: JointId) -> Result<Isometry3<f64>> {
        self.joint(id)
            .map(|j| j.world_transform)
            .ok_or(ModelError::UnknownJoint(id))
    }

    /// World transform of a body's centre-of-mass frame (the body frame
    /// translated by the centre-of-mass offset).
    pub fn com_world_transform(&self, id: JointId) -> Result<Isometry3<f64>> {
        let joint = self.joint(id).ok_or(ModelError::UnknownJoint(id))?;
        let com = joint.body.mass_properties.center_of_mass;
        Ok(joint.world_transform * Translation3::from(com))
    }

    /// World-frame axis of a one-DOF joint.
    pub fn joint_world_axis(&self, id: JointId) -> Result<Vector3<f64>> {
        let joint = self.joint(id).ok_or(ModelError::UnknownJoint(id))?;
        Ok(joint.world_transform.rotation * joint.axis.direction)
    }

    /// Total mass of all bodies.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.joints.iter().map(|j| j.body.mass_properties.mass).sum()
    }

    /// Check the generalized state and base for `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.base.is_finite() && self.joints.iter().all(|j| j.state.is_finite())
    }
}
