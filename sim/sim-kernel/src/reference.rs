//! In-process reference kernel.
//!
//! A small kernel, good enough to drive the coupling layer in tests and
//! demos:
//!
//! - Each revolute joint integrates on its own with semi-implicit Euler,
//!   `q̈ = (τ_motor + τ_gravity) / I_axis`, where `I_axis` is the link's
//!   inertia about the joint axis through the pivot and `τ_gravity` is the
//!   gravity torque on the link about that axis. Links do not load each
//!   other.
//! - A floating base moves as a free rigid body under gravity.
//! - Constraint readouts are quasi-static: the joint force holds the link
//!   against gravity and the joint torque cancels the off-axis part of the
//!   gravity torque.
//!
//! After every step the motor accumulators are cleared and every collider
//! transform is recomputed from the base and joint coordinates.

use hashbrown::HashMap;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use tracing::{debug, warn};

use crate::descriptor::{BaseDescriptor, RevoluteJointDescriptor};
use crate::error::KernelError;
use crate::handle::{LinkHandle, LinkIndex, MultibodyId};
use crate::kernel::PhysicsKernel;
use crate::Result;

/// Inertia about an axis below which a link is treated as massless.
const MIN_AXIS_INERTIA: f64 = 1e-12;

#[derive(Debug, Clone)]
struct BaseState {
    descriptor: BaseDescriptor,
    collider: Isometry3<f64>,
    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
}

#[derive(Debug, Clone)]
struct LinkState {
    descriptor: RevoluteJointDescriptor,
    position: f64,
    velocity: f64,
    torque: f64,
    applied_torque: f64,
    collider: Isometry3<f64>,
    constraint_force: Vector3<f64>,
    constraint_torque: Vector3<f64>,
}

impl LinkState {
    fn new(descriptor: RevoluteJointDescriptor) -> Self {
        Self {
            descriptor,
            position: 0.0,
            velocity: 0.0,
            torque: 0.0,
            applied_torque: 0.0,
            collider: Isometry3::identity(),
            constraint_force: Vector3::zeros(),
            constraint_torque: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone)]
struct Multibody {
    base: BaseState,
    links: Vec<LinkState>,
    finalized: bool,
}

impl Multibody {
    fn parent_collider(&self, parent: LinkIndex) -> Isometry3<f64> {
        parent
            .slot()
            .and_then(|slot| self.links.get(slot))
            .map_or(self.base.collider, |link| link.collider)
    }

    /// Recompute link colliders from the base collider and joint positions.
    fn update_colliders(&mut self) {
        for i in 0..self.links.len() {
            let parent = self.parent_collider(self.links[i].descriptor.parent_index);
            let local = self.links[i].descriptor.local_transform(self.links[i].position);
            self.links[i].collider = parent * local;
        }
    }
}

/// Reference implementation of [`PhysicsKernel`].
///
/// # Example
///
/// ```
/// use sim_kernel::{BaseDescriptor, LinkHandle, PhysicsKernel, ReferenceKernel};
/// use nalgebra::{Isometry3, Vector3};
///
/// let mut kernel = ReferenceKernel::new(Vector3::new(0.0, 0.0, -9.81));
/// let base = BaseDescriptor::floating(1.0, Vector3::new(0.1, 0.1, 0.1))
///     .with_transform(Isometry3::translation(0.0, 0.0, 10.0));
/// let body = kernel.create_multibody(&base).unwrap();
/// kernel.finalize_multibody(body).unwrap();
///
/// kernel.step_simulation(0.01).unwrap();
/// let v = kernel.base_world_velocity(body).unwrap();
/// assert!(v.z < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceKernel {
    gravity: Vector3<f64>,
    multibodies: HashMap<MultibodyId, Multibody>,
    next_id: u32,
    time: f64,
    steps: u64,
}

impl Default for ReferenceKernel {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, -9.81))
    }
}

impl ReferenceKernel {
    /// Create an empty kernel with the given gravity.
    #[must_use]
    pub fn new(gravity: Vector3<f64>) -> Self {
        Self {
            gravity,
            multibodies: HashMap::new(),
            next_id: 0,
            time: 0.0,
            steps: 0,
        }
    }

    /// Gravity vector.
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    /// Simulated time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of steps taken.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Number of live multibodies.
    #[must_use]
    pub fn multibody_count(&self) -> usize {
        self.multibodies.len()
    }

    /// Number of links of a multibody, base excluded.
    pub fn num_links(&self, multibody: MultibodyId) -> Result<usize> {
        Ok(self.multibody(multibody)?.links.len())
    }

    fn multibody(&self, id: MultibodyId) -> Result<&Multibody> {
        self.multibodies
            .get(&id)
            .ok_or(KernelError::UnknownMultibody(id))
    }

    fn multibody_mut(&mut self, id: MultibodyId) -> Result<&mut Multibody> {
        self.multibodies
            .get_mut(&id)
            .ok_or(KernelError::UnknownMultibody(id))
    }

    fn link(&self, handle: LinkHandle) -> Result<&LinkState> {
        let body = self.multibody(handle.multibody)?;
        if handle.link.is_base() {
            return Err(KernelError::NoJointCoordinate(handle));
        }
        handle
            .link
            .slot()
            .and_then(|slot| body.links.get(slot))
            .ok_or(KernelError::UnknownLink(handle))
    }

    fn link_mut(&mut self, handle: LinkHandle) -> Result<&mut LinkState> {
        let body = self.multibody_mut(handle.multibody)?;
        if handle.link.is_base() {
            return Err(KernelError::NoJointCoordinate(handle));
        }
        handle
            .link
            .slot()
            .and_then(|slot| body.links.get_mut(slot))
            .ok_or(KernelError::UnknownLink(handle))
    }

    fn step_multibody(body: &mut Multibody, gravity: &Vector3<f64>, dt: f64) {
        // Joint dynamics are evaluated at the pre-step configuration.
        for i in 0..body.links.len() {
            let parent = body.parent_collider(body.links[i].descriptor.parent_index);
            let link = &mut body.links[i];
            let d = link.descriptor;

            let joint_frame = parent
                * Isometry3::from_parts(
                    Translation3::from(d.parent_pivot_offset),
                    d.rotation_from_parent,
                );
            let pivot = joint_frame.translation.vector;
            let axis = joint_frame.rotation * d.axis.normalize();
            let lever = link.collider.translation.vector - pivot;

            let weight = gravity * d.mass;
            let gravity_torque = lever.cross(&weight);
            let torque_about_axis = gravity_torque.dot(&axis);

            let local_axis = d.axis.normalize();
            let rotational = d.inertia_diagonal.component_mul(&local_axis).dot(&local_axis);
            let lever_perp = lever - axis * lever.dot(&axis);
            let inertia = rotational + d.mass * lever_perp.norm_squared();

            let acceleration = if inertia > MIN_AXIS_INERTIA {
                (link.torque + torque_about_axis) / inertia
            } else {
                warn!(link = %d.index, inertia, "zero inertia about joint axis, holding joint");
                0.0
            };

            link.velocity += acceleration * dt;
            link.position += link.velocity * dt;
            link.applied_torque = link.torque;
            link.torque = 0.0;

            link.constraint_force = -weight;
            link.constraint_torque = -(gravity_torque - axis * torque_about_axis);
        }

        if !body.base.descriptor.fixed_base {
            let base = &mut body.base;
            base.linear_velocity += gravity * dt;
            base.collider.translation.vector += base.linear_velocity * dt;
            integrate_world_rotation(&mut base.collider.rotation, &base.angular_velocity, dt);
        }
        body.update_colliders();
    }
}

/// Rotate by a world-frame angular velocity over `dt`.
fn integrate_world_rotation(rotation: &mut UnitQuaternion<f64>, omega: &Vector3<f64>, dt: f64) {
    if omega.norm() < 1e-10 {
        return;
    }
    let delta = UnitQuaternion::from_scaled_axis(omega * dt);
    *rotation = delta * *rotation;
}

impl PhysicsKernel for ReferenceKernel {
    fn create_multibody(&mut self, base: &BaseDescriptor) -> Result<MultibodyId> {
        if !(base.mass.is_finite() && base.mass > 0.0) {
            return Err(KernelError::invalid_descriptor(format!(
                "base mass must be positive, got {}",
                base.mass
            )));
        }
        let id = MultibodyId::new(self.next_id);
        self.next_id += 1;
        self.multibodies.insert(
            id,
            Multibody {
                base: BaseState {
                    descriptor: *base,
                    collider: base.collider_transform,
                    linear_velocity: Vector3::zeros(),
                    angular_velocity: Vector3::zeros(),
                },
                links: Vec::new(),
                finalized: false,
            },
        );
        debug!(multibody = %id, "multibody created");
        Ok(id)
    }

    fn setup_revolute_joint(
        &mut self,
        multibody: MultibodyId,
        joint: &RevoluteJointDescriptor,
    ) -> Result<()> {
        let body = self.multibody_mut(multibody)?;
        if body.finalized {
            return Err(KernelError::AlreadyFinalized(multibody));
        }
        let expected = LinkIndex::from_slot(body.links.len());
        if joint.index != expected {
            return Err(KernelError::LinkOutOfOrder {
                expected,
                got: joint.index,
            });
        }
        if joint.parent_index >= joint.index || joint.parent_index < LinkIndex::BASE {
            return Err(KernelError::InvalidParent {
                link: joint.index,
                parent: joint.parent_index,
            });
        }
        if joint.axis.norm() < 1e-10 {
            return Err(KernelError::invalid_descriptor(format!(
                "link {} has a zero axis",
                joint.index
            )));
        }
        body.links.push(LinkState::new(*joint));
        Ok(())
    }

    fn finalize_multibody(&mut self, multibody: MultibodyId) -> Result<()> {
        let body = self.multibody_mut(multibody)?;
        if body.finalized {
            return Err(KernelError::AlreadyFinalized(multibody));
        }
        body.finalized = true;
        body.update_colliders();
        debug!(multibody = %multibody, links = body.links.len(), "multibody finalized");
        Ok(())
    }

    fn remove_multibody(&mut self, multibody: MultibodyId) -> Result<()> {
        if self.multibodies.remove(&multibody).is_none() {
            return Err(KernelError::UnknownMultibody(multibody));
        }
        debug!(multibody = %multibody, "multibody removed");
        Ok(())
    }

    fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.gravity = gravity;
    }

    fn set_joint_position(&mut self, link: LinkHandle, position: f64) -> Result<()> {
        self.link_mut(link)?.position = position;
        Ok(())
    }

    fn set_joint_velocity(&mut self, link: LinkHandle, velocity: f64) -> Result<()> {
        self.link_mut(link)?.velocity = velocity;
        Ok(())
    }

    fn add_joint_torque(&mut self, link: LinkHandle, torque: f64) -> Result<()> {
        self.link_mut(link)?.torque += torque;
        Ok(())
    }

    fn joint_position(&self, link: LinkHandle) -> Result<f64> {
        Ok(self.link(link)?.position)
    }

    fn joint_velocity(&self, link: LinkHandle) -> Result<f64> {
        Ok(self.link(link)?.velocity)
    }

    fn joint_applied_torque(&self, link: LinkHandle) -> Result<f64> {
        Ok(self.link(link)?.applied_torque)
    }

    fn set_collider_world_transform(
        &mut self,
        link: LinkHandle,
        transform: &Isometry3<f64>,
    ) -> Result<()> {
        if link.link.is_base() {
            self.multibody_mut(link.multibody)?.base.collider = *transform;
        } else {
            self.link_mut(link)?.collider = *transform;
        }
        Ok(())
    }

    fn collider_world_transform(&self, link: LinkHandle) -> Result<Isometry3<f64>> {
        if link.link.is_base() {
            Ok(self.multibody(link.multibody)?.base.collider)
        } else {
            Ok(self.link(link)?.collider)
        }
    }

    fn constraint_force(&self, link: LinkHandle) -> Result<Vector3<f64>> {
        Ok(self.link(link)?.constraint_force)
    }

    fn constraint_torque(&self, link: LinkHandle) -> Result<Vector3<f64>> {
        Ok(self.link(link)?.constraint_torque)
    }

    fn set_base_world_velocity(
        &mut self,
        multibody: MultibodyId,
        velocity: &Vector3<f64>,
    ) -> Result<()> {
        self.multibody_mut(multibody)?.base.linear_velocity = *velocity;
        Ok(())
    }

    fn set_base_world_angular_velocity(
        &mut self,
        multibody: MultibodyId,
        angular_velocity: &Vector3<f64>,
    ) -> Result<()> {
        self.multibody_mut(multibody)?.base.angular_velocity = *angular_velocity;
        Ok(())
    }

    fn base_world_velocity(&self, multibody: MultibodyId) -> Result<Vector3<f64>> {
        Ok(self.multibody(multibody)?.base.linear_velocity)
    }

    fn base_world_angular_velocity(&self, multibody: MultibodyId) -> Result<Vector3<f64>> {
        Ok(self.multibody(multibody)?.base.angular_velocity)
    }

    fn step_simulation(&mut self, dt: f64) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(KernelError::InvalidStep(dt));
        }
        if let Some((id, _)) = self.multibodies.iter().find(|(_, body)| !body.finalized) {
            return Err(KernelError::NotFinalized(*id));
        }

        let gravity = self.gravity;
        for body in self.multibodies.values_mut() {
            Self::step_multibody(body, &gravity, dt);
        }
        self.time += dt;
        self.steps += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pendulum(kernel: &mut ReferenceKernel) -> MultibodyId {
        let base = BaseDescriptor::floating(1.0, Vector3::new(0.1, 0.1, 0.1)).fixed();
        let id = kernel.create_multibody(&base).unwrap();
        kernel
            .setup_revolute_joint(
                id,
                &RevoluteJointDescriptor {
                    index: LinkIndex::new(0),
                    mass: 1.0,
                    inertia_diagonal: Vector3::zeros(),
                    parent_index: LinkIndex::BASE,
                    rotation_from_parent: UnitQuaternion::identity(),
                    axis: Vector3::y(),
                    parent_pivot_offset: Vector3::zeros(),
                    child_pivot_offset: Vector3::new(1.0, 0.0, 0.0),
                    disable_parent_collision: true,
                },
            )
            .unwrap();
        kernel.finalize_multibody(id).unwrap();
        id
    }

    #[test]
    fn test_free_fall() {
        let mut kernel = ReferenceKernel::new(Vector3::new(0.0, 0.0, -10.0));
        let id = kernel
            .create_multibody(&BaseDescriptor::floating(2.0, Vector3::new(1.0, 1.0, 1.0)))
            .unwrap();
        kernel.finalize_multibody(id).unwrap();

        for _ in 0..10 {
            kernel.step_simulation(0.1).unwrap();
        }
        assert_relative_eq!(kernel.base_world_velocity(id).unwrap().z, -10.0, epsilon = 1e-9);
        assert_relative_eq!(kernel.time(), 1.0, epsilon = 1e-12);
        assert_eq!(kernel.step_count(), 10);
    }

    #[test]
    fn test_base_spin() {
        let mut kernel = ReferenceKernel::new(Vector3::zeros());
        let id = kernel
            .create_multibody(&BaseDescriptor::floating(1.0, Vector3::new(1.0, 1.0, 1.0)))
            .unwrap();
        kernel.finalize_multibody(id).unwrap();
        kernel
            .set_base_world_angular_velocity(id, &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();

        for _ in 0..100 {
            kernel.step_simulation(0.01).unwrap();
        }
        let pose = kernel.collider_world_transform(LinkHandle::base(id)).unwrap();
        assert_relative_eq!(pose.rotation.angle(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_horizontal_pendulum_falls() {
        let mut kernel = ReferenceKernel::new(Vector3::new(0.0, 0.0, -9.81));
        let id = pendulum(&mut kernel);
        let link = LinkHandle::new(id, LinkIndex::new(0));

        kernel.step_simulation(0.001).unwrap();
        // Gravity about +Y on a mass at +X rotates the link towards -Z,
        // which is a positive rotation about +Y.
        let qd = kernel.joint_velocity(link).unwrap();
        assert_relative_eq!(qd, 9.81 * 0.001, epsilon = 1e-9);

        let force = kernel.constraint_force(link).unwrap();
        assert_relative_eq!(force, Vector3::new(0.0, 0.0, 9.81), epsilon = 1e-12);
    }

    #[test]
    fn test_torque_accumulates_and_clears() {
        let mut kernel = ReferenceKernel::new(Vector3::zeros());
        let id = pendulum(&mut kernel);
        let link = LinkHandle::new(id, LinkIndex::new(0));

        kernel.add_joint_torque(link, 1.0).unwrap();
        kernel.add_joint_torque(link, 1.0).unwrap();
        kernel.step_simulation(0.01).unwrap();
        assert_relative_eq!(kernel.joint_applied_torque(link).unwrap(), 2.0);
        assert_relative_eq!(kernel.joint_velocity(link).unwrap(), 0.02, epsilon = 1e-12);

        kernel.step_simulation(0.01).unwrap();
        assert_relative_eq!(kernel.joint_applied_torque(link).unwrap(), 0.0);
        assert_relative_eq!(kernel.joint_velocity(link).unwrap(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_collider_follows_joint() {
        let mut kernel = ReferenceKernel::new(Vector3::zeros());
        let id = pendulum(&mut kernel);
        let link = LinkHandle::new(id, LinkIndex::new(0));

        kernel
            .set_joint_position(link, std::f64::consts::FRAC_PI_2)
            .unwrap();
        kernel.step_simulation(0.01).unwrap();
        let collider = kernel.collider_world_transform(link).unwrap();
        assert_relative_eq!(
            collider.translation.vector,
            Vector3::new(0.0, 0.0, -1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_setup_errors() {
        let mut kernel = ReferenceKernel::default();
        let id = pendulum(&mut kernel);
        let link = LinkHandle::base(id);

        assert_eq!(
            kernel.joint_position(link),
            Err(KernelError::NoJointCoordinate(link))
        );
        assert!(matches!(
            kernel.finalize_multibody(id),
            Err(KernelError::AlreadyFinalized(_))
        ));
        let missing = LinkHandle::new(id, LinkIndex::new(4));
        assert_eq!(
            kernel.joint_velocity(missing),
            Err(KernelError::UnknownLink(missing))
        );

        let open = kernel
            .create_multibody(&BaseDescriptor::floating(1.0, Vector3::zeros()))
            .unwrap();
        assert_eq!(
            kernel.step_simulation(0.01),
            Err(KernelError::NotFinalized(open))
        );
        assert_eq!(kernel.step_simulation(0.0), Err(KernelError::InvalidStep(0.0)));
    }

    #[test]
    fn test_out_of_order_link() {
        let mut kernel = ReferenceKernel::default();
        let id = kernel
            .create_multibody(&BaseDescriptor::floating(1.0, Vector3::zeros()))
            .unwrap();
        let joint = RevoluteJointDescriptor {
            index: LinkIndex::new(1),
            mass: 1.0,
            inertia_diagonal: Vector3::zeros(),
            parent_index: LinkIndex::BASE,
            rotation_from_parent: UnitQuaternion::identity(),
            axis: Vector3::z(),
            parent_pivot_offset: Vector3::zeros(),
            child_pivot_offset: Vector3::zeros(),
            disable_parent_collision: true,
        };
        assert!(matches!(
            kernel.setup_revolute_joint(id, &joint),
            Err(KernelError::LinkOutOfOrder { .. })
        ));
    }

    #[test]
    fn test_remove_multibody() {
        let mut kernel = ReferenceKernel::default();
        let id = pendulum(&mut kernel);
        assert_eq!(kernel.multibody_count(), 1);
        kernel.remove_multibody(id).unwrap();
        assert_eq!(kernel.multibody_count(), 0);
        assert_eq!(
            kernel.remove_multibody(id),
            Err(KernelError::UnknownMultibody(id))
        );
    }
}
