//! Descriptors used to register a multibody with a kernel.

use nalgebra::{Isometry3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::handle::LinkIndex;

/// The base object of a multibody.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BaseDescriptor {
    /// Base mass (kg).
    pub mass: f64,
    /// Principal inertia of the base about its centre of mass.
    pub inertia_diagonal: Vector3<f64>,
    /// Initial world transform of the base collider (centre-of-mass frame).
    pub collider_transform: Isometry3<f64>,
    /// Whether the base is welded to the world.
    pub fixed_base: bool,
}

impl BaseDescriptor {
    /// A floating base.
    #[must_use]
    pub fn floating(mass: f64, inertia_diagonal: Vector3<f64>) -> Self {
        Self {
            mass,
            inertia_diagonal,
            collider_transform: Isometry3::identity(),
            fixed_base: false,
        }
    }

    /// Set the initial collider transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.collider_transform = transform;
        self
    }

    /// Weld the base to the world.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.fixed_base = true;
        self
    }
}

/// A revolute link.
///
/// Frames follow the usual multibody convention: the link's collider frame is
/// its centre-of-mass frame, and
///
/// ```text
/// X_link = X_parent · T(parent_pivot_offset) · R(rotation_from_parent)
///          · R(axis, q) · T(child_pivot_offset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RevoluteJointDescriptor {
    /// Slot of this link. Must equal the number of links already set up.
    pub index: LinkIndex,
    /// Link mass (kg).
    pub mass: f64,
    /// Principal inertia about the link's centre of mass.
    pub inertia_diagonal: Vector3<f64>,
    /// Parent link, [`LinkIndex::BASE`] for the base.
    pub parent_index: LinkIndex,
    /// Rotation from the parent collider frame to the joint frame.
    pub rotation_from_parent: UnitQuaternion<f64>,
    /// Joint axis in the joint frame (unit length).
    pub axis: Vector3<f64>,
    /// Pivot position in the parent collider frame.
    pub parent_pivot_offset: Vector3<f64>,
    /// Link centre of mass relative to the pivot, in the link frame.
    pub child_pivot_offset: Vector3<f64>,
    /// Skip collision between this link and its parent.
    pub disable_parent_collision: bool,
}

impl RevoluteJointDescriptor {
    /// Local transform from the parent collider frame to this link's collider
    /// frame at joint position `q`.
    #[must_use]
    pub fn local_transform(&self, q: f64) -> Isometry3<f64> {
        let axis = nalgebra::Unit::new_normalize(self.axis);
        Isometry3::from_parts(self.parent_pivot_offset.into(), self.rotation_from_parent)
            * UnitQuaternion::from_axis_angle(&axis, q)
            * nalgebra::Translation3::from(self.child_pivot_offset)
    }
}
