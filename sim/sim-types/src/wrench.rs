//! Force/torque pairs acting on rigid bodies.

use nalgebra::{UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A (force, torque) pair acting on a rigid body.
///
/// Like [`Twist`](crate::Twist), a wrench does not record its frame; see
/// the accumulator in `sim-coupling` for the framed variant.
///
/// # Example
///
/// ```
/// use sim_types::Wrench;
/// use nalgebra::Vector3;
///
/// let a = Wrench::force_only(Vector3::new(1.0, 0.0, 0.0));
/// let b = Wrench::torque_only(Vector3::new(0.0, 0.0, 2.0));
/// let sum = a.add(&b);
/// assert_eq!(sum.force.x, 1.0);
/// assert_eq!(sum.torque.z, 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wrench {
    /// Force (N).
    pub force: Vector3<f64>,
    /// Torque (Nm).
    pub torque: Vector3<f64>,
}

impl Default for Wrench {
    fn default() -> Self {
        Self::zero()
    }
}

impl Wrench {
    /// Create a wrench from force and torque.
    #[must_use]
    pub const fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    /// The zero wrench.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// Pure force.
    #[must_use]
    pub fn force_only(force: Vector3<f64>) -> Self {
        Self {
            force,
            torque: Vector3::zeros(),
        }
    }

    /// Pure torque.
    #[must_use]
    pub fn torque_only(torque: Vector3<f64>) -> Self {
        Self {
            force: Vector3::zeros(),
            torque,
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            force: self.force + other.force,
            torque: self.torque + other.torque,
        }
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            force: self.force * factor,
            torque: self.torque * factor,
        }
    }

    /// Re-express both components through a rotation.
    #[must_use]
    pub fn rotated(&self, rotation: &UnitQuaternion<f64>) -> Self {
        Self {
            force: rotation * self.force,
            torque: rotation * self.torque,
        }
    }

    /// Whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.force == Vector3::zeros() && self.torque == Vector3::zeros()
    }

    /// Check if the wrench contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.force.iter().all(|x| x.is_finite()) && self.torque.iter().all(|x| x.is_finite())
    }
}

impl std::ops::AddAssign for Wrench {
    fn add_assign(&mut self, rhs: Self) {
        self.force += rhs.force;
        self.torque += rhs.torque;
    }
}
