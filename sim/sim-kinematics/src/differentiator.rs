//! Floating-base kinematic differentiation.
//!
//! The physics kernel reports the base pose but not the body-frame twist or
//! spatial acceleration the rest of the stack consumes. These functions
//! recover both from two successive samples, one step apart.
//!
//! # Angular velocity
//!
//! The orientation derivative is taken component-wise on the raw quaternion
//! coefficients, `q̇ = (q_curr - q_prev) / dt`, and mapped to a body-frame rate
//! with `ω = 2 · vec(q_curr* ⊗ q̇)`. No hemisphere alignment is applied: if the
//! two quaternions straddle a sign flip the result is wrong, and callers that
//! can produce such pairs must canonicalize first.
//!
//! # Spatial acceleration
//!
//! Twists live in their own body frame. The previous twist is first rotated
//! into the current frame, `R_curr⁻¹ · R_prev · x`, then
//!
//! ```text
//! α = (ω_curr - ω_prev') / dt
//! a = (v_curr - v_prev') / dt + v_curr × ω_curr
//! ```
//!
//! The `v × ω` term accounts for the rotating frame and must not be dropped.

use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use sim_types::{SpatialAcceleration, Twist};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A timestamped pose of the floating base.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseSample {
    /// Orientation of the body frame in the world.
    pub rotation: UnitQuaternion<f64>,
    /// Position of the body frame origin in the world.
    pub position: Point3<f64>,
    /// Tick index the sample was taken at.
    pub step: u64,
}

impl PoseSample {
    /// Create a new pose sample.
    #[must_use]
    pub const fn new(rotation: UnitQuaternion<f64>, position: Point3<f64>, step: u64) -> Self {
        Self {
            rotation,
            position,
            step,
        }
    }
}

/// A twist together with the orientation of the frame it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwistSample {
    /// Angular and linear velocity, expressed in `frame`.
    pub twist: Twist,
    /// World orientation of the frame the twist is expressed in.
    pub frame: UnitQuaternion<f64>,
}

impl TwistSample {
    /// Create a new twist sample.
    #[must_use]
    pub const fn new(twist: Twist, frame: UnitQuaternion<f64>) -> Self {
        Self { twist, frame }
    }

    /// Re-express the twist in another frame: `target⁻¹ · frame · x`.
    #[must_use]
    pub fn in_frame(&self, target: &UnitQuaternion<f64>) -> Twist {
        let angular = target.inverse_transform_vector(&(self.frame * self.twist.angular));
        let linear = target.inverse_transform_vector(&(self.frame * self.twist.linear));
        Twist::new(angular, linear)
    }
}

/// Twist and acceleration recovered for the current sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Differentiated {
    /// Body-frame twist at the current sample.
    pub twist: Twist,
    /// Body-frame spatial acceleration at the current sample.
    pub acceleration: SpatialAcceleration,
}

/// Body-frame linear velocity: `R_curr⁻¹ · (p_curr - p_prev) / dt`.
#[must_use]
pub fn body_linear_velocity(prev: &PoseSample, curr: &PoseSample, dt: f64) -> Vector3<f64> {
    let world = (curr.position - prev.position) / dt;
    curr.rotation.inverse_transform_vector(&world)
}

/// Body-frame angular velocity from two orientations.
#[must_use]
pub fn body_angular_velocity(
    prev: &UnitQuaternion<f64>,
    curr: &UnitQuaternion<f64>,
    dt: f64,
) -> Vector3<f64> {
    let q_dot = Quaternion::from_vector((curr.coords - prev.coords) / dt);
    let product = curr.quaternion().conjugate() * q_dot;
    product.imag() * 2.0
}

/// Body-frame twist between two pose samples.
#[must_use]
pub fn body_twist(prev: &PoseSample, curr: &PoseSample, dt: f64) -> Twist {
    if curr.step != prev.step.wrapping_add(1) {
        warn!(
            prev = prev.step,
            curr = curr.step,
            "pose samples are not consecutive"
        );
    }
    Twist::new(
        body_angular_velocity(&prev.rotation, &curr.rotation, dt),
        body_linear_velocity(prev, curr, dt),
    )
}

/// Spatial acceleration in the current frame from two twists.
#[must_use]
pub fn spatial_acceleration(
    prev: &TwistSample,
    curr: &TwistSample,
    dt: f64,
) -> SpatialAcceleration {
    let prev_in_curr = prev.in_frame(&curr.frame);
    let w = curr.twist.angular;
    let v = curr.twist.linear;

    SpatialAcceleration::new(
        (w - prev_in_curr.angular) / dt,
        (v - prev_in_curr.linear) / dt + v.cross(&w),
    )
}

/// Recover the current twist and acceleration of the floating base.
///
/// `prev_twist` must be expressed in the frame of `prev_pose`.
#[must_use]
pub fn differentiate(
    prev_pose: &PoseSample,
    prev_twist: &Twist,
    curr_pose: &PoseSample,
    dt: f64,
) -> Differentiated {
    let twist = body_twist(prev_pose, curr_pose, dt);
    let acceleration = spatial_acceleration(
        &TwistSample::new(*prev_twist, prev_pose.rotation),
        &TwistSample::new(twist, curr_pose.rotation),
        dt,
    );
    Differentiated {
        twist,
        acceleration,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rz(angle: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle)
    }

    #[test]
    fn test_zero_motion() {
        let dt = 0.01;
        let rotation = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let position = Point3::new(1.0, 2.0, 3.0);
        let prev = PoseSample::new(rotation, position, 4);
        let curr = PoseSample::new(rotation, position, 5);

        let twist = body_twist(&prev, &curr, dt);
        assert_eq!(twist.angular, Vector3::zeros());
        assert_eq!(twist.linear, Vector3::zeros());

        let result = differentiate(&prev, &Twist::zero(), &curr, dt);
        assert_eq!(result.acceleration.angular, Vector3::zeros());
        assert_eq!(result.acceleration.linear, Vector3::zeros());
    }

    #[test]
    fn test_pure_rotation_about_z() {
        let dt = 0.001;
        let rate = 1.5;
        let angle = rate * dt;
        let omega = body_angular_velocity(&UnitQuaternion::identity(), &rz(angle), dt);

        // Chord vs arc error is O(angle³)/dt, well inside angle²/dt.
        let tolerance = angle * angle / dt;
        assert!((omega.z - angle / dt).abs() < tolerance);
        assert!(omega.x.abs() < 1e-12);
        assert!(omega.y.abs() < 1e-12);
    }

    #[test]
    fn test_rotation_is_body_frame() {
        // Base pitched 90° about Y, spinning about its own Z axis.
        let dt = 0.001;
        let tilt = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2);
        let prev = tilt;
        let curr = tilt * rz(2.0 * dt);

        let omega = body_angular_velocity(&prev, &curr, dt);
        assert_relative_eq!(omega, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_linear_velocity_in_body_frame() {
        let dt = 0.01;
        let rotation = rz(std::f64::consts::FRAC_PI_2);
        let prev = PoseSample::new(rotation, Point3::origin(), 0);
        let curr = PoseSample::new(rotation, Point3::new(0.0, 0.01, 0.0), 1);

        // World +Y is body +X after a quarter turn about Z.
        let v = body_linear_velocity(&prev, &curr, dt);
        assert_relative_eq!(v, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_circular_motion_correction_term() {
        let rate = 2.0;
        let radius = 0.5;
        let speed = rate * radius;
        let dt = 1e-3;
        let angle = rate * dt;

        // Body spinning at `rate` about Z while moving at `speed` along its own
        // +X. The previous velocity is stored in the unrotated frame already
        // turned by `angle`, so both samples read (speed, 0, 0) once expressed
        // in the current frame. The finite difference is then zero and the
        // whole rate² · radius magnitude has to come from v × ω.
        let prev = TwistSample::new(
            Twist::new(
                Vector3::new(0.0, 0.0, rate),
                rz(angle) * Vector3::new(speed, 0.0, 0.0),
            ),
            UnitQuaternion::identity(),
        );
        let curr = TwistSample::new(
            Twist::new(Vector3::new(0.0, 0.0, rate), Vector3::new(speed, 0.0, 0.0)),
            rz(angle),
        );

        let acc = spatial_acceleration(&prev, &curr, dt);
        assert_relative_eq!(acc.linear.y, -rate * rate * radius, epsilon = 1e-9);
        assert_relative_eq!(acc.linear.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(acc.angular, Vector3::zeros(), epsilon = 1e-9);

        // Without v × ω the same samples give no acceleration at all.
        let naive = (curr.twist.linear - prev.in_frame(&curr.frame).linear) / dt;
        assert!(naive.norm() < 1e-9);
        assert!((acc.linear - naive).norm() > 1.0);
    }

    #[test]
    fn test_in_frame_round_trip() {
        let twist = Twist::new(Vector3::new(0.1, 0.2, 0.3), Vector3::new(1.0, -1.0, 0.5));
        let frame = UnitQuaternion::from_euler_angles(0.4, 0.1, -0.7);
        let sample = TwistSample::new(twist, frame);

        let world = sample.in_frame(&UnitQuaternion::identity());
        assert_relative_eq!(world.linear, frame * twist.linear, epsilon = 1e-12);

        let back = TwistSample::new(world, UnitQuaternion::identity()).in_frame(&frame);
        assert_relative_eq!(back.angular, twist.angular, epsilon = 1e-12);
        assert_relative_eq!(back.linear, twist.linear, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_acceleration_along_body_x() {
        let dt = 0.01;
        let prev = TwistSample::new(Twist::linear(Vector3::new(1.0, 0.0, 0.0)), rz(0.0));
        let curr = TwistSample::new(Twist::linear(Vector3::new(1.02, 0.0, 0.0)), rz(0.0));

        let acc = spatial_acceleration(&prev, &curr, dt);
        assert_relative_eq!(acc.linear, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-9);
    }
}
