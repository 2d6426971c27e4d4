//! Inertial measurement unit on a floating base.
//!
//! The IMU reads the base twist and spatial acceleration reconstructed by the
//! coupling layer during the pull phase. Accelerometers measure specific force
//! (kinematic acceleration minus gravity), so a base at rest reads +g upward
//! and a base in free fall reads zero.

use nalgebra::{UnitQuaternion, Vector3};
use sim_coupling::{RobotId, SensorContext, TickSensor};
use sim_kinematics::FloatingBaseState;
use sim_types::{SensorData, SensorId, SensorReading};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{saturate, SensorError};

/// Configuration for an IMU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuConfig {
    /// Position of the IMU in the base frame.
    pub local_position: Vector3<f64>,

    /// Orientation of the IMU in the base frame.
    pub local_rotation: UnitQuaternion<f64>,

    /// Report kinematic acceleration instead of specific force.
    pub gravity_compensated: bool,

    /// Accelerometer bias in the sensor frame (m/s²).
    pub accel_bias: Vector3<f64>,

    /// Gyroscope bias in the sensor frame (rad/s).
    pub gyro_bias: Vector3<f64>,

    /// Accelerometer range (m/s²). Infinity for no limit.
    pub max_acceleration: f64,

    /// Gyroscope range (rad/s). Infinity for no limit.
    pub max_angular_velocity: f64,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            local_position: Vector3::zeros(),
            local_rotation: UnitQuaternion::identity(),
            gravity_compensated: false,
            accel_bias: Vector3::zeros(),
            gyro_bias: Vector3::zeros(),
            max_acceleration: f64::INFINITY,
            max_angular_velocity: f64::INFINITY,
        }
    }
}

impl ImuConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mounting position.
    #[must_use]
    pub fn with_local_position(mut self, position: Vector3<f64>) -> Self {
        self.local_position = position;
        self
    }

    /// Set the mounting orientation.
    #[must_use]
    pub fn with_local_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.local_rotation = rotation;
        self
    }

    /// Remove gravity from the accelerometer output.
    #[must_use]
    pub fn gravity_compensated(mut self) -> Self {
        self.gravity_compensated = true;
        self
    }

    /// Set accelerometer bias.
    #[must_use]
    pub fn with_accel_bias(mut self, bias: Vector3<f64>) -> Self {
        self.accel_bias = bias;
        self
    }

    /// Set gyroscope bias.
    #[must_use]
    pub fn with_gyro_bias(mut self, bias: Vector3<f64>) -> Self {
        self.gyro_bias = bias;
        self
    }

    /// Set accelerometer and gyroscope ranges.
    #[must_use]
    pub fn with_ranges(mut self, max_acceleration: f64, max_angular_velocity: f64) -> Self {
        self.max_acceleration = max_acceleration;
        self.max_angular_velocity = max_angular_velocity;
        self
    }

    /// Check ranges.
    pub fn validate(&self, sensor: SensorId) -> crate::Result<()> {
        if self.max_acceleration.is_nan()
            || self.max_angular_velocity.is_nan()
            || self.max_acceleration <= 0.0
            || self.max_angular_velocity <= 0.0
        {
            return Err(SensorError::invalid_config(sensor, "ranges must be positive"));
        }
        Ok(())
    }
}

/// IMU reading in the sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuReading {
    /// Specific force, or kinematic acceleration when gravity-compensated (m/s²).
    pub linear_acceleration: Vector3<f64>,
    /// Angular velocity (rad/s).
    pub angular_velocity: Vector3<f64>,
}

impl ImuReading {
    /// Convert to `SensorData` for generic handling.
    #[must_use]
    pub fn to_sensor_data(self) -> SensorData {
        SensorData::Imu {
            linear_acceleration: self.linear_acceleration,
            angular_velocity: self.angular_velocity,
        }
    }
}

/// IMU mounted on a robot's floating base.
#[derive(Debug, Clone)]
pub struct Imu {
    id: SensorId,
    robot: RobotId,
    config: ImuConfig,
    last: Option<SensorReading>,
}

impl Imu {
    /// Create an IMU on the base of `robot`.
    #[must_use]
    pub fn new(id: SensorId, robot: RobotId, config: ImuConfig) -> Self {
        Self {
            id,
            robot,
            config,
            last: None,
        }
    }

    /// Robot whose base carries the IMU.
    #[must_use]
    pub fn robot(&self) -> RobotId {
        self.robot
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ImuConfig {
        &self.config
    }

    /// Compute a reading from a base state and world gravity.
    #[must_use]
    pub fn process(&self, base: &FloatingBaseState, gravity: &Vector3<f64>) -> ImuReading {
        let omega = base.twist.angular;
        let alpha = base.acceleration.angular;
        let p = self.config.local_position;

        // Rigid-body transfer from the base origin to the mounting point.
        let mut accel = base.acceleration.linear + alpha.cross(&p) + omega.cross(&omega.cross(&p));
        if !self.config.gravity_compensated {
            accel -= base.pose.rotation.inverse_transform_vector(gravity);
        }

        let inv = self.config.local_rotation.inverse();
        let accel = saturate(inv * accel, self.config.max_acceleration) + self.config.accel_bias;
        let gyro = saturate(inv * omega, self.config.max_angular_velocity) + self.config.gyro_bias;

        ImuReading {
            linear_acceleration: accel,
            angular_velocity: gyro,
        }
    }

    /// Last reading in typed form.
    #[must_use]
    pub fn last_reading(&self) -> Option<ImuReading> {
        self.last.as_ref().and_then(|r| {
            r.data.as_imu().map(|(a, w)| ImuReading {
                linear_acceleration: *a,
                angular_velocity: *w,
            })
        })
    }
}

impl TickSensor for Imu {
    fn id(&self) -> SensorId {
        self.id
    }

    fn update(&mut self, ctx: &SensorContext<'_>) -> sim_coupling::Result<()> {
        let model = ctx.robot(self.robot).ok_or(SensorError::UnknownRobot {
            sensor: self.id,
            robot: self.robot,
        })?;
        let reading = self.process(model.base(), &ctx.gravity);
        debug!(
            sensor = %self.id,
            accel = reading.linear_acceleration.norm(),
            gyro = reading.angular_velocity.norm(),
            "imu updated"
        );
        self.last = Some(SensorReading::new(self.id, ctx.time, reading.to_sensor_data()));
        Ok(())
    }

    fn reading(&self) -> Option<&SensorReading> {
        self.last.as_ref()
    }
}
