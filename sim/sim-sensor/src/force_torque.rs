//! Force/Torque sensor.
//!
//! A 6-axis force/torque sensor mounted on a body. Each tick it reads the
//! wrench accumulated on that body during the pull phase (the joint reaction
//! reported by the physics kernel) and expresses it in the sensor frame.

use nalgebra::{UnitQuaternion, Vector3};
use sim_coupling::{BodyRef, SensorContext, TickSensor};
use sim_types::{SensorData, SensorId, SensorReading};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{body_rotation, saturate, SensorError};

/// Configuration for a force/torque sensor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceTorqueSensorConfig {
    /// Position of the sensor in the body's local frame.
    pub local_position: Vector3<f64>,

    /// Orientation of the sensor in the body's local frame.
    pub local_rotation: UnitQuaternion<f64>,

    /// Maximum force magnitude before saturation (N).
    /// Set to infinity for no limit.
    pub max_force: f64,

    /// Maximum torque magnitude before saturation (Nm).
    /// Set to infinity for no limit.
    pub max_torque: f64,

    /// Force bias (constant offset in sensor frame).
    pub force_bias: Vector3<f64>,

    /// Torque bias (constant offset in sensor frame).
    pub torque_bias: Vector3<f64>,

    /// Forces below this magnitude are reported as zero (N).
    pub force_deadband: f64,

    /// Torques below this magnitude are reported as zero (Nm).
    pub torque_deadband: f64,
}

impl Default for ForceTorqueSensorConfig {
    fn default() -> Self {
        Self {
            local_position: Vector3::zeros(),
            local_rotation: UnitQuaternion::identity(),
            max_force: f64::INFINITY,
            max_torque: f64::INFINITY,
            force_bias: Vector3::zeros(),
            torque_bias: Vector3::zeros(),
            force_deadband: 0.0,
            torque_deadband: 0.0,
        }
    }
}

impl ForceTorqueSensorConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the local position of the sensor.
    #[must_use]
    pub fn with_local_position(mut self, position: Vector3<f64>) -> Self {
        self.local_position = position;
        self
    }

    /// Set the local rotation of the sensor.
    #[must_use]
    pub fn with_local_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.local_rotation = rotation;
        self
    }

    /// Set maximum force before saturation.
    #[must_use]
    pub fn with_max_force(mut self, max: f64) -> Self {
        self.max_force = max;
        self
    }

    /// Set maximum torque before saturation.
    #[must_use]
    pub fn with_max_torque(mut self, max: f64) -> Self {
        self.max_torque = max;
        self
    }

    /// Set force bias.
    #[must_use]
    pub fn with_force_bias(mut self, bias: Vector3<f64>) -> Self {
        self.force_bias = bias;
        self
    }

    /// Set torque bias.
    #[must_use]
    pub fn with_torque_bias(mut self, bias: Vector3<f64>) -> Self {
        self.torque_bias = bias;
        self
    }

    /// Set force deadband.
    #[must_use]
    pub fn with_force_deadband(mut self, deadband: f64) -> Self {
        self.force_deadband = deadband;
        self
    }

    /// Set torque deadband.
    #[must_use]
    pub fn with_torque_deadband(mut self, deadband: f64) -> Self {
        self.torque_deadband = deadband;
        self
    }

    /// Create an ideal sensor with no limits or bias.
    #[must_use]
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Create a sensor with typical industrial-grade limits.
    #[must_use]
    pub fn realistic() -> Self {
        Self {
            max_force: 1000.0,
            max_torque: 100.0,
            force_deadband: 0.5,
            torque_deadband: 0.05,
            ..Self::default()
        }
    }

    /// Check limits and deadbands.
    pub fn validate(&self, sensor: SensorId) -> crate::Result<()> {
        if self.max_force.is_nan()
            || self.max_torque.is_nan()
            || self.max_force <= 0.0
            || self.max_torque <= 0.0
        {
            return Err(SensorError::invalid_config(
                sensor,
                "saturation limits must be positive",
            ));
        }
        if !self.force_deadband.is_finite()
            || !self.torque_deadband.is_finite()
            || self.force_deadband < 0.0
            || self.torque_deadband < 0.0
        {
            return Err(SensorError::invalid_config(
                sensor,
                "deadbands must be non-negative",
            ));
        }
        if !self.local_position.iter().all(|x| x.is_finite()) {
            return Err(SensorError::invalid_config(
                sensor,
                "local position must be finite",
            ));
        }
        Ok(())
    }
}

/// Force/torque sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceTorqueReading {
    /// Force in sensor frame (N).
    pub force: Vector3<f64>,
    /// Torque in sensor frame (Nm).
    pub torque: Vector3<f64>,
}

impl ForceTorqueReading {
    /// Create a new force/torque reading.
    #[must_use]
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    /// Create a zero reading.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// Get the force magnitude.
    #[must_use]
    pub fn force_magnitude(&self) -> f64 {
        self.force.norm()
    }

    /// Get the torque magnitude.
    #[must_use]
    pub fn torque_magnitude(&self) -> f64 {
        self.torque.norm()
    }

    /// Convert to `SensorData` for generic handling.
    #[must_use]
    pub fn to_sensor_data(self) -> SensorData {
        SensorData::ForceTorque {
            force: self.force,
            torque: self.torque,
        }
    }
}

impl Default for ForceTorqueReading {
    fn default() -> Self {
        Self::zero()
    }
}

/// 6-axis force/torque sensor.
///
/// # Example
///
/// ```
/// use sim_coupling::{BodyRef, RobotId};
/// use sim_sensor::{ForceTorqueSensor, ForceTorqueSensorConfig};
/// use sim_types::{JointId, SensorId};
/// use nalgebra::Vector3;
///
/// let body = BodyRef::new(RobotId::new(0), JointId::new(1));
/// let sensor = ForceTorqueSensor::new(SensorId::new(1), body, ForceTorqueSensorConfig::default());
///
/// let reading = sensor.process(Vector3::new(10.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
/// assert_eq!(reading.force.x, 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct ForceTorqueSensor {
    id: SensorId,
    body: BodyRef,
    name: Option<String>,
    config: ForceTorqueSensorConfig,
    last: Option<SensorReading>,
}

impl ForceTorqueSensor {
    /// Create a new force/torque sensor on `body`.
    #[must_use]
    pub fn new(id: SensorId, body: BodyRef, config: ForceTorqueSensorConfig) -> Self {
        Self {
            id,
            body,
            name: None,
            config,
            last: None,
        }
    }

    /// Set the sensor name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Body the sensor is mounted on.
    #[must_use]
    pub fn body(&self) -> BodyRef {
        self.body
    }

    /// Get the sensor name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the sensor configuration.
    #[must_use]
    pub fn config(&self) -> &ForceTorqueSensorConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut ForceTorqueSensorConfig {
        &mut self.config
    }

    /// Process a body-frame wrench through the sensor model.
    ///
    /// Applies, in order: moment transfer to the sensor origin, rotation into
    /// the sensor frame, deadband, saturation, bias.
    #[must_use]
    pub fn process(&self, force_body: Vector3<f64>, torque_body: Vector3<f64>) -> ForceTorqueReading {
        let torque_at_sensor = torque_body - self.config.local_position.cross(&force_body);

        let inv = self.config.local_rotation.inverse();
        let force_sensor = inv * force_body;
        let torque_sensor = inv * torque_at_sensor;

        let force_filtered = if force_sensor.norm() < self.config.force_deadband {
            Vector3::zeros()
        } else {
            force_sensor
        };
        let torque_filtered = if torque_sensor.norm() < self.config.torque_deadband {
            Vector3::zeros()
        } else {
            torque_sensor
        };

        let force = saturate(force_filtered, self.config.max_force) + self.config.force_bias;
        let torque = saturate(torque_filtered, self.config.max_torque) + self.config.torque_bias;
        ForceTorqueReading::new(force, torque)
    }

    /// Last processed reading in typed form.
    #[must_use]
    pub fn last_reading(&self) -> Option<ForceTorqueReading> {
        self.last.as_ref().and_then(|r| {
            r.data
                .as_force_torque()
                .map(|(f, t)| ForceTorqueReading::new(*f, *t))
        })
    }
}

impl TickSensor for ForceTorqueSensor {
    fn id(&self) -> SensorId {
        self.id
    }

    fn update(&mut self, ctx: &SensorContext<'_>) -> sim_coupling::Result<()> {
        let rotation = body_rotation(ctx, self.id, self.body)?;
        let wrench = ctx.wrenches.wrench_in_frame(self.body, &rotation);
        let reading = self.process(wrench.force, wrench.torque);
        debug!(
            sensor = %self.id,
            force = reading.force_magnitude(),
            torque = reading.torque_magnitude(),
            "force/torque updated"
        );
        self.last = Some(SensorReading::new(self.id, ctx.time, reading.to_sensor_data()));
        Ok(())
    }

    fn reading(&self) -> Option<&SensorReading> {
        self.last.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_coupling::{FramedWrench, RobotId, WrenchAccumulator};
    use sim_kinematics::{JointSpec, RigidBody, RobotModel};
    use sim_types::{JointAxis, JointId, MassProperties, Pose, Wrench};

    fn body() -> BodyRef {
        BodyRef::new(RobotId::new(0), JointId::new(1))
    }

    fn sensor(config: ForceTorqueSensorConfig) -> ForceTorqueSensor {
        ForceTorqueSensor::new(SensorId::new(7), body(), config)
    }

    #[test]
    fn test_config_builder() {
        let config = ForceTorqueSensorConfig::new()
            .with_max_force(100.0)
            .with_max_torque(10.0)
            .with_force_deadband(0.5);

        assert_eq!(config.max_force, 100.0);
        assert_eq!(config.max_torque, 10.0);
        assert_eq!(config.force_deadband, 0.5);
        assert!(config.validate(SensorId::new(0)).is_ok());
    }

    #[test]
    fn test_config_validation() {
        let id = SensorId::new(3);
        assert!(ForceTorqueSensorConfig::new()
            .with_max_force(0.0)
            .validate(id)
            .is_err());
        assert!(ForceTorqueSensorConfig::new()
            .with_torque_deadband(-1.0)
            .validate(id)
            .is_err());
        assert!(ForceTorqueSensorConfig::realistic().validate(id).is_ok());
    }

    #[test]
    fn test_sensor_passthrough() {
        let s = sensor(ForceTorqueSensorConfig::ideal());
        let reading = s.process(Vector3::new(10.0, 20.0, 30.0), Vector3::new(1.0, 2.0, 3.0));

        assert_relative_eq!(reading.force, Vector3::new(10.0, 20.0, 30.0));
        assert_relative_eq!(reading.torque, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_sensor_saturation() {
        let s = sensor(ForceTorqueSensorConfig::new().with_max_force(10.0).with_max_torque(1.0));
        let reading = s.process(Vector3::new(100.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0));

        assert_relative_eq!(reading.force.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(reading.torque.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sensor_deadband() {
        let s = sensor(
            ForceTorqueSensorConfig::new()
                .with_force_deadband(1.0)
                .with_torque_deadband(0.1),
        );

        let reading = s.process(Vector3::new(0.5, 0.0, 0.0), Vector3::new(0.05, 0.0, 0.0));
        assert_eq!(reading.force.norm(), 0.0);
        assert_eq!(reading.torque.norm(), 0.0);

        let reading = s.process(Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.2, 0.0, 0.0));
        assert!(reading.force.norm() > 0.0);
        assert!(reading.torque.norm() > 0.0);
    }

    #[test]
    fn test_sensor_bias() {
        let s = sensor(
            ForceTorqueSensorConfig::new()
                .with_force_bias(Vector3::new(1.0, 0.0, 0.0))
                .with_torque_bias(Vector3::new(0.0, 0.1, 0.0)),
        );
        let reading = s.process(Vector3::zeros(), Vector3::zeros());

        assert_relative_eq!(reading.force.x, 1.0);
        assert_relative_eq!(reading.torque.y, 0.1);
    }

    #[test]
    fn test_sensor_rotation() {
        let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let s = sensor(ForceTorqueSensorConfig::new().with_local_rotation(rotation));

        // +X in the body frame is -Y in a sensor frame turned 90° about Z.
        let reading = s.process(Vector3::new(10.0, 0.0, 0.0), Vector3::zeros());
        assert_relative_eq!(reading.force, Vector3::new(0.0, -10.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_moment_transfer() {
        let s = sensor(ForceTorqueSensorConfig::new().with_local_position(Vector3::new(0.5, 0.0, 0.0)));

        // Upward force at the body origin seen from 0.5 m along +X.
        let reading = s.process(Vector3::new(0.0, 0.0, 10.0), Vector3::zeros());
        assert_relative_eq!(reading.torque, Vector3::new(0.0, 5.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_update_reads_accumulator_in_body_frame() {
        let mut model = RobotModel::new(
            "r",
            JointSpec::floating("root", RigidBody::new("base", MassProperties::point_mass(1.0))),
        )
        .unwrap();
        let hinge = model
            .add_joint(
                model.root(),
                JointSpec::revolute(
                    "hinge",
                    JointAxis::x(),
                    RigidBody::new("arm", MassProperties::point_mass(1.0)),
                ),
            )
            .unwrap();
        model.base_mut().pose = Pose::from_position_rotation(
            nalgebra::Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        model.update_frames();

        let body = BodyRef::new(RobotId::new(0), hinge);
        let mut wrenches = WrenchAccumulator::new();
        wrenches
            .add(body, FramedWrench::world(Wrench::force_only(Vector3::new(0.0, 5.0, 0.0))))
            .unwrap();

        let ctx = SensorContext::new(0.5, 50, Vector3::zeros(), &wrenches, vec![&model]);
        let mut s = ForceTorqueSensor::new(SensorId::new(1), body, ForceTorqueSensorConfig::ideal());
        assert!(s.reading().is_none());
        s.update(&ctx).unwrap();

        // World +Y is body +X after a 90° yaw.
        let reading = s.last_reading().unwrap();
        assert_relative_eq!(reading.force, Vector3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(s.reading().unwrap().timestamp, 0.5);
    }

    #[test]
    fn test_update_unknown_body() {
        let model = RobotModel::new(
            "r",
            JointSpec::floating("root", RigidBody::new("base", MassProperties::point_mass(1.0))),
        )
        .unwrap();
        let wrenches = WrenchAccumulator::new();
        let ctx = SensorContext::new(0.0, 0, Vector3::zeros(), &wrenches, vec![&model]);

        let mut s = sensor(ForceTorqueSensorConfig::ideal());
        assert!(s.update(&ctx).is_err());

        let mut s = ForceTorqueSensor::new(
            SensorId::new(2),
            BodyRef::new(RobotId::new(4), JointId::new(0)),
            ForceTorqueSensorConfig::ideal(),
        );
        assert!(s.update(&ctx).is_err());
    }
}
