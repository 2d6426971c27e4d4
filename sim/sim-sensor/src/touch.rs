//! Touch sensor.
//!
//! Reports contact on a body when the constraint force accumulated on it this
//! tick exceeds a threshold. The force direction is reported as the contact
//! normal in the world frame.

use nalgebra::{UnitQuaternion, Vector3};
use sim_coupling::{BodyRef, SensorContext, TickSensor};
use sim_types::{SensorData, SensorId, SensorReading};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SensorError;

/// Configuration for a touch sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchSensorConfig {
    /// Force magnitude at which contact is reported (N).
    pub force_threshold: f64,
}

impl Default for TouchSensorConfig {
    fn default() -> Self {
        Self {
            force_threshold: 0.01,
        }
    }
}

impl TouchSensorConfig {
    /// Set the contact threshold.
    #[must_use]
    pub fn with_threshold(mut self, force_threshold: f64) -> Self {
        self.force_threshold = force_threshold;
        self
    }

    /// Check the threshold.
    pub fn validate(&self, sensor: SensorId) -> crate::Result<()> {
        if !self.force_threshold.is_finite() || self.force_threshold < 0.0 {
            return Err(SensorError::invalid_config(
                sensor,
                format!("touch threshold must be non-negative, got {}", self.force_threshold),
            ));
        }
        Ok(())
    }
}

/// Touch sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchReading {
    /// Whether the force exceeds the threshold.
    pub in_contact: bool,
    /// Force magnitude (N).
    pub force: f64,
    /// Unit force direction in the world frame, when in contact.
    pub normal: Option<Vector3<f64>>,
}

impl TouchReading {
    /// Convert to `SensorData` for generic handling.
    #[must_use]
    pub fn to_sensor_data(self) -> SensorData {
        SensorData::Touch {
            in_contact: self.in_contact,
            contact_force: self.force,
            contact_normal: self.normal,
        }
    }
}

/// Binary contact sensor on a body.
#[derive(Debug, Clone)]
pub struct TouchSensor {
    id: SensorId,
    body: BodyRef,
    config: TouchSensorConfig,
    last: Option<SensorReading>,
}

impl TouchSensor {
    /// Create a touch sensor on `body`.
    #[must_use]
    pub fn new(id: SensorId, body: BodyRef, config: TouchSensorConfig) -> Self {
        Self {
            id,
            body,
            config,
            last: None,
        }
    }

    /// Body the sensor is mounted on.
    #[must_use]
    pub fn body(&self) -> BodyRef {
        self.body
    }

    /// Classify a world-frame force.
    #[must_use]
    pub fn process(&self, force: &Vector3<f64>) -> TouchReading {
        let magnitude = force.norm();
        let in_contact = magnitude > self.config.force_threshold && magnitude > 0.0;
        TouchReading {
            in_contact,
            force: magnitude,
            normal: in_contact.then(|| force / magnitude),
        }
    }

    /// Whether the last reading reported contact.
    #[must_use]
    pub fn in_contact(&self) -> bool {
        self.last
            .as_ref()
            .and_then(|r| r.data.as_touch())
            .is_some_and(|(contact, _)| contact)
    }
}

impl TickSensor for TouchSensor {
    fn id(&self) -> SensorId {
        self.id
    }

    fn update(&mut self, ctx: &SensorContext<'_>) -> sim_coupling::Result<()> {
        let model = ctx.robot(self.body.robot).ok_or(SensorError::UnknownRobot {
            sensor: self.id,
            robot: self.body.robot,
        })?;
        if model.joint(self.body.joint).is_none() {
            return Err(SensorError::UnknownBody {
                sensor: self.id,
                body: self.body,
            }
            .into());
        }

        let force = ctx
            .wrenches
            .wrench_in_frame(self.body, &UnitQuaternion::identity())
            .force;
        let reading = self.process(&force);
        debug!(
            sensor = %self.id,
            contact = reading.in_contact,
            force = reading.force,
            "touch updated"
        );
        self.last = Some(SensorReading::new(self.id, ctx.time, reading.to_sensor_data()));
        Ok(())
    }

    fn reading(&self) -> Option<&SensorReading> {
        self.last.as_ref()
    }
}
