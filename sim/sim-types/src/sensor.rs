//! Sensor readings produced during the post-update phase of a tick.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorId(pub u64);

impl SensorId {
    /// Create a new sensor ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SensorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensor({})", self.0)
    }
}

/// Type of sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorType {
    /// Inertial measurement unit (accelerometer + gyroscope).
    Imu,
    /// Force/torque sensor (6-axis).
    ForceTorque,
    /// Touch/contact sensor.
    Touch,
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imu => write!(f, "IMU"),
            Self::ForceTorque => write!(f, "Force/Torque"),
            Self::Touch => write!(f, "Touch"),
        }
    }
}

/// A reading from a sensor at a specific time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorReading {
    /// ID of the sensor that produced this reading.
    pub sensor_id: SensorId,
    /// Simulation time at which the reading was taken.
    pub timestamp: f64,
    /// The sensor data.
    pub data: SensorData,
}

impl SensorReading {
    /// Create a new sensor reading.
    #[must_use]
    pub fn new(sensor_id: SensorId, timestamp: f64, data: SensorData) -> Self {
        Self {
            sensor_id,
            timestamp,
            data,
        }
    }

    /// Type of the sensor that produced this reading.
    #[must_use]
    pub fn sensor_type(&self) -> SensorType {
        self.data.sensor_type()
    }
}

/// Data from a sensor reading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorData {
    /// IMU reading.
    Imu {
        /// Specific force in the sensor frame (m/s²).
        linear_acceleration: Vector3<f64>,
        /// Angular velocity in the sensor frame (rad/s).
        angular_velocity: Vector3<f64>,
    },

    /// Force/torque sensor reading.
    ForceTorque {
        /// Force in the sensor frame (N).
        force: Vector3<f64>,
        /// Torque in the sensor frame (Nm).
        torque: Vector3<f64>,
    },

    /// Touch sensor reading.
    Touch {
        /// Whether contact is detected.
        in_contact: bool,
        /// Contact force magnitude (N).
        contact_force: f64,
        /// Direction of the contact force (if in contact).
        contact_normal: Option<Vector3<f64>>,
    },
}

impl SensorData {
    /// The sensor type this data belongs to.
    #[must_use]
    pub fn sensor_type(&self) -> SensorType {
        match self {
            Self::Imu { .. } => SensorType::Imu,
            Self::ForceTorque { .. } => SensorType::ForceTorque,
            Self::Touch { .. } => SensorType::Touch,
        }
    }

    /// Get IMU data as `(linear_acceleration, angular_velocity)`.
    #[must_use]
    pub fn as_imu(&self) -> Option<(&Vector3<f64>, &Vector3<f64>)> {
        match self {
            Self::Imu {
                linear_acceleration,
                angular_velocity,
            } => Some((linear_acceleration, angular_velocity)),
            _ => None,
        }
    }

    /// Get force/torque data as `(force, torque)`.
    #[must_use]
    pub fn as_force_torque(&self) -> Option<(&Vector3<f64>, &Vector3<f64>)> {
        match self {
            Self::ForceTorque { force, torque } => Some((force, torque)),
            _ => None,
        }
    }

    /// Get touch data as `(in_contact, contact_force)`.
    #[must_use]
    pub fn as_touch(&self) -> Option<(bool, f64)> {
        match self {
            Self::Touch {
                in_contact,
                contact_force,
                ..
            } => Some((*in_contact, *contact_force)),
            _ => None,
        }
    }

    /// Flatten to a vector of values for logging or learning pipelines.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Imu {
                linear_acceleration: a,
                angular_velocity: w,
            } => vec![a.x, a.y, a.z, w.x, w.y, w.z],
            Self::ForceTorque { force: f, torque: t } => vec![f.x, f.y, f.z, t.x, t.y, t.z],
            Self::Touch {
                in_contact,
                contact_force,
                contact_normal,
            } => {
                let n = contact_normal.unwrap_or_else(Vector3::zeros);
                vec![
                    if *in_contact { 1.0 } else { 0.0 },
                    *contact_force,
                    n.x,
                    n.y,
                    n.z,
                ]
            }
        }
    }
}
