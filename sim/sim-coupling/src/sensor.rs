//! Sensors updated in the post-update phase of a tick.

use nalgebra::Vector3;
use sim_kinematics::RobotModel;
use sim_types::{SensorId, SensorReading};

use crate::wrench::{RobotId, WrenchAccumulator};
use crate::Result;

/// Read-only view of the simulation handed to sensors after a tick.
#[derive(Debug)]
pub struct SensorContext<'a> {
    /// Simulation time after the tick (seconds).
    pub time: f64,
    /// Number of completed ticks.
    pub tick: u64,
    /// Gravity in the world frame.
    pub gravity: Vector3<f64>,
    /// Wrenches accumulated during this tick's pull phase.
    pub wrenches: &'a WrenchAccumulator,
    robots: Vec<&'a RobotModel>,
}

impl<'a> SensorContext<'a> {
    /// Create a context. `robots` is indexed by [`RobotId`].
    #[must_use]
    pub fn new(
        time: f64,
        tick: u64,
        gravity: Vector3<f64>,
        wrenches: &'a WrenchAccumulator,
        robots: Vec<&'a RobotModel>,
    ) -> Self {
        Self {
            time,
            tick,
            gravity,
            wrenches,
            robots,
        }
    }

    /// Robot model by ID.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&'a RobotModel> {
        self.robots.get(id.index()).copied()
    }

    /// Robot model by ID, or [`CouplingError::UnknownRobot`](crate::CouplingError::UnknownRobot).
    pub fn require_robot(&self, id: RobotId) -> Result<&'a RobotModel> {
        self.robot(id)
            .ok_or(crate::CouplingError::UnknownRobot(id))
    }
}

/// A sensor consuming post-update state once per tick.
pub trait TickSensor {
    /// Sensor identifier.
    fn id(&self) -> SensorId;

    /// Refresh the reading from the current tick.
    fn update(&mut self, ctx: &SensorContext<'_>) -> Result<()>;

    /// Most recent reading, if the sensor has updated at least once.
    fn reading(&self) -> Option<&SensorReading>;
}
