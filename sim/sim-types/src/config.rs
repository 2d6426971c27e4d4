//! Configuration types for simulation.
//!
//! The timestep is validated once, when a simulation is built, and never
//! re-checked per tick.

use crate::dynamics::Gravity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Main configuration for a coupled simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed timestep of one external tick (seconds).
    pub timestep: f64,
    /// Number of kernel sub-steps per tick. Must be exactly 1: the
    /// floating-base differentiator assumes one kernel sample per tick.
    pub substeps: u32,
    /// Gravity in the inertial frame.
    pub gravity: Gravity,
    /// Whether revolute links skip collision with their parent link.
    pub disable_parent_collision: bool,
    /// Maximum simulation time (None for unlimited).
    pub max_time: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 1000.0,
            substeps: 1,
            gravity: Gravity::earth(),
            disable_parent_collision: true,
            max_time: None,
        }
    }
}

impl SimulationConfig {
    /// Create a config with the given timestep.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Gravity::zero();
        self
    }

    /// Set the maximum simulation time.
    #[must_use]
    pub fn max_time(mut self, max_time: f64) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Keep collisions between revolute links and their parents.
    #[must_use]
    pub fn with_parent_collision(mut self) -> Self {
        self.disable_parent_collision = false;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(crate::SimError::InvalidTimestep(self.timestep));
        }

        if self.timestep > 1.0 {
            return Err(crate::SimError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }

        if self.substeps != 1 {
            return Err(crate::SimError::invalid_config(format!(
                "substeps must be 1 (got {}); kernel sub-stepping breaks the one-sample-per-tick contract",
                self.substeps
            )));
        }

        if !self.gravity.acceleration.iter().all(|x| x.is_finite()) {
            return Err(crate::SimError::invalid_config("gravity must be finite"));
        }

        if let Some(max_time) = self.max_time {
            if !max_time.is_finite() || max_time <= 0.0 {
                return Err(crate::SimError::invalid_config(
                    "max_time must be positive and finite",
                ));
            }
        }

        Ok(())
    }

    /// Get the tick frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.timestep
    }
}
