//! Per-tick wrench accumulator.
//!
//! Populated from constraint readouts during the pull phase and read by
//! sensors during post-update. Reset once per tick before any pull.

use hashbrown::HashMap;
use nalgebra::UnitQuaternion;
use sim_types::{JointId, Wrench};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CouplingError;
use crate::Result;

/// Angle below which two frames are considered the same (rad).
const FRAME_TOLERANCE: f64 = 1e-9;

/// Identifier of a robot registered with a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RobotId(pub usize);

impl RobotId {
    /// Create a robot ID.
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RobotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Robot({})", self.0)
    }
}

/// A rigid body: the body carried by `joint` in robot `robot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyRef {
    /// Owning robot.
    pub robot: RobotId,
    /// Joint carrying the body.
    pub joint: JointId,
}

impl BodyRef {
    /// Create a body reference.
    #[must_use]
    pub const fn new(robot: RobotId, joint: JointId) -> Self {
        Self { robot, joint }
    }
}

impl std::fmt::Display for BodyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.robot, self.joint)
    }
}

/// A wrench with the orientation of the frame it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramedWrench {
    /// Force and torque, expressed in `frame`.
    pub wrench: Wrench,
    /// World orientation of the expression frame.
    pub frame: UnitQuaternion<f64>,
}

impl FramedWrench {
    /// A wrench expressed in the world frame.
    #[must_use]
    pub fn world(wrench: Wrench) -> Self {
        Self {
            wrench,
            frame: UnitQuaternion::identity(),
        }
    }

    /// Re-express in another frame: `target⁻¹ · frame · x`.
    #[must_use]
    pub fn in_frame(&self, target: &UnitQuaternion<f64>) -> Wrench {
        self.wrench.rotated(&(target.inverse() * self.frame))
    }
}

/// Map from rigid body to the external wrench accumulated this tick.
#[derive(Debug, Clone, Default)]
pub struct WrenchAccumulator {
    entries: HashMap<BodyRef, FramedWrench>,
    resets: u64,
}

impl WrenchAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every entry. Called once per tick before the pull phase.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.resets += 1;
    }

    /// Number of resets so far (one per tick).
    #[must_use]
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    /// Accumulate a wrench on a body.
    ///
    /// The first wrench fixes the entry's frame for the rest of the tick;
    /// later wrenches must be expressed in the same frame.
    pub fn add(&mut self, body: BodyRef, wrench: FramedWrench) -> Result<()> {
        match self.entries.get_mut(&body) {
            Some(entry) => {
                if entry.frame.angle_to(&wrench.frame) > FRAME_TOLERANCE {
                    return Err(CouplingError::FrameMismatch(body));
                }
                entry.wrench += wrench.wrench;
            }
            None => {
                self.entries.insert(body, wrench);
            }
        }
        Ok(())
    }

    /// Accumulated wrench on a body, in its entry frame. Zero if nothing was
    /// added this tick.
    #[must_use]
    pub fn get(&self, body: BodyRef) -> Wrench {
        self.entries
            .get(&body)
            .map_or_else(Wrench::zero, |entry| entry.wrench)
    }

    /// Accumulated wrench with its frame, if anything was added.
    #[must_use]
    pub fn entry(&self, body: BodyRef) -> Option<&FramedWrench> {
        self.entries.get(&body)
    }

    /// Accumulated wrench on a body re-expressed in `frame`.
    #[must_use]
    pub fn wrench_in_frame(&self, body: BodyRef, frame: &UnitQuaternion<f64>) -> Wrench {
        self.entries
            .get(&body)
            .map_or_else(Wrench::zero, |entry| entry.in_frame(frame))
    }

    /// Number of bodies with an entry this tick.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no body has an entry this tick.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a non-zero wrench.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (&BodyRef, &FramedWrench)> + '_ {
        self.entries.iter().filter(|(_, entry)| !entry.wrench.is_zero())
    }

    /// Whether every entry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.entries.values().all(|entry| entry.wrench.is_finite())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn body(joint: usize) -> BodyRef {
        BodyRef::new(RobotId::new(0), JointId::new(joint))
    }

    fn push(x: f64) -> FramedWrench {
        FramedWrench::world(Wrench::force_only(Vector3::new(x, 0.0, 0.0)))
    }

    #[test]
    fn test_untouched_body_reads_zero() {
        let acc = WrenchAccumulator::new();
        assert!(acc.get(body(1)).is_zero());
        assert!(acc.entry(body(1)).is_none());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_single_add() {
        let mut acc = WrenchAccumulator::new();
        acc.add(body(1), push(2.0)).unwrap();
        assert_eq!(acc.get(body(1)).force.x, 2.0);
        assert!(acc.get(body(2)).is_zero());
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_double_add_accumulates() {
        let mut acc = WrenchAccumulator::new();
        acc.add(body(1), push(2.0)).unwrap();
        acc.add(body(1), push(3.0)).unwrap();
        assert_eq!(acc.get(body(1)).force.x, 5.0);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_reset_clears() {
        let mut acc = WrenchAccumulator::new();
        acc.add(body(1), push(2.0)).unwrap();
        acc.reset();
        assert!(acc.get(body(1)).is_zero());
        assert!(acc.is_empty());
        assert_eq!(acc.reset_count(), 1);
    }

    #[test]
    fn test_frame_mismatch() {
        let mut acc = WrenchAccumulator::new();
        acc.add(body(1), push(1.0)).unwrap();

        let rotated = FramedWrench {
            wrench: Wrench::force_only(Vector3::x()),
            frame: UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3),
        };
        assert_eq!(
            acc.add(body(1), rotated),
            Err(CouplingError::FrameMismatch(body(1)))
        );
        assert_eq!(acc.get(body(1)).force.x, 1.0);
    }

    #[test]
    fn test_wrench_in_body_frame() {
        let mut acc = WrenchAccumulator::new();
        acc.add(body(1), push(1.0)).unwrap();

        let frame = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let local = acc.wrench_in_frame(body(1), &frame);
        assert_relative_eq!(local.force, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_iter_nonzero() {
        let mut acc = WrenchAccumulator::new();
        acc.add(body(1), push(1.0)).unwrap();
        acc.add(body(2), FramedWrench::world(Wrench::zero())).unwrap();
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.iter_nonzero().count(), 1);
    }
}
