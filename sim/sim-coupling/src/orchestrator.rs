//! Tick orchestrator.
//!
//! Every tick runs five phases in a fixed order:
//!
//! ```text
//! controllers ─► push ─► step ─► pull ─► post-update
//! ```
//!
//! 1. Controllers compute commanded efforts from the pre-physics state.
//! 2. Every adapter pushes its state into the kernel, root before children.
//! 3. The kernel advances exactly one fixed step.
//! 4. The wrench accumulator is reset, then every adapter pulls.
//! 5. Model frames are recomputed and sensors update.
//!
//! Robots run in registration order within phases 2 and 4.

use std::sync::Arc;

use sim_kernel::{
    BaseDescriptor, LinkHandle, LinkIndex, MultibodyId, PhysicsKernel, RevoluteJointDescriptor,
};
use sim_kinematics::RobotModel;
use sim_types::{SensorId, SensorReading, SimError, SimulationConfig};
use tracing::{debug, debug_span, info, warn};

use crate::adapter::{LinkAdapter, RevoluteAdapter, RootAdapter};
use crate::controller::Controller;
use crate::error::CouplingError;
use crate::sensor::{SensorContext, TickSensor};
use crate::topology::Topology;
use crate::wrench::{RobotId, WrenchAccumulator};
use crate::Result;

/// Summary of a completed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Number of completed ticks.
    pub tick: u64,
    /// Simulation time after the tick (seconds).
    pub time: f64,
    /// Number of sensors updated.
    pub sensors_updated: usize,
}

struct Robot {
    model: RobotModel,
    topology: Arc<Topology>,
    multibody: MultibodyId,
    adapters: Vec<LinkAdapter>,
    controllers: Vec<Box<dyn Controller>>,
}

/// A set of robots coupled to one physics kernel with one fixed timestep.
///
/// # Example
///
/// ```
/// use sim_coupling::Simulation;
/// use sim_kernel::ReferenceKernel;
/// use sim_kinematics::{JointSpec, RigidBody, RobotModel};
/// use sim_types::{JointAxis, MassProperties, SimulationConfig};
///
/// let body = |n: &str| RigidBody::new(n, MassProperties::point_mass(1.0));
/// let mut robot = RobotModel::new("r", JointSpec::floating("root", body("base"))).unwrap();
/// robot
///     .add_joint(robot.root(), JointSpec::revolute("hinge", JointAxis::y(), body("link")))
///     .unwrap();
///
/// let mut sim = Simulation::new(ReferenceKernel::default(), SimulationConfig::default()).unwrap();
/// let id = sim.add_robot(robot).unwrap();
/// let report = sim.run(10).unwrap();
///
/// assert_eq!(report.tick, 10);
/// assert!(sim.robot(id).unwrap().base().pose.position.z < 0.0);
/// ```
pub struct Simulation<K: PhysicsKernel> {
    kernel: K,
    config: SimulationConfig,
    robots: Vec<Robot>,
    sensors: Vec<Box<dyn TickSensor>>,
    wrenches: WrenchAccumulator,
    time: f64,
    tick: u64,
}

impl<K: PhysicsKernel> Simulation<K> {
    /// Create a simulation around a kernel.
    ///
    /// The configuration is validated here and never again.
    pub fn new(mut kernel: K, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        kernel.set_gravity(config.gravity.acceleration);
        Ok(Self {
            kernel,
            config,
            robots: Vec::new(),
            sensors: Vec::new(),
            wrenches: WrenchAccumulator::new(),
            time: 0.0,
            tick: 0,
        })
    }

    /// Register a robot: build its topology, create the kernel multibody and
    /// the link adapters.
    pub fn add_robot(&mut self, mut model: RobotModel) -> Result<RobotId> {
        let topology = Arc::new(Topology::build(&model)?);
        model.update_frames();

        let root = model.root();
        let root_joint = model
            .joint(root)
            .ok_or(sim_kinematics::ModelError::UnknownJoint(root))?;
        let root_mass = root_joint.body.mass_properties;
        let base = BaseDescriptor::floating(root_mass.mass, root_mass.inertia_diagonal())
            .with_transform(model.com_world_transform(root)?);
        let multibody = self.kernel.create_multibody(&base)?;

        let id = RobotId::new(self.robots.len());
        let adapters = match self.register_links(id, &model, &topology, multibody) {
            Ok(adapters) => adapters,
            Err(err) => {
                warn!(robot = model.name(), %multibody, error = %err, "registration failed");
                if let Err(cleanup) = self.kernel.remove_multibody(multibody) {
                    warn!(%multibody, error = %cleanup, "could not remove multibody");
                }
                return Err(err);
            }
        };

        info!(
            robot = %id,
            name = model.name(),
            links = topology.num_links(),
            multibody = %multibody,
            "robot registered"
        );
        self.robots.push(Robot {
            model,
            topology,
            multibody,
            adapters,
            controllers: Vec::new(),
        });
        Ok(id)
    }

    /// Set up and finalize every link of a created multibody, then build the
    /// adapters. The caller removes the multibody if this fails.
    fn register_links(
        &mut self,
        id: RobotId,
        model: &RobotModel,
        topology: &Topology,
        multibody: MultibodyId,
    ) -> Result<Vec<LinkAdapter>> {
        for (index, entry) in topology.links() {
            let descriptor = self.revolute_descriptor(model, topology, index, entry.joint)?;
            self.kernel.setup_revolute_joint(multibody, &descriptor)?;
        }
        self.kernel.finalize_multibody(multibody)?;
        Self::build_adapters(id, model, topology, multibody)
    }

    fn revolute_descriptor(
        &self,
        model: &RobotModel,
        topology: &Topology,
        index: LinkIndex,
        joint_id: sim_types::JointId,
    ) -> Result<RevoluteJointDescriptor> {
        let joint = model
            .joint(joint_id)
            .ok_or(sim_kinematics::ModelError::UnknownJoint(joint_id))?;
        let parent_index = topology
            .parent_of(index)
            .ok_or_else(|| CouplingError::MissingLinkIndex(joint.name.clone()))?;
        let parent_joint = joint
            .parent
            .and_then(|p| model.joint(p))
            .ok_or(sim_kinematics::ModelError::UnknownJoint(joint_id))?;

        let parent_com = parent_joint.body.mass_properties.center_of_mass;
        let mass = joint.body.mass_properties;
        Ok(RevoluteJointDescriptor {
            index,
            mass: mass.mass,
            inertia_diagonal: mass.inertia_diagonal(),
            parent_index,
            rotation_from_parent: joint.offset_from_parent.rotation,
            axis: joint.axis.direction,
            parent_pivot_offset: joint.offset_from_parent.translation.vector - parent_com,
            child_pivot_offset: mass.center_of_mass,
            disable_parent_collision: self.config.disable_parent_collision,
        })
    }

    fn build_adapters(
        robot: RobotId,
        model: &RobotModel,
        topology: &Topology,
        multibody: MultibodyId,
    ) -> Result<Vec<LinkAdapter>> {
        let mut adapters = Vec::with_capacity(topology.num_links() + 1);
        adapters.push(LinkAdapter::Root(RootAdapter::new(
            robot,
            topology.root(),
            multibody,
        )));

        // Model arena order is parent-first, but adapters follow link index
        // order so pushes run root before children in kernel terms.
        let mut links: Vec<(LinkIndex, sim_types::JointId)> = Vec::new();
        for joint in model.joints().iter().skip(1) {
            let index = topology
                .index_of(&joint.name)
                .ok_or_else(|| CouplingError::MissingLinkIndex(joint.name.clone()))?;
            let id = topology
                .joint_of(index)
                .ok_or_else(|| CouplingError::MissingLinkIndex(joint.name.clone()))?;
            links.push((index, id));
        }
        links.sort_by_key(|(index, _)| *index);

        adapters.extend(links.into_iter().map(|(index, joint)| {
            LinkAdapter::Revolute(RevoluteAdapter::new(
                robot,
                joint,
                LinkHandle::new(multibody, index),
            ))
        }));
        Ok(adapters)
    }

    /// Attach a controller to a robot. Controllers run in attach order.
    pub fn add_controller(
        &mut self,
        robot: RobotId,
        controller: impl Controller + 'static,
    ) -> Result<()> {
        let entry = self
            .robots
            .get_mut(robot.index())
            .ok_or(CouplingError::UnknownRobot(robot))?;
        debug!(robot = %robot, controller = controller.name(), "controller attached");
        entry.controllers.push(Box::new(controller));
        Ok(())
    }

    /// Add a sensor. Sensors update in insertion order.
    pub fn add_sensor(&mut self, sensor: impl TickSensor + 'static) -> SensorId {
        let id = sensor.id();
        self.sensors.push(Box::new(sensor));
        id
    }

    /// Run one tick.
    ///
    /// An error leaves the simulation mid-tick; the caller should tear it
    /// down rather than continue.
    pub fn tick(&mut self) -> Result<TickReport> {
        let span = debug_span!("tick", tick = self.tick);
        let _enter = span.enter();
        let dt = self.config.timestep;

        for robot in &mut self.robots {
            for controller in &mut robot.controllers {
                controller.compute(&mut robot.model, self.time)?;
            }
        }
        debug!("controllers done");

        for robot in &mut self.robots {
            robot.model.update_frames();
            for adapter in &mut robot.adapters {
                adapter.push_state(&robot.model, &mut self.kernel)?;
            }
        }
        debug!("push done");

        self.kernel.step_simulation(dt)?;
        debug!(dt, "step done");

        self.wrenches.reset();
        for robot in &mut self.robots {
            for adapter in &mut robot.adapters {
                adapter.pull_state(&mut robot.model, &self.kernel, &mut self.wrenches, dt)?;
            }
        }
        debug!(wrenches = self.wrenches.len(), "pull done");

        for robot in &mut self.robots {
            robot.model.update_frames();
        }
        self.time += dt;
        self.tick += 1;

        let ctx = SensorContext::new(
            self.time,
            self.tick,
            self.config.gravity.acceleration,
            &self.wrenches,
            self.robots.iter().map(|r| &r.model).collect(),
        );
        for sensor in &mut self.sensors {
            sensor.update(&ctx)?;
        }
        debug!(sensors = self.sensors.len(), "post-update done");

        Ok(TickReport {
            tick: self.tick,
            time: self.time,
            sensors_updated: self.sensors.len(),
        })
    }

    /// Run up to `ticks` ticks, stopping early at the configured time limit.
    pub fn run(&mut self, ticks: u64) -> Result<TickReport> {
        let mut report = TickReport {
            tick: self.tick,
            time: self.time,
            sensors_updated: 0,
        };
        for _ in 0..ticks {
            if self.config.max_time.is_some_and(|limit| self.time >= limit) {
                debug!(time = self.time, "time limit reached");
                break;
            }
            report = self.tick()?;
        }
        Ok(report)
    }

    /// Remove every robot from the kernel and hand the kernel back.
    pub fn teardown(mut self) -> Result<K> {
        for (i, robot) in self.robots.drain(..).enumerate() {
            self.kernel.remove_multibody(robot.multibody)?;
            info!(robot = i, name = robot.model.name(), "robot removed");
        }
        Ok(self.kernel)
    }

    /// Fail if any model state or accumulated wrench is `NaN` or infinite.
    ///
    /// Not called by [`tick`](Self::tick); intended for test suites.
    pub fn check_finite(&self) -> Result<()> {
        for robot in &self.robots {
            if !robot.model.is_finite() {
                return Err(SimError::non_finite(format!("robot {}", robot.model.name())).into());
            }
        }
        if !self.wrenches.is_finite() {
            return Err(SimError::non_finite("wrench accumulator").into());
        }
        Ok(())
    }

    /// Robot model by ID.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&RobotModel> {
        self.robots.get(id.index()).map(|r| &r.model)
    }

    /// Mutable robot model by ID, for setting state between ticks.
    pub fn robot_mut(&mut self, id: RobotId) -> Option<&mut RobotModel> {
        self.robots.get_mut(id.index()).map(|r| &mut r.model)
    }

    /// Topology of a robot.
    #[must_use]
    pub fn topology(&self, id: RobotId) -> Option<&Arc<Topology>> {
        self.robots.get(id.index()).map(|r| &r.topology)
    }

    /// Kernel multibody of a robot.
    #[must_use]
    pub fn multibody(&self, id: RobotId) -> Option<MultibodyId> {
        self.robots.get(id.index()).map(|r| r.multibody)
    }

    /// Link adapters of a robot, root first.
    #[must_use]
    pub fn adapters(&self, id: RobotId) -> Option<&[LinkAdapter]> {
        self.robots.get(id.index()).map(|r| r.adapters.as_slice())
    }

    /// Number of registered robots.
    #[must_use]
    pub fn num_robots(&self) -> usize {
        self.robots.len()
    }

    /// Latest reading of every sensor that has one.
    #[must_use]
    pub fn readings(&self) -> Vec<&SensorReading> {
        self.sensors.iter().filter_map(|s| s.reading()).collect()
    }

    /// Latest reading of one sensor.
    #[must_use]
    pub fn reading(&self, id: SensorId) -> Option<&SensorReading> {
        self.sensors
            .iter()
            .find(|s| s.id() == id)
            .and_then(|s| s.reading())
    }

    /// Wrenches accumulated during the last tick.
    #[must_use]
    pub fn wrenches(&self) -> &WrenchAccumulator {
        &self.wrenches
    }

    /// The kernel.
    #[must_use]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulation time (seconds).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}

impl<K: PhysicsKernel + std::fmt::Debug> std::fmt::Debug for Simulation<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("kernel", &self.kernel)
            .field("robots", &self.robots.len())
            .field("sensors", &self.sensors.len())
            .field("time", &self.time)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
