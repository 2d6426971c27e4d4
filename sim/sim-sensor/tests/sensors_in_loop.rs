//! Sensors driven by a full simulation loop.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use nalgebra::{Isometry3, Vector3};
use sim_coupling::{BodyRef, CouplingError, RobotId, Simulation};
use sim_kernel::ReferenceKernel;
use sim_kinematics::{JointSpec, RigidBody, RobotModel};
use sim_sensor::{
    ForceTorqueSensor, ForceTorqueSensorConfig, Imu, ImuConfig, TouchSensor, TouchSensorConfig,
};
use sim_types::{Gravity, JointAxis, MassProperties, SensorId, SensorType, SimulationConfig};

fn hopper() -> RobotModel {
    let mut model = RobotModel::new(
        "hopper",
        JointSpec::floating(
            "root",
            RigidBody::new("torso", MassProperties::sphere(5.0, 0.2)),
        ),
    )
    .unwrap();
    model
        .add_joint(
            model.root(),
            JointSpec::revolute(
                "hip",
                JointAxis::x(),
                RigidBody::new(
                    "leg",
                    MassProperties::point_mass(2.0).with_center_of_mass(Vector3::new(0.0, 0.0, -0.4)),
                ),
            )
            .with_offset(Isometry3::translation(0.0, 0.0, -0.2)),
        )
        .unwrap();
    model
}

fn sim() -> (Simulation<ReferenceKernel>, RobotId) {
    let config = SimulationConfig::with_timestep(0.01)
        .gravity(Gravity::custom(Vector3::new(0.0, 0.0, -10.0)));
    let mut sim = Simulation::new(ReferenceKernel::default(), config).unwrap();
    let id = sim.add_robot(hopper()).unwrap();
    (sim, id)
}

#[test]
fn imu_reads_zero_specific_force_in_free_fall() {
    let (mut sim, id) = sim();
    let imu = sim.add_sensor(Imu::new(SensorId::new(1), id, ImuConfig::default()));
    let compensated = sim.add_sensor(Imu::new(
        SensorId::new(2),
        id,
        ImuConfig::new().gravity_compensated(),
    ));

    sim.run(20).unwrap();

    let (accel, gyro) = sim.reading(imu).unwrap().data.as_imu().unwrap();
    assert_relative_eq!(*accel, Vector3::zeros(), epsilon = 1e-6);
    assert_relative_eq!(*gyro, Vector3::zeros(), epsilon = 1e-12);

    let (accel, _) = sim.reading(compensated).unwrap().data.as_imu().unwrap();
    assert_relative_eq!(*accel, Vector3::new(0.0, 0.0, -10.0), epsilon = 1e-6);
}

#[test]
fn force_torque_reads_joint_reaction() {
    let (mut sim, id) = sim();
    let hip = sim.robot(id).unwrap().joint_by_name("hip").unwrap();
    let ft = sim.add_sensor(ForceTorqueSensor::new(
        SensorId::new(3),
        BodyRef::new(id, hip),
        ForceTorqueSensorConfig::ideal(),
    ));

    sim.run(5).unwrap();

    let reading = sim.reading(ft).unwrap();
    assert_eq!(reading.sensor_type(), SensorType::ForceTorque);
    assert_relative_eq!(reading.timestamp, 0.05, epsilon = 1e-12);

    // The hanging leg is supported against its weight and feels no torque.
    let (force, torque) = reading.data.as_force_torque().unwrap();
    assert_relative_eq!(*force, Vector3::new(0.0, 0.0, 20.0), epsilon = 1e-9);
    assert_relative_eq!(*torque, Vector3::zeros(), epsilon = 1e-9);
}

#[test]
fn touch_follows_accumulated_force() {
    let (mut sim, id) = sim();
    let robot = sim.robot(id).unwrap();
    let hip = robot.joint_by_name("hip").unwrap();
    let root = robot.root();

    let leg = sim.add_sensor(TouchSensor::new(
        SensorId::new(4),
        BodyRef::new(id, hip),
        TouchSensorConfig::default().with_threshold(1.0),
    ));
    let torso = sim.add_sensor(TouchSensor::new(
        SensorId::new(5),
        BodyRef::new(id, root),
        TouchSensorConfig::default(),
    ));

    let report = sim.tick().unwrap();
    assert_eq!(report.sensors_updated, 2);

    assert!(sim.reading(leg).unwrap().data.as_touch().unwrap().0);
    assert!(!sim.reading(torso).unwrap().data.as_touch().unwrap().0);
}

#[test]
fn sensor_on_missing_robot_fails_the_tick() {
    let (mut sim, _) = sim();
    sim.add_sensor(Imu::new(SensorId::new(9), RobotId::new(7), ImuConfig::default()));

    match sim.tick() {
        Err(CouplingError::Sensor { sensor, .. }) => assert_eq!(sensor, SensorId::new(9)),
        other => panic!("expected sensor error, got {other:?}"),
    }
}
