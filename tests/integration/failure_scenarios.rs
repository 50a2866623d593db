//! Failure handling: configure-time errors clean up, tick-time errors are
//! absorbed

use std::sync::Arc;

use motor_temp_monitor::clock::SystemClock;
use motor_temp_monitor::config::Config;
use motor_temp_monitor::device::sim::{SimulatedBoard, SimulatedRack};
use motor_temp_monitor::monitor::{MonitorHandle, MotorTemperatureMonitor};
use motor_temp_monitor::port::BroadcastPort;
use motor_temp_monitor::topology::Topology;

use crate::helpers::*;

#[test]
fn mismatched_subpart_and_joint_lists_refuse_to_start() {
    let config: Config = serde_json::from_value(serde_json::json!({
        "general": {
            "listofsubparts": ["left_arm", "right_arm", "torso"],
            "listofjoints": [[0, 1], [0]]
        }
    }))
    .unwrap();

    let err = Topology::resolve(&config).unwrap_err();
    assert!(err.to_string().contains("must be equal"));
}

#[tokio::test]
async fn failed_configure_leaves_no_open_handles() {
    // right_arm is missing from the rack entirely.
    let mut rack = SimulatedRack::new();
    rack.add_board("/testbot/left_arm", SimulatedBoard::new(vec![45.0, 50.0]));

    let result = MotorTemperatureMonitor::configure(
        arm_topology(),
        &rack,
        Arc::new(SystemClock),
        Box::new(BroadcastPort::new(16)),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(rack.open_handles(), 0);
}

#[tokio::test]
async fn read_failures_do_not_stop_the_stream() {
    let (rack, left, right) = arm_rack();
    right.set_temperature(0, 33.0).await;

    let port = BroadcastPort::new(64);
    let mut records = port.subscribe();
    let mut monitor = MotorTemperatureMonitor::configure(
        arm_topology(),
        &rack,
        Arc::new(SystemClock),
        Box::new(port),
    )
    .await
    .unwrap();

    left.fail_reads(true);

    // Records keep flowing while the left arm misbehaves; its joints read
    // as cold, the right arm stays correct.
    for _ in 0..3 {
        monitor.tick().await;
        let record = records.recv().await.unwrap();
        assert_eq!(record.samples.len(), 3);
        assert_eq!(record.samples[0].temperature, 0.0);
        assert_eq!(record.samples[1].temperature, 0.0);
        assert_eq!(record.samples[2].temperature, 33.0);
    }

    left.fail_reads(false);
    left.set_temperature(0, 30.0).await;
    monitor.tick().await;
    let record = records.recv().await.unwrap();
    assert_eq!(record.samples[0].temperature, 30.0);

    monitor.shutdown().await;
    assert_eq!(rack.open_handles(), 0);
}

#[tokio::test]
async fn publishing_without_subscribers_keeps_ticking() {
    let (rack, _left, _right) = arm_rack();

    let monitor = MotorTemperatureMonitor::configure(
        arm_topology(),
        &rack,
        Arc::new(SystemClock),
        Box::new(BroadcastPort::new(16)),
    )
    .await
    .unwrap();
    let handle = MonitorHandle::spawn(monitor);

    // No receiver anywhere; ticks must still succeed.
    for _ in 0..3 {
        handle.tick_now().await.unwrap();
    }

    handle.shutdown().await.unwrap();
}
