//! Full configure / tick / shutdown lifecycle through the task handle

use std::sync::Arc;
use std::time::Duration;

use motor_temp_monitor::clock::SystemClock;
use motor_temp_monitor::monitor::{MonitorHandle, MotorTemperatureMonitor};
use motor_temp_monitor::port::BroadcastPort;

use crate::helpers::*;

#[tokio::test]
async fn monitor_runs_end_to_end() {
    let (rack, left, right) = arm_rack();
    left.set_temperature(0, 30.0).await;
    left.set_temperature(1, 31.0).await;
    right.set_temperature(0, 32.0).await;

    let port = BroadcastPort::new(64);
    let mut records = port.subscribe();

    let monitor = MotorTemperatureMonitor::configure(
        arm_topology(),
        &rack,
        Arc::new(SystemClock),
        Box::new(port),
    )
    .await
    .unwrap();
    assert_eq!(rack.open_handles(), 2);

    let handle = MonitorHandle::spawn(monitor);
    assert_eq!(handle.joint_count, 3);
    assert_eq!(handle.port_name, "/testbot/motor_temperatures:o");

    handle.tick_now().await.unwrap();

    let record = tokio::time::timeout(Duration::from_millis(500), records.recv())
        .await
        .unwrap()
        .unwrap();
    let temperatures: Vec<f64> = record.samples.iter().map(|s| s.temperature).collect();
    assert_eq!(temperatures, vec![30.0, 31.0, 32.0]);
    assert!(record.samples.iter().all(|s| !s.alarm));

    handle.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rack.open_handles(), 0);
}

#[tokio::test]
async fn sample_count_is_stable_across_the_run() {
    let (rack, _left, _right) = arm_rack();

    let port = BroadcastPort::new(64);
    let mut records = port.subscribe();
    let monitor = MotorTemperatureMonitor::configure(
        arm_topology(),
        &rack,
        Arc::new(SystemClock),
        Box::new(port),
    )
    .await
    .unwrap();
    let handle = MonitorHandle::spawn(monitor);

    for _ in 0..10 {
        handle.tick_now().await.unwrap();
        let record = records.recv().await.unwrap();
        assert_eq!(record.samples.len(), 3);
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn periodic_ticks_publish_without_commands() {
    let (rack, _left, _right) = arm_rack();

    let port = BroadcastPort::new(64);
    let mut records = port.subscribe();
    let monitor = MotorTemperatureMonitor::configure(
        arm_topology(),
        &rack,
        Arc::new(SystemClock),
        Box::new(port),
    )
    .await
    .unwrap();

    // Period is 50ms; the timer alone must produce records.
    let handle = MonitorHandle::spawn(monitor);

    for _ in 0..3 {
        let record = tokio::time::timeout(Duration::from_millis(500), records.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.samples.len(), 3);
    }

    handle.shutdown().await.unwrap();
}
