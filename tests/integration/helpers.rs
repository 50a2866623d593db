//! Helper functions for integration tests

use motor_temp_monitor::config::Config;
use motor_temp_monitor::device::sim::{SimulatedBoard, SimulatedRack};
use motor_temp_monitor::topology::Topology;

pub fn arm_config() -> Config {
    serde_json::from_value(serde_json::json!({
        "general": {
            "robotname": "testbot",
            "period": 0.05,
            "listofsubparts": ["left_arm", "right_arm"],
            "listofjoints": [[0, 1], [0]]
        }
    }))
    .unwrap()
}

pub fn arm_topology() -> Topology {
    Topology::resolve(&arm_config()).unwrap()
}

/// Rack matching `arm_config`: limits 45/50 on the left arm, 55 on the
/// right. Returns control handles for scripting temperatures and failures.
pub fn arm_rack() -> (SimulatedRack, SimulatedBoard, SimulatedBoard) {
    let left = SimulatedBoard::new(vec![45.0, 50.0]);
    let right = SimulatedBoard::new(vec![55.0]);
    let mut rack = SimulatedRack::new();
    rack.add_board("/testbot/left_arm", left.clone());
    rack.add_board("/testbot/right_arm", right.clone());
    (rack, left, right)
}
