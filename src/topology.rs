//! Topology resolver
//!
//! Turns the declarative joint/sub-part configuration into an ordered list
//! of device endpoints to open plus the joints to monitor on each of them.
//! The single-device setups are the one-endpoint case of the same shape.

use std::time::Duration;

use anyhow::bail;
use tracing::{debug, warn};

use crate::config::{Config, GeneralConfig, JointLists};

/// Names used to open one motor-control endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub subpart: String,
    pub local_name: String,
    pub remote_name: String,
}

/// Joints to monitor on one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JointSelection {
    /// Every motor the board reports, sampled with the whole-vector query.
    AllMotors,
    /// An explicit subset, sampled joint by joint.
    Joints(Vec<usize>),
}

/// Address of one monitored joint: the slot of the owning device binding
/// plus the motor index local to that board. The position of an address in
/// the resolved list defines its position in every published record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointAddress {
    pub device: usize,
    pub motor: usize,
}

#[derive(Debug, Clone)]
pub struct Topology {
    /// Endpoints to open, one per configured sub-part.
    pub endpoints: Vec<DeviceEndpoint>,
    /// Joint selection per endpoint, parallel to `endpoints`.
    pub selections: Vec<JointSelection>,
    /// Name of the shared output port.
    pub port_name: String,
    /// Update period of the tick loop.
    pub period: Duration,
}

impl Topology {
    pub fn resolve(config: &Config) -> anyhow::Result<Topology> {
        let general = match &config.general {
            Some(general) => general.clone(),
            None => {
                warn!("missing general group, the module uses the default values");
                GeneralConfig::default()
            }
        };

        if !(general.period > 0.0 && general.period.is_finite()) {
            bail!("period must be a positive number of seconds, got {}", general.period);
        }

        let mut endpoints = Vec::new();
        let mut selections = Vec::new();
        let port_name;

        match (&general.listofsubparts, &general.listofjoints) {
            (Some(subparts), joints) => {
                let joints = match joints {
                    Some(JointLists::PerSubpart(lists)) => lists,
                    Some(JointLists::Flat(_)) => {
                        bail!("listofjoints must contain one joint list per subpart when listofsubparts is given")
                    }
                    None => bail!("listofsubparts is given but listofjoints is missing"),
                };

                if subparts.len() != joints.len() {
                    bail!(
                        "dimension of listofsubparts ({}) and listofjoints ({}) must be equal",
                        subparts.len(),
                        joints.len()
                    );
                }

                for (subpart, list) in subparts.iter().zip(joints) {
                    endpoints.push(DeviceEndpoint {
                        subpart: subpart.clone(),
                        local_name: format!("{}/{subpart}/mc", general.portprefix),
                        remote_name: format!("/{}/{subpart}", general.robotname),
                    });
                    selections.push(JointSelection::Joints(list.clone()));
                    debug!("inserted element: <{subpart}, {list:?}>");
                }

                port_name = format!("/{}/motor_temperatures:o", general.robotname);
            }

            (None, joints) => {
                let selection = match joints {
                    Some(JointLists::Flat(list)) => JointSelection::Joints(list.clone()),
                    Some(JointLists::PerSubpart(_)) => {
                        bail!("listofjoints is grouped by subpart but listofsubparts is missing")
                    }
                    None => JointSelection::AllMotors,
                };

                endpoints.push(DeviceEndpoint {
                    subpart: String::from("mc"),
                    local_name: format!("{}/mc", general.portprefix),
                    remote_name: format!("/{}", general.robotname),
                });
                selections.push(selection);

                port_name = format!("{}/motor_temperatures:o", general.portprefix);
            }
        }

        debug!(
            "++++ config ++++: period: {} robotname: {} endpoints: {endpoints:?}",
            general.period, general.robotname
        );

        Ok(Topology {
            endpoints,
            selections,
            port_name,
            period: Duration::from_secs_f64(general.period),
        })
    }
}
