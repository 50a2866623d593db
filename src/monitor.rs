//! MotorTemperatureMonitor - samples joint temperatures and publishes alarms
//!
//! ## Lifecycle
//!
//! ```text
//! configure -> tick (once per period) -> shutdown
//! ```
//!
//! Configure opens one board per sub-part, probes its motor interface,
//! fetches the static temperature limits once and binds the output port;
//! any failure along the way closes every board opened so far and refuses
//! to start. Each tick samples all configured joints, derives the alarm
//! flags and publishes exactly one record; read failures are absorbed, the
//! affected joints report 0.0 and the record still goes out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, instrument, trace, warn};

use crate::clock::Clock;
use crate::device::{BoardOpener, MotorBoard};
use crate::port::OutputPort;
use crate::topology::{JointAddress, JointSelection, Topology};
use crate::{JointSample, OutputRecord};

/// One opened board together with its sampling mode.
struct DeviceBinding {
    subpart: String,
    board: Box<dyn MotorBoard>,
    /// Sampled with the whole-vector query when the configuration selected
    /// every motor on the board.
    whole_vector: bool,
}

pub struct MotorTemperatureMonitor {
    devices: Vec<DeviceBinding>,
    joints: Vec<JointAddress>,
    temperatures: Vec<f64>,
    limits: Vec<f64>,
    port: Option<Box<dyn OutputPort>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    port_name: String,
    closed: bool,
}

impl MotorTemperatureMonitor {
    /// Open and probe every configured device, fetch the static temperature
    /// limits and bind the output port.
    ///
    /// Limit retrieval is fail-fast: a joint without a known limit would
    /// make every alarm decision for it meaningless.
    pub async fn configure(
        topology: Topology,
        opener: &dyn BoardOpener,
        clock: Arc<dyn Clock>,
        mut port: Box<dyn OutputPort>,
    ) -> Result<Self> {
        let mut devices: Vec<DeviceBinding> = Vec::with_capacity(topology.endpoints.len());

        for (endpoint, selection) in topology.endpoints.iter().zip(&topology.selections) {
            debug!(
                "opening device for subpart {} (local {}, remote {})",
                endpoint.subpart, endpoint.local_name, endpoint.remote_name
            );
            let board = match opener.open(endpoint).await {
                Ok(board) => board,
                Err(e) => {
                    close_boards(&mut devices).await;
                    bail!("unable to open device for subpart {}: {e}", endpoint.subpart);
                }
            };
            devices.push(DeviceBinding {
                subpart: endpoint.subpart.clone(),
                board,
                whole_vector: matches!(selection, JointSelection::AllMotors),
            });
        }

        let joints = match Self::attach(&devices, &topology).await {
            Ok(joints) => joints,
            Err(e) => {
                close_boards(&mut devices).await;
                return Err(e);
            }
        };

        debug!("requesting opening of port {}", topology.port_name);
        if let Err(e) = port.open(&topology.port_name).await {
            close_boards(&mut devices).await;
            bail!("error opening output port {}: {e}", topology.port_name);
        }

        let mut limits = vec![0.0; joints.len()];
        if let Err(e) = Self::fetch_limits(&devices, &joints, &mut limits).await {
            close_boards(&mut devices).await;
            return Err(e);
        }

        debug!(
            "working with totally {} motors and {} subparts",
            joints.len(),
            devices.len()
        );

        Ok(Self {
            temperatures: vec![0.0; joints.len()],
            limits,
            joints,
            devices,
            port: Some(port),
            clock,
            period: topology.period,
            port_name: topology.port_name,
            closed: false,
        })
    }

    /// Probe each board's motor interface and resolve the flat joint list
    /// in output order.
    async fn attach(devices: &[DeviceBinding], topology: &Topology) -> Result<Vec<JointAddress>> {
        let mut joints = Vec::new();

        for (slot, (binding, selection)) in
            devices.iter().zip(&topology.selections).enumerate()
        {
            let count = binding.board.motor_count().await.with_context(|| {
                format!(
                    "unable to open motor interface for subpart {}",
                    binding.subpart
                )
            })?;

            match selection {
                JointSelection::AllMotors => {
                    for motor in 0..count {
                        joints.push(JointAddress { device: slot, motor });
                    }
                    debug!("subpart {}: monitoring all {count} motors", binding.subpart);
                }
                JointSelection::Joints(list) => {
                    for &motor in list {
                        if motor >= count {
                            bail!(
                                "subpart {} declares joint {motor} but the board reports {count} motors",
                                binding.subpart
                            );
                        }
                        joints.push(JointAddress { device: slot, motor });
                    }
                    debug!("subpart {}: monitoring joints {list:?}", binding.subpart);
                }
            }
        }

        Ok(joints)
    }

    async fn fetch_limits(
        devices: &[DeviceBinding],
        joints: &[JointAddress],
        limits: &mut [f64],
    ) -> Result<()> {
        for (i, joint) in joints.iter().enumerate() {
            let binding = &devices[joint.device];
            let limit = binding
                .board
                .temperature_limit(joint.motor)
                .await
                .with_context(|| {
                    format!(
                        "unable to get temperature limit for {}[{}]",
                        binding.subpart, joint.motor
                    )
                })?;
            debug!(
                "limit for motor #{i} ({}[{}]): {limit}",
                binding.subpart, joint.motor
            );
            limits[i] = limit;
        }
        Ok(())
    }

    /// Sample every configured joint and publish one record.
    ///
    /// A failed read leaves 0.0 for that joint so a transient error shows
    /// up as "cold" rather than as a stale alarm carried over from the
    /// previous tick; the record is published regardless.
    #[instrument(skip(self), fields(port = %self.port_name))]
    pub async fn tick(&mut self) {
        for slot in self.temperatures.iter_mut() {
            *slot = 0.0;
        }

        // One whole-vector query per board that monitors all of its motors.
        let mut vectors: Vec<Option<Vec<f64>>> = Vec::with_capacity(self.devices.len());
        for binding in &self.devices {
            if !binding.whole_vector {
                vectors.push(None);
                continue;
            }
            match binding.board.temperatures().await {
                Ok(values) => vectors.push(Some(values)),
                Err(e) => {
                    warn!(
                        "unable to get temperatures from subpart {}: {e}",
                        binding.subpart
                    );
                    vectors.push(None);
                }
            }
        }

        for (i, joint) in self.joints.iter().enumerate() {
            let binding = &self.devices[joint.device];
            if binding.whole_vector {
                if let Some(values) = &vectors[joint.device] {
                    self.temperatures[i] = values.get(joint.motor).copied().unwrap_or(0.0);
                }
                continue;
            }
            match binding.board.temperature(joint.motor).await {
                Ok(value) => self.temperatures[i] = value,
                Err(e) => warn!(
                    "unable to get motor {}[{}] temperature: {e}",
                    binding.subpart, joint.motor
                ),
            }
        }

        let samples = self
            .temperatures
            .iter()
            .zip(&self.limits)
            .map(|(&temperature, &limit)| JointSample {
                temperature,
                // Equality trips the alarm.
                alarm: temperature >= limit,
            })
            .collect();
        let record = OutputRecord {
            timestamp: self.clock.now(),
            samples,
        };

        if let Some(port) = &self.port {
            if let Err(e) = port.send(&record).await {
                warn!("error writing to output port: {e}");
            }
        }
    }

    /// Release the per-joint buffers and close every owned board. Safe to
    /// call more than once; later calls are no-ops.
    pub async fn shutdown(&mut self) {
        if self.closed {
            trace!("shutdown already performed");
            return;
        }
        self.closed = true;

        self.temperatures.clear();
        self.limits.clear();
        self.joints.clear();
        self.port = None;

        for binding in self.devices.drain(..) {
            if let Err(e) = binding.board.close().await {
                warn!("error closing device for subpart {}: {e}", binding.subpart);
            }
        }
        debug!("monitor shut down");
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

async fn close_boards(devices: &mut Vec<DeviceBinding>) {
    for binding in devices.drain(..) {
        if let Err(e) = binding.board.close().await {
            warn!("error closing device for subpart {}: {e}", binding.subpart);
        }
    }
}

/// Commands understood by the monitor task.
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run one sample-and-publish cycle immediately, bypassing the timer.
    TickNow { respond_to: oneshot::Sender<()> },

    /// Shut the monitor down and exit the task.
    Shutdown,
}

/// Handle for a monitor running on its own task.
///
/// Can be cloned and shared; commands are serialized over the channel.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,

    /// Name of the output port, for logging.
    pub port_name: String,

    /// Number of configured joints.
    pub joint_count: usize,
}

impl MonitorHandle {
    /// Spawn the periodic driver loop for a configured monitor.
    pub fn spawn(monitor: MotorTemperatureMonitor) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let handle = Self {
            sender: cmd_tx,
            port_name: monitor.port_name.clone(),
            joint_count: monitor.joints.len(),
        };

        tokio::spawn(run(monitor, cmd_rx));

        handle
    }

    /// Trigger an immediate tick and wait for it to complete.
    pub async fn tick_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::TickNow { respond_to: tx })
            .await
            .context("failed to send TickNow command")?;
        rx.await.context("failed to receive tick response")?;
        Ok(())
    }

    /// Gracefully shut down the monitor.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

/// Periodic driver loop: tick on every timer beat, handle commands between
/// ticks, shut down on request or when the command channel closes.
#[instrument(skip_all, fields(port = %monitor.port_name))]
async fn run(mut monitor: MotorTemperatureMonitor, mut commands: mpsc::Receiver<MonitorCommand>) {
    debug!("starting monitor loop with period {:?}", monitor.period);

    let mut ticker = interval(monitor.period);

    loop {
        tokio::select! {
            _ = ticker.tick() => monitor.tick().await,

            cmd = commands.recv() => match cmd {
                Some(MonitorCommand::TickNow { respond_to }) => {
                    monitor.tick().await;
                    let _ = respond_to.send(());
                }

                Some(MonitorCommand::Shutdown) => {
                    debug!("received shutdown command");
                    break;
                }

                None => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }
    }

    monitor.shutdown().await;
    debug!("monitor loop stopped");
}
