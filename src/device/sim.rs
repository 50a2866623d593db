//! Simulated motor-control boards
//!
//! Backs the demo binary and the test suite: boards with scripted
//! temperatures and limits, switchable failure modes, and an open-handle
//! counter for leak checks.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::topology::DeviceEndpoint;

use super::error::{DeviceError, DeviceResult};
use super::interface::{BoardOpener, MotorBoard};

/// Shared state of one simulated board.
///
/// Cloning keeps a control handle for scripting temperatures and failures
/// while the monitor owns the opened `MotorBoard` view.
#[derive(Clone)]
pub struct SimulatedBoard {
    inner: Arc<BoardInner>,
}

struct BoardInner {
    temperatures: Mutex<Vec<f64>>,
    limits: Vec<f64>,
    unsupported: bool,
    fail_reads: AtomicBool,
    fail_limits: AtomicBool,
}

impl SimulatedBoard {
    /// One motor per entry in `limits`; temperatures start at 0.0.
    pub fn new(limits: Vec<f64>) -> Self {
        let motors = limits.len();
        Self {
            inner: Arc::new(BoardInner {
                temperatures: Mutex::new(vec![0.0; motors]),
                limits,
                unsupported: false,
                fail_reads: AtomicBool::new(false),
                fail_limits: AtomicBool::new(false),
            }),
        }
    }

    /// A board that opens fine but refuses the motor interface probe.
    pub fn unsupported() -> Self {
        Self {
            inner: Arc::new(BoardInner {
                temperatures: Mutex::new(Vec::new()),
                limits: Vec::new(),
                unsupported: true,
                fail_reads: AtomicBool::new(false),
                fail_limits: AtomicBool::new(false),
            }),
        }
    }

    pub async fn set_temperature(&self, motor: usize, value: f64) {
        let mut temperatures = self.inner.temperatures.lock().await;
        if let Some(slot) = temperatures.get_mut(motor) {
            *slot = value;
        }
    }

    /// Make every temperature query on this board fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make limit queries on this board fail until reset.
    pub fn fail_limits(&self, fail: bool) {
        self.inner.fail_limits.store(fail, Ordering::SeqCst);
    }
}

/// One opened handle onto a simulated board.
struct OpenBoard {
    board: SimulatedBoard,
    open_handles: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl OpenBoard {
    fn check_open(&self) -> DeviceResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(DeviceError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MotorBoard for OpenBoard {
    async fn motor_count(&self) -> DeviceResult<usize> {
        self.check_open()?;
        if self.board.inner.unsupported {
            return Err(DeviceError::Unsupported(String::from(
                "simulated board without motor interface",
            )));
        }
        Ok(self.board.inner.limits.len())
    }

    async fn temperature(&self, motor: usize) -> DeviceResult<f64> {
        self.check_open()?;
        if self.board.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(DeviceError::QueryFailed(format!(
                "simulated read failure for motor {motor}"
            )));
        }
        let temperatures = self.board.inner.temperatures.lock().await;
        temperatures
            .get(motor)
            .copied()
            .ok_or(DeviceError::NoSuchMotor {
                motor,
                count: temperatures.len(),
            })
    }

    async fn temperature_limit(&self, motor: usize) -> DeviceResult<f64> {
        self.check_open()?;
        if self.board.inner.fail_limits.load(Ordering::SeqCst) {
            return Err(DeviceError::QueryFailed(format!(
                "simulated limit failure for motor {motor}"
            )));
        }
        self.board
            .inner
            .limits
            .get(motor)
            .copied()
            .ok_or(DeviceError::NoSuchMotor {
                motor,
                count: self.board.inner.limits.len(),
            })
    }

    async fn temperatures(&self) -> DeviceResult<Vec<f64>> {
        self.check_open()?;
        if self.board.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(DeviceError::QueryFailed(String::from(
                "simulated whole-vector read failure",
            )));
        }
        Ok(self.board.inner.temperatures.lock().await.clone())
    }

    async fn close(&self) -> DeviceResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// A set of simulated boards keyed by remote endpoint name.
pub struct SimulatedRack {
    boards: HashMap<String, SimulatedBoard>,
    open_handles: Arc<AtomicUsize>,
}

impl SimulatedRack {
    pub fn new() -> Self {
        Self {
            boards: HashMap::new(),
            open_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a board under the remote endpoint name the topology derives
    /// for its sub-part.
    pub fn add_board(&mut self, remote_name: &str, board: SimulatedBoard) {
        self.boards.insert(remote_name.to_string(), board);
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedRack {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BoardOpener for SimulatedRack {
    async fn open(&self, endpoint: &DeviceEndpoint) -> DeviceResult<Box<dyn MotorBoard>> {
        let Some(board) = self.boards.get(&endpoint.remote_name) else {
            return Err(DeviceError::OpenFailed(format!(
                "no board at {}",
                endpoint.remote_name
            )));
        };

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(OpenBoard {
            board: board.clone(),
            open_handles: self.open_handles.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}
