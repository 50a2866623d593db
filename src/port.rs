//! Output port abstraction
//!
//! The monitor publishes exactly one record per tick on a single shared
//! port. The in-process implementation is backed by a tokio broadcast
//! channel; a networked transport plugs in behind the same trait.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::OutputRecord;

pub type PortResult<T> = Result<T, PortError>;

/// Errors that can occur on the outbound channel
#[derive(Debug)]
pub enum PortError {
    /// The port could not be bound under the requested name
    OpenFailed(String),

    /// A record could not be delivered
    WriteFailed(String),
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortError::OpenFailed(msg) => write!(f, "failed to open output port: {}", msg),
            PortError::WriteFailed(msg) => write!(f, "failed to write to output port: {}", msg),
        }
    }
}

impl std::error::Error for PortError {}

/// Outbound channel for published records. Opened once during configure and
/// written once per tick.
#[async_trait]
pub trait OutputPort: Send + Sync {
    /// Bind the port under `name`. Failure here fails the whole configure
    /// step.
    async fn open(&mut self, name: &str) -> PortResult<()>;

    /// Publish one record to all subscribers.
    async fn send(&self, record: &OutputRecord) -> PortResult<()>;

    fn name(&self) -> &str;
}

/// In-process port backed by a tokio broadcast channel.
pub struct BroadcastPort {
    sender: broadcast::Sender<OutputRecord>,
    name: String,
}

impl BroadcastPort {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            name: String::new(),
        }
    }

    /// Receiver side for subscribers. Slow subscribers may lag and drop
    /// records, which is acceptable for a live telemetry stream.
    pub fn subscribe(&self) -> broadcast::Receiver<OutputRecord> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl OutputPort for BroadcastPort {
    async fn open(&mut self, name: &str) -> PortResult<()> {
        debug!("opening output port {name}");
        self.name = name.to_string();
        Ok(())
    }

    async fn send(&self, record: &OutputRecord) -> PortResult<()> {
        // No subscribers is fine; records are continuously regenerated.
        match self.sender.send(record.clone()) {
            Ok(receivers) => trace!("published record to {receivers} receivers"),
            Err(_) => trace!("no receivers for record"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
