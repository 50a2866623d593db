//! Device trait definitions
//!
//! `MotorBoard` is the temperature-capable view of one opened motor-control
//! endpoint; `BoardOpener` creates those views from endpoint names. All
//! methods are async for compatibility with the tokio driver loop, and all
//! failures are reported synchronously through `DeviceResult`.

use async_trait::async_trait;

use crate::topology::DeviceEndpoint;

use super::error::DeviceResult;

/// Temperature-capable view of one motor-control board.
///
/// Implementations must be `Send + Sync`; the monitor owns its boards
/// exclusively and calls them from a single task.
#[async_trait]
pub trait MotorBoard: Send + Sync {
    /// Number of motors on the board.
    ///
    /// Also serves as the capability probe: a board without a usable motor
    /// interface answers `DeviceError::Unsupported` here.
    async fn motor_count(&self) -> DeviceResult<usize>;

    /// Current temperature of one motor, in degrees Celsius.
    async fn temperature(&self, motor: usize) -> DeviceResult<f64>;

    /// Static temperature limit of one motor.
    async fn temperature_limit(&self, motor: usize) -> DeviceResult<f64>;

    /// Current temperatures of every motor on the board, indexed by motor.
    async fn temperatures(&self) -> DeviceResult<Vec<f64>>;

    /// Release the underlying handle.
    async fn close(&self) -> DeviceResult<()>;
}

/// Opens motor-control boards by endpoint.
///
/// A production deployment implements this over the robot's transport;
/// tests and the demo binary use the simulated rack.
#[async_trait]
pub trait BoardOpener: Send + Sync {
    async fn open(&self, endpoint: &DeviceEndpoint) -> DeviceResult<Box<dyn MotorBoard>>;
}
