//! Error types for the device layer

use std::fmt;

/// Result type alias for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors that can occur when talking to a motor-control board
#[derive(Debug)]
pub enum DeviceError {
    /// The endpoint could not be opened
    OpenFailed(String),

    /// The device does not expose a temperature-capable motor interface
    Unsupported(String),

    /// A temperature or limit query failed
    QueryFailed(String),

    /// The requested motor index does not exist on the board
    NoSuchMotor { motor: usize, count: usize },

    /// The handle has already been closed
    Closed,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OpenFailed(msg) => {
                write!(f, "failed to open device endpoint: {}", msg)
            }
            DeviceError::Unsupported(msg) => {
                write!(f, "device does not expose a motor interface: {}", msg)
            }
            DeviceError::QueryFailed(msg) => write!(f, "device query failed: {}", msg),
            DeviceError::NoSuchMotor { motor, count } => {
                write!(f, "no motor #{} on this board ({} motors)", motor, count)
            }
            DeviceError::Closed => write!(f, "device handle is closed"),
        }
    }
}

impl std::error::Error for DeviceError {}
