//! Device abstraction layer
//!
//! The monitor talks to motor-control boards only through the traits in
//! this module; timeout and retry policy belong to the transport behind
//! them, not to the monitor.

pub mod error;
pub mod interface;
pub mod sim;

pub use error::{DeviceError, DeviceResult};
pub use interface::{BoardOpener, MotorBoard};
