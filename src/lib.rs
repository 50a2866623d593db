pub mod clock;
pub mod config;
pub mod device;
pub mod monitor;
pub mod port;
pub mod topology;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One monitored joint's share of a published record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub temperature: f64,
    pub alarm: bool,
}

/// One message on the output stream: the capture time followed by the
/// configured joints' (temperature, alarm) pairs, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub timestamp: DateTime<Utc>,
    pub samples: Vec<JointSample>,
}

impl OutputRecord {
    /// Capture time as float seconds since the Unix epoch.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp.timestamp() as f64
            + f64::from(self.timestamp.timestamp_subsec_nanos()) * 1e-9
    }

    /// Flat wire layout: little-endian f64 capture time in seconds, then per
    /// joint a little-endian f64 temperature and a single alarm byte (0 or 1).
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.samples.len() * 9);
        buf.extend_from_slice(&self.timestamp_secs().to_le_bytes());
        for sample in &self.samples {
            buf.extend_from_slice(&sample.temperature.to_le_bytes());
            buf.push(u8::from(sample.alarm));
        }
        buf
    }
}
