//! Serial bus configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for opening the servo bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyACM0" or "COM5")
    pub port: String,
    /// Baud rate (default: 1,000,000)
    pub baudrate: u32,
    /// Upper bound on any single reply wait
    pub timeout: Duration,
}

impl SerialConfig {
    /// Default baud rate (1 Mbps)
    pub const DEFAULT_BAUDRATE: u32 = 1_000_000;

    /// Default reply timeout (100 ms)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    /// Create a configuration for the given port
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baudrate: Self::DEFAULT_BAUDRATE,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the baud rate
    pub fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    /// Set the reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyACM0")
    }
}
