//! stewart-core: control core for a teleoperated Stewart-platform robot head
//!
//! Converts live operator input into safe actuator commands: a 3-DOF head
//! pose is derived from joystick input, solved into six leg angles, merged
//! with three directly driven joints, clamped to hardware-safe ranges and
//! dispatched to a motor backend at a fixed rate.
//!
//! # Modules
//!
//! - [`math`] - Angle wrapping, clamping and nalgebra aliases
//! - [`kinematics`] - Platform geometry and the inverse-kinematics solver
//! - [`state`] - Actuator vector and head pose with invariant-enforcing mutation
//! - [`hardware`] - Motor layout, limits, and the motor backend capability
//! - [`input`] - Per-tick input snapshot contract and input sources
//! - [`control`] - Input arbitration, the rate-limited teleop loop, startup sequencing
//!
//! # Architecture
//!
//! ```text
//! InputSnapshot ──► TeleopLoop ──► ActuatorState ──► MotorBackend
//!                        │              ▲               (Simulated | Hardware)
//!                        └──► HeadPose ─┴─ StewartIk
//! ```

#![warn(unused_must_use)]

pub mod control;
pub mod hardware;
pub mod input;
pub mod kinematics;
pub mod math;
pub mod state;

// Re-exports for convenience
pub use control::{
    interpret, power_up, ControlIntent, CurrentProfile, InputMapping, StartupConfig, StopSignal,
    TeleopConfig, TeleopLoop, TeleopStats, TickOutcome,
};
pub use hardware::{ActuatorVector, LegCurrents, MotorBackend, SimulatedBackend};
pub use input::{InputSnapshot, InputSource, ScriptedInput};
pub use kinematics::{PlatformGeometry, StewartIk};
pub use state::{ActuatorState, DirectJoint, HeadAxis, HeadPose};

#[cfg(feature = "hardware-serial")]
pub use hardware::{HardwareBackend, SerialConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for stewart-core
///
/// Actuator range violations are never errors: they are resolved by clamping
/// or wrapping inside [`ActuatorState`]. What remains are I/O and startup
/// failures.
///
/// # Example
/// ```ignore
/// match HardwareBackend::connect(config) {
///     Ok(backend) => { /* run */ },
///     Err(Error::Connection(msg)) => eprintln!("cannot open bus: {}", msg),
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[must_use = "errors must be handled or explicitly ignored with let _ = ..."]
#[non_exhaustive]
pub enum Error {
    /// Failed to open the serial port or input device.
    /// Fatal at startup.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A servo answered with an error flag or a malformed packet.
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Writing to or reading from the bus failed.
    /// Handle by: logging and letting the next tick re-send.
    #[error("Communication error: {0}")]
    Communication(String),

    /// A bounded read did not complete in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration parameter.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input device could not be read.
    #[error("Input error: {0}")]
    Input(String),

    /// The operator stopped the process during a blocking phase.
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Operation attempted in invalid state (e.g. writing to a closed bus).
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Communication(format!("I/O error: {}", e))
    }
}

/// Result type alias for stewart-core operations
pub type Result<T> = std::result::Result<T, Error>;
