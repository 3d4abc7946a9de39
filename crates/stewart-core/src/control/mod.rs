//! Teleoperation control
//!
//! Turns input snapshots into actuator commands: intent arbitration,
//! the rate-limited teleop loop, and the power-up sequence that precedes it.

mod config;
mod control_loop;
mod intent;
mod startup;

pub use config::{
    AxisPair, CurrentProfile, InputMapping, PresetBinding, StartupConfig, TeleopConfig,
};
pub use control_loop::{StopSignal, TeleopLoop, TeleopStats, TickIntents, TickOutcome};
pub use intent::{interpret, ControlIntent, MAX_INTENTS_PER_TICK};
pub use startup::power_up;
