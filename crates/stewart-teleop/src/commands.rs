//! Typed motor commands for bench testing
//!
//! Each stdin line is one command:
//!
//! - `<motor> <degrees> [<motor> <degrees> ...]` sets absolute angles,
//!   where a motor is a bus ID (`1`, `21`) or a name (`leg_1`, `base`)
//! - `home` returns every motor to the startup vector
//! - `status` prints present positions
//! - `quit` ends the session
//!
//! Angles pass through the same clamping and wrapping as teleop commands.

use std::time::Duration;

use anyhow::{bail, Result};
use crossbeam_channel::{self as cc, RecvTimeoutError};
use stewart_core::hardware::{slot_by_motor_id, slot_by_name, MOTOR_NAMES};
use stewart_core::{ActuatorState, MotorBackend, StartupConfig, StopSignal};

const STOP_CHECK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum MotorCommand {
    Quit,
    Status,
    Home,
    /// (slot, absolute degrees) pairs in line order
    Set(Vec<(usize, f64)>),
}

impl MotorCommand {
    /// Parse one line; `None` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let command = match tokens.as_slice() {
            [] => return Ok(None),
            ["quit"] => Self::Quit,
            ["status"] => Self::Status,
            ["home"] => Self::Home,
            _ => {
                if tokens.len() % 2 != 0 {
                    bail!("expected <motor> <degrees> pairs, got {} tokens", tokens.len());
                }
                let mut targets = Vec::with_capacity(tokens.len() / 2);
                for pair in tokens.chunks_exact(2) {
                    let slot = resolve_motor(pair[0])?;
                    let degrees: f64 = pair[1]
                        .parse()
                        .map_err(|_| anyhow::anyhow!("bad angle '{}' for {}", pair[1], pair[0]))?;
                    if !degrees.is_finite() {
                        bail!("angle for {} must be finite", pair[0]);
                    }
                    targets.push((slot, degrees));
                }
                Self::Set(targets)
            }
        };
        Ok(Some(command))
    }

    /// Update the commanded state; returns true when positions changed
    pub fn apply(&self, state: &mut ActuatorState, startup: &StartupConfig) -> bool {
        match self {
            Self::Set(targets) => {
                for &(slot, degrees) in targets {
                    state.set_slot(slot, degrees);
                }
                true
            }
            Self::Home => {
                *state = startup.initial_state(state.ik().clone());
                true
            }
            Self::Quit | Self::Status => false,
        }
    }
}

fn resolve_motor(token: &str) -> Result<usize> {
    token
        .parse::<u8>()
        .ok()
        .and_then(slot_by_motor_id)
        .or_else(|| slot_by_name(token))
        .ok_or_else(|| anyhow::anyhow!("unknown motor '{}'", token))
}

/// Run typed commands until `quit`, end of input, or stop
pub fn run_commands(
    backend: &dyn MotorBackend,
    state: &mut ActuatorState,
    startup: &StartupConfig,
    lines: &cc::Receiver<String>,
    stop: &StopSignal,
) {
    while !stop.is_stopped() {
        let line = match lines.recv_timeout(STOP_CHECK) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let command = match MotorCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Ignoring '{}': {}", line.trim(), e);
                continue;
            }
        };

        match command {
            MotorCommand::Quit => break,
            MotorCommand::Status => {
                if let Err(e) = crate::print_status(backend) {
                    tracing::warn!("{:#}", e);
                }
            }
            _ => {
                command.apply(state, startup);
                if let Err(e) = backend.set_goal_positions(state.positions()) {
                    tracing::warn!("Failed to send goal positions: {}", e);
                }
            }
        }
    }
    tracing::info!(
        "Command session ended at {}",
        MOTOR_NAMES
            .iter()
            .zip(state.positions())
            .map(|(name, angle)| format!("{}={:.1}", name, angle.to_degrees()))
            .collect::<Vec<_>>()
            .join(" ")
    );
}
