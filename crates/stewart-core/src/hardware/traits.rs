//! Motor backend capability
//!
//! The control loop talks to motors only through [`MotorBackend`], so the
//! same loop drives real servos or a recording simulator. The variant is
//! chosen once at startup.

use std::collections::VecDeque;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::{NUM_LEGS, NUM_MOTORS};

/// Goal positions for all nine motors (radians), in slot order
pub type ActuatorVector = [f64; NUM_MOTORS];

/// Goal currents for the six platform legs (controller-native units)
pub type LegCurrents = [i32; NUM_LEGS];

/// Trait for motor backends
///
/// Vectors are passed by value: a backend never sees a live reference to
/// the controller's state, so a slow write cannot observe a half-updated
/// vector. Every call must return in bounded time.
pub trait MotorBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Enable torque on every motor
    fn enable_torque(&self) -> Result<()>;

    /// Set torque-limiting goal currents on the six legs
    fn set_leg_goal_currents(&self, currents: LegCurrents) -> Result<()>;

    /// Command goal positions for all nine motors
    fn set_goal_positions(&self, positions: ActuatorVector) -> Result<()>;

    /// Read present positions of all nine motors
    fn read_all_positions(&self) -> Result<ActuatorVector>;
}

/// A command observed by the [`SimulatedBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackendEvent {
    /// Leg goal currents were set
    LegCurrents(LegCurrents),
    /// Torque was enabled
    TorqueEnabled,
    /// Goal positions were commanded
    GoalPositions(ActuatorVector),
}

/// Number of events kept by the simulated backend before the oldest is dropped
const EVENT_HISTORY: usize = 1024;

#[derive(Debug, Default)]
struct SimulatedMotors {
    positions: Option<ActuatorVector>,
    leg_currents: Option<LegCurrents>,
    torque_enabled: bool,
    position_writes: u64,
    events: VecDeque<BackendEvent>,
    fail_writes: bool,
    fail_reads: bool,
}

impl SimulatedMotors {
    fn record(&mut self, event: BackendEvent) {
        if self.events.len() == EVENT_HISTORY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Dry-run backend that records commands and never touches hardware
///
/// Motors are assumed to reach their goal instantly, so
/// [`read_all_positions`](MotorBackend::read_all_positions) returns the last
/// commanded vector. Failures can be injected to exercise error paths.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    motors: RwLock<SimulatedMotors>,
}

impl SimulatedBackend {
    /// Create a new simulated backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded goal positions
    pub fn positions(&self) -> Option<ActuatorVector> {
        self.motors.read().positions
    }

    /// Last commanded leg goal currents
    pub fn leg_currents(&self) -> Option<LegCurrents> {
        self.motors.read().leg_currents
    }

    /// Whether torque has been enabled
    pub fn torque_enabled(&self) -> bool {
        self.motors.read().torque_enabled
    }

    /// Number of goal-position writes accepted so far
    pub fn position_writes(&self) -> u64 {
        self.motors.read().position_writes
    }

    /// Recent commands, oldest first
    pub fn events(&self) -> Vec<BackendEvent> {
        self.motors.read().events.iter().copied().collect()
    }

    /// Make every subsequent write fail with a communication error
    pub fn set_fail_writes(&self, fail: bool) {
        self.motors.write().fail_writes = fail;
    }

    /// Make every subsequent read fail with a communication error
    pub fn set_fail_reads(&self, fail: bool) {
        self.motors.write().fail_reads = fail;
    }

    fn check_write(motors: &SimulatedMotors) -> Result<()> {
        if motors.fail_writes {
            return Err(Error::Communication("simulated write failure".into()));
        }
        Ok(())
    }
}

impl MotorBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn enable_torque(&self) -> Result<()> {
        let mut motors = self.motors.write();
        Self::check_write(&motors)?;
        motors.torque_enabled = true;
        motors.record(BackendEvent::TorqueEnabled);
        Ok(())
    }

    fn set_leg_goal_currents(&self, currents: LegCurrents) -> Result<()> {
        let mut motors = self.motors.write();
        Self::check_write(&motors)?;
        motors.leg_currents = Some(currents);
        motors.record(BackendEvent::LegCurrents(currents));
        Ok(())
    }

    fn set_goal_positions(&self, positions: ActuatorVector) -> Result<()> {
        let mut motors = self.motors.write();
        Self::check_write(&motors)?;
        motors.positions = Some(positions);
        motors.position_writes += 1;
        motors.record(BackendEvent::GoalPositions(positions));
        Ok(())
    }

    fn read_all_positions(&self) -> Result<ActuatorVector> {
        let motors = self.motors.read();
        if motors.fail_reads {
            return Err(Error::Communication("simulated read failure".into()));
        }
        motors
            .positions
            .ok_or_else(|| Error::InvalidState("no positions commanded yet".into()))
    }
}
