//! Teleop configuration
//!
//! Plain values read once at startup and handed to the loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hardware::{ActuatorVector, LegCurrents, NUM_LEGS};
use crate::kinematics::StewartIk;
use crate::state::{ActuatorState, HeadPose};
use crate::{Error, Result};

/// Two axes arbitrated so that at most one of them acts per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisPair {
    /// Wins when strictly larger in magnitude
    pub first: usize,
    /// Wins ties
    pub second: usize,
}

impl AxisPair {
    /// Create a pair from two axis indices
    pub const fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }
}

/// A button that snaps every leg to a fixed angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetBinding {
    /// Button index
    pub button: usize,
    /// Leg angle applied while held (degrees)
    pub degrees: f64,
}

impl PresetBinding {
    /// Bind `button` to a leg angle in degrees
    pub const fn new(button: usize, degrees: f64) -> Self {
        Self { button, degrees }
    }
}

/// Button and axis indices, deadzone and per-channel scales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMapping {
    /// Held to steer the antennas
    pub first_modifier: usize,
    /// Held to steer the base and the head
    pub second_modifier: usize,
    /// Axis driving antenna A
    pub antenna_a_axis: usize,
    /// Axis driving antenna B
    pub antenna_b_axis: usize,
    /// Preset buttons, highest priority first
    pub presets: Vec<PresetBinding>,
    /// First: base rotation, second: head Z
    pub base_z_pair: AxisPair,
    /// First: head X rotation, second: head Y rotation
    pub xy_pair: AxisPair,
    /// Axis magnitudes at or below this are ignored
    pub deadzone: f64,
    /// Degrees per tick at full antenna deflection
    pub antenna_scale: f64,
    /// Degrees per tick at full base deflection
    pub base_scale: f64,
    /// Raw head-pose delta at full deflection
    pub head_scale: f64,
}

impl Default for InputMapping {
    fn default() -> Self {
        Self {
            first_modifier: 6,
            second_modifier: 7,
            antenna_a_axis: 3,
            antenna_b_axis: 0,
            presets: vec![
                PresetBinding::new(0, -120.0),
                PresetBinding::new(1, -60.0),
                PresetBinding::new(3, -90.0),
                PresetBinding::new(4, -30.0),
            ],
            base_z_pair: AxisPair::new(0, 1),
            xy_pair: AxisPair::new(3, 4),
            deadzone: 0.1,
            antenna_scale: 20.0,
            base_scale: 4.0,
            head_scale: 5.0,
        }
    }
}

/// Configuration for the teleop loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleopConfig {
    /// Minimum time between two dispatched ticks
    pub update_interval: Duration,
    /// Pause between input polls
    pub poll_interval: Duration,
    /// Read present positions after each dispatch
    pub read_feedback: bool,
    /// Input bindings
    pub mapping: InputMapping,
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            read_feedback: false,
            mapping: InputMapping::default(),
        }
    }
}

impl TeleopConfig {
    /// Set the minimum time between dispatches
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set the pause between input polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enable or disable position feedback after each dispatch
    pub fn with_read_feedback(mut self, enabled: bool) -> Self {
        self.read_feedback = enabled;
        self
    }

    /// Replace the input bindings
    pub fn with_mapping(mut self, mapping: InputMapping) -> Self {
        self.mapping = mapping;
        self
    }
}

/// Two-phase goal-current ramp for the legs
///
/// Legs start at `initial` so a motor far from its goal cannot slam into an
/// end stop, then rise to `operating` scaled per leg by `ratios`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentProfile {
    /// Goal current while travelling to the startup vector
    pub initial: i32,
    /// Goal current once settled, before scaling
    pub operating: i32,
    /// Per-leg scale for the operating current
    pub ratios: [f64; NUM_LEGS],
}

impl Default for CurrentProfile {
    fn default() -> Self {
        Self {
            initial: 30,
            operating: 30,
            ratios: [1.0; NUM_LEGS],
        }
    }
}

impl CurrentProfile {
    /// Create a profile with unit ratios
    pub fn new(initial: i32, operating: i32) -> Self {
        Self {
            initial,
            operating,
            ..Default::default()
        }
    }

    /// Set the per-leg ratios
    pub fn with_ratios(mut self, ratios: [f64; NUM_LEGS]) -> Self {
        self.ratios = ratios;
        self
    }

    /// Check levels and ratios
    pub fn validate(&self) -> Result<()> {
        if self.initial < 0 || self.operating < 0 {
            return Err(Error::Config(format!(
                "current levels must be non-negative (initial {}, operating {})",
                self.initial, self.operating
            )));
        }
        if let Some((leg, ratio)) = self
            .ratios
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_finite() || **r < 0.0)
        {
            return Err(Error::Config(format!(
                "current ratio for leg {} must be finite and non-negative, got {}",
                leg + 1,
                ratio
            )));
        }
        Ok(())
    }

    /// Initial level on every leg
    pub fn initial_currents(&self) -> LegCurrents {
        [self.initial; NUM_LEGS]
    }

    /// Operating level times each leg's ratio, truncated toward zero
    pub fn operating_currents(&self) -> LegCurrents {
        self.ratios
            .map(|ratio| (f64::from(self.operating) * ratio).trunc() as i32)
    }
}

/// Power-up target and settle time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Wait between commanding the startup vector and raising currents
    pub settle: Duration,
    /// Vector commanded at power-up
    pub vector: ActuatorVector,
    /// Head pose assumed at power-up
    pub pose: HeadPose,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            vector: ActuatorState::startup_vector(),
            pose: HeadPose::STARTUP,
        }
    }
}

impl StartupConfig {
    /// Set the settle wait
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Actuator state matching the startup vector and pose
    pub fn initial_state(&self, ik: StewartIk) -> ActuatorState {
        ActuatorState::from_parts(ik, self.vector, self.pose)
    }
}
