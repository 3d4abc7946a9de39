//! Input arbitration
//!
//! One snapshot yields a short list of intents, applied in order:
//!
//! 1. first modifier held: antenna B, then antenna A, each past the deadzone
//! 2. the first held preset button, regardless of modifiers
//! 3. second modifier held: one of base/Z, then one of X/Y
//!
//! Within a pair the axis with the larger magnitude wins. On equal
//! magnitudes the second axis of the pair wins.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::input::InputSnapshot;
use crate::state::{ActuatorState, DirectJoint, HeadAxis};

use super::config::{AxisPair, InputMapping};

/// Upper bound on intents produced by one snapshot
pub const MAX_INTENTS_PER_TICK: usize = 5;

/// A single state change requested by the operator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlIntent {
    /// Nothing to do this tick
    NoOp,
    /// Rotate a direct joint by a delta in degrees
    AdjustJoint {
        joint: DirectJoint,
        delta_degrees: f64,
    },
    /// Move the head along one axis by a raw delta
    AdjustHeadPose { axis: HeadAxis, delta: f64 },
    /// Snap all six legs to one angle
    SetPlatformAbsolute { degrees: f64 },
}

impl ControlIntent {
    /// Apply this intent to the actuator state
    pub fn apply(self, state: &mut ActuatorState) {
        match self {
            Self::NoOp => {}
            Self::AdjustJoint {
                joint,
                delta_degrees,
            } => state.adjust_joint(joint, delta_degrees),
            Self::AdjustHeadPose { axis, delta } => state.adjust_head_pose(axis, delta),
            Self::SetPlatformAbsolute { degrees } => state.set_platform_absolute(degrees),
        }
    }
}

/// Which axis of a pair acts this tick
#[derive(Debug, Clone, Copy, PartialEq)]
enum PairChoice {
    First(f64),
    Second(f64),
}

fn choose(snapshot: &InputSnapshot, pair: AxisPair, deadzone: f64) -> Option<PairChoice> {
    let a = snapshot.axis(pair.first);
    let b = snapshot.axis(pair.second);
    if a.abs() > b.abs() && a.abs() > deadzone {
        Some(PairChoice::First(a))
    } else if b.abs() > deadzone {
        Some(PairChoice::Second(b))
    } else {
        None
    }
}

/// Derive this tick's intents from a snapshot
///
/// Stick deflection is inverted for every channel to match the mounting of
/// the motors. A snapshot that requests nothing yields a single
/// [`ControlIntent::NoOp`].
pub fn interpret(
    snapshot: &InputSnapshot,
    mapping: &InputMapping,
) -> ArrayVec<ControlIntent, MAX_INTENTS_PER_TICK> {
    let mut intents = ArrayVec::new();

    if snapshot.button(mapping.first_modifier) {
        for (axis, joint) in [
            (mapping.antenna_b_axis, DirectJoint::AntennaB),
            (mapping.antenna_a_axis, DirectJoint::AntennaA),
        ] {
            let value = snapshot.axis(axis);
            if value.abs() > mapping.deadzone {
                intents.push(ControlIntent::AdjustJoint {
                    joint,
                    delta_degrees: -value * mapping.antenna_scale,
                });
            }
        }
    }

    if let Some(preset) = mapping
        .presets
        .iter()
        .find(|preset| snapshot.button(preset.button))
    {
        intents.push(ControlIntent::SetPlatformAbsolute {
            degrees: preset.degrees,
        });
    }

    if snapshot.button(mapping.second_modifier) {
        match choose(snapshot, mapping.base_z_pair, mapping.deadzone) {
            Some(PairChoice::First(value)) => intents.push(ControlIntent::AdjustJoint {
                joint: DirectJoint::Base,
                delta_degrees: -value * mapping.base_scale,
            }),
            Some(PairChoice::Second(value)) => intents.push(ControlIntent::AdjustHeadPose {
                axis: HeadAxis::Z,
                delta: -value * mapping.head_scale,
            }),
            None => {}
        }
        match choose(snapshot, mapping.xy_pair, mapping.deadzone) {
            Some(PairChoice::First(value)) => intents.push(ControlIntent::AdjustHeadPose {
                axis: HeadAxis::X,
                delta: -value * mapping.head_scale,
            }),
            Some(PairChoice::Second(value)) => intents.push(ControlIntent::AdjustHeadPose {
                axis: HeadAxis::Y,
                delta: -value * mapping.head_scale,
            }),
            None => {}
        }
    }

    if intents.is_empty() {
        intents.push(ControlIntent::NoOp);
    }
    intents
}
