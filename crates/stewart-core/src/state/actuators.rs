//! Invariant-enforcing owner of the actuator vector

use serde::{Deserialize, Serialize};

use crate::hardware::{joint_limits, slot, ActuatorVector, MOTOR_NAMES, NUM_LEGS, NUM_MOTORS};
use crate::kinematics::StewartIk;
use crate::math::{clamp_angle, wrap_angle};

use super::pose::{z_step_for_height, HeadAxis, HeadPose, ROTATION_DAMPING};

/// A motor driven by direct angle command rather than IK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectJoint {
    /// Base rotation (slot 0)
    Base,
    /// Antenna joint A (slot 1)
    AntennaA,
    /// Antenna joint B (slot 2)
    AntennaB,
}

impl DirectJoint {
    /// All direct joints in slot order
    pub const ALL: [DirectJoint; 3] = [Self::Base, Self::AntennaA, Self::AntennaB];

    /// Slot of this joint in the actuator vector
    pub const fn slot(self) -> usize {
        match self {
            Self::Base => slot::BASE,
            Self::AntennaA => slot::ANTENNA_A,
            Self::AntennaB => slot::ANTENNA_B,
        }
    }

    /// Joint living at the given slot, if it is a direct joint
    pub fn from_slot(index: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.slot() == index)
    }
}

fn clamp_leg(angle: f64) -> f64 {
    clamp_angle(angle, joint_limits::leg::MIN, joint_limits::leg::MAX)
}

/// Current actuator vector and head pose
///
/// Invariants, re-established by every mutation:
/// - slots 0-2 lie in (-180°, 180°], wrapped rather than clamped
/// - slots 3-8 lie in the leg safety range, clamped rather than wrapped
/// - the head pose lies within [`HeadPose::clamped`]
/// - after any head-pose change, legs hold the clamped IK solution of the pose
#[derive(Debug, Clone)]
pub struct ActuatorState {
    positions: ActuatorVector,
    pose: HeadPose,
    ik: StewartIk,
}

impl ActuatorState {
    /// State at power-up: direct joints at 0°, legs at the startup angle,
    /// head at [`HeadPose::STARTUP`]
    pub fn new(ik: StewartIk) -> Self {
        Self::from_parts(ik, Self::startup_vector(), HeadPose::STARTUP)
    }

    /// Build a state from arbitrary parts, enforcing every invariant
    ///
    /// The legs are taken from `positions` as given (clamped), not re-solved
    /// from `pose`.
    pub fn from_parts(ik: StewartIk, positions: ActuatorVector, pose: HeadPose) -> Self {
        let mut state = Self {
            positions,
            pose: pose.clamped(),
            ik,
        };
        for joint in DirectJoint::ALL {
            let i = joint.slot();
            state.positions[i] = wrap_angle(state.positions[i]);
        }
        for i in slot::LEGS {
            state.positions[i] = clamp_leg(state.positions[i]);
        }
        state
    }

    /// The vector commanded at power-up
    pub fn startup_vector() -> ActuatorVector {
        let mut vector = [joint_limits::leg::STARTUP; NUM_MOTORS];
        for joint in DirectJoint::ALL {
            vector[joint.slot()] = 0.0;
        }
        vector
    }

    /// Copy of the current actuator vector
    pub fn positions(&self) -> ActuatorVector {
        self.positions
    }

    /// Current head pose
    pub fn head_pose(&self) -> HeadPose {
        self.pose
    }

    /// Current angle of a direct joint (radians)
    pub fn joint(&self, joint: DirectJoint) -> f64 {
        self.positions[joint.slot()]
    }

    /// Current angles of the six legs (radians)
    pub fn legs(&self) -> [f64; NUM_LEGS] {
        std::array::from_fn(|i| self.positions[slot::FIRST_LEG + i])
    }

    /// The solver used for head-pose changes
    pub fn ik(&self) -> &StewartIk {
        &self.ik
    }

    /// Add a delta to a direct joint, wrapping into (-180°, 180°]
    pub fn adjust_joint(&mut self, joint: DirectJoint, delta_degrees: f64) {
        let i = joint.slot();
        self.positions[i] = wrap_angle(self.positions[i] + delta_degrees.to_radians());
        tracing::debug!(
            "{}: {:.1}°",
            MOTOR_NAMES[i],
            self.positions[i].to_degrees()
        );
    }

    /// Set one leg to an absolute angle, clamped into the safety range
    ///
    /// `leg` counts from 0; indices past the last leg are ignored.
    pub fn set_leg(&mut self, leg: usize, absolute_degrees: f64) {
        if leg >= NUM_LEGS {
            tracing::warn!("Ignoring command for nonexistent leg {}", leg);
            return;
        }
        self.positions[slot::FIRST_LEG + leg] = clamp_leg(absolute_degrees.to_radians());
    }

    /// Set one motor, by slot, to an absolute angle
    ///
    /// Direct joints are wrapped and legs clamped, as for every other
    /// write. Slots past the last motor are ignored.
    pub fn set_slot(&mut self, index: usize, absolute_degrees: f64) {
        if DirectJoint::from_slot(index).is_some() {
            self.positions[index] = wrap_angle(absolute_degrees.to_radians());
            tracing::debug!(
                "{}: {:.1}°",
                MOTOR_NAMES[index],
                self.positions[index].to_degrees()
            );
        } else if slot::LEGS.contains(&index) {
            self.set_leg(index - slot::FIRST_LEG, absolute_degrees);
        } else {
            tracing::warn!("Ignoring command for nonexistent slot {}", index);
        }
    }

    /// Move the head along one axis and re-solve the legs
    ///
    /// Z steps scale with the current height (see [`z_step_for_height`]);
    /// X/Y deltas are degrees, damped by [`ROTATION_DAMPING`]. The result is
    /// clamped into the head's range before solving.
    pub fn adjust_head_pose(&mut self, axis: HeadAxis, raw_delta: f64) {
        let mut pose = self.pose;
        match axis {
            HeadAxis::Z => {
                pose.z_translation += raw_delta * z_step_for_height(pose.z_translation);
            }
            HeadAxis::X => {
                pose.x_rotation += (raw_delta * ROTATION_DAMPING).to_radians();
            }
            HeadAxis::Y => {
                pose.y_rotation += (raw_delta * ROTATION_DAMPING).to_radians();
            }
        }
        self.set_head_pose(pose);
    }

    /// Replace the head pose (clamped) and re-solve the legs
    pub fn set_head_pose(&mut self, pose: HeadPose) {
        self.pose = pose.clamped();
        let solution = self.ik.solve(&self.pose);
        for (i, angle) in slot::LEGS.zip(solution) {
            self.positions[i] = clamp_leg(angle);
        }
        tracing::debug!(
            "Head pose {} -> legs {:?}",
            self.pose,
            solution.map(|a| (a.to_degrees() * 10.0).round() / 10.0)
        );
    }

    /// Set all six legs to one angle, bypassing IK
    ///
    /// The head pose is left untouched; the next head-pose change re-solves
    /// the legs from it.
    pub fn set_platform_absolute(&mut self, absolute_degrees: f64) {
        let angle = clamp_leg(absolute_degrees.to_radians());
        for i in slot::LEGS {
            self.positions[i] = angle;
        }
        tracing::info!("Platform legs set to {:.1}°", angle.to_degrees());
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new(StewartIk::default())
    }
}
