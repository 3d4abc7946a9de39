//! Head pose and its per-axis scaling policy

use std::fmt;

use serde::{Deserialize, Serialize};

/// Damping applied to X/Y rotation deltas before they are added
pub const ROTATION_DAMPING: f64 = 0.5;

/// Vertical step per unit of raw input, by current height
///
/// (upper bound of the band in meters, step in meters). Heights at or above
/// the last bound use [`Z_STEP_TOP`].
const Z_STEP_BANDS: [(f64, f64); 4] = [(0.05, 0.001), (0.1, 0.002), (0.2, 0.005), (0.5, 0.01)];
const Z_STEP_TOP: f64 = 0.02;

/// Vertical step size for one unit of raw input at the given height
///
/// Finer near the ground and coarser higher up, so the legs turn at a
/// roughly constant rate through the nonlinear IK map.
pub fn z_step_for_height(z: f64) -> f64 {
    Z_STEP_BANDS
        .iter()
        .find(|&&(upper, _)| z < upper)
        .map_or(Z_STEP_TOP, |&(_, step)| step)
}

/// Head pose axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadAxis {
    /// Rotation about X
    X,
    /// Rotation about Y
    Y,
    /// Vertical translation
    Z,
}

/// Target orientation and height of the platform top plate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Rotation about X (radians)
    pub x_rotation: f64,
    /// Rotation about Y (radians)
    pub y_rotation: f64,
    /// Vertical translation (meters)
    pub z_translation: f64,
}

impl HeadPose {
    /// Rotation limit on X and Y (±30°)
    pub const ROTATION_LIMIT: f64 = 30.0 * std::f64::consts::PI / 180.0;
    /// Lowest vertical translation (-50 mm)
    pub const Z_MIN: f64 = -0.05;
    /// Highest vertical translation (1100 mm)
    pub const Z_MAX: f64 = 1.1;

    /// Pose at power-up (8 mm below the base plane)
    pub const STARTUP: HeadPose = HeadPose {
        x_rotation: 0.0,
        y_rotation: 0.0,
        z_translation: -0.008,
    };

    /// Create a pose; no limits are applied
    pub const fn new(x_rotation: f64, y_rotation: f64, z_translation: f64) -> Self {
        Self {
            x_rotation,
            y_rotation,
            z_translation,
        }
    }

    /// The same pose saturated into the head's range
    pub fn clamped(self) -> Self {
        Self {
            x_rotation: self
                .x_rotation
                .clamp(-Self::ROTATION_LIMIT, Self::ROTATION_LIMIT),
            y_rotation: self
                .y_rotation
                .clamp(-Self::ROTATION_LIMIT, Self::ROTATION_LIMIT),
            z_translation: self.z_translation.clamp(Self::Z_MIN, Self::Z_MAX),
        }
    }

    /// Value along one axis
    pub fn get(&self, axis: HeadAxis) -> f64 {
        match axis {
            HeadAxis::X => self.x_rotation,
            HeadAxis::Y => self.y_rotation,
            HeadAxis::Z => self.z_translation,
        }
    }
}

impl Default for HeadPose {
    fn default() -> Self {
        Self::STARTUP
    }
}

impl fmt::Display for HeadPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X={:.1}°, Y={:.1}°, Z={:.1}mm",
            self.x_rotation.to_degrees(),
            self.y_rotation.to_degrees(),
            self.z_translation * 1000.0
        )
    }
}
