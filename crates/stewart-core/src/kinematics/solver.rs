//! Geometric inverse-kinematics solver

use std::f64::consts::FRAC_PI_2;

use crate::math::{rotation_x, rotation_y, Vector3};
use crate::state::HeadPose;

use super::geometry::{PlatformGeometry, NUM_ANCHORS};

/// Six leg-actuator angles in radians, in anchor order
pub type LegAngles = [f64; NUM_ANCHORS];

/// Offset from the geometric leg elevation to the actuator zero reference (-90°)
pub const ACTUATOR_ZERO_OFFSET: f64 = -FRAC_PI_2;

/// Inverse-kinematics solver for the six-legged platform
///
/// Pure and deterministic. Inputs are assumed finite, which holds for any
/// pose taken from [`ActuatorState`](crate::state::ActuatorState) since it is
/// clamped on every mutation.
#[derive(Debug, Clone, Default)]
pub struct StewartIk {
    geometry: PlatformGeometry,
}

impl StewartIk {
    /// Create a solver over the given geometry
    pub fn new(geometry: PlatformGeometry) -> Self {
        Self { geometry }
    }

    /// The geometry this solver was built with
    pub fn geometry(&self) -> &PlatformGeometry {
        &self.geometry
    }

    /// Solve a head pose into six actuator angles
    ///
    /// The top plate is rotated by `Ry(y) · Rx(x)` (X applied first), lifted
    /// by the pose translation, and each leg's elevation above the horizontal
    /// is converted to the actuator convention. Output is unclamped.
    pub fn solve(&self, pose: &HeadPose) -> LegAngles {
        let rotation = rotation_y(pose.y_rotation) * rotation_x(pose.x_rotation);
        let lift = Vector3::new(0.0, 0.0, pose.z_translation);
        let base = self.geometry.base_anchors();
        let platform = self.geometry.platform_anchors();

        std::array::from_fn(|i| {
            let leg = rotation * platform[i] + lift - base[i];
            leg_elevation(&leg) + ACTUATOR_ZERO_OFFSET
        })
    }
}

/// Elevation of a leg vector above the base plane
///
/// A leg with no horizontal extent is treated as straight up or straight down.
fn leg_elevation(leg: &Vector3) -> f64 {
    let horizontal = leg.x.hypot(leg.y);
    if horizontal > 0.0 {
        leg.z.atan2(horizontal)
    } else if leg.z > 0.0 {
        FRAC_PI_2
    } else {
        -FRAC_PI_2
    }
}
