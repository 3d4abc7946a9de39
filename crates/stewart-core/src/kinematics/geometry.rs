//! Fixed platform geometry

use crate::math::Vector3;

/// Number of joint anchors on each plate, one per leg
pub const NUM_ANCHORS: usize = 6;

/// Angular spacing between consecutive anchors (60°)
const ANCHOR_SPACING: f64 = std::f64::consts::PI / 3.0;

/// Rigid geometry of the base and top plates
///
/// Anchors sit on circles of `base_radius` / `platform_radius` at 60°
/// intervals, anchor 0 at 0°. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGeometry {
    /// Radius of the base anchor circle (m)
    pub base_radius: f64,
    /// Radius of the top plate anchor circle (m)
    pub platform_radius: f64,
    /// Nominal leg length (m)
    pub leg_length: f64,
    /// Height of the base plate (m)
    pub base_height: f64,
    base_anchors: [Vector3; NUM_ANCHORS],
    platform_anchors: [Vector3; NUM_ANCHORS],
}

impl PlatformGeometry {
    /// Default base radius (100 mm)
    pub const DEFAULT_BASE_RADIUS: f64 = 0.1;
    /// Default platform radius (80 mm)
    pub const DEFAULT_PLATFORM_RADIUS: f64 = 0.08;
    /// Default leg length (150 mm)
    pub const DEFAULT_LEG_LENGTH: f64 = 0.15;
    /// Default base height (22 mm)
    pub const DEFAULT_BASE_HEIGHT: f64 = 0.022;

    /// Build a geometry and lay out its anchors
    pub fn new(base_radius: f64, platform_radius: f64, leg_length: f64, base_height: f64) -> Self {
        Self {
            base_radius,
            platform_radius,
            leg_length,
            base_height,
            base_anchors: ring(base_radius),
            platform_anchors: ring(platform_radius),
        }
    }

    /// Base anchor positions in the base frame
    pub fn base_anchors(&self) -> &[Vector3; NUM_ANCHORS] {
        &self.base_anchors
    }

    /// Top plate anchor positions in the platform frame
    pub fn platform_anchors(&self) -> &[Vector3; NUM_ANCHORS] {
        &self.platform_anchors
    }
}

impl Default for PlatformGeometry {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE_RADIUS,
            Self::DEFAULT_PLATFORM_RADIUS,
            Self::DEFAULT_LEG_LENGTH,
            Self::DEFAULT_BASE_HEIGHT,
        )
    }
}

fn ring(radius: f64) -> [Vector3; NUM_ANCHORS] {
    std::array::from_fn(|i| {
        let (s, c) = (i as f64 * ANCHOR_SPACING).sin_cos();
        Vector3::new(radius * c, radius * s, 0.0)
    })
}
