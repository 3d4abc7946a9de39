//! Math utilities for the platform: angle wrapping, clamping, rotations
//!
//! Rotations and vectors are nalgebra types; angles are plain `f64` radians
//! unless a name says otherwise.

use std::f64::consts::PI;

/// Type alias for 3D vectors
pub type Vector3 = nalgebra::Vector3<f64>;

/// Type alias for 3x3 rotation matrices
pub type Matrix3 = nalgebra::Matrix3<f64>;

const TWO_PI: f64 = 2.0 * PI;

/// Wrap an angle into (-π, π]
///
/// Unlike a clamp, values past the boundary re-enter from the other side:
/// 190° becomes -170°. Exactly π is kept as π and -π maps to π.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = PI - (PI - angle).rem_euclid(TWO_PI);
    // rem_euclid may round up to exactly 2π for inputs a hair above π
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Saturate an angle into `[min, max]`
#[inline]
pub fn clamp_angle(angle: f64, min: f64, max: f64) -> f64 {
    angle.clamp(min, max)
}

/// Rotation about the X axis
pub fn rotation_x(angle: f64) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, -s, //
        0.0, s, c,
    )
}

/// Rotation about the Y axis
pub fn rotation_y(angle: f64) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, 0.0, s, //
        0.0, 1.0, 0.0, //
        -s, 0.0, c,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_angle_inside_range() {
        assert_relative_eq!(wrap_angle(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-1.0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_angle_boundaries() {
        // Upper bound is inclusive, lower bound exclusive
        assert_relative_eq!(wrap_angle(PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_angle_past_boundary() {
        assert_relative_eq!(
            wrap_angle(190f64.to_radians()),
            (-170f64).to_radians(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            wrap_angle((-200f64).to_radians()),
            160f64.to_radians(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            wrap_angle(725f64.to_radians()),
            5f64.to_radians(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_clamp_angle() {
        assert_eq!(clamp_angle(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_angle(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_angle(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_rotations() {
        let v = Vector3::new(0.0, 1.0, 0.0);
        let r = rotation_x(PI / 2.0) * v;
        assert_relative_eq!(r, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        let v = Vector3::new(1.0, 0.0, 0.0);
        let r = rotation_y(PI / 2.0) * v;
        assert_relative_eq!(r, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }
}
