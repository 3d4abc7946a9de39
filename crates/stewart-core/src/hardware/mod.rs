//! Motor layout, safety limits, and backend abstraction
//!
//! The head carries nine motors: three directly driven joints (base
//! rotation and two antennas) and the six legs of the Stewart platform.
//! Positions travel as a fixed nine-slot [`ActuatorVector`].

#[cfg(feature = "hardware-serial")]
pub mod serial;
mod traits;

#[cfg(feature = "hardware-serial")]
pub use serial::{HardwareBackend, SerialConfig};
pub use traits::{ActuatorVector, BackendEvent, LegCurrents, MotorBackend, SimulatedBackend};

/// Number of motors in the actuator vector
pub const NUM_MOTORS: usize = 9;

/// Number of platform legs
pub const NUM_LEGS: usize = 6;

/// Slot indices in the actuator vector
pub mod slot {
    use std::ops::Range;

    /// Base rotation joint
    pub const BASE: usize = 0;
    /// Antenna joint A
    pub const ANTENNA_A: usize = 1;
    /// Antenna joint B
    pub const ANTENNA_B: usize = 2;
    /// First platform leg
    pub const FIRST_LEG: usize = 3;
    /// All six platform legs
    pub const LEGS: Range<usize> = FIRST_LEG..FIRST_LEG + super::NUM_LEGS;
}

/// Joint position limits (radians)
pub mod joint_limits {
    use std::f64::consts::PI;

    /// Directly driven joints are periodic and wrap into (-180°, 180°]
    pub mod direct {
        use super::PI;

        /// Exclusive lower bound (-180°)
        pub const MIN_EXCLUSIVE: f64 = -PI;
        /// Inclusive upper bound (180°)
        pub const MAX: f64 = PI;
    }

    /// Platform legs saturate inside the servo's safe travel
    pub mod leg {
        use super::PI;

        /// Minimum leg angle (-135.3°)
        pub const MIN: f64 = -135.3 * PI / 180.0;
        /// Maximum leg angle (-20.2°)
        pub const MAX: f64 = -20.2 * PI / 180.0;
        /// Angle commanded to every leg at power-up (-120°)
        pub const STARTUP: f64 = -120.0 * PI / 180.0;
    }
}

/// Bus IDs of the physical motors, in slot order
pub const MOTOR_IDS: [u8; NUM_MOTORS] = [11, 21, 22, 1, 2, 3, 4, 5, 6];

/// Motor names, in slot order
pub const MOTOR_NAMES: [&str; NUM_MOTORS] = [
    "base", "antenna_a", "antenna_b", "leg_1", "leg_2", "leg_3", "leg_4", "leg_5", "leg_6",
];

/// Get slot index by motor name
pub fn slot_by_name(name: &str) -> Option<usize> {
    MOTOR_NAMES.iter().position(|&n| n == name)
}

/// Get slot index by bus ID
pub fn slot_by_motor_id(id: u8) -> Option<usize> {
    MOTOR_IDS.iter().position(|&m| m == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lookup() {
        assert_eq!(slot_by_name("base"), Some(slot::BASE));
        assert_eq!(slot_by_name("leg_6"), Some(8));
        assert_eq!(slot_by_name("tail"), None);

        assert_eq!(slot_by_motor_id(11), Some(slot::BASE));
        assert_eq!(slot_by_motor_id(22), Some(slot::ANTENNA_B));
        assert_eq!(slot_by_motor_id(1), Some(slot::FIRST_LEG));
        assert_eq!(slot_by_motor_id(7), None);
    }

    #[test]
    fn test_leg_slots() {
        assert_eq!(slot::LEGS.len(), NUM_LEGS);
        assert_eq!(slot::LEGS.end, NUM_MOTORS);
    }

    #[test]
    fn test_leg_limits_ordered() {
        assert!(joint_limits::leg::MIN < joint_limits::leg::STARTUP);
        assert!(joint_limits::leg::STARTUP < joint_limits::leg::MAX);
    }
}
