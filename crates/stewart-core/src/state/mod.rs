//! Actuator state: the nine-slot position vector and the head pose
//!
//! [`ActuatorState`] is the only writer of either. Every mutation enforces
//! the range invariants at the mutation site, so no caller can leave an
//! unclamped leg or an unwrapped joint behind.

mod actuators;
mod pose;

pub use actuators::{ActuatorState, DirectJoint};
pub use pose::{z_step_for_height, HeadAxis, HeadPose, ROTATION_DAMPING};
