//! Stewart-platform inverse kinematics
//!
//! Maps a 3-DOF head pose (X rotation, Y rotation, vertical translation)
//! to the six leg-actuator angles of the parallel platform.

mod geometry;
mod solver;

pub use geometry::{PlatformGeometry, NUM_ANCHORS};
pub use solver::{LegAngles, StewartIk, ACTUATOR_ZERO_OFFSET};
