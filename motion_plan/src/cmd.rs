//! # Motion commands
//!
//! The command type accepted by the planner entry point. Commands are an
//! explicit tagged enum and the planner pattern-matches on the kind; there
//! is no implicit type-based dispatch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::state::Pose;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// A motion command to be converted into a trajectory by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MotionCommand {
    /// Plan a collision-free trajectory which ends at the goal pose moving
    /// with the given velocity.
    PathTarget {
        /// The pose to arrive at
        goal: Pose,

        /// The linear velocity to arrive with, in meters/second
        goal_velocity_ms: Vector2<f64>,
    },

    /// Bring the robot to an immediate halt at its current position,
    /// discarding any previous trajectory.
    Halt,
}
