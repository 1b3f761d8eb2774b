//! # Robot state types
//!
//! Defines the snapshot types shared by every stage of the planning
//! pipeline: the robot's pose on the field plane, its velocity, and the
//! timestamped combination of the two.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose (position and heading) of the robot on the field plane.
///
/// Headings are angles to the positive field X axis in radians. Headings
/// held in a trajectory are continuous (unwrapped), so values outside
/// [-pi, pi] are meaningful and must not be normalised away.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Pose {
    /// The position on the field plane
    pub position_m: Point2<f64>,

    /// The heading (angle to the positive field X axis)
    pub heading_rad: f64,
}

/// Linear and angular velocity of the robot.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Twist {
    /// Linear velocity on the field plane
    pub linear_ms: Vector2<f64>,

    /// Angular velocity about the robot's vertical axis. Follows the right
    /// hand rule, so positive rates rotate the robot anticlockwise when
    /// viewed from above.
    pub angular_rads: f64,
}

/// A timestamped snapshot of the robot's state.
///
/// Timestamps are seconds on the caller's clock (seconds since session epoch
/// in the executive). The planning library never reads a wall clock itself.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct RobotInstant {
    pub pose: Pose,
    pub twist: Twist,
    pub time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Point2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad,
        }
    }
}

impl Twist {
    /// A twist with no linear or angular motion.
    pub fn zero() -> Self {
        Self {
            linear_ms: Vector2::zeros(),
            angular_rads: 0.0,
        }
    }

    /// Return the linear speed (magnitude of the linear velocity).
    pub fn speed_ms(&self) -> f64 {
        self.linear_ms.norm()
    }
}

impl RobotInstant {
    pub fn new(pose: Pose, twist: Twist, time_s: f64) -> Self {
        Self {
            pose,
            twist,
            time_s,
        }
    }

    /// A stationary instant at the given pose.
    pub fn stationary(pose: Pose, time_s: f64) -> Self {
        Self {
            pose,
            twist: Twist::zero(),
            time_s,
        }
    }
}
