//! # Trajectory module
//!
//! The time-indexed output of the planner: an ordered sequence of robot
//! instants with strictly increasing timestamps, supporting interpolated
//! evaluation at arbitrary times.
//!
//! An empty trajectory is the planner's failure signal, so most accessors
//! return `Option` rather than assuming instants exist.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use util::maths::lin_map;

use crate::state::{Pose, RobotInstant, Twist};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A time-parameterised sequence of robot states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    instants: Vec<RobotInstant>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors raised while constructing a trajectory.
#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("Timestamps must be strictly increasing, instant {0} is not after its predecessor")]
    NonMonotonicTime(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// An empty trajectory, the planner's failure signal.
    pub fn empty() -> Self {
        Self {
            instants: Vec::new(),
        }
    }

    /// Build a trajectory from instants, checking that timestamps strictly
    /// increase.
    pub fn new(instants: Vec<RobotInstant>) -> Result<Self, TrajectoryError> {
        for i in 1..instants.len() {
            if instants[i].time_s <= instants[i - 1].time_s {
                return Err(TrajectoryError::NonMonotonicTime(i));
            }
        }

        Ok(Self { instants })
    }

    /// A trajectory holding a single instant.
    pub fn single(instant: RobotInstant) -> Self {
        Self {
            instants: vec![instant],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn instants(&self) -> &[RobotInstant] {
        &self.instants
    }

    pub fn first(&self) -> Option<&RobotInstant> {
        self.instants.first()
    }

    pub fn last(&self) -> Option<&RobotInstant> {
        self.instants.last()
    }

    pub fn start_time_s(&self) -> Option<f64> {
        self.first().map(|i| i.time_s)
    }

    pub fn end_time_s(&self) -> Option<f64> {
        self.last().map(|i| i.time_s)
    }

    /// Duration from first to last instant, zero for empty or single-instant
    /// trajectories.
    pub fn duration_s(&self) -> f64 {
        match (self.start_time_s(), self.end_time_s()) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        }
    }

    /// Evaluate the trajectory at the given time.
    ///
    /// Times inside the trajectory's span return a linearly interpolated
    /// instant. Times outside the span CLAMP to the nearest end; only an
    /// empty trajectory returns `None`.
    pub fn evaluate(&self, time_s: f64) -> Option<RobotInstant> {
        let first = self.first()?;
        let last = self.last()?;

        if time_s <= first.time_s {
            return Some(*first);
        }
        if time_s >= last.time_s {
            return Some(*last);
        }

        // Find the pair of instants bracketing the requested time.
        //
        // The unwrap is safe: the time is strictly inside the span, so a
        // bracketing pair always exists.
        let i = self
            .instants
            .windows(2)
            .position(|pair| pair[0].time_s <= time_s && time_s <= pair[1].time_s)
            .unwrap();

        Some(interpolate(
            &self.instants[i],
            &self.instants[i + 1],
            time_s,
        ))
    }

    /// Extract the section of the trajectory between two times as a new
    /// trajectory, with interpolated instants at the cut points.
    ///
    /// Returns an empty trajectory if this one is empty or the times are
    /// not ordered.
    pub fn section(&self, from_s: f64, to_s: f64) -> Trajectory {
        if self.is_empty() || to_s <= from_s {
            return Trajectory::empty();
        }

        let mut instants = Vec::new();

        if let Some(start) = self.evaluate(from_s) {
            instants.push(start);
        }

        // Clamping can place the cut instant after `from_s`, so gate interior
        // instants on the last pushed timestamp to keep strict ordering
        for instant in &self.instants {
            let after_last = instants
                .last()
                .map(|last| instant.time_s > last.time_s)
                .unwrap_or(true);
            if after_last && instant.time_s < to_s {
                instants.push(*instant);
            }
        }

        if let Some(end) = self.evaluate(to_s) {
            // Clamping can collapse the end onto the previous instant, skip
            // it to keep timestamps strictly increasing
            if instants
                .last()
                .map(|last| end.time_s > last.time_s)
                .unwrap_or(true)
            {
                instants.push(end);
            }
        }

        Trajectory { instants }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Linearly interpolate between two instants at a time between them.
fn interpolate(a: &RobotInstant, b: &RobotInstant, time_s: f64) -> RobotInstant {
    let range = (a.time_s, b.time_s);

    let lerp = |va: f64, vb: f64| lin_map(range, (va, vb), time_s);

    RobotInstant {
        pose: Pose {
            position_m: nalgebra::Point2::new(
                lerp(a.pose.position_m.x, b.pose.position_m.x),
                lerp(a.pose.position_m.y, b.pose.position_m.y),
            ),
            // Headings are unwrapped so plain interpolation is correct even
            // across what would be a +-pi boundary
            heading_rad: lerp(a.pose.heading_rad, b.pose.heading_rad),
        },
        twist: Twist {
            linear_ms: nalgebra::Vector2::new(
                lerp(a.twist.linear_ms.x, b.twist.linear_ms.x),
                lerp(a.twist.linear_ms.y, b.twist.linear_ms.y),
            ),
            angular_rads: lerp(a.twist.angular_rads, b.twist.angular_rads),
        },
        time_s,
    }
}
