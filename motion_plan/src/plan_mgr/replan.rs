//! Replanning decision logic
//!
//! Each control cycle opens with a categorical decision about how much of
//! the previous trajectory to keep. The decision is made once, before any
//! search work, from the previous trajectory and a fresh obstacle snapshot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};

use crate::state_space::StateSpace;
use crate::traj::Trajectory;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The replanning decision for one control cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplanState {
    /// The previous trajectory remains valid with enough lead time, keep it
    /// untouched.
    Reuse,

    /// Plan afresh from the current state.
    FullReplan,

    /// Keep the imminent prefix of the previous trajectory, replan only the
    /// remainder from a splice point one lead time in the future.
    PartialReplan,

    /// The previous trajectory remains valid, but enough time has passed
    /// that a fresh plan should be attempted and adopted if strictly
    /// better.
    CheckBetter,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Decide how to treat the previous trajectory this cycle.
pub fn decide(
    prev: Option<&Trajectory>,
    space: &StateSpace,
    now_s: f64,
    lead_time_s: f64,
    check_better_due: bool,
) -> ReplanState {
    let prev = match prev {
        Some(t) if !t.is_empty() => t,
        _ => return ReplanState::FullReplan,
    };

    // Nearly exhausted trajectories aren't worth splicing into
    let end_s = match prev.end_time_s() {
        Some(t) => t,
        None => return ReplanState::FullReplan,
    };
    if end_s - now_s <= lead_time_s {
        return ReplanState::FullReplan;
    }

    match first_invalid_time(prev, space, now_s) {
        // Blocked, but far enough ahead that the prefix can be kept while
        // the remainder is replanned
        Some(blocked_s) if blocked_s > now_s + lead_time_s => {
            trace!("Previous trajectory blocked at t = {:.3} s", blocked_s);
            ReplanState::PartialReplan
        }

        // Blocked within the lead window, nothing useful to keep
        Some(_) => ReplanState::FullReplan,

        None if check_better_due => ReplanState::CheckBetter,

        None => ReplanState::Reuse,
    }
}

/// The time at which the remainder of the trajectory first crosses an
/// obstacle, or `None` if it stays clear.
///
/// The returned time is the timestamp at the start of the first invalid
/// segment.
pub fn first_invalid_time(traj: &Trajectory, space: &StateSpace, from_s: f64) -> Option<f64> {
    let start = traj.evaluate(from_s)?;

    let mut prev_position = start.pose.position_m;
    let mut prev_time_s = start.time_s;

    for instant in traj.instants() {
        if instant.time_s <= prev_time_s {
            continue;
        }

        if !space.segment_valid(&prev_position, &instant.pose.position_m) {
            return Some(prev_time_s);
        }

        prev_position = instant.pose.position_m;
        prev_time_s = instant.time_s;
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::{Pose, RobotInstant, Twist};
    use crate::state_space::{FieldBounds, Obstacle};
    use nalgebra::{Point2, Vector2};

    fn space(obstacles: Vec<Obstacle>) -> StateSpace {
        StateSpace::new(
            FieldBounds {
                x_min_m: -5.0,
                x_max_m: 5.0,
                y_min_m: -4.0,
                y_max_m: 4.0,
            },
            obstacles,
        )
        .unwrap()
    }

    /// A straight trajectory along +x at 1 m/s from (-4, 0), starting at
    /// t = 0 and running for 8 s.
    fn straight_trajectory() -> Trajectory {
        let instants = (0..=80)
            .map(|i| {
                let t = i as f64 * 0.1;
                RobotInstant {
                    pose: Pose {
                        position_m: Point2::new(-4.0 + t, 0.0),
                        heading_rad: 0.0,
                    },
                    twist: Twist {
                        linear_ms: Vector2::new(1.0, 0.0),
                        angular_rads: 0.0,
                    },
                    time_s: t,
                }
            })
            .collect();
        Trajectory::new(instants).unwrap()
    }

    #[test]
    fn test_no_previous_full_replan() {
        assert_eq!(
            decide(None, &space(vec![]), 0.0, 0.2, false),
            ReplanState::FullReplan
        );

        let empty = Trajectory::empty();
        assert_eq!(
            decide(Some(&empty), &space(vec![]), 0.0, 0.2, false),
            ReplanState::FullReplan
        );
    }

    #[test]
    fn test_clear_trajectory_reused() {
        let traj = straight_trajectory();
        assert_eq!(
            decide(Some(&traj), &space(vec![]), 1.0, 0.2, false),
            ReplanState::Reuse
        );
    }

    #[test]
    fn test_check_better_when_due() {
        let traj = straight_trajectory();
        assert_eq!(
            decide(Some(&traj), &space(vec![]), 1.0, 0.2, true),
            ReplanState::CheckBetter
        );
    }

    #[test]
    fn test_blocked_ahead_partial_replan() {
        let traj = straight_trajectory();

        // Obstacle at x = 2, reached at t = 6: well beyond the lead window
        let s = space(vec![Obstacle::Circle {
            centre_m: Point2::new(2.0, 0.0),
            radius_m: 0.3,
        }]);

        assert_eq!(decide(Some(&traj), &s, 1.0, 0.2, false), ReplanState::PartialReplan);
    }

    #[test]
    fn test_blocked_imminently_full_replan() {
        let traj = straight_trajectory();

        // Obstacle right on top of the robot's position at t = 1
        let s = space(vec![Obstacle::Circle {
            centre_m: Point2::new(-2.9, 0.0),
            radius_m: 0.3,
        }]);

        assert_eq!(decide(Some(&traj), &s, 1.0, 0.2, false), ReplanState::FullReplan);
    }

    #[test]
    fn test_exhausted_trajectory_full_replan() {
        let traj = straight_trajectory();
        assert_eq!(
            decide(Some(&traj), &space(vec![]), 7.9, 0.2, false),
            ReplanState::FullReplan
        );
    }

    #[test]
    fn test_first_invalid_time() {
        let traj = straight_trajectory();
        let s = space(vec![Obstacle::Circle {
            centre_m: Point2::new(0.0, 0.0),
            radius_m: 0.25,
        }]);

        // The robot reaches x = -0.25 at t = 3.75, so the segment starting
        // at t = 3.7 is the first to hit
        let blocked = first_invalid_time(&traj, &s, 0.0).unwrap();
        assert!((blocked - 3.7).abs() < 0.11, "blocked at {}", blocked);

        assert!(first_invalid_time(&traj, &space(vec![]), 0.0).is_none());
    }
}
