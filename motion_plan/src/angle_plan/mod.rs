//! # Angle planning module
//!
//! Overlays a heading profile onto a time-parameterised trajectory. The
//! desired heading at each instant is the direction of travel, unless
//! matching it would demand more than a quarter turn from the continuation
//! of the previous heading, in which case the robot faces backward along
//! the path (a soccer robot drives equally well in reverse, and this
//! minimises net rotation).
//!
//! Desired headings are angle-unwrapped, so the output is continuous rather
//! than wrapped into a fixed range. The desired profile is then tracked by
//! a rate and acceleration limited angular profiler running on the fixed
//! translational timestamps: a forward pass limits angular speed and
//! acceleration, a backward pass limits the deceleration into a settled
//! (zero rate) final heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::{FRAC_PI_2, PI};

use util::maths::ang_delta;

use crate::constraints::MotionConstraints;
use crate::state::RobotInstant;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this speed the direction of travel is undefined and the previous
/// desired heading is held.
const MIN_HEADING_SPEED_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Plan headings and angular rates for the given instants, in place.
///
/// `start` supplies the heading and angular rate the profile must continue
/// from. Timestamps of the instants are not modified.
pub fn plan_angles(
    instants: &mut [RobotInstant],
    start: &RobotInstant,
    constraints: &MotionConstraints,
) {
    if instants.is_empty() {
        return;
    }

    let n = instants.len();
    let omega_max = constraints.max_ang_speed_rads;
    let alpha_max = constraints.max_ang_accel_radss;

    // ---- DESIRED HEADINGS ----

    let mut desired = vec![0f64; n];
    let mut prev = start.pose.heading_rad;

    for i in 0..n {
        let velocity = instants[i].twist.linear_ms;

        desired[i] = if velocity.norm() > MIN_HEADING_SPEED_MS {
            let travel_rad = velocity.y.atan2(velocity.x);
            let delta = ang_delta(prev, travel_rad);

            // Face along the path if within a quarter turn, otherwise face
            // backward along it
            if delta.abs() <= FRAC_PI_2 {
                prev + delta
            } else if delta > 0.0 {
                prev + delta - PI
            } else {
                prev + delta + PI
            }
        } else {
            prev
        };

        prev = desired[i];
    }

    // ---- RATE/ACCEL LIMITED TRACKING ----

    let mut heading = vec![0f64; n];
    let mut omega = vec![0f64; n];

    heading[0] = start.pose.heading_rad;
    omega[0] = start.twist.angular_rads.clamp(-omega_max, omega_max);

    // Forward pass: track the desired heading within the angular speed and
    // acceleration limits. The approach speed follows a half-acceleration
    // deceleration ramp onto the target, capped so a single step cannot
    // overshoot it.
    for i in 1..n {
        let dt = instants[i].time_s - instants[i - 1].time_s;

        let remaining_rad = desired[i] - heading[i - 1];
        let approach_rads = (alpha_max * remaining_rad.abs()).sqrt().min(omega_max);
        let wanted_rads = remaining_rad.signum() * approach_rads.min(remaining_rad.abs() / dt);

        let lo = (omega[i - 1] - alpha_max * dt).max(-omega_max);
        let hi = (omega[i - 1] + alpha_max * dt).min(omega_max);

        omega[i] = wanted_rads.clamp(lo, hi);
        heading[i] = heading[i - 1] + omega[i] * dt;
    }

    // Backward pass: the rate must be able to settle to zero by the final
    // instant without exceeding the deceleration limit
    omega[n - 1] = 0.0;
    for i in (0..n - 1).rev() {
        let dt = instants[i + 1].time_s - instants[i].time_s;
        let cap = omega[i + 1].abs() + alpha_max * dt;
        if omega[i].abs() > cap {
            omega[i] = omega[i].signum() * cap;
        }
    }

    // Re-integrate headings so they stay consistent with the limited rates
    for i in 1..n {
        let dt = instants[i].time_s - instants[i - 1].time_s;
        heading[i] = heading[i - 1] + 0.5 * (omega[i - 1] + omega[i]) * dt;
    }

    // ---- WRITE BACK ----

    for i in 0..n {
        instants[i].pose.heading_rad = heading[i];
        instants[i].twist.angular_rads = omega[i];
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::{Pose, Twist};
    use nalgebra::{Point2, Vector2};

    fn constraints() -> MotionConstraints {
        MotionConstraints {
            max_speed_ms: 2.0,
            max_accel_mss: 1.0,
            max_ang_speed_rads: 2.0,
            max_ang_accel_radss: 4.0,
            max_lat_accel_mss: 1.5,
        }
    }

    /// Instants travelling at 1 m/s along the given velocity directions,
    /// 0.1 s apart.
    fn instants_along(directions: &[Vector2<f64>]) -> Vec<RobotInstant> {
        directions
            .iter()
            .enumerate()
            .map(|(i, dir)| RobotInstant {
                pose: Pose {
                    position_m: Point2::new(i as f64 * 0.1, 0.0),
                    heading_rad: 0.0,
                },
                twist: Twist {
                    linear_ms: dir.normalize(),
                    angular_rads: 0.0,
                },
                time_s: i as f64 * 0.1,
            })
            .collect()
    }

    fn start(heading_rad: f64) -> RobotInstant {
        RobotInstant::stationary(
            Pose {
                position_m: Point2::new(0.0, 0.0),
                heading_rad,
            },
            0.0,
        )
    }

    #[test]
    fn test_faces_travel_direction() {
        let mut instants = instants_along(&[Vector2::new(1.0, 0.0); 20]);
        plan_angles(&mut instants, &start(0.0), &constraints());

        for inst in &instants {
            assert!(inst.pose.heading_rad.abs() < 1e-9);
            assert!(inst.twist.angular_rads.abs() < 1e-9);
        }
    }

    #[test]
    fn test_faces_backward_beyond_quarter_turn() {
        // Facing -x while travelling +x: reversing is closer than turning
        let mut instants = instants_along(&[Vector2::new(1.0, 0.0); 20]);
        plan_angles(&mut instants, &start(PI), &constraints());

        for inst in &instants {
            assert!((inst.pose.heading_rad - PI).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rate_and_accel_limits() {
        // A quarter-turn heading change tracked under the angular limits
        let mut instants = instants_along(&[Vector2::new(0.0, 1.0); 40]);
        let c = constraints();
        plan_angles(&mut instants, &start(0.0), &c);

        for pair in instants.windows(2) {
            let dt = pair[1].time_s - pair[0].time_s;
            let dw = pair[1].twist.angular_rads - pair[0].twist.angular_rads;

            assert!(pair[1].twist.angular_rads.abs() <= c.max_ang_speed_rads + 1e-9);
            assert!(dw.abs() <= c.max_ang_accel_radss * dt + 1e-9);
        }

        // Long enough to settle onto the desired heading with zero rate
        let last = instants.last().unwrap();
        assert!((last.pose.heading_rad - FRAC_PI_2).abs() < 0.05);
        assert!(last.twist.angular_rads.abs() < 1e-9);
    }

    #[test]
    fn test_headings_unwrapped() {
        // Travel directions rotating through the +-pi boundary: the output
        // heading must continue past pi, not jump back to -pi
        let directions: Vec<Vector2<f64>> = (0..30)
            .map(|i| {
                let ang = 3.0 + 0.01 * i as f64;
                Vector2::new(ang.cos(), ang.sin())
            })
            .collect();

        let mut instants = instants_along(&directions);
        plan_angles(&mut instants, &start(3.0), &constraints());

        for pair in instants.windows(2) {
            let step = pair[1].pose.heading_rad - pair[0].pose.heading_rad;
            assert!(step.abs() < 0.5, "heading jumped by {}", step);
        }

        // The final heading has passed pi without wrapping
        assert!(instants.last().unwrap().pose.heading_rad > PI);
    }
}
