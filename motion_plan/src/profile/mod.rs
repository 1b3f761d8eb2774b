//! # Velocity profiling module
//!
//! Assigns time to arclength along a sampled curve, producing the
//! timestamped instants that make up a trajectory. The profile is the
//! pointwise minimum of three limits at every sample:
//!
//! 1. a forward acceleration-limited ramp from the start speed,
//! 2. a backward deceleration-limited ramp into the goal speed,
//! 3. the curvature speed cap `v <= sqrt(max_lat_accel / |curvature|)`,
//!
//! all clamped by the maximum speed. Timestamps follow by integrating
//! arclength over the average speed of each interval.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::bezier::CurveSample;
use crate::constraints::MotionConstraints;
use crate::state::{Pose, RobotInstant, Twist};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this speed an interval is treated as starting from rest when
/// integrating time.
const REST_SPEED_MS: f64 = 1e-6;

/// Minimum time step between neighbouring instants, keeping timestamps
/// strictly increasing.
const MIN_TIME_STEP_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors raised while profiling a curve.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Need at least two curve samples to profile, got {0}")]
    TooFewSamples(usize),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Profile the sampled curve, producing instants timestamped from
/// `start_time_s`.
///
/// Headings are set to the tangent direction and angular rates to zero
/// here; the angle planner overlays the real heading profile afterwards.
pub fn profile(
    samples: &[CurveSample],
    start_speed_ms: f64,
    goal_speed_ms: f64,
    constraints: &MotionConstraints,
    start_time_s: f64,
) -> Result<Vec<RobotInstant>, ProfileError> {
    if samples.len() < 2 {
        return Err(ProfileError::TooFewSamples(samples.len()));
    }

    let speeds = limit_speeds(samples, start_speed_ms, goal_speed_ms, constraints);

    // Integrate 1/speed over arclength to assign timestamps
    let mut instants = Vec::with_capacity(samples.len());
    let mut time_s = start_time_s;

    for (i, sample) in samples.iter().enumerate() {
        if i > 0 {
            let ds = sample.arclength_m - samples[i - 1].arclength_m;
            let v_avg = 0.5 * (speeds[i - 1] + speeds[i]);

            // Where both endpoint speeds are at rest fall back to the time a
            // full-acceleration start would take over the interval
            let dt = if v_avg > REST_SPEED_MS {
                ds / v_avg
            } else {
                (2.0 * ds / constraints.max_accel_mss).sqrt()
            };

            time_s += dt.max(MIN_TIME_STEP_S);
        }

        let heading_rad = sample.tangent.y.atan2(sample.tangent.x);

        instants.push(RobotInstant {
            pose: Pose {
                position_m: sample.position_m,
                heading_rad,
            },
            twist: Twist {
                linear_ms: sample.tangent * speeds[i],
                angular_rads: 0.0,
            },
            time_s,
        });
    }

    Ok(instants)
}

/// The speed at each sample: pointwise minimum of the maximum speed, the
/// curvature cap, the forward acceleration ramp and the backward
/// deceleration ramp.
pub fn limit_speeds(
    samples: &[CurveSample],
    start_speed_ms: f64,
    goal_speed_ms: f64,
    constraints: &MotionConstraints,
) -> Vec<f64> {
    let n = samples.len();

    // Curvature cap and max speed
    let mut speeds: Vec<f64> = samples
        .iter()
        .map(|s| {
            let curv = s.curv_m.abs();
            if curv > std::f64::EPSILON {
                (constraints.max_lat_accel_mss / curv)
                    .sqrt()
                    .min(constraints.max_speed_ms)
            } else {
                constraints.max_speed_ms
            }
        })
        .collect();

    // Forward pass: acceleration-limited ramp from the start speed
    speeds[0] = speeds[0].min(start_speed_ms.max(0.0));
    for i in 1..n {
        let ds = samples[i].arclength_m - samples[i - 1].arclength_m;
        let reachable =
            (speeds[i - 1] * speeds[i - 1] + 2.0 * constraints.max_accel_mss * ds).sqrt();
        speeds[i] = speeds[i].min(reachable);
    }

    // Backward pass: deceleration-limited ramp into the goal speed
    speeds[n - 1] = speeds[n - 1].min(goal_speed_ms.max(0.0));
    for i in (0..n - 1).rev() {
        let ds = samples[i + 1].arclength_m - samples[i].arclength_m;
        let reachable =
            (speeds[i + 1] * speeds[i + 1] + 2.0 * constraints.max_accel_mss * ds).sqrt();
        speeds[i] = speeds[i].min(reachable);
    }

    speeds
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::{Point2, Vector2};

    fn constraints() -> MotionConstraints {
        MotionConstraints {
            max_speed_ms: 2.0,
            max_accel_mss: 1.0,
            max_ang_speed_rads: 4.0,
            max_ang_accel_radss: 8.0,
            max_lat_accel_mss: 1.5,
        }
    }

    /// Straight-line samples along +x at the given spacing.
    fn straight_samples(length_m: f64, num: usize) -> Vec<CurveSample> {
        (0..num)
            .map(|i| {
                let s = length_m * i as f64 / (num - 1) as f64;
                CurveSample {
                    position_m: Point2::new(s, 0.0),
                    tangent: Vector2::new(1.0, 0.0),
                    curv_m: 0.0,
                    arclength_m: s,
                }
            })
            .collect()
    }

    #[test]
    fn test_trapezoidal_duration() {
        // 5 m rest-to-rest at 2 m/s, 1 m/s^2: accelerate 2 s over 2 m,
        // cruise 1 m in 0.5 s, decelerate 2 s over 2 m, 4.5 s in total
        let samples = straight_samples(5.0, 2001);
        let instants = profile(&samples, 0.0, 0.0, &constraints(), 0.0).unwrap();

        let duration = instants.last().unwrap().time_s;
        assert!(
            (duration - 4.5).abs() < 0.05,
            "expected ~4.5 s, got {}",
            duration
        );

        // Monotonically increasing timestamps
        for pair in instants.windows(2) {
            assert!(pair[1].time_s > pair[0].time_s);
        }

        // Boundary speeds at rest
        assert!(instants.first().unwrap().twist.speed_ms() < 1e-6);
        assert!(instants.last().unwrap().twist.speed_ms() < 1e-6);
    }

    #[test]
    fn test_speed_limits_respected() {
        let samples = straight_samples(5.0, 501);
        let c = constraints();
        let speeds = limit_speeds(&samples, 0.0, 0.0, &c);

        for (i, v) in speeds.iter().enumerate() {
            assert!(*v <= c.max_speed_ms + 1e-9);

            // Forward ramp from rest
            let s = samples[i].arclength_m;
            let fwd = (2.0 * c.max_accel_mss * s).sqrt();
            assert!(*v <= fwd + 1e-9);

            // Backward ramp into rest
            let remaining = samples.last().unwrap().arclength_m - s;
            let bwd = (2.0 * c.max_accel_mss * remaining).sqrt();
            assert!(*v <= bwd + 1e-9);
        }
    }

    #[test]
    fn test_curvature_cap() {
        // Constant-curvature samples: the cap sqrt(a_lat / k) binds below
        // the max speed
        let curv = 1.5;
        let samples: Vec<CurveSample> = (0..200)
            .map(|i| {
                let s = 10.0 * i as f64 / 199.0;
                CurveSample {
                    position_m: Point2::new(s, 0.0),
                    tangent: Vector2::new(1.0, 0.0),
                    curv_m: curv,
                    arclength_m: s,
                }
            })
            .collect();

        let c = constraints();
        let speeds = limit_speeds(&samples, 0.0, 0.0, &c);
        let cap = (c.max_lat_accel_mss / curv).sqrt();

        for v in &speeds {
            assert!(*v <= cap + 1e-9);
        }

        // The cap actually binds somewhere mid-path
        let mid = speeds[speeds.len() / 2];
        assert!((mid - cap).abs() < 1e-6);
    }

    #[test]
    fn test_too_few_samples() {
        let samples = straight_samples(1.0, 2);
        assert!(profile(&samples[..1], 0.0, 0.0, &constraints(), 0.0).is_err());
    }
}
