//! # Bezier curve module
//!
//! Fits a piecewise cubic Bezier curve through a smoothed waypoint path.
//! The start and goal linear velocities provide the tangent directions at
//! the curve ends, and interior tangents are taken Catmull-Rom style from
//! the neighbouring waypoints, giving a C1 continuous curve.
//!
//! The fit is constrained by a maximum curvature. If sampled curvature
//! exceeds the limit the builder relaxes: tangent magnitudes are shrunk
//! (directions, i.e. the boundary conditions, are preserved) and the worst
//! segment is subdivided. Relaxation is bounded; if the limit still cannot
//! be met the fit reports infeasibility rather than silently overshooting.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Waypoints closer than this are treated as coincident and merged.
const COINCIDENT_TOLERANCE_M: f64 = 1e-9;

/// Below this speed a boundary velocity carries no usable direction.
const MIN_BOUNDARY_SPEED_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single cubic Bezier segment.
#[derive(Debug, Clone, Copy)]
pub struct CubicBezier {
    points: [Point2<f64>; 4],
}

/// A piecewise cubic Bezier curve through a waypoint path.
#[derive(Debug, Clone)]
pub struct BezierPath {
    segments: Vec<CubicBezier>,
}

/// A sample of the curve at one arclength station, consumed by the velocity
/// profiler.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurveSample {
    /// Position of the sample
    pub position_m: Point2<f64>,

    /// Unit tangent direction at the sample
    pub tangent: Vector2<f64>,

    /// Signed curvature at the sample, in 1/meters
    pub curv_m: f64,

    /// Arclength from the start of the curve, in meters
    pub arclength_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurveParams {
    /// Number of samples taken along each Bezier segment, both for the
    /// curvature check and for the output sampling.
    pub samples_per_segment: usize,

    /// Maximum number of relaxation attempts before the fit is declared
    /// infeasible.
    pub max_relax_iterations: usize,

    /// Factor applied to tangent magnitudes on each relaxation attempt.
    /// Must be in (0, 1).
    pub tangent_relax_factor: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors raised while fitting a curve.
#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    #[error("Need at least two distinct waypoints to fit a curve, got {0}")]
    TooFewWaypoints(usize),

    #[error("Curvature limit of {0} 1/m could not be met after bounded relaxation")]
    CurvatureInfeasible(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicBezier {
    fn new(p0: Point2<f64>, p1: Point2<f64>, p2: Point2<f64>, p3: Point2<f64>) -> Self {
        Self {
            points: [p0, p1, p2, p3],
        }
    }

    /// Position on the segment at parameter `t` in [0, 1].
    pub fn position(&self, t: f64) -> Point2<f64> {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;

        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;

        Point2::new(
            b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
            b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
        )
    }

    /// First derivative with respect to the parameter.
    pub fn derivative(&self, t: f64) -> Vector2<f64> {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;

        (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t)
    }

    /// Second derivative with respect to the parameter.
    pub fn second_derivative(&self, t: f64) -> Vector2<f64> {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;

        ((p2 - p1) - (p1 - p0)) * (6.0 * u) + ((p3 - p2) - (p2 - p1)) * (6.0 * t)
    }

    /// Signed curvature at parameter `t`, in 1/meters.
    ///
    /// Zero where the speed of the parameterisation is too small for the
    /// quotient to be meaningful.
    pub fn curvature_m(&self, t: f64) -> f64 {
        let d = self.derivative(t);
        let dd = self.second_derivative(t);

        let speed_sq = d.norm_squared();
        if speed_sq <= std::f64::EPSILON {
            return 0.0;
        }

        (d.x * dd.y - d.y * dd.x) / speed_sq.powf(1.5)
    }
}

impl BezierPath {
    /// Fit a curve through the waypoints with the given velocity boundary
    /// conditions, keeping sampled curvature within `max_curv_m`.
    pub fn fit(
        waypoints_m: &[Point2<f64>],
        start_velocity_ms: Vector2<f64>,
        goal_velocity_ms: Vector2<f64>,
        max_curv_m: f64,
        params: &CurveParams,
    ) -> Result<Self, CurveError> {
        // Merge coincident waypoints so chords are never degenerate
        let mut waypoints: Vec<Point2<f64>> = Vec::with_capacity(waypoints_m.len());
        for wp in waypoints_m {
            if waypoints
                .last()
                .map(|last| (wp - last).norm() > COINCIDENT_TOLERANCE_M)
                .unwrap_or(true)
            {
                waypoints.push(*wp);
            }
        }

        if waypoints.len() < 2 {
            return Err(CurveError::TooFewWaypoints(waypoints.len()));
        }

        let mut scale = 1.0;

        for attempt in 0..params.max_relax_iterations {
            let path = Self::build(&waypoints, start_velocity_ms, goal_velocity_ms, scale);

            let (worst_segment, worst_curv_m) = path.worst_curvature(params.samples_per_segment);

            if worst_curv_m <= max_curv_m {
                return Ok(path);
            }

            trace!(
                "Curve fit attempt {}: curvature {:.3} 1/m exceeds limit {:.3} 1/m",
                attempt + 1,
                worst_curv_m,
                max_curv_m
            );

            // Relax: shrink the tangents, and from the second attempt also
            // split the worst segment at its midpoint
            scale *= params.tangent_relax_factor;
            if attempt >= 1 {
                let midpoint = path.segments[worst_segment].position(0.5);
                waypoints.insert(worst_segment + 1, midpoint);
            }
        }

        Err(CurveError::CurvatureInfeasible(max_curv_m))
    }

    /// Build the piecewise curve for a fixed tangent scale.
    fn build(
        waypoints: &[Point2<f64>],
        start_velocity_ms: Vector2<f64>,
        goal_velocity_ms: Vector2<f64>,
        scale: f64,
    ) -> Self {
        let n = waypoints.len();

        // Tangent vectors at each waypoint. Boundary tangents take their
        // direction from the boundary velocities and their magnitude from
        // the adjacent chord; interior tangents are Catmull-Rom.
        let mut tangents: Vec<Vector2<f64>> = Vec::with_capacity(n);
        for i in 0..n {
            let tangent = if i == 0 {
                let chord = waypoints[1] - waypoints[0];
                if start_velocity_ms.norm() > MIN_BOUNDARY_SPEED_MS {
                    start_velocity_ms.normalize() * chord.norm()
                } else {
                    chord
                }
            } else if i == n - 1 {
                let chord = waypoints[n - 1] - waypoints[n - 2];
                if goal_velocity_ms.norm() > MIN_BOUNDARY_SPEED_MS {
                    goal_velocity_ms.normalize() * chord.norm()
                } else {
                    chord
                }
            } else {
                (waypoints[i + 1] - waypoints[i - 1]) * 0.5
            };

            tangents.push(tangent * scale);
        }

        let segments = (0..n - 1)
            .map(|k| {
                let p0 = waypoints[k];
                let p3 = waypoints[k + 1];
                let p1 = p0 + tangents[k] / 3.0;
                let p2 = p3 - tangents[k + 1] / 3.0;
                CubicBezier::new(p0, p1, p2, p3)
            })
            .collect();

        Self { segments }
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Sample the curve uniformly in parameter, returning arclength-indexed
    /// samples from start to goal inclusive.
    pub fn sample(&self, samples_per_segment: usize) -> Vec<CurveSample> {
        let samples_per_segment = samples_per_segment.max(1);
        let mut samples: Vec<CurveSample> = Vec::new();

        let mut arclength_m = 0f64;
        let mut last_tangent = Vector2::new(1.0, 0.0);

        for (k, segment) in self.segments.iter().enumerate() {
            // Sample [0, 1) for all but the last segment, which includes 1
            // so the goal point is present exactly once
            let last_index = if k + 1 == self.segments.len() {
                samples_per_segment
            } else {
                samples_per_segment - 1
            };

            for i in 0..=last_index {
                let t = i as f64 / samples_per_segment as f64;
                let position_m = segment.position(t);

                // Skip samples which don't advance along the curve, keeping
                // arclength strictly increasing
                if let Some(prev) = samples.last() {
                    let ds = (position_m - prev.position_m).norm();
                    if ds <= COINCIDENT_TOLERANCE_M {
                        continue;
                    }
                    arclength_m += ds;
                }

                let derivative = segment.derivative(t);
                let tangent = if derivative.norm() > std::f64::EPSILON {
                    derivative.normalize()
                } else {
                    last_tangent
                };
                last_tangent = tangent;

                samples.push(CurveSample {
                    position_m,
                    tangent,
                    curv_m: segment.curvature_m(t),
                    arclength_m,
                });
            }
        }

        samples
    }

    /// The worst absolute sampled curvature and the segment it occurs on.
    fn worst_curvature(&self, samples_per_segment: usize) -> (usize, f64) {
        let samples_per_segment = samples_per_segment.max(1);

        let mut worst = (0, 0f64);
        for (k, segment) in self.segments.iter().enumerate() {
            for i in 0..=samples_per_segment {
                let t = i as f64 / samples_per_segment as f64;
                let curv = segment.curvature_m(t).abs();
                if curv > worst.1 {
                    worst = (k, curv);
                }
            }
        }

        worst
    }
}
