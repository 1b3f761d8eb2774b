//! # Path smoothing module
//!
//! Shortcut smoothing of raw RRT waypoint paths. The smoother sweeps the
//! waypoint list looking for a pair of non-adjacent waypoints whose direct
//! connecting segment is collision free, and splices out everything between
//! them. Sweeps repeat until one makes no improvement or the pass budget is
//! reached.
//!
//! Guarantees: the endpoints are unchanged, every output segment is
//! collision free under the same state space, and the total path length
//! never increases (each splice replaces a polyline by its chord).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Point2;
use serde::Deserialize;

use crate::state_space::StateSpace;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PathSmoother {
    params: SmoothParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmoothParams {
    /// Maximum number of full shortcutting sweeps over the waypoint list.
    pub max_passes: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathSmoother {
    pub fn new(params: SmoothParams) -> Self {
        Self { params }
    }

    /// Shortcut the waypoint path, returning the smoothed sequence.
    ///
    /// Paths with fewer than three waypoints have nothing to shortcut and
    /// are returned unchanged.
    pub fn smooth(&self, space: &StateSpace, waypoints_m: &[Point2<f64>]) -> Vec<Point2<f64>> {
        let mut points = waypoints_m.to_vec();

        if points.len() < 3 {
            return points;
        }

        for pass in 0..self.params.max_passes {
            let mut improved = false;

            let mut i = 0;
            while i + 2 < points.len() {
                // Find the furthest waypoint reachable directly from i,
                // scanning from the far end so the biggest shortcut wins
                let mut j = points.len() - 1;
                while j > i + 1 {
                    if space.segment_valid(&points[i], &points[j]) {
                        points.drain(i + 1..j);
                        improved = true;
                        break;
                    }
                    j -= 1;
                }

                i += 1;
            }

            trace!(
                "Smoothing pass {}: {} waypoints remain",
                pass + 1,
                points.len()
            );

            if !improved {
                break;
            }
        }

        points
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Total length of a waypoint polyline in meters.
pub fn path_length_m(waypoints_m: &[Point2<f64>]) -> f64 {
    waypoints_m
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).norm())
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state_space::{FieldBounds, Obstacle, StateSpace};

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

    fn smoother() -> PathSmoother {
        PathSmoother::new(SmoothParams { max_passes: 10 })
    }

    #[test]
    fn test_open_field_collapses_to_segment() {
        // A wiggly path over an open field shortcuts straight to the ends
        let path = vec![
            Point2::new(-4.0, 0.0),
            Point2::new(-2.0, 2.0),
            Point2::new(0.0, -1.5),
            Point2::new(2.0, 2.0),
            Point2::new(4.0, 0.0),
        ];

        let smoothed = smoother().smooth(&space(vec![]), &path);

        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed[0], path[0]);
        assert_eq!(smoothed[1], *path.last().unwrap());
    }

    #[test]
    fn test_length_never_increases() {
        let obstacles = vec![Obstacle::Circle {
            centre_m: Point2::new(0.0, 0.0),
            radius_m: 1.0,
        }];
        let s = space(obstacles);

        let path = vec![
            Point2::new(-4.0, 0.0),
            Point2::new(-3.0, 2.0),
            Point2::new(-1.0, 2.5),
            Point2::new(1.0, 2.5),
            Point2::new(3.0, 2.0),
            Point2::new(4.0, 0.0),
        ];

        let smoothed = smoother().smooth(&s, &path);

        assert!(path_length_m(&smoothed) <= path_length_m(&path) + 1e-12);
        assert_eq!(smoothed[0], path[0]);
        assert_eq!(*smoothed.last().unwrap(), *path.last().unwrap());

        // Still collision free everywhere
        for pair in smoothed.windows(2) {
            assert!(s.segment_valid(&pair[0], &pair[1]));
        }
    }

    #[test]
    fn test_short_paths_unchanged() {
        let path = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        let smoothed = smoother().smooth(&space(vec![]), &path);
        assert_eq!(smoothed.len(), 2);
    }
}
