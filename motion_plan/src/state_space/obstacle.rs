//! Obstacle geometry
//!
//! Obstacles are opaque geometric regions on the field plane. A snapshot of
//! the obstacle set is captured once per planning call and never mutated
//! mid-call.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// A geometric region of the field which must not be entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Obstacle {
    /// A circular region, e.g. another robot or the ball keep-out.
    Circle {
        /// Centre of the circle
        centre_m: Point2<f64>,

        /// Radius of the circle
        radius_m: f64,
    },

    /// An axis-aligned rectangular region, e.g. a goal box or wall section.
    Aabb {
        /// Minimum (bottom left) corner
        min_m: Point2<f64>,

        /// Maximum (top right) corner
        max_m: Point2<f64>,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Obstacle {
    /// True if the obstacle's geometry is well formed: finite coordinates,
    /// positive radius, non-inverted corners.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Obstacle::Circle { centre_m, radius_m } => {
                centre_m.x.is_finite()
                    && centre_m.y.is_finite()
                    && radius_m.is_finite()
                    && *radius_m > 0.0
            }
            Obstacle::Aabb { min_m, max_m } => {
                min_m.x.is_finite()
                    && min_m.y.is_finite()
                    && max_m.x.is_finite()
                    && max_m.y.is_finite()
                    && min_m.x < max_m.x
                    && min_m.y < max_m.y
            }
        }
    }

    /// True if the given point lies inside (or on the boundary of) the
    /// obstacle.
    pub fn contains(&self, point_m: &Point2<f64>) -> bool {
        match self {
            Obstacle::Circle { centre_m, radius_m } => {
                (point_m - centre_m).norm_squared() <= radius_m * radius_m
            }
            Obstacle::Aabb { min_m, max_m } => {
                point_m.x >= min_m.x
                    && point_m.x <= max_m.x
                    && point_m.y >= min_m.y
                    && point_m.y <= max_m.y
            }
        }
    }

    /// True if the segment from `a` to `b` passes through the obstacle.
    ///
    /// These are exact geometric tests, not sampled approximations, so thin
    /// obstacles cannot be stepped over.
    pub fn intersects_segment(&self, a: &Point2<f64>, b: &Point2<f64>) -> bool {
        match self {
            Obstacle::Circle { centre_m, radius_m } => {
                segment_point_dist_sq(a, b, centre_m) <= radius_m * radius_m
            }
            Obstacle::Aabb { min_m, max_m } => segment_intersects_aabb(a, b, min_m, max_m),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Squared distance from the segment `ab` to the point `p`.
fn segment_point_dist_sq(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> f64 {
    let ab: Vector2<f64> = b - a;
    let ap: Vector2<f64> = p - a;

    let len_sq = ab.norm_squared();

    // Degenerate segment, just use the point-point distance
    if len_sq <= std::f64::EPSILON {
        return ap.norm_squared();
    }

    // Project p onto the segment, clamping to the segment ends
    let t = (ap.dot(&ab) / len_sq).max(0.0).min(1.0);
    let closest = a + ab * t;

    (p - closest).norm_squared()
}

/// Slab-clipping test for a segment against an axis-aligned box.
fn segment_intersects_aabb(
    a: &Point2<f64>,
    b: &Point2<f64>,
    min_m: &Point2<f64>,
    max_m: &Point2<f64>,
) -> bool {
    let d: Vector2<f64> = b - a;

    let mut t_min = 0f64;
    let mut t_max = 1f64;

    for axis in 0..2 {
        if d[axis].abs() <= std::f64::EPSILON {
            // Segment parallel to this slab, reject if outside it
            if a[axis] < min_m[axis] || a[axis] > max_m[axis] {
                return false;
            }
        } else {
            let inv = 1.0 / d[axis];
            let mut t0 = (min_m[axis] - a[axis]) * inv;
            let mut t1 = (max_m[axis] - a[axis]) * inv;

            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);

            if t_min > t_max {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_well_formed() {
        assert!(Obstacle::Circle {
            centre_m: Point2::new(1.0, 1.0),
            radius_m: 0.5
        }
        .is_well_formed());

        assert!(!Obstacle::Circle {
            centre_m: Point2::new(std::f64::NAN, 1.0),
            radius_m: 0.5
        }
        .is_well_formed());

        assert!(!Obstacle::Circle {
            centre_m: Point2::new(1.0, 1.0),
            radius_m: 0.0
        }
        .is_well_formed());

        assert!(!Obstacle::Aabb {
            min_m: Point2::new(1.0, 0.0),
            max_m: Point2::new(0.0, 1.0)
        }
        .is_well_formed());
    }

    #[test]
    fn test_circle_segment() {
        let obs = Obstacle::Circle {
            centre_m: Point2::new(0.0, 0.0),
            radius_m: 1.0,
        };

        // Straight through the centre
        assert!(obs.intersects_segment(&Point2::new(-2.0, 0.0), &Point2::new(2.0, 0.0)));

        // Clips the edge
        assert!(obs.intersects_segment(&Point2::new(-2.0, 0.9), &Point2::new(2.0, 0.9)));

        // Clear miss
        assert!(!obs.intersects_segment(&Point2::new(-2.0, 1.5), &Point2::new(2.0, 1.5)));

        // Segment ends short of the circle
        assert!(!obs.intersects_segment(&Point2::new(-3.0, 0.0), &Point2::new(-1.5, 0.0)));
    }

    #[test]
    fn test_aabb_segment() {
        let obs = Obstacle::Aabb {
            min_m: Point2::new(0.0, 0.0),
            max_m: Point2::new(1.0, 1.0),
        };

        assert!(obs.intersects_segment(&Point2::new(-1.0, 0.5), &Point2::new(2.0, 0.5)));
        assert!(obs.intersects_segment(&Point2::new(0.5, 0.5), &Point2::new(2.0, 2.0)));
        assert!(!obs.intersects_segment(&Point2::new(-1.0, 2.0), &Point2::new(2.0, 2.0)));

        // Diagonal passing just outside the corner
        assert!(!obs.intersects_segment(&Point2::new(1.5, -0.5), &Point2::new(2.5, 0.5)));
    }
}
