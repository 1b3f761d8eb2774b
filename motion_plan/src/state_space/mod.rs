//! # State space module
//!
//! The state space is the collision/validity oracle used by every stage of
//! the planning pipeline. It is constructed once per planning call from the
//! field bounds and a snapshot of the obstacle set, and answers point and
//! segment validity queries. Queries are pure and deterministic for a fixed
//! snapshot.
//!
//! Malformed inputs (non-finite coordinates, inverted bounds) are rejected
//! at construction so that queries themselves never fail.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod obstacle;
pub use obstacle::Obstacle;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The rectangular bounds of the playable field area.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct FieldBounds {
    pub x_min_m: f64,
    pub x_max_m: f64,
    pub y_min_m: f64,
    pub y_max_m: f64,
}

/// Validity oracle over the field bounds and an obstacle snapshot.
#[derive(Debug, Clone)]
pub struct StateSpace {
    bounds: FieldBounds,
    obstacles: Vec<Obstacle>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors raised while constructing a state space.
#[derive(Debug, thiserror::Error)]
pub enum StateSpaceError {
    #[error("Field bounds are malformed: {0:?}")]
    MalformedBounds(FieldBounds),

    #[error("Obstacle {0} is malformed: {1:?}")]
    MalformedObstacle(usize, Obstacle),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FieldBounds {
    /// True if the bounds are finite and not inverted.
    pub fn is_well_formed(&self) -> bool {
        self.x_min_m.is_finite()
            && self.x_max_m.is_finite()
            && self.y_min_m.is_finite()
            && self.y_max_m.is_finite()
            && self.x_min_m < self.x_max_m
            && self.y_min_m < self.y_max_m
    }

    /// True if the point lies within the bounds.
    pub fn contains(&self, point_m: &Point2<f64>) -> bool {
        point_m.x >= self.x_min_m
            && point_m.x <= self.x_max_m
            && point_m.y >= self.y_min_m
            && point_m.y <= self.y_max_m
    }
}

impl StateSpace {
    /// Build a state space from the field bounds and an obstacle snapshot.
    ///
    /// Malformed bounds or obstacles are rejected here, never during later
    /// queries.
    pub fn new(bounds: FieldBounds, obstacles: Vec<Obstacle>) -> Result<Self, StateSpaceError> {
        if !bounds.is_well_formed() {
            return Err(StateSpaceError::MalformedBounds(bounds));
        }

        for (i, obs) in obstacles.iter().enumerate() {
            if !obs.is_well_formed() {
                return Err(StateSpaceError::MalformedObstacle(i, obs.clone()));
            }
        }

        Ok(Self { bounds, obstacles })
    }

    pub fn bounds(&self) -> &FieldBounds {
        &self.bounds
    }

    /// True if the point is inside the field and outside every obstacle.
    pub fn valid(&self, point_m: &Point2<f64>) -> bool {
        if !self.bounds.contains(point_m) {
            return false;
        }

        !self.obstacles.iter().any(|o| o.contains(point_m))
    }

    /// True if the whole segment from `a` to `b` is inside the field and
    /// clear of every obstacle.
    ///
    /// The bounds are convex so containment of both endpoints covers the
    /// whole segment; obstacle tests are exact segment intersections.
    pub fn segment_valid(&self, a: &Point2<f64>, b: &Point2<f64>) -> bool {
        if !self.bounds.contains(a) || !self.bounds.contains(b) {
            return false;
        }

        !self.obstacles.iter().any(|o| o.intersects_segment(a, b))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bounds() -> FieldBounds {
        FieldBounds {
            x_min_m: -4.5,
            x_max_m: 4.5,
            y_min_m: -3.0,
            y_max_m: 3.0,
        }
    }

    #[test]
    fn test_construction_rejects_malformed() {
        let bad_bounds = FieldBounds {
            x_min_m: 1.0,
            x_max_m: -1.0,
            y_min_m: 0.0,
            y_max_m: 1.0,
        };
        assert!(matches!(
            StateSpace::new(bad_bounds, vec![]),
            Err(StateSpaceError::MalformedBounds(_))
        ));

        let bad_obs = Obstacle::Circle {
            centre_m: Point2::new(0.0, std::f64::INFINITY),
            radius_m: 0.2,
        };
        assert!(matches!(
            StateSpace::new(bounds(), vec![bad_obs]),
            Err(StateSpaceError::MalformedObstacle(0, _))
        ));
    }

    #[test]
    fn test_point_validity() {
        let space = StateSpace::new(
            bounds(),
            vec![Obstacle::Circle {
                centre_m: Point2::new(1.0, 1.0),
                radius_m: 0.5,
            }],
        )
        .unwrap();

        assert!(space.valid(&Point2::new(0.0, 0.0)));
        assert!(!space.valid(&Point2::new(1.0, 1.0)));
        assert!(!space.valid(&Point2::new(5.0, 0.0)));
    }

    #[test]
    fn test_segment_validity() {
        let space = StateSpace::new(
            bounds(),
            vec![Obstacle::Circle {
                centre_m: Point2::new(0.0, 0.0),
                radius_m: 0.5,
            }],
        )
        .unwrap();

        // Straight through the obstacle
        assert!(!space.segment_valid(&Point2::new(-2.0, 0.0), &Point2::new(2.0, 0.0)));

        // Skirting around it
        assert!(space.segment_valid(&Point2::new(-2.0, 1.0), &Point2::new(2.0, 1.0)));

        // Leaving the field
        assert!(!space.segment_valid(&Point2::new(0.0, 1.0), &Point2::new(0.0, 4.0)));
    }
}
