//! # Motion constraints
//!
//! Kinematic limits supplied with each plan request. Limits must be strictly
//! positive and finite; they are validated at the planner entry point before
//! any search work begins.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic limits for a single plan request.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct MotionConstraints {
    /// Maximum linear speed in meters/second
    pub max_speed_ms: f64,

    /// Maximum linear acceleration in meters/second^2
    pub max_accel_mss: f64,

    /// Maximum angular speed in radians/second
    pub max_ang_speed_rads: f64,

    /// Maximum angular acceleration in radians/second^2
    pub max_ang_accel_radss: f64,

    /// Maximum lateral (centripetal) acceleration in meters/second^2, used
    /// to cap speed through curved sections of the path.
    pub max_lat_accel_mss: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// An error in the supplied motion constraints.
#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("Constraint {0} must be strictly positive and finite, got {1}")]
    NonPositiveLimit(&'static str, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionConstraints {
    /// Check that every limit is strictly positive and finite.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        let limits = [
            ("max_speed_ms", self.max_speed_ms),
            ("max_accel_mss", self.max_accel_mss),
            ("max_ang_speed_rads", self.max_ang_speed_rads),
            ("max_ang_accel_radss", self.max_ang_accel_radss),
            ("max_lat_accel_mss", self.max_lat_accel_mss),
        ];

        for (name, value) in limits.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(ConstraintError::NonPositiveLimit(name, *value));
            }
        }

        Ok(())
    }

    /// The curvature limit implied by the angular and linear speed limits,
    /// in 1/meters. Curves are fit so that their curvature stays below this
    /// value.
    pub fn max_curv_m(&self) -> f64 {
        self.max_ang_speed_rads / self.max_speed_ms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn nominal() -> MotionConstraints {
        MotionConstraints {
            max_speed_ms: 2.0,
            max_accel_mss: 1.0,
            max_ang_speed_rads: 4.0,
            max_ang_accel_radss: 8.0,
            max_lat_accel_mss: 1.5,
        }
    }

    #[test]
    fn test_validate() {
        assert!(nominal().validate().is_ok());

        let mut bad = nominal();
        bad.max_accel_mss = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = nominal();
        bad.max_speed_ms = -1.0;
        assert!(bad.validate().is_err());

        let mut bad = nominal();
        bad.max_lat_accel_mss = std::f64::NAN;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_max_curv() {
        let c = nominal();
        assert!((c.max_curv_m() - 2.0).abs() < 1e-12);
    }
}
