//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Wrap an angle into the range [-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + std::ops::Rem,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

/// Get the signed shortest angular distance from `a` to `b`.
///
/// The result is in the range [-pi, pi], and satisfies
/// `wrap_pi(a + ang_delta(a, b)) == wrap_pi(b)`.
pub fn ang_delta<T>(a: T, b: T) -> T
where
    T: Float + std::ops::Rem,
{
    wrap_pi(b - a)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float + std::ops::Rem,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0f64)).abs() < 1e-12);
        assert!((wrap_pi(TAU) - 0f64).abs() < 1e-12);
        assert!((wrap_pi(PI + 0.5) - (-PI + 0.5)).abs() < 1e-12);
        assert!((wrap_pi(-PI - 0.5) - (PI - 0.5)).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI) - PI).abs() < 1e-12 || (wrap_pi(3.0 * PI) + PI).abs() < 1e-12);
    }

    #[test]
    fn test_ang_delta() {
        assert!((ang_delta(1f64, 2f64) - 1f64).abs() < 1e-12);
        assert!((ang_delta(2f64, 1f64) + 1f64).abs() < 1e-12);
        assert!((ang_delta(0f64, TAU)).abs() < 1e-12);
        // Wrapping across the -pi/pi boundary takes the short way round
        assert!((ang_delta(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-12);
        assert!((ang_delta(-PI + 0.1, PI - 0.1) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_lin_map() {
        assert!((lin_map((0f64, 1f64), (0f64, 10f64), 0.5) - 5f64).abs() < 1e-12);
        assert!((lin_map((1f64, 3f64), (0f64, 1f64), 2f64) - 0.5).abs() < 1e-12);
    }
}
