//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Linearly interpolate between `a` and `b` by `t`.
///
/// `t` is not clamped, so values outside [0, 1] extrapolate.
pub fn lerp<T>(a: T, b: T, t: T) -> T
where
    T: Float,
{
    a + (b - a) * t
}

/// Clamp `value` into the range [min, max].
///
/// If `min > max` the result is `min`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into the half-open range (-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + FloatConst,
{
    let tau = T::PI() + T::PI();
    let r = rem_euclid(angle + T::PI(), tau) - T::PI();

    // rem_euclid gives [-pi, pi), and can round up to exactly pi
    if r <= -T::PI() {
        r + tau
    } else {
        r
    }
}

/// Get the signed shortest angular distance to go from `from` to `to`.
///
/// The result is in (-pi, pi], positive being anticlockwise.
pub fn ang_dist<T>(from: T, to: T) -> T
where
    T: Float + FloatConst,
{
    wrap_pi(to - from)
}

/// Map a value in the range [-pi, pi] to [0, 2pi)
pub fn map_pi_to_2pi<T>(value: T) -> T
where
    T: Float + FloatConst,
{
    if value < T::zero() {
        T::PI() + T::PI() + value
    } else {
        value
    }
}
