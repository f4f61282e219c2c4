//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of seconds into a chrono duration, rounded to the nearest
/// nanosecond.
pub fn seconds_to_duration(seconds: f64) -> chrono::Duration {
    chrono::Duration::nanoseconds((seconds * NANOS_PER_SECOND as f64).round() as i64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_conversion() {
        let d = seconds_to_duration(1.25);
        assert_eq!(d.num_milliseconds(), 1250);
        assert_eq!(duration_to_seconds(d), Some(1.25));
    }
}
