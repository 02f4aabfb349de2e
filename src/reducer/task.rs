use std::hint::black_box;

/// Accumulation loop run by a worker for one queued value
///
/// Starts from zero on every call. Positive values count up `value` times.
/// Negative values count down `|value| - 1` times, so `-1` yields `0`.
pub fn accumulate(value: i64) -> i64 {
    let mut result: i64 = 0;

    if value < 0 {
        for _ in 1..value.unsigned_abs() {
            result = black_box(result) - 1;
        }
    } else if value > 0 {
        for _ in 1..=value {
            result = black_box(result) + 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_values() {
        assert_eq!(accumulate(1), 1);
        assert_eq!(accumulate(12_345), 12_345);
    }

    #[test]
    fn test_negative_values_stop_one_short() {
        assert_eq!(accumulate(-1), 0);
        assert_eq!(accumulate(-2), -1);
        assert_eq!(accumulate(-10_000), -9_999);
    }

    #[test]
    fn test_zero() {
        assert_eq!(accumulate(0), 0);
    }

    #[test]
    fn test_no_state_carried_between_calls() {
        let first = accumulate(500);
        let second = accumulate(500);
        assert_eq!(first, second);
    }
}
