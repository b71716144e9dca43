//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Clamp a value into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for NaN values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i64>(clamped).unwrap_or(if clamped > 0.0 { i64::MAX } else { i64::MIN })
}

/// Round a f64 half away from zero and clamp it to the i64 range.
///
/// Values in this engine are non-negative wherever rounding is applied, so
/// this matches the round-half-up behaviour the scoring tables were tuned on.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(if clamped > 0.0 { i64::MAX } else { i64::MIN })
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert usize to i64, saturating at `i64::MAX`.
#[must_use]
pub fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Convert a non-negative i64 into an index, returning `None` for negatives.
#[must_use]
pub fn i64_to_index(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}

/// Convert a f64 uniform draw in `[0, 1)` into an index below `len`.
#[must_use]
pub fn unit_to_index(unit: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let scaled = floor_f64_to_i64(unit * usize_to_f64(len));
    usize::try_from(scaled).unwrap_or(0).min(len - 1)
}

/// `1234567` as `1,234,567`.
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
