//! Small numeric guards shared by the kernel, spectrum and correlation stages.
//!
//! Every zero-norm, zero-frequency and out-of-range index case in the engine
//! goes through one of these helpers instead of an inline branch.

/// Floor applied to every norm before it is used as a divisor.
pub const EPS: f32 = 1e-8;

/// Returns `value`, or [`EPS`] if `value` is smaller.
#[inline]
pub fn floor_eps(value: f32) -> f32 {
    value.max(EPS)
}

/// Divides `numerator` by `denominator`, yielding `0.0` for a zero denominator.
#[inline]
pub fn safe_div(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Clamps a signed index into `[0, len - 1]`.
///
/// An empty range clamps to `0`; callers never index an empty slice with it.
#[inline]
pub fn clamp_index(index: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.clamp(0, len as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_index_bounds() {
        assert_eq!(clamp_index(-3, 10), 0);
        assert_eq!(clamp_index(4, 10), 4);
        assert_eq!(clamp_index(42, 10), 9);
        assert_eq!(clamp_index(5, 0), 0);
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(3.0, 0.0), 0.0);
        assert_eq!(safe_div(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_floor_eps() {
        assert_eq!(floor_eps(0.0), EPS);
        assert_eq!(floor_eps(0.5), 0.5);
    }
}
