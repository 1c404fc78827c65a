/// Error that can't be reached with any palette
pub(crate) const MAX_DIFF: f64 = 1e20;

/// Converts quality `0..=100` to the mean squared error it allows
pub(crate) fn quality_to_mse(quality: u8) -> f64 {
    if quality == 0 {
        return MAX_DIFF;
    }
    if quality >= 100 {
        return 0.0;
    }

    let q = quality as f64;

    // Curve fitted to be roughly comparable with JPEG quality
    let extra_low_quality_fudge = (0.016 / (0.001 + q) - 0.001).max(0.0);

    0.45 * (extra_low_quality_fudge + 2.5 / (210.0 + q).powf(1.2) * (100.1 - q) / 100.0)
}

/// Highest quality whose allowed error is still above `mse`
pub(crate) fn mse_to_quality(mse: f64) -> u8 {
    for i in (1..=100).rev() {
        if mse <= quality_to_mse(i) + 0.000001 {
            return i;
        }
    }

    0
}

/// Scales internal error to what users of 8-bit colors expect
pub(crate) fn mse_to_standard_mse(mse: f64) -> f64 {
    mse * 65536.0 / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(MAX_DIFF, quality_to_mse(0));
        assert_eq!(0.0, quality_to_mse(100));
        assert_eq!(100, mse_to_quality(0.0));
        assert_eq!(0, mse_to_quality(1.0));
    }

    #[test]
    fn test_monotonic() {
        for q in 1..100 {
            assert!(quality_to_mse(q) > quality_to_mse(q + 1), "quality {}", q);
        }
    }

    #[test]
    fn test_round_trip() {
        for q in 1..=100 {
            assert_eq!(q, mse_to_quality(quality_to_mse(q)));
        }
    }
}
