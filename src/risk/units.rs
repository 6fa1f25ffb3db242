//! Unit conversions and rounding used by the risk report
//!
//! All rounding is ties-to-even on the exact binary value of the input:
//! `2.675` rounds to `2.67` because its binary value lies just below the
//! tie, while an exact tie such as `0.125` goes to the even neighbour `0.12`.
//!
//! Averages are the correctly rounded mean of the exact sum, so a window
//! whose true mean sits next to a rounding tie lands on the same side
//! regardless of summation order.

/// km/h to m/s factor. Deliberately the 5-digit constant, not `1 / 3.6`.
pub const KMH_TO_MS: f64 = 0.27778;

/// Centimeters to millimeters
pub const CM_TO_MM: f64 = 10.0;

/// Round to `decimals` places, ties to even.
///
/// Float formatting produces the correctly rounded decimal string (ties to
/// even), and parsing it back yields the nearest `f64`.
#[must_use]
pub fn round_half_even(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// Fold `values` into `partials`, keeping their sum exact.
///
/// The partials are non-overlapping and ordered by increasing magnitude
/// (Shewchuk's algorithm).
fn add_exact(partials: &mut Vec<f64>, values: impl IntoIterator<Item = f64>) {
    for value in values {
        let mut x = value;
        let mut kept = 0;
        for j in 0..partials.len() {
            let mut y = partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let lo = y - (hi - x);
            if lo != 0.0 {
                partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        partials.truncate(kept);
        partials.push(x);
    }
}

/// The `f64` nearest to the exact sum held in `partials`
fn round_partials(partials: &[f64]) -> f64 {
    let Some((&top, rest)) = partials.split_last() else {
        return 0.0;
    };

    let mut hi = top;
    let mut lo = 0.0;
    let mut n = rest.len();
    while n > 0 {
        let x = hi;
        n -= 1;
        let y = rest[n];
        hi = x + y;
        lo = y - (hi - x);
        if lo != 0.0 {
            break;
        }
    }

    // half-way case: the remaining partials decide the direction
    if n > 0 && ((lo < 0.0 && rest[n - 1] < 0.0) || (lo > 0.0 && rest[n - 1] > 0.0)) {
        let y = lo * 2.0;
        let x = hi + y;
        if y == x - hi {
            hi = x;
        }
    }
    hi
}

/// Correctly rounded sum
#[must_use]
pub fn exact_sum(values: &[f64]) -> f64 {
    let mut partials = Vec::new();
    add_exact(&mut partials, values.iter().copied());
    round_partials(&partials)
}

/// Mean of `values` from their exact sum, `0.0` for an empty slice
#[must_use]
pub fn exact_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let count = values.len() as f64;

    let mut partials = Vec::new();
    add_exact(&mut partials, values.iter().copied());
    let estimate = round_partials(&partials) / count;

    // residual = sum - estimate * count, with the product split exactly
    let product = estimate * count;
    let product_error = estimate.mul_add(count, -product);
    add_exact(&mut partials, [-product, -product_error]);
    estimate + round_partials(&partials) / count
}

/// Wind speed in m/s, rounded to 2 decimals
#[must_use]
pub fn kmh_to_ms(kmh: f64) -> f64 {
    round_half_even(kmh * KMH_TO_MS, 2)
}

/// Snow amount in mm, rounded to 1 decimal
#[must_use]
pub fn cm_to_mm(cm: f64) -> f64 {
    round_half_even(cm * CM_TO_MM, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(20.714_285_714_285_715, 2, 20.71)]
    #[case(0.125, 2, 0.12)]
    #[case(0.375, 2, 0.38)]
    #[case(2.5, 0, 2.0)]
    #[case(3.5, 0, 4.0)]
    #[case(2.675, 2, 2.67)]
    #[case(-1.005, 2, -1.0)]
    #[case(8.3334, 2, 8.33)]
    fn test_round_half_even(#[case] value: f64, #[case] decimals: usize, #[case] expected: f64) {
        assert_eq!(round_half_even(value, decimals), expected);
    }

    #[test]
    fn test_round_passes_non_finite_through() {
        assert!(round_half_even(f64::NAN, 2).is_nan());
        assert_eq!(round_half_even(f64::INFINITY, 2), f64::INFINITY);
    }

    #[rstest]
    #[case(30.0, 8.33)]
    #[case(10.0, 2.78)]
    #[case(100.0, 27.78)]
    #[case(0.0, 0.0)]
    fn test_kmh_to_ms_uses_fixed_constant(#[case] kmh: f64, #[case] expected: f64) {
        assert_eq!(kmh_to_ms(kmh), expected);
    }

    #[test]
    fn test_kmh_to_ms_differs_from_exact_conversion() {
        // exact conversion would give 10000.0
        assert_eq!(kmh_to_ms(36000.0), 10000.08);
    }

    #[test]
    fn test_exact_sum_keeps_small_terms() {
        assert_eq!(exact_sum(&[1e16, 1.0, -1e16]), 1.0);
        assert_eq!(exact_sum(&[0.1; 10]), 1.0);
        assert_eq!(exact_sum(&[]), 0.0);
    }

    #[rstest]
    #[case(&[18.8, 2.0, 0.4, 25.1], 11.58)]
    #[case(&[15.2, 11.8, 25.8, 13.1], 16.48)]
    #[case(&[18.9, -2.3, 22.2, 9.8, -13.1, -1.3, 0.6, 27.8], 7.83)]
    #[case(
        &[28.4, 12.6, 29.1, 13.0, 22.7, -1.1, -7.5, -1.0, -18.4, 27.2, 35.5, 23.6],
        13.68
    )]
    fn test_mean_near_tie_rounds_from_exact_sum(#[case] values: &[f64], #[case] expected: f64) {
        assert_eq!(round_half_even(exact_mean(values), 2), expected);
    }

    #[test]
    fn test_exact_mean_matches_simple_cases() {
        assert_eq!(exact_mean(&[20.0, 21.0, 22.0]), 21.0);
        assert_eq!(exact_mean(&[-5.0]), -5.0);
        assert_eq!(exact_mean(&[]), 0.0);
    }

    #[test]
    fn test_cm_to_mm() {
        assert_eq!(cm_to_mm(25.0), 250.0);
        assert_eq!(cm_to_mm(0.33), 3.3);
        assert_eq!(cm_to_mm(1.234), 12.3);
    }
}
