//! Group statistics and correlation
//!
//! Small, allocation-light statistics over daily samples:
//! - per-condition count and mean
//! - Pearson product-moment correlation over paired samples

use serde::{Deserialize, Serialize};

/// Count and mean of one condition group.
///
/// `average` is `None` when the group is empty, so callers can tell
/// "no data" apart from a genuine zero mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: u32,
    pub average: Option<f64>,
}

impl GroupStats {
    /// Summarise a group's dependent values, rounding the mean to one decimal.
    ///
    /// Non-finite samples are skipped.
    pub fn from_values(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let count = finite.len() as u32;
        Self {
            count,
            average: mean(&finite).map(|m| round_to(m, 1)),
        }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            average: None,
        }
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round to `decimals` places for display
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Pearson correlation coefficient of paired samples.
///
/// Pairs where either member is NaN or infinite are dropped before anything
/// is summed. Returns `None` when fewer than two pairs remain or when either
/// series has zero variance. The result is clamped to [-1, 1].
///
/// Passing slices of different lengths is a caller bug: debug builds panic,
/// release builds pair up to the shorter length.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    debug_assert_eq!(
        xs.len(),
        ys.len(),
        "pearson_correlation requires equal-length inputs"
    );

    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    if is_constant(pairs.iter().map(|(x, _)| *x)) || is_constant(pairs.iter().map(|(_, y)| *y)) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = (sxx * syy).sqrt();
    if !denominator.is_finite() || denominator <= 0.0 {
        return None;
    }

    let r = sxy / denominator;
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_perfect_positive_correlation() {
        assert_eq!(pearson_correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), Some(1.0));
    }

    #[test]
    fn test_perfect_negative_correlation() {
        assert_eq!(pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), Some(-1.0));
    }

    #[test]
    fn test_single_point_is_insufficient() {
        assert_eq!(pearson_correlation(&[1.0], &[1.0]), None);
        assert_eq!(pearson_correlation(&[], &[]), None);
    }

    #[test]
    fn test_zero_variance_is_none() {
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]), None);
        assert_eq!(pearson_correlation(&[0.1, 0.1, 0.1], &[0.3, 0.3, 0.3]), None);
    }

    #[test]
    fn test_non_finite_samples_are_dropped() {
        let xs = [1.0, f64::NAN, 2.0, 3.0, f64::INFINITY];
        let ys = [1.0, 100.0, 2.0, 3.0, 5.0];
        assert_eq!(pearson_correlation(&xs, &ys), Some(1.0));

        // Dropping leaves only one pair
        assert_eq!(pearson_correlation(&[1.0, f64::NAN], &[2.0, 3.0]), None);
    }

    #[test]
    fn test_result_stays_in_range() {
        let xs = [0.1, 0.7, 1.3, 2.2, 2.9, 3.3, 4.8, 5.0];
        let ys = [3.1, 2.5, 9.0, 0.2, 4.4, 7.7, 1.2, 6.6];
        let r = pearson_correlation(&xs, &ys).unwrap();
        assert!((-1.0..=1.0).contains(&r));

        let scaled: Vec<f64> = xs.iter().map(|x| x * 1e6).collect();
        let r = pearson_correlation(&scaled, &scaled).unwrap();
        assert!((-1.0..=1.0).contains(&r));
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_value() {
        // r for these samples is 0.8
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 1.0, 4.0, 3.0, 5.0];
        let r = pearson_correlation(&xs, &ys).unwrap();
        assert!((r - 0.8).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "equal-length")]
    #[cfg(debug_assertions)]
    fn test_mismatched_lengths_panic_in_debug() {
        pearson_correlation(&[1.0, 2.0], &[1.0]);
    }

    #[test]
    fn test_group_stats() {
        let stats = GroupStats::from_values(&[8.0, 7.0, 9.0, 6.0, 8.0]);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.average, Some(7.6));

        let stats = GroupStats::from_values(&[1.0, 2.0, 2.0]);
        assert_eq!(stats.average, Some(1.7));
    }

    #[test]
    fn test_empty_group_has_no_average() {
        let stats = GroupStats::from_values(&[]);
        assert_eq!(stats, GroupStats::empty());
        assert_eq!(stats.count, 0);
        assert!(stats.average.is_none());
    }

    #[test]
    fn test_true_zero_average_is_kept() {
        let stats = GroupStats::from_values(&[0.0, 0.0]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.average, Some(0.0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.46, 1), 3.5);
        assert_eq!(round_to(3.44, 1), 3.4);
        assert_eq!(round_to(-1.25, 0), -1.0);
    }
}
