use crate::analysis::{FixedPoint, Variation};

/// Signed percentage change of `current` relative to `baseline`
///
/// The baseline is a scaled magnitude (a historical average, or a previous
/// count lifted with [`FixedPoint::from_count`]). A zero baseline yields
/// `+100.00%` when the current value is positive and `+0.00%` otherwise.
/// The division truncates toward zero.
pub fn variation(baseline: FixedPoint, current: u64) -> Variation {
    let baseline = i128::from(baseline.scaled());
    let diff = i128::from(FixedPoint::from_count(current).scaled()) - baseline;

    if baseline == 0 {
        return if diff > 0 {
            Variation::FULL_INCREASE
        } else {
            Variation::ZERO
        };
    }

    let scaled = i128::from(Variation::SCALE) * diff / baseline;
    Variation::from_scaled(i64::try_from(scaled).unwrap_or(if scaled < 0 {
        i64::MIN
    } else {
        i64::MAX
    }))
}

/// Element-wise [`variation`] over aligned vectors
///
/// Both slices are indexed by severity type and must have the same length.
pub fn variations(baselines: &[FixedPoint], current: &[u64]) -> Vec<Variation> {
    debug_assert_eq!(
        baselines.len(),
        current.len(),
        "baseline and current vectors must be aligned"
    );
    baselines
        .iter()
        .zip(current)
        .map(|(baseline, current)| variation(*baseline, *current))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_baseline_with_growth_is_full_increase() {
        let result = variation(FixedPoint::ZERO, 3);
        assert_eq!(result, Variation::FULL_INCREASE);
        assert_eq!(result.to_string(), "+100.00%");
    }

    #[test]
    fn test_zero_baseline_without_growth_is_zero() {
        let result = variation(FixedPoint::ZERO, 0);
        assert_eq!(result, Variation::ZERO);
        assert_eq!(result.to_string(), "+0.00%");
    }

    #[test]
    fn test_fifty_percent_increase() {
        // baseline 100.00, current 150
        let result = variation(FixedPoint::from_scaled(10000), 150);
        assert_eq!(result.scaled(), 5000);
        assert_eq!(result.to_string(), "+50.00%");
    }

    #[test]
    fn test_decrease_is_negative() {
        let result = variation(FixedPoint::from_count(4), 1);
        assert_eq!(result.scaled(), -7500);
        assert_eq!(result.to_string(), "-75.00%");
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        // baseline 3.00, current 4: 10000 * 100 / 300 = 3333.33..
        assert_eq!(variation(FixedPoint::from_count(3), 4).scaled(), 3333);
        // baseline 3.00, current 2: 10000 * -100 / 300 = -3333.33..
        assert_eq!(variation(FixedPoint::from_count(3), 2).scaled(), -3333);
    }

    #[test]
    fn test_fractional_baseline() {
        // average 2.50, current 5 => +100%
        assert_eq!(
            variation(FixedPoint::from_scaled(250), 5).to_string(),
            "+100.00%"
        );
    }

    #[test]
    fn test_variations_are_aligned() {
        let baselines = [
            FixedPoint::from_count(2),
            FixedPoint::ZERO,
            FixedPoint::from_scaled(10000),
        ];
        let result = variations(&baselines, &[1, 0, 150]);
        assert_eq!(
            result,
            vec![
                Variation::from_scaled(-5000),
                Variation::ZERO,
                Variation::from_scaled(5000),
            ]
        );
    }
}
