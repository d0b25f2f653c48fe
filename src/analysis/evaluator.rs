//! Threshold evaluation and the notification gate
//!
//! Severity types are scanned most severe first, so the first breach found is
//! also the most severe one and the scan stops there.

use crate::analysis::Variation;
use crate::severity::{BreachReason, SeverityTable, Verdict};
use log::{debug, info};

/// Find the most severe type whose threshold is breached
///
/// For each type, an occurrence count above `max_absolute` breaches first;
/// otherwise, when a variation vector is supplied, a variation above
/// `max_variation_percent` breaches. Disabled thresholds never breach.
///
/// # Arguments
///
/// * `table` - Severity types with their thresholds
/// * `counts` - Occurrences per type, aligned to `table`
/// * `variations` - Optional variations per type, aligned to `table`
pub fn evaluate(
    table: &SeverityTable,
    counts: &[u64],
    variations: Option<&[Variation]>,
) -> Verdict {
    debug_assert_eq!(table.len(), counts.len());

    for (index, (severity, &count)) in table.iter().zip(counts).enumerate() {
        if let Some(max) = severity.max_absolute {
            if count > max {
                debug!("{} breached absolute threshold: {} > {}", severity.label, count, max);
                return Verdict::Breached {
                    index,
                    label: severity.label.clone(),
                    reason: BreachReason::Absolute { count, max },
                };
            }
        }

        let variation = variations.and_then(|v| v.get(index)).copied();
        if let (Some(variation), Some(max_percent)) = (variation, severity.max_variation_percent)
        {
            if variation.exceeds(max_percent) {
                debug!(
                    "{} breached variation threshold: {} > {}%",
                    severity.label, variation, max_percent
                );
                return Verdict::Breached {
                    index,
                    label: severity.label.clone(),
                    reason: BreachReason::Variation {
                        variation,
                        max_percent,
                    },
                };
            }
        }
    }

    Verdict::None
}

/// Decide whether a verdict is severe enough to notify
///
/// Notifies only when the verdict's type is at least as severe as
/// `minimum_level`. A label that is not part of `table`, on either side,
/// never satisfies the condition.
pub fn should_notify(verdict: &Verdict, minimum_level: &str, table: &SeverityTable) -> bool {
    let Some(label) = verdict.label() else {
        info!("No threshold breached, nothing to notify");
        return false;
    };

    let notify = match (table.position(label), table.position(minimum_level)) {
        (Some(verdict_index), Some(minimum_index)) => verdict_index <= minimum_index,
        _ => false,
    };

    info!(
        "Verdict {} against notification level {}: {}",
        label,
        minimum_level,
        if notify { "notify" } else { "suppress" }
    );
    notify
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::severity::SeverityType;
    use quickcheck_macros::quickcheck;

    /// Builds a four-type table from raw maxima, `None` disabling a threshold
    fn table(max: &[Option<u8>; 4]) -> SeverityTable {
        SeverityTable::new(
            ["ERROR", "WARNING", "INFO", "DEBUG"]
                .iter()
                .zip(max)
                .map(|(label, max)| {
                    let severity = SeverityType::new(*label);
                    match max {
                        Some(max) => severity.with_max_absolute(u64::from(*max)),
                        None => severity,
                    }
                })
                .collect(),
        )
    }

    #[quickcheck]
    fn prop_verdict_is_first_breached_type(
        max: (Option<u8>, Option<u8>, Option<u8>, Option<u8>),
        counts: (u8, u8, u8, u8),
    ) -> bool {
        let max = [max.0, max.1, max.2, max.3];
        let counts = [counts.0, counts.1, counts.2, counts.3].map(u64::from);
        let verdict = evaluate(&table(&max), &counts, None);

        let expected = max
            .iter()
            .zip(&counts)
            .position(|(max, &count)| max.is_some_and(|m| count > u64::from(m)));
        match (verdict, expected) {
            (Verdict::None, None) => true,
            (Verdict::Breached { index, .. }, Some(expected)) => index == expected,
            _ => false,
        }
    }

    #[quickcheck]
    fn prop_disabled_thresholds_never_breach(counts: (u64, u64, u64, u64)) -> bool {
        let counts = [counts.0, counts.1, counts.2, counts.3];
        let variations = [Variation::from_scaled(i64::MAX); 4];
        evaluate(&table(&[None; 4]), &counts, Some(&variations[..])) == Verdict::None
    }
}
