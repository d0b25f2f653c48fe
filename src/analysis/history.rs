//! Averages over the history window

use crate::analysis::FixedPoint;
use crate::error::CounterError;
use crate::logfiles::{analyze_file, FileCounts, LineMatcher, LogFile};
use log::debug;

/// Per-type and line averages over a set of historical files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAverage {
    /// Mean occurrences per severity type, in severity order
    pub occurrences: Vec<FixedPoint>,
    /// Mean line count
    pub lines: FixedPoint,
    /// Number of files averaged
    pub files: usize,
}

/// Count every file of the history window and average the results
///
/// An empty window has no average and yields `None`.
///
/// # Errors
///
/// Returns the first `CounterError` raised while reading a file.
pub fn aggregate(
    matcher: &LineMatcher,
    files: &[LogFile],
) -> Result<Option<HistoryAverage>, CounterError> {
    if files.is_empty() {
        return Ok(None);
    }

    let counts = files
        .iter()
        .map(|file| analyze_file(matcher, file))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(average(matcher.len(), &counts))
}

/// Average already computed counts
pub fn average(types: usize, counts: &[FileCounts]) -> Option<HistoryAverage> {
    let files = counts.len();

    let mut occurrence_sums = vec![0u64; types];
    let mut line_sum = 0u64;
    for file in counts {
        line_sum = line_sum.saturating_add(file.lines);
        for (sum, &count) in occurrence_sums.iter_mut().zip(&file.occurrences) {
            *sum = sum.saturating_add(count);
        }
    }

    let occurrences = occurrence_sums
        .into_iter()
        .map(|sum| FixedPoint::mean(sum, files))
        .collect::<Option<Vec<_>>>()?;
    let lines = FixedPoint::mean(line_sum, files)?;

    debug!(
        "Average over {} file(s): {} lines, occurrences {:?}",
        files,
        lines,
        occurrences.iter().map(ToString::to_string).collect::<Vec<_>>()
    );

    Some(HistoryAverage {
        occurrences,
        lines,
        files,
    })
}
