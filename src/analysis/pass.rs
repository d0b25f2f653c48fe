//! One analysis pass: locate, count, compare, evaluate
//!
//! Nothing is kept between passes. The rotated files on disk are the only
//! history.

use crate::analysis::history::{self, HistoryAverage};
use crate::analysis::{evaluate, variation, variations, FixedPoint, Variation};
use crate::config::Settings;
use crate::error::AnalysisError;
use crate::logfiles::{analyze_file, locate, FileCounts, FilePattern, LineMatcher, LogFile};
use crate::severity::Verdict;
use chrono::{Days, NaiveDate};
use log::{debug, info};

/// The current file compared with the file rotated just before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousComparison {
    pub file: LogFile,
    pub counts: FileCounts,
    /// Variation of each type's occurrences relative to the previous file
    pub variations: Vec<Variation>,
    pub line_variation: Variation,
}

/// The current file compared with the average of the history window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryComparison {
    pub files: Vec<LogFile>,
    pub average: HistoryAverage,
    /// Variation of each type's occurrences relative to the average
    pub variations: Vec<Variation>,
    pub line_variation: Variation,
}

/// Everything computed by one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub current: LogFile,
    pub counts: FileCounts,
    pub previous: Option<PreviousComparison>,
    pub history: Option<HistoryComparison>,
    pub verdict: Verdict,
}

impl AnalysisResult {
    /// Variations the thresholds were evaluated against
    ///
    /// The history average is preferred over the previous file; without
    /// either, only absolute thresholds apply.
    pub fn evaluated_variations(&self) -> Option<&[Variation]> {
        self.history
            .as_ref()
            .map(|h| h.variations.as_slice())
            .or_else(|| self.previous.as_ref().map(|p| p.variations.as_slice()))
    }
}

/// Run a full pass for `run_date`
///
/// # Errors
///
/// Returns `AnalysisError::NoCurrentLogFile` when no file exists for the
/// date, and propagates listing and reading failures.
pub fn run(settings: &Settings, run_date: NaiveDate) -> Result<AnalysisResult, AnalysisError> {
    let current = current_log_file(settings, run_date)?;
    analyze(settings, current)
}

/// Resolve the file to analyze
///
/// An explicit `log_file` wins; otherwise the rotation pattern is applied
/// to the run date minus the configured delay.
pub fn current_log_file(settings: &Settings, run_date: NaiveDate) -> Result<LogFile, AnalysisError> {
    if let Some(path) = &settings.log_file {
        if !path.is_file() {
            return Err(AnalysisError::NoCurrentLogFile(path.display().to_string()));
        }
        return Ok(LogFile::new(path.clone()));
    }

    let date = run_date
        .checked_sub_days(Days::new(u64::from(settings.date_delay_days)))
        .ok_or_else(|| {
            AnalysisError::NoCurrentLogFile(format!(
                "{} minus {} day(s)",
                run_date, settings.date_delay_days
            ))
        })?;
    let formatted = date.format(&settings.date_format).to_string();
    debug!("Looking for the log file of {}", formatted);

    let pattern =
        FilePattern::for_date(&settings.log_file_pattern, &formatted, &settings.environment)?;
    locate(&pattern, &settings.log_folder, Some(1), 0, None)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AnalysisError::NoCurrentLogFile(format!(
                "{} in {}",
                formatted,
                settings.log_folder.display()
            ))
        })
}

/// Analyze `current` against its predecessors in the log folder
pub fn analyze(settings: &Settings, current: LogFile) -> Result<AnalysisResult, AnalysisError> {
    info!("Analyzing {}", current.path.display());

    let matcher = LineMatcher::new(&settings.line_regex_sources())?;
    let counts = analyze_file(&matcher, &current)?;

    let history_pattern = FilePattern::for_any_date(
        &settings.log_file_pattern,
        &settings.date_format,
        &settings.environment,
    )?;

    let previous = locate(
        &history_pattern,
        &settings.log_folder,
        Some(1),
        0,
        Some(&current.path),
    )?
    .into_iter()
    .next()
    .map(|file| compare_previous(&matcher, &counts, file))
    .transpose()?;

    let history_files = locate(
        &history_pattern,
        &settings.log_folder,
        settings.history.limit,
        settings.history.offset,
        Some(&current.path),
    )?;
    debug!("History window holds {} file(s)", history_files.len());
    let history = history::aggregate(&matcher, &history_files)?.map(|average| {
        compare_history(&counts, history_files, average)
    });

    let mut result = AnalysisResult {
        current,
        counts,
        previous,
        history,
        verdict: Verdict::None,
    };
    result.verdict = evaluate(
        &settings.severities,
        &result.counts.occurrences,
        result.evaluated_variations(),
    );
    info!("Verdict: {}", result.verdict);

    Ok(result)
}

fn compare_previous(
    matcher: &LineMatcher,
    current: &FileCounts,
    file: LogFile,
) -> Result<PreviousComparison, AnalysisError> {
    let counts = analyze_file(matcher, &file)?;
    let baselines: Vec<FixedPoint> = counts
        .occurrences
        .iter()
        .map(|&count| FixedPoint::from_count(count))
        .collect();

    Ok(PreviousComparison {
        variations: variations(&baselines, &current.occurrences),
        line_variation: variation(FixedPoint::from_count(counts.lines), current.lines),
        file,
        counts,
    })
}

fn compare_history(
    current: &FileCounts,
    files: Vec<LogFile>,
    average: HistoryAverage,
) -> HistoryComparison {
    HistoryComparison {
        variations: variations(&average.occurrences, &current.occurrences),
        line_variation: variation(average.lines, current.lines),
        files,
        average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigProvider;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn settings(folder: &Path, assignments: &[&str]) -> Settings {
        let mut provider = ConfigProvider::new();
        provider
            .apply_assignment(&format!("log_folder={}", folder.display()))
            .unwrap();
        provider
            .apply_assignment("log_file_pattern=app-{date}.log")
            .unwrap();
        for assignment in assignments {
            provider.apply_assignment(assignment).unwrap();
        }
        Settings::from_provider(&provider).unwrap()
    }

    fn write_log(dir: &Path, name: &str, errors: usize, warnings: usize) {
        let content = "x ERROR failed\n".repeat(errors) + &"x WARNING slow\n".repeat(warnings);
        fs::write(dir.join(name), content).unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_current_file_for_run_date() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-02.log", 0, 0);
        write_log(dir.path(), "app-2024-01-03.log", 0, 0);

        let settings = settings(dir.path(), &[]);
        let file = current_log_file(&settings, date("2024-01-02")).unwrap();
        assert_eq!(file.name(), "app-2024-01-02.log");
    }

    #[test]
    fn test_current_file_honours_delay() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-02.log", 0, 0);

        let settings = settings(dir.path(), &["log_file_date_delay=1"]);
        let file = current_log_file(&settings, date("2024-01-03")).unwrap();
        assert_eq!(file.name(), "app-2024-01-02.log");
    }

    #[test]
    fn test_missing_current_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-01.log", 0, 0);

        let settings = settings(dir.path(), &[]);
        let result = run(&settings, date("2024-01-05"));
        assert!(matches!(result, Err(AnalysisError::NoCurrentLogFile(_))));
    }

    #[test]
    fn test_explicit_log_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.log");
        let settings = settings(dir.path(), &[format!("log_file={}", missing.display()).as_str()]);
        assert!(matches!(
            current_log_file(&settings, date("2024-01-01")),
            Err(AnalysisError::NoCurrentLogFile(_))
        ));
    }

    #[test]
    fn test_lone_file_has_no_comparisons() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-01.log", 2, 1);

        let settings = settings(dir.path(), &["log_thresholds_var=10"]);
        let result = run(&settings, date("2024-01-01")).unwrap();
        assert_eq!(result.counts.occurrences, vec![2, 1, 0, 0]);
        assert_eq!(result.counts.lines, 3);
        assert!(result.previous.is_none());
        assert!(result.history.is_none());
        assert_eq!(result.evaluated_variations(), None);
        assert_eq!(result.verdict, Verdict::None);
    }

    #[test]
    fn test_comparisons_with_previous_and_history() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-01.log", 1, 0);
        write_log(dir.path(), "app-2024-01-02.log", 2, 0);
        write_log(dir.path(), "app-2024-01-03.log", 3, 0);
        write_log(dir.path(), "app-2024-01-04.log", 4, 2);
        // Newer than the analyzed date, must be ignored
        write_log(dir.path(), "app-2024-01-05.log", 100, 100);

        let settings = settings(dir.path(), &[]);
        let result = run(&settings, date("2024-01-04")).unwrap();
        assert_eq!(result.current.name(), "app-2024-01-04.log");

        let previous = result.previous.as_ref().unwrap();
        assert_eq!(previous.file.name(), "app-2024-01-03.log");
        // 3 -> 4 errors
        assert_eq!(previous.variations[0].to_string(), "+33.33%");
        // 0 -> 2 warnings
        assert_eq!(previous.variations[1], Variation::FULL_INCREASE);

        let history = result.history.as_ref().unwrap();
        assert_eq!(history.files.len(), 3);
        assert_eq!(history.average.occurrences[0].to_string(), "2.00");
        // 2.00 -> 4 errors
        assert_eq!(history.variations[0].to_string(), "+100.00%");
        // 2.00 -> 6 lines
        assert_eq!(history.line_variation.to_string(), "+200.00%");

        assert_eq!(
            result.evaluated_variations(),
            Some(history.variations.as_slice())
        );
    }

    #[test]
    fn test_history_window_limit_and_offset() {
        let dir = TempDir::new().unwrap();
        for day in 1..=5 {
            write_log(dir.path(), &format!("app-2024-01-0{}.log", day), day, 0);
        }

        let settings = settings(
            dir.path(),
            &["log_file_history_limit=2", "log_file_history_offset=1"],
        );
        let result = run(&settings, date("2024-01-05")).unwrap();

        let history = result.history.unwrap();
        let names: Vec<String> = history.files.iter().map(LogFile::name).collect();
        assert_eq!(names, vec!["app-2024-01-03.log", "app-2024-01-02.log"]);
        // The previous file ignores the window
        assert_eq!(result.previous.unwrap().file.name(), "app-2024-01-04.log");
        // (3 + 2) / 2
        assert_eq!(history.average.occurrences[0].to_string(), "2.50");
    }

    #[test]
    fn test_variation_breach_uses_history_average() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-01.log", 2, 0);
        write_log(dir.path(), "app-2024-01-02.log", 2, 0);
        write_log(dir.path(), "app-2024-01-03.log", 3, 0);

        // +50% against the average of 2.00 breaches a 40% limit
        let settings = settings(dir.path(), &["log_thresholds_var=40 -1 -1 -1"]);
        let result = run(&settings, date("2024-01-03")).unwrap();
        assert_eq!(result.verdict.label(), Some("ERROR"));
    }

    #[test]
    fn test_absolute_breach() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-01.log", 0, 6);

        let settings = settings(dir.path(), &["log_thresholds_max=1 5 -1 -1"]);
        let result = run(&settings, date("2024-01-01")).unwrap();
        assert_eq!(result.verdict.label(), Some("WARNING"));
    }

    #[test]
    fn test_explicit_log_file_anchors_history() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "app-2024-01-01.log", 1, 0);
        write_log(dir.path(), "app-2024-01-02.log", 5, 0);
        write_log(dir.path(), "app-2024-01-03.log", 9, 0);

        let current = dir.path().join("app-2024-01-02.log");
        let settings = settings(dir.path(), &[format!("log_file={}", current.display()).as_str()]);
        let result = run(&settings, date("2030-01-01")).unwrap();

        assert_eq!(result.current.name(), "app-2024-01-02.log");
        assert_eq!(result.previous.unwrap().file.name(), "app-2024-01-01.log");
        assert_eq!(result.history.unwrap().files.len(), 1);
    }
}
