//! Human-readable notification content built from an analysis pass

use crate::analysis::{AnalysisResult, FixedPoint, Variation};
use crate::config::template;
use crate::config::Settings;
use crate::logfiles::LogFile;
use crate::severity::Verdict;

/// Subject and body handed to a notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub body: String,
}

impl Report {
    /// Build the report of one pass
    ///
    /// # Arguments
    ///
    /// * `settings` - Provides the subject template, environment and volume
    /// * `result` - The completed pass
    /// * `disk_usage` - Used space of the configured volume, when known
    pub fn build(
        settings: &Settings,
        result: &AnalysisResult,
        disk_usage: Option<FixedPoint>,
    ) -> Self {
        Self {
            subject: subject(settings, &result.verdict),
            body: body(settings, result, disk_usage),
        }
    }
}

/// Render the subject template with the environment and breached level
pub fn subject(settings: &Settings, verdict: &Verdict) -> String {
    let mut values = settings.base_tokens();
    values.insert(
        template::LEVEL,
        verdict.label().unwrap_or("none").to_string(),
    );
    settings.subject.render(&values)
}

fn body(settings: &Settings, result: &AnalysisResult, disk_usage: Option<FixedPoint>) -> String {
    let mut out = String::new();

    out.push_str(&format!("Environment: {}\n", settings.environment));
    out.push_str(&format!("Log file: {}\n", result.current.path.display()));
    if let Some(previous) = &result.previous {
        out.push_str(&format!("Previous file: {}\n", previous.file.name()));
    }
    if let Some(history) = &result.history {
        out.push_str(&format!(
            "History: {} file(s): {}\n",
            history.files.len(),
            file_names(&history.files)
        ));
    }
    out.push_str(&format!("Verdict: {}\n", result.verdict));

    let mut lines = Table::new(comparison_header("", result));
    lines.push(comparison_row(
        "lines",
        result.counts.lines,
        result
            .previous
            .as_ref()
            .map(|p| (p.counts.lines, p.line_variation)),
        result
            .history
            .as_ref()
            .map(|h| (h.average.lines, h.line_variation)),
    ));
    out.push_str(&format!("\nLines\n{}", lines.render()));

    let mut occurrences = Table::new(comparison_header("Type", result));
    for (index, severity) in settings.severities.iter().enumerate() {
        let current = result.counts.occurrences.get(index).copied().unwrap_or(0);
        let previous = result.previous.as_ref().and_then(|p| {
            Some((*p.counts.occurrences.get(index)?, *p.variations.get(index)?))
        });
        let average = result.history.as_ref().and_then(|h| {
            Some((
                *h.average.occurrences.get(index)?,
                *h.variations.get(index)?,
            ))
        });
        occurrences.push(comparison_row(&severity.label, current, previous, average));
    }
    out.push_str(&format!("\nOccurrences\n{}", occurrences.render()));

    let usage = disk_usage
        .map(|usage| format!("{}%", usage))
        .unwrap_or_else(|| "unavailable".to_string());
    out.push_str(&format!(
        "\nDisk usage ({}): {}\n",
        settings.disk_volume.display(),
        usage
    ));

    out
}

fn file_names(files: &[LogFile]) -> String {
    files.iter().map(LogFile::name).collect::<Vec<_>>().join(", ")
}

fn comparison_header(first: &str, result: &AnalysisResult) -> Vec<String> {
    let mut header = vec![first.to_string(), "Current".to_string()];
    if result.previous.is_some() {
        header.push("Previous".to_string());
        header.push("Variation".to_string());
    }
    if result.history.is_some() {
        header.push("Average".to_string());
        header.push("Variation".to_string());
    }
    header
}

fn comparison_row(
    label: &str,
    current: u64,
    previous: Option<(u64, Variation)>,
    average: Option<(FixedPoint, Variation)>,
) -> Vec<String> {
    let mut row = vec![label.to_string(), current.to_string()];
    if let Some((count, variation)) = previous {
        row.push(count.to_string());
        row.push(variation.to_string());
    }
    if let Some((mean, variation)) = average {
        row.push(mean.to_string());
        row.push(variation.to_string());
    }
    row
}

/// Plain-text table, first column left aligned and the others right aligned
struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(header: Vec<String>) -> Self {
        Self { rows: vec![header] }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|column| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(column, (cell, &width))| {
                    if column == 0 {
                        format!("{:<width$}", cell, width = width)
                    } else {
                        format!("{:>width$}", cell, width = width)
                    }
                })
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}
