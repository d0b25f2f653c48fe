//! Discovery of the current and historical log files under a rotation pattern
//!
//! Rotated files are listed directly under one directory, sorted in
//! descending lexicographic order (newest first for date-stamped names) and
//! windowed relative to the file currently being analyzed.

use crate::config::template::{self, Template, TokenValues};
use crate::error::LocateError;
use chrono::format::{Item, Numeric, Pad, StrftimeItems};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Extension of rotated files that have been compressed
pub const COMPRESSED_EXTENSION: &str = "gz";

/// A discovered log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    /// Whether the file must be decompressed before reading
    pub compressed: bool,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let compressed = path
            .extension()
            .is_some_and(|ext| ext == COMPRESSED_EXTENSION);
        Self { path, compressed }
    }

    /// File name for display, falling back to the full path
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A rotation pattern compiled against a file name
#[derive(Debug, Clone)]
pub struct FilePattern {
    regex: Regex,
}

impl FilePattern {
    /// Pattern matching the file of one specific date
    pub fn for_date(
        pattern: &Template,
        formatted_date: &str,
        environment: &str,
    ) -> Result<Self, LocateError> {
        Self::build(pattern, regex::escape(formatted_date), environment)
    }

    /// Pattern matching files of any date written with `date_format`
    pub fn for_any_date(
        pattern: &Template,
        date_format: &str,
        environment: &str,
    ) -> Result<Self, LocateError> {
        Self::build(pattern, date_format_regex(date_format), environment)
    }

    fn build(pattern: &Template, date: String, environment: &str) -> Result<Self, LocateError> {
        let fragments = TokenValues::from([
            (template::DATE, date),
            (template::ENV, regex::escape(environment)),
            (template::TYPE, ".+?".to_string()),
        ]);
        let source = format!(
            r"^(?:{})(?:\.{})?$",
            pattern.to_regex_source(&fragments),
            COMPRESSED_EXTENSION
        );
        debug!("Rotation pattern '{}' compiled to {}", pattern.source(), source);

        let regex = Regex::new(&source).map_err(|source| LocateError::InvalidPattern {
            pattern: pattern.source().to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

/// Translate a strftime format into a regular expression matching its output
fn date_format_regex(format: &str) -> String {
    StrftimeItems::new(format)
        .map(|item| match item {
            Item::Literal(s) | Item::Space(s) => regex::escape(s),
            Item::OwnedLiteral(s) | Item::OwnedSpace(s) => regex::escape(&s),
            Item::Numeric(Numeric::Year | Numeric::IsoYear, _) => r"\d{4}".to_string(),
            Item::Numeric(Numeric::Ordinal, _) => r"\d{1,3}".to_string(),
            Item::Numeric(Numeric::Timestamp | Numeric::Nanosecond, _) => r"\d+".to_string(),
            Item::Numeric(_, Pad::Space) => r" ?\d{1,2}".to_string(),
            Item::Numeric(_, _) => r"\d{1,2}".to_string(),
            _ => ".+?".to_string(),
        })
        .collect()
}

/// Name of `exclude` within `directory`, `None` when it lives elsewhere
///
/// Relative paths are taken relative to `directory`.
fn anchor_name(directory: &Path, exclude: &Path) -> Option<String> {
    let resolve = |dir: &Path| dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

    let path = directory.join(exclude);
    let name = path.file_name()?.to_string_lossy().into_owned();
    let parent = resolve(path.parent()?);
    if parent != resolve(directory) {
        debug!("{} is outside {}, no history anchor", path.display(), directory.display());
        return None;
    }
    Some(name)
}

/// List files matching `pattern` in `directory`, newest first, windowed
///
/// When `exclude` is found in the listing, everything collected so far is
/// discarded and the window restarts right after it. `offset` entries are
/// then skipped and at most `limit` entries kept. No match yields an empty
/// list.
///
/// # Errors
///
/// Returns `LocateError::ListDirectory` if `directory` cannot be read.
pub fn locate(
    pattern: &FilePattern,
    directory: &Path,
    limit: Option<usize>,
    offset: usize,
    exclude: Option<&Path>,
) -> Result<Vec<LogFile>, LocateError> {
    let list_error = |source| LocateError::ListDirectory {
        path: directory.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if pattern.matches(&name) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort_unstable_by(|a, b| b.cmp(a));
    debug!(
        "{} file(s) in {} match the rotation pattern",
        names.len(),
        directory.display()
    );

    let excluded_name = exclude.and_then(|path| anchor_name(directory, path));
    let limit = limit.unwrap_or(usize::MAX);

    let mut selected = Vec::new();
    let mut position = 0usize;
    for name in names {
        if excluded_name.as_deref() == Some(name.as_str()) {
            selected.clear();
            position = 0;
            continue;
        }
        if position >= offset && selected.len() < limit {
            selected.push(LogFile::new(directory.join(&name)));
        }
        position += 1;
    }

    Ok(selected)
}
