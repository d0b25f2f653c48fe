//! Per-severity line counting over plain and gzip-compressed log files
//!
//! Files are streamed line by line; nothing is loaded whole into memory.
//! A line counts once for a severity type when the type's pattern matches
//! anywhere in it.

use crate::error::CounterError;
use crate::logfiles::LogFile;
use flate2::read::MultiGzDecoder;
use log::debug;
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Occurrences of each severity type and the total line count of one file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileCounts {
    /// Matching lines per severity type, in severity order
    pub occurrences: Vec<u64>,
    pub lines: u64,
}

/// Compiled line patterns, one per severity type in severity order
#[derive(Debug, Clone)]
pub struct LineMatcher {
    patterns: Vec<Regex>,
}

impl LineMatcher {
    /// Compile one regular expression per severity type
    ///
    /// # Errors
    ///
    /// Returns `CounterError::InvalidPattern` for the first source that does
    /// not compile.
    pub fn new<S: AsRef<str>>(sources: &[S]) -> Result<Self, CounterError> {
        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source.as_ref()).map_err(|e| CounterError::InvalidPattern {
                    pattern: source.as_ref().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Count the lines of `file` matching `pattern`
pub fn count_occurrences(pattern: &Regex, file: &LogFile) -> Result<u64, CounterError> {
    let mut count = 0u64;
    for_each_line(file, |line| {
        if pattern.is_match(line) {
            count += 1;
        }
    })?;
    Ok(count)
}

/// Count the lines of `file`
///
/// A final line without a trailing newline is counted.
pub fn count_lines(file: &LogFile) -> Result<u64, CounterError> {
    let mut count = 0u64;
    for_each_line(file, |_| count += 1)?;
    Ok(count)
}

/// Count every severity type and the lines of `file` in a single pass
pub fn analyze_file(matcher: &LineMatcher, file: &LogFile) -> Result<FileCounts, CounterError> {
    let mut counts = FileCounts {
        occurrences: vec![0; matcher.len()],
        lines: 0,
    };

    for_each_line(file, |line| {
        counts.lines += 1;
        for (count, pattern) in counts.occurrences.iter_mut().zip(&matcher.patterns) {
            if pattern.is_match(line) {
                *count += 1;
            }
        }
    })?;

    debug!(
        "{}: {} lines, occurrences {:?}",
        file.path.display(),
        counts.lines,
        counts.occurrences
    );
    Ok(counts)
}

fn open(file: &LogFile) -> Result<Box<dyn BufRead>, CounterError> {
    let handle = File::open(&file.path).map_err(|source| CounterError::Open {
        path: file.path.clone(),
        source,
    })?;

    if file.compressed {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(handle))))
    } else {
        Ok(Box::new(BufReader::new(handle)))
    }
}

/// Stream the lines of `file`, without line terminators, decoding lossily
fn for_each_line<F>(file: &LogFile, mut visit: F) -> Result<(), CounterError>
where
    F: FnMut(&str),
{
    let mut reader = open(file)?;
    let mut buffer = Vec::with_capacity(512);

    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|source| CounterError::Read {
                path: file.path.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(());
        }

        let mut line = buffer.as_slice();
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }

        let text: Cow<'_, str> = String::from_utf8_lossy(line);
        visit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
2024-01-01 10:00:00 ERROR database unreachable
2024-01-01 10:00:01 WARNING slow query
2024-01-01 10:00:02 INFO request served
2024-01-01 10:00:03 ERROR database unreachable
2024-01-01 10:00:04 DEBUG cache hit
2024-01-01 10:00:05 INFO request served";

    fn write_plain(dir: &Path, name: &str, content: &str) -> LogFile {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        LogFile::new(path)
    }

    fn write_gzip(dir: &Path, name: &str, content: &str) -> LogFile {
        let path = dir.join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        LogFile::new(path)
    }

    fn standard_matcher() -> LineMatcher {
        LineMatcher::new(&[" ERROR ", " WARNING ", " INFO ", " DEBUG "]).unwrap()
    }

    #[test]
    fn test_count_occurrences_plain() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "app.log", SAMPLE);
        let error = Regex::new(" ERROR ").unwrap();
        assert_eq!(count_occurrences(&error, &file).unwrap(), 2);
    }

    #[test]
    fn test_count_lines_includes_unterminated_last_line() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "app.log", SAMPLE);
        assert_eq!(count_lines(&file).unwrap(), 6);

        let terminated = write_plain(dir.path(), "b.log", "a\nb\n");
        assert_eq!(count_lines(&terminated).unwrap(), 2);
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "empty.log", "");
        assert_eq!(
            analyze_file(&standard_matcher(), &file).unwrap(),
            FileCounts {
                occurrences: vec![0, 0, 0, 0],
                lines: 0
            }
        );
    }

    #[test]
    fn test_analyze_file_single_pass() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "app.log", SAMPLE);
        let counts = analyze_file(&standard_matcher(), &file).unwrap();
        assert_eq!(counts.occurrences, vec![2, 1, 2, 1]);
        assert_eq!(counts.lines, 6);
    }

    #[test]
    fn test_compressed_file_is_decompressed() {
        let dir = TempDir::new().unwrap();
        let file = write_gzip(dir.path(), "app.log.gz", SAMPLE);
        assert!(file.compressed);

        let counts = analyze_file(&standard_matcher(), &file).unwrap();
        assert_eq!(counts.occurrences, vec![2, 1, 2, 1]);
        assert_eq!(counts.lines, 6);
    }

    #[test]
    fn test_line_counts_once_per_type() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "app.log", "ERROR ERROR ERROR\nERROR\n");
        let error = Regex::new("ERROR").unwrap();
        assert_eq!(count_occurrences(&error, &file).unwrap(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "app.log", "x ERROR\r\ny\r\n");
        let anchored = Regex::new("ERROR$").unwrap();
        assert_eq!(count_occurrences(&anchored, &file).unwrap(), 1);
        assert_eq!(count_lines(&file).unwrap(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.log");
        std::fs::write(&path, b"\xff\xfe ERROR x\n\xc3\x28 INFO x\n").unwrap();
        let counts = analyze_file(&standard_matcher(), &LogFile::new(path)).unwrap();
        assert_eq!(counts.occurrences, vec![1, 0, 1, 0]);
        assert_eq!(counts.lines, 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let file = LogFile::new("/nonexistent/app.log");
        assert!(matches!(
            count_lines(&file),
            Err(CounterError::Open { .. })
        ));
    }

    #[test]
    fn test_corrupt_gzip_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = write_plain(dir.path(), "broken.log.gz", "definitely not gzip");
        assert!(file.compressed);
        assert!(matches!(
            count_lines(&file),
            Err(CounterError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = LineMatcher::new(&["(unclosed"]);
        assert!(matches!(result, Err(CounterError::InvalidPattern { .. })));
    }
}
