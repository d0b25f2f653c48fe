//! Access to the rotated log files on disk

pub mod counter;
pub mod disk;
pub mod locator;

pub use counter::{analyze_file, count_lines, count_occurrences, FileCounts, LineMatcher};
pub use disk::disk_usage;
pub use locator::{locate, FilePattern, LogFile};
