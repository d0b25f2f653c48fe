/// Error types for every stage of a run
pub mod error;

/// Severity types, thresholds and verdicts
pub mod severity;

/// Configuration resolution and validation
pub mod config;

/// Log file discovery, counting and disk usage
pub mod logfiles;

/// Averages, variations, threshold evaluation and the analysis pass
pub mod analysis;

/// Report formatting and notification transports
pub mod alerts;

// Re-export commonly used types
pub use analysis::{AnalysisResult, FixedPoint, Variation};
pub use config::{ConfigProvider, Settings};
pub use error::{AlertError, AnalysisError, ConfigError, CounterError, LocateError};
pub use severity::{SeverityTable, SeverityType, Verdict};
