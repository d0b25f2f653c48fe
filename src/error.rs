use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving and validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while discovering log files
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Failed to list directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rotation pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur while counting lines in a log file
#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid line pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur when delivering a notification
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),

    #[error("Notification timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid notifier configuration: {0}")]
    Misconfigured(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("SMTP error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),
}

/// Errors that abort an analysis pass
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No log file found for {0}")]
    NoCurrentLogFile(String),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Counter(#[from] CounterError),
}

/// Error returned when a formatted fixed-point value cannot be parsed back
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid fixed-point value: '{0}'")]
pub struct ParseFixedPointError(pub String);
