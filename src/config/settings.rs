//! Typed settings resolved once per run
//!
//! `Settings` is immutable after construction and handed by reference to
//! every component, so severity labels, thresholds and patterns are read
//! from one place.

use crate::config::provider::ConfigProvider;
use crate::config::template::{self, Template, TokenValues};
use crate::error::ConfigError;
use crate::severity::{SeverityTable, SeverityType};
use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Window applied to the history listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryWindow {
    /// Maximum number of files, unbounded when `None`
    pub limit: Option<usize>,
    /// Number of files skipped after the current file
    pub offset: usize,
}

/// Transport used to deliver notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// Write the notification to the log and stdout
    Log,
    /// Send an email through SMTP
    Email,
    /// POST a JSON document to a URL
    Webhook,
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" | "stdout" => Ok(Self::Log),
            "email" | "mail" | "smtp" => Ok(Self::Email),
            "webhook" | "http" => Ok(Self::Webhook),
            other => Err(format!("unknown notifier: {}", other)),
        }
    }
}

/// Connection security for the SMTP transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    None,
    StartTls,
    Tls,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(Self::None),
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            other => Err(format!("unknown SMTP security mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub host: Option<String>,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierSettings {
    pub kind: NotifierKind,
    /// Upper bound on one delivery attempt
    pub timeout: Duration,
    pub email: EmailSettings,
    pub webhook_url: Option<String>,
}

/// Everything an analysis pass needs, validated
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_folder: PathBuf,
    /// Explicit current log file, bypassing the date lookup
    pub log_file: Option<PathBuf>,
    pub log_file_pattern: Template,
    pub date_format: String,
    /// Days subtracted from the run date to name the current file
    pub date_delay_days: u32,
    pub history: HistoryWindow,
    pub severities: SeverityTable,
    pub line_pattern: Template,
    pub notification_level: String,
    pub environment: String,
    pub disk_volume: PathBuf,
    pub subject: Template,
    pub notifier: NotifierSettings,
}

impl Settings {
    /// Resolve and validate every property
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first offending key.
    pub fn from_provider(provider: &ConfigProvider) -> Result<Self, ConfigError> {
        let labels: Vec<String> = provider
            .resolve("log_types")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if labels.is_empty() {
            return Err(ConfigError::invalid("log_types", "at least one type is required"));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(ConfigError::invalid(
                "log_types",
                format!("duplicate type '{}'", duplicate),
            ));
        }

        let max_absolute = parse_thresholds(
            "log_thresholds_max",
            &provider.resolve("log_thresholds_max"),
            labels.len(),
        )?;
        let max_variation = parse_thresholds(
            "log_thresholds_var",
            &provider.resolve("log_thresholds_var"),
            labels.len(),
        )?;

        let severities = SeverityTable::new(
            labels
                .into_iter()
                .zip(max_absolute)
                .zip(max_variation)
                .map(|((label, max_absolute), max_variation_percent)| SeverityType {
                    label,
                    max_absolute: max_absolute.and_then(|v| u64::try_from(v).ok()),
                    max_variation_percent,
                })
                .collect(),
        );

        let date_format = provider.resolve("log_file_date_format");
        if date_format.is_empty()
            || StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::invalid(
                "log_file_date_format",
                format!("invalid date format '{}'", date_format),
            ));
        }

        let log_file_pattern = provider
            .resolve_opt("log_file_pattern")
            .map(|p| Template::parse(&p))
            .ok_or_else(|| ConfigError::invalid("log_file_pattern", "must not be empty"))?;

        let line_pattern = provider
            .resolve_opt("log_type_pattern")
            .map(|p| Template::parse(&p))
            .ok_or_else(|| ConfigError::invalid("log_type_pattern", "must not be empty"))?;

        let history = HistoryWindow {
            limit: provider
                .resolve_opt("log_file_history_limit")
                .map(|v| parse_number::<usize>("log_file_history_limit", &v))
                .transpose()?,
            offset: parse_number(
                "log_file_history_offset",
                &provider.resolve("log_file_history_offset"),
            )?,
        };

        let settings = Self {
            log_folder: PathBuf::from(provider.resolve("log_folder")),
            log_file: provider.resolve_opt("log_file").map(PathBuf::from),
            log_file_pattern,
            date_format,
            date_delay_days: parse_number(
                "log_file_date_delay",
                &provider.resolve("log_file_date_delay"),
            )?,
            history,
            severities,
            line_pattern,
            notification_level: provider.resolve("log_notification_level").trim().to_string(),
            environment: provider.resolve("environment"),
            disk_volume: PathBuf::from(provider.resolve("disk_volume")),
            subject: Template::parse(&provider.resolve("notification_subject")),
            notifier: notifier_settings(provider)?,
        };

        for source in settings.line_regex_sources() {
            Regex::new(&source).map_err(|e| ConfigError::invalid("log_type_pattern", e.to_string()))?;
        }

        Ok(settings)
    }

    /// Values substituted into every template
    pub fn base_tokens(&self) -> TokenValues<'static> {
        TokenValues::from([(template::ENV, self.environment.clone())])
    }

    /// Regular expression source for each severity type, in severity order
    pub fn line_regex_sources(&self) -> Vec<String> {
        self.severities
            .labels()
            .map(|label| {
                let values = TokenValues::from([
                    (template::TYPE, regex::escape(label)),
                    (template::ENV, regex::escape(&self.environment)),
                ]);
                self.line_pattern.render(&values)
            })
            .collect()
    }
}

fn notifier_settings(provider: &ConfigProvider) -> Result<NotifierSettings, ConfigError> {
    let kind = provider
        .resolve("notifier")
        .parse::<NotifierKind>()
        .map_err(|e| ConfigError::invalid("notifier", e))?;

    let email = EmailSettings {
        host: provider.resolve_opt("smtp_host"),
        port: parse_number("smtp_port", &provider.resolve("smtp_port"))?,
        security: provider
            .resolve("smtp_security")
            .parse()
            .map_err(|e: String| ConfigError::invalid("smtp_security", e))?,
        username: provider.resolve_opt("smtp_username"),
        password: provider.resolve_opt("smtp_password"),
        from: provider.resolve_opt("smtp_from"),
        to: provider
            .resolve("smtp_to")
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    };

    let settings = NotifierSettings {
        kind,
        timeout: Duration::from_secs(parse_number(
            "notification_timeout",
            &provider.resolve("notification_timeout"),
        )?),
        email,
        webhook_url: provider.resolve_opt("webhook_url"),
    };

    match settings.kind {
        NotifierKind::Email => {
            if settings.email.host.is_none() {
                return Err(ConfigError::invalid("smtp_host", "required by the email notifier"));
            }
            if settings.email.from.is_none() {
                return Err(ConfigError::invalid("smtp_from", "required by the email notifier"));
            }
            if settings.email.to.is_empty() {
                return Err(ConfigError::invalid("smtp_to", "required by the email notifier"));
            }
        }
        NotifierKind::Webhook if settings.webhook_url.is_none() => {
            return Err(ConfigError::invalid("webhook_url", "required by the webhook notifier"));
        }
        _ => {}
    }

    Ok(settings)
}

/// Parse a space-separated threshold list aligned to `count` types
///
/// `-1` disables a threshold. A single value applies to every type.
fn parse_thresholds(key: &str, raw: &str, count: usize) -> Result<Vec<Option<i64>>, ConfigError> {
    let values = raw
        .split_whitespace()
        .map(|token| {
            let value: i64 = parse_number(key, token)?;
            match value {
                -1 => Ok(None),
                v if v < -1 => Err(ConfigError::invalid(
                    key,
                    format!("{} is below -1", v),
                )),
                v => Ok(Some(v)),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.len() {
        0 => Ok(vec![None; count]),
        1 => Ok(vec![values[0]; count]),
        n if n == count => Ok(values),
        n => Err(ConfigError::invalid(
            key,
            format!("{} values for {} log types", n, count),
        )),
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a valid number", raw)))
}
