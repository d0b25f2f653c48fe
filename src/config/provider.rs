//! Resolution of named properties from command-line overrides, the config
//! file and built-in defaults, in that order of precedence.

use crate::error::ConfigError;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is named
pub const DEFAULT_CONFIG_FILE: &str = "logpulse.toml";

/// Every known property with its default value (empty means unset)
pub const DEFAULTS: &[(&str, &str)] = &[
    ("log_folder", "/var/log"),
    ("log_file", ""),
    ("log_file_pattern", "{env}.log.{date}"),
    ("log_file_date_format", "%Y-%m-%d"),
    ("log_file_date_delay", "0"),
    ("log_file_history_limit", ""),
    ("log_file_history_offset", "0"),
    ("log_types", "ERROR WARNING INFO DEBUG"),
    ("log_type_pattern", "{type}"),
    ("log_thresholds_max", "-1"),
    ("log_thresholds_var", "-1"),
    ("log_notification_level", "WARNING"),
    ("environment", "production"),
    ("disk_volume", "/"),
    ("notification_subject", "[{env}] Log alert: {level}"),
    ("notifier", "log"),
    ("notification_timeout", "30"),
    ("smtp_host", ""),
    ("smtp_port", "25"),
    ("smtp_security", "starttls"),
    ("smtp_username", ""),
    ("smtp_password", ""),
    ("smtp_from", ""),
    ("smtp_to", ""),
    ("webhook_url", ""),
];

fn default_for(key: &str) -> Option<&'static str> {
    DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn is_known(key: &str) -> bool {
    default_for(key).is_some()
}

/// Property source with override > file > default precedence
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    overrides: HashMap<String, String>,
    file_values: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl ConfigProvider {
    /// A provider that only knows the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file
    ///
    /// An explicitly named file must exist. Without one, `logpulse.toml` in
    /// the working directory is used when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if `explicit` does not exist and
    /// `ConfigError::ParseError` if the file is not a flat TOML table.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                path.to_path_buf()
            }
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    info!("No configuration file, using defaults");
                    return Ok(Self::new());
                }
                fallback
            }
        };

        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let mut provider = Self::from_toml_str(&content)?;
        provider.source = Some(path);
        Ok(provider)
    }

    /// Build a provider from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut file_values = HashMap::with_capacity(table.len());

        for (key, value) in table {
            if !is_known(&key) {
                warn!("Ignoring unknown configuration key: {}", key);
                continue;
            }
            let value = value_to_string(&key, &value)?;
            file_values.insert(key, value);
        }

        Ok(Self {
            file_values,
            ..Self::default()
        })
    }

    /// Add an explicit override, taking precedence over the file
    pub fn set_override(&mut self, key: &str, value: &str) {
        if !is_known(key) {
            warn!("Ignoring unknown override: {}", key);
            return;
        }
        debug!("Override {} = {}", key, value);
        self.overrides.insert(key.to_string(), value.to_string());
    }

    /// Add an override given as `KEY=VALUE`
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ConfigError::ParseError(format!("expected KEY=VALUE, got '{}'", assignment))
        })?;
        self.set_override(key.trim(), value.trim());
        Ok(())
    }

    /// Path of the loaded config file, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Resolved value of `key`, empty when unset at every level
    pub fn resolve(&self, key: &str) -> String {
        self.overrides
            .get(key)
            .or_else(|| self.file_values.get(key))
            .cloned()
            .or_else(|| default_for(key).map(str::to_string))
            .unwrap_or_default()
    }

    /// Resolved value of `key`, `None` when blank
    pub fn resolve_opt(&self, key: &str) -> Option<String> {
        let value = self.resolve(key);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn value_to_string(key: &str, value: &toml::Value) -> Result<String, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        toml::Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| value_to_string(key, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(" "))
        }
        toml::Value::Table(_) => Err(ConfigError::ParseError(format!(
            "'{}' must be a value, not a table",
            key
        ))),
    }
}
