//! Guard configuration and startup validation
//!
//! Validation never aborts: every problem is returned so the caller can log
//! it and keep running in a degraded state.

use crate::types::NotifyTarget;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reserved prefix every tracked remote source must start with.
pub const DEFAULT_SOURCE_PREFIX: &str = "https://api.vrchat.cloud/api/1/worlds/wrld_";

/// Metadata field carrying the remote last-modified timestamp.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "updated_at";

/// Configuration problems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConfigError {
    /// Remote source does not identify the expected resource type
    #[error("Invalid remote source `{source_url}`: expected prefix `{prefix}`")]
    InvalidSource {
        /// Configured remote source
        source_url: String,
        /// Required prefix
        prefix: String,
    },

    /// No notify target configured
    #[error("Notify target is not set")]
    MissingNotifyTarget,

    /// Notify target has an empty object name
    #[error("Notify target object is empty")]
    MissingNotifyObject,

    /// Notify target has an empty method name
    #[error("Notify target method is empty")]
    MissingNotifyMethod,

    /// Timestamp field name is empty
    #[error("Timestamp field name is empty")]
    EmptyTimestampField,

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {reason}")]
    Parse {
        /// Parser message
        reason: String,
    },

    /// Configuration file could not be read
    #[error("Failed to read configuration file: {reason}")]
    Io {
        /// I/O error message
        reason: String,
    },
}

/// Configuration of a single guard instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// URL of the remote metadata this guard tracks
    pub remote_source: String,
    /// Prefix `remote_source` must start with
    pub source_prefix: String,
    /// Object and method invoked once a mismatch is known
    pub notify_target: Option<NotifyTarget>,
    /// Metadata field holding the last-modified timestamp
    pub timestamp_field: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            remote_source: String::new(),
            source_prefix: DEFAULT_SOURCE_PREFIX.to_string(),
            notify_target: None,
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
        }
    }
}

impl GuardConfig {
    /// Create a configuration tracking `remote_source`
    pub fn new(remote_source: impl Into<String>) -> Self {
        Self {
            remote_source: remote_source.into(),
            ..Self::default()
        }
    }

    /// Set the notify target
    pub fn with_notify_target(mut self, target: NotifyTarget) -> Self {
        self.notify_target = Some(target);
        self
    }

    /// Override the required source prefix
    pub fn with_source_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_prefix = prefix.into();
        self
    }

    /// Override the timestamp field name
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// Parse a TOML configuration
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Load a TOML configuration file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    /// Collect every configuration problem. Empty means valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if !self.remote_source.starts_with(&self.source_prefix) {
            problems.push(ConfigError::InvalidSource {
                source_url: self.remote_source.clone(),
                prefix: self.source_prefix.clone(),
            });
        }

        match &self.notify_target {
            None => problems.push(ConfigError::MissingNotifyTarget),
            Some(target) => {
                if target.object.trim().is_empty() {
                    problems.push(ConfigError::MissingNotifyObject);
                }
                if target.method.trim().is_empty() {
                    problems.push(ConfigError::MissingNotifyMethod);
                }
            }
        }

        if self.timestamp_field.trim().is_empty() {
            problems.push(ConfigError::EmptyTimestampField);
        }

        problems
    }
}
