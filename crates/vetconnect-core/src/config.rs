//! Runtime configuration.
//!
//! Read once at startup from a JSON document. Every field has a default, so
//! `{}` is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::Language;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which reminders are raised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReminderConfig {
    /// Alert one day before an appointment.
    pub day_before: bool,
    /// Alert within the hour before an appointment.
    pub hour_before: bool,
    /// Day-before alerts for medication doses (off: doses are too frequent).
    pub day_before_for_medication: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            day_before: true,
            hour_before: true,
            day_before_for_medication: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreConfig {
    pub language: Language,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"vetconnect_core=debug"`.
    pub log_filter: String,
    pub reminders: ReminderConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            log_filter: "info".into(),
            reminders: ReminderConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded config");
        Ok(config)
    }
}
