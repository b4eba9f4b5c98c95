//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Output style of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `2024-01-15T10:30:00.123Z INFO message`
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Human }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("PORTCULLIS_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("PORTCULLIS_LOG_FORMAT") {
            match format.trim().to_lowercase().as_str() {
                "json" => self.format = LogFormat::Json,
                "human" => self.format = LogFormat::Human,
                other => log::warn!("Ignoring unknown PORTCULLIS_LOG_FORMAT '{}'", other),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level_filter().is_none() {
            bail!("unknown log level '{}'", self.level);
        }
        Ok(())
    }

    /// Parsed level, `None` when the configured name is not a log level
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.level.trim().parse().ok()
    }
}
