//! Configuration system for Portcullis
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** (`PORTCULLIS_*`)
//! 2. **Config File** (portcullis.toml)
//! 3. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use portcullis_core::config::PortcullisConfig;
//!
//! let config = PortcullisConfig::load()?;
//! config.validate()?;
//! let global = config.security.global_security()?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [security]
//! strategy = "affirmative"
//!
//! [security.role_hierarchy]
//! ROLE_ADMIN = ["ROLE_USER"]
//!
//! [[security.access_control]]
//! kind = "prefix"
//! path = "/admin"
//! attributes = ["ROLE_ADMIN"]
//! ```

pub mod logging;
pub mod security;

pub use logging::{LogFormat, LoggingConfig};
pub use security::{AccessControlRuleConfig, SecuritySettings};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "portcullis.toml";

/// Complete Portcullis configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortcullisConfig {
    pub logging: LoggingConfig,
    pub security: SecuritySettings,
}

impl PortcullisConfig {
    /// Load `portcullis.toml` (if present) over the defaults, then the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file; a missing file leaves the defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.logging.merge(other.logging);
        self.security.merge(other.security);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.logging.apply_env_vars();
        self.security.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.security.validate()?;
        Ok(())
    }
}
