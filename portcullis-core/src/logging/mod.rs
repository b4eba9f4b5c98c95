//! Logger initialisation
//!
//! Every module logs through the standard `log` macros; this module installs
//! an `env_logger` backend once at startup. `RUST_LOG` still refines the
//! configured level per module.
//!
//! ```rust,no_run
//! use portcullis_core::config::LoggingConfig;
//!
//! portcullis_core::logging::init_logging(&LoggingConfig::default()).unwrap();
//! log::info!("Router ready");
//! ```

use std::io::Write;
use std::sync::Once;

use anyhow::Context;

use crate::config::{LogFormat, LoggingConfig};

static INIT: Once = Once::new();

/// Install the logger described by `config`
///
/// Safe to call multiple times; only the first call has an effect. An
/// invalid level is reported before anything is installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    config.validate().context("invalid logging configuration")?;

    INIT.call_once(|| {
        // Another logger may already be installed by the host application
        let _ = builder(config).try_init();
    });
    Ok(())
}

fn builder(config: &LoggingConfig) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.level_filter().unwrap_or(log::LevelFilter::Info));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    match config.format {
        LogFormat::Human => {
            builder.format_timestamp_millis().format_module_path(false);
        }
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "timestamp": buf.timestamp_millis().to_string(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "message": record.args().to_string(),
                });
                writeln!(buf, "{}", line)
            });
        }
    }
    builder
}
