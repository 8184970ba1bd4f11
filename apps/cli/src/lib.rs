//! # tzpass CLI
//!
//! Command-line front end over [`tzpass_vault`], driving a development
//! [`tzpass_oracle::SoftOracle`] in place of the hardware device.

pub mod args;
pub mod commands;
pub mod config;
pub mod device;

use crate::config::LoggingSettings;
use anyhow::{Context, Result};
use tzpass_logger::{LevelFilter, Logger};

/// Installs the global logger described by `settings`.
///
/// # Errors
/// Returns an error for an unknown level or if the logger cannot be initialized.
pub fn init_logger(settings: &LoggingSettings) -> Result<Logger> {
    let level: LevelFilter = settings
        .level
        .parse()
        .with_context(|| format!("Unknown log level '{}'", settings.level))?;

    let mut builder = Logger::builder(env!("CARGO_PKG_NAME")).console(true).level(level);
    if let Some(directory) = &settings.directory {
        builder = builder.directory(directory).json(settings.json);
    }
    Ok(builder.init()?)
}
