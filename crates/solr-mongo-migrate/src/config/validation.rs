//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(MigrateError::Config("source.host is required".into()));
    }
    if config.source.port == 0 {
        return Err(MigrateError::Config("source.port must be non-zero".into()));
    }
    if !matches!(config.source.protocol.as_str(), "http" | "https") {
        return Err(MigrateError::Config(format!(
            "source.protocol must be 'http' or 'https', got '{}'",
            config.source.protocol
        )));
    }
    if config.source.password.is_some() && config.source.username.is_none() {
        return Err(MigrateError::Config(
            "source.password requires source.username".into(),
        ));
    }

    // Target validation
    match &config.target.uri {
        Some(uri) => {
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(MigrateError::Config(
                    "target.uri must start with mongodb:// or mongodb+srv://".into(),
                ));
            }
        }
        None => {
            if config.target.host.is_empty() {
                return Err(MigrateError::Config("target.host is required".into()));
            }
            if config.target.username.is_empty() != config.target.password.is_empty() {
                return Err(MigrateError::Config(
                    "target.username and target.password must be set together".into(),
                ));
            }
        }
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }

    Ok(())
}
