//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment, reading `.env` first.
    ///
    /// Recognised variables: `SOLR_HOST`, `SOLR_PORT`, `SOLR_PROTOCOL`,
    /// `SOLR_USERNAME`, `SOLR_PASSWORD`, `MONGO_HOST`, `MONGO_USERNAME`,
    /// `MONGO_PASSWORD`, `MONGO_DB`, `MONGO_URI`.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal outside local development.
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("SOLR_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                MigrateError::Config(format!("SOLR_PORT must be a port number, got '{}'", raw))
            })?,
            None => types::default_solr_port(),
        };

        let config = Config {
            source: SourceConfig {
                protocol: var("SOLR_PROTOCOL").unwrap_or_else(|| "http".to_string()),
                host: var("SOLR_HOST").unwrap_or_default(),
                port,
                path: types::default_solr_path(),
                username: var("SOLR_USERNAME"),
                password: var("SOLR_PASSWORD"),
                timeout_secs: types::default_timeout_secs(),
            },
            target: TargetConfig {
                uri: var("MONGO_URI"),
                host: var("MONGO_HOST").unwrap_or_default(),
                port: None,
                username: var("MONGO_USERNAME").unwrap_or_default(),
                password: var("MONGO_PASSWORD").unwrap_or_default(),
                database: var("MONGO_DB").unwrap_or_default(),
                auth_source: None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}
