//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source search service configuration (Solr).
    pub source: SourceConfig,

    /// Target document store configuration (MongoDB).
    pub target: TargetConfig,
}

/// Source search service (Solr) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL scheme: "http" or "https" (default: "http").
    #[serde(default = "default_http")]
    pub protocol: String,

    /// Service host.
    pub host: String,

    /// Service port (default: 8983).
    #[serde(default = "default_solr_port")]
    pub port: u16,

    /// Path prefix in front of the core name (default: "/solr").
    #[serde(default = "default_solr_path")]
    pub path: String,

    /// Optional basic-auth username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Optional basic-auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request timeout in seconds (default: 120).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Base URL for a core, e.g. `http://solr:8983/solr/d3_posts`.
    pub fn core_url(&self, core: &str) -> String {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("{}://{}:{}/{}", self.protocol, self.host, self.port, core)
        } else {
            format!(
                "{}://{}:{}/{}/{}",
                self.protocol, self.host, self.port, path, core
            )
        }
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Target document store (MongoDB) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Full connection URI. When set, host and credentials are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Host, optionally with ":port".
    #[serde(default)]
    pub host: String,

    /// Port appended to host when host carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username.
    #[serde(default)]
    pub username: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Database holding the target collections.
    pub database: String,

    /// Authentication database (e.g. "admin").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_source: Option<String>,
}

impl TargetConfig {
    /// Build a MongoDB connection string.
    pub fn connection_string(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }

        let host = match self.port {
            Some(port) if !self.host.contains(':') => format!("{}:{}", self.host, port),
            _ => self.host.clone(),
        };

        let mut uri = if self.username.is_empty() {
            format!("mongodb://{}", host)
        } else {
            format!(
                "mongodb://{}:{}@{}",
                urlencoding::encode(&self.username),
                urlencoding::encode(&self.password),
                host
            )
        };

        if let Some(auth_source) = &self.auth_source {
            uri.push_str(&format!("/?authSource={}", urlencoding::encode(auth_source)));
        }

        uri
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("uri", &self.uri.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("auth_source", &self.auth_source)
            .finish()
    }
}

// Default value functions for serde
fn default_http() -> String {
    "http".to_string()
}

pub(crate) fn default_solr_port() -> u16 {
    8983
}

pub(crate) fn default_solr_path() -> String {
    "/solr".to_string()
}

pub(crate) fn default_timeout_secs() -> u64 {
    120
}
