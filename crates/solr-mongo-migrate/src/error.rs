//! Error types for the reindexing pipeline.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport, status or decode failure against the search service.
    #[error("Source core {core} unavailable: {message}")]
    SourceUnavailable { core: String, message: String },

    /// Bulk write rejected by the document store.
    #[error("Write failed for collection {collection} (batch {batch}): {message}")]
    Write {
        collection: String,
        batch: usize,
        message: String,
    },

    /// Record without a usable primary key. Counted and skipped by jobs.
    #[error("Malformed record: missing primary key field '{field}'")]
    MalformedRecord { field: String },

    /// Document store unreachable at connect, clear or teardown time.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a SourceUnavailable error for a core.
    pub fn source_unavailable(core: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::SourceUnavailable {
            core: core.into(),
            message: message.to_string(),
        }
    }

    /// Create a Write error for a batch of a collection.
    pub fn write(collection: impl Into<String>, batch: usize, message: impl ToString) -> Self {
        MigrateError::Write {
            collection: collection.into(),
            batch,
            message: message.to_string(),
        }
    }

    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            MigrateError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
