//! # solr-mongo-migrate
//!
//! Batch reindexing from Solr cores into MongoDB collections.
//!
//! Each job empties one target collection, pages through one source core with
//! deep-paging cursors, normalizes every record for its collection, and
//! upserts each page keyed on `_id`. Jobs run one at a time in a fixed order
//! and the first failure stops the run.
//!
//! - **Cursor paging** over `q=*:*` sorted by primary key
//! - **Per-collection transforms** chosen from a dispatch table
//! - **Idempotent writes**: whole-document replace with upsert
//! - **One target connection** per run, always closed
//!
//! ## Example
//!
//! ```rust,no_run
//! use solr_mongo_migrate::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> solr_mongo_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run(&CancellationToken::new()).await?;
//!     println!("Migrated {} records", result.records_written);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod target;
pub mod transform;

// Re-exports for convenient access
pub use config::{Config, SourceConfig, TargetConfig};
pub use crate::core::{FieldValue, NormalizedRecord, RawRecord};
pub use error::{MigrateError, Result};
pub use orchestrator::{HealthCheckResult, MigrationResult, Orchestrator, RECOVERY_HINT};
pub use pipeline::{JobResult, JobSpec, JobState, MigrationJob};
pub use source::{Page, PageRequest, SearchSource, SolrClient, SourceCursor};
pub use target::{BatchUpserter, DocumentStore, MongoStore};
pub use transform::TransformKind;
