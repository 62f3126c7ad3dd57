//! Migration pipeline.
//!
//! - [`JobSpec`]: immutable description of one core-to-collection migration
//! - [`MigrationJob`]: clear, page, transform, upsert for one job
//! - [`catalog`]: the fixed, ordered list of jobs a run executes

pub mod catalog;
mod job;

pub use catalog::{default_jobs, select_jobs};
pub use job::{JobResult, JobSpec, JobState, MigrationJob, DEFAULT_SORT_FIELD};
