//! Migration job: one core into one collection.
//!
//! A job clears its target collection, then pages through the source core,
//! transforming and upserting each page before fetching the next:
//!
//! ```text
//! Init -> Clearing -> Paging -> Draining -> Done
//!            \           |          /
//!             +------> Failed <----+
//! ```
//!
//! A failed job leaves its collection empty or partially filled. Re-running
//! the job from scratch repairs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{MigrateError, Result};
use crate::source::{SearchSource, SourceCursor, CURSOR_START};
use crate::target::{BatchUpserter, DocumentStore};
use crate::transform::TransformKind;

/// Default primary-key sort field in the source cores.
pub const DEFAULT_SORT_FIELD: &str = "id";

/// Immutable description of one migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Source core name.
    pub source_core: String,

    /// Target collection name.
    pub target_collection: String,

    /// Transform variant applied to every record.
    pub transform: TransformKind,

    /// Records per page (and per write batch).
    pub page_size: usize,

    /// Field the cursor sorts on.
    pub sort_field: String,
}

impl JobSpec {
    /// Create a job sorted on the default `id` field.
    pub fn new(
        source_core: impl Into<String>,
        target_collection: impl Into<String>,
        transform: TransformKind,
        page_size: usize,
    ) -> Self {
        Self {
            source_core: source_core.into(),
            target_collection: target_collection.into(),
            transform,
            page_size,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
        }
    }

    /// Override the sort field.
    pub fn with_sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort_field = field.into();
        self
    }
}

/// Job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Init,
    Clearing,
    Paging,
    Draining,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Init => "init",
            JobState::Clearing => "clearing",
            JobState::Paging => "paging",
            JobState::Draining => "draining",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome and counters of one job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Source core.
    pub source_core: String,

    /// Target collection.
    pub collection: String,

    /// Final state.
    pub state: JobState,

    /// Documents deleted while clearing.
    pub cleared: u64,

    /// Pages fetched from the source.
    pub pages: usize,

    /// Records received from the source.
    pub records_read: u64,

    /// Records written to the target.
    pub records_written: u64,

    /// Records skipped for lacking a primary key.
    pub records_rejected: u64,

    /// Last cursor token reached.
    pub last_cursor: String,

    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,

    /// Error message if the job failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    fn new(spec: &JobSpec) -> Self {
        Self {
            source_core: spec.source_core.clone(),
            collection: spec.target_collection.clone(),
            state: JobState::Init,
            cleared: 0,
            pages: 0,
            records_read: 0,
            records_written: 0,
            records_rejected: 0,
            last_cursor: CURSOR_START.to_string(),
            duration_seconds: 0.0,
            error: None,
        }
    }

    /// Whether the job reached `Done`.
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Done
    }
}

/// A single end-to-end migration of one collection.
pub struct MigrationJob {
    spec: JobSpec,
    state: JobState,
    result: JobResult,
}

impl MigrationJob {
    /// Create a job in the `Init` state.
    pub fn new(spec: JobSpec) -> Self {
        let result = JobResult::new(&spec);
        Self {
            spec,
            state: JobState::Init,
            result,
        }
    }

    /// The job descriptor.
    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Counters so far (complete once `run` returns).
    pub fn result(&self) -> &JobResult {
        &self.result
    }

    /// Consume the job, returning its counters.
    pub fn into_result(self) -> JobResult {
        self.result
    }

    /// Run the job to `Done` or `Failed`.
    ///
    /// Cancellation is observed at every I/O boundary and fails the job with
    /// `MigrateError::Cancelled`.
    pub async fn run(
        &mut self,
        source: &dyn SearchSource,
        store: &dyn DocumentStore,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let start = Instant::now();
        info!(
            "{} -> {}: starting (transform: {}, page size: {})",
            self.spec.source_core,
            self.spec.target_collection,
            self.spec.transform,
            self.spec.page_size
        );

        let outcome = self.execute(source, store, cancel).await;
        self.result.duration_seconds = start.elapsed().as_secs_f64();

        match &outcome {
            Ok(()) => {
                self.transition(JobState::Done);
                info!(
                    "{}: migration complete ({} written, {} rejected, {} pages in {:.1}s)",
                    self.spec.target_collection,
                    self.result.records_written,
                    self.result.records_rejected,
                    self.result.pages,
                    self.result.duration_seconds
                );
            }
            Err(e) => {
                let failed_in = self.state;
                self.transition(JobState::Failed);
                self.result.error = Some(e.to_string());
                error!(
                    "{}: failed while {} after {} records: {}",
                    self.spec.target_collection, failed_in, self.result.records_written, e
                );
            }
        }

        outcome
    }

    async fn execute(
        &mut self,
        source: &dyn SearchSource,
        store: &dyn DocumentStore,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let collection = self.spec.target_collection.clone();

        self.transition(JobState::Clearing);
        self.result.cleared = cancellable(cancel, store.clear(&collection)).await?;
        info!("{}: cleared {} documents", collection, self.result.cleared);

        self.transition(JobState::Paging);
        let transform = self.spec.transform.function();
        let mut cursor = SourceCursor::open(
            source,
            self.spec.source_core.as_str(),
            self.spec.page_size,
            self.spec.sort_field.as_str(),
        );
        let mut upserter = BatchUpserter::new(store, collection.as_str());

        loop {
            let page = cancellable(cancel, cursor.next()).await?;
            self.result.pages = cursor.pages_fetched();
            self.result.last_cursor = cursor.token().to_string();

            let read = page.records.len();
            let mut batch = Vec::with_capacity(read);
            let mut rejected = 0u64;
            for raw in page.records {
                match transform(raw) {
                    Ok(record) => batch.push(record),
                    Err(r) => {
                        rejected += 1;
                        debug!("{}: {}", collection, MigrateError::from(r));
                    }
                }
            }

            self.result.records_read += read as u64;
            self.result.records_rejected += rejected;
            if rejected > 0 {
                warn!(
                    "{}: skipped {} of {} records without a primary key",
                    collection, rejected, read
                );
            }

            let written = cancellable(cancel, upserter.upsert(&batch)).await?;
            self.result.records_written += written;

            if read > 0 {
                info!(
                    "{}: migrated {} docs, next cursor={}",
                    collection,
                    written,
                    cursor.token()
                );
            }

            if page.done {
                break;
            }
        }

        // Every page was written as it arrived; nothing is buffered.
        self.transition(JobState::Draining);
        Ok(())
    }

    fn transition(&mut self, next: JobState) {
        debug!(
            "{}: {} -> {}",
            self.spec.target_collection, self.state, next
        );
        self.state = next;
        self.result.state = next;
    }
}

/// Await `fut` unless the token fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MigrateError::Cancelled),
        result = fut => result,
    }
}
