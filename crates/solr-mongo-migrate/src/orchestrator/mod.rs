//! Migration orchestrator - main workflow coordinator.

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::pipeline::{default_jobs, select_jobs, JobResult, JobSpec, MigrationJob};
use crate::source::{SearchSource, SolrClient};
use crate::target::{DocumentStore, MongoStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// What an interrupted run leaves behind and how to repair it.
pub const RECOVERY_HINT: &str = "Collections migrated before the failure were fully refreshed. \
The failing collection is empty or partially filled. Later collections were not touched. \
Re-run the pipeline, or only the failing collection with `run --only <collection>`.";

/// Migration orchestrator.
///
/// Owns the source client and the single target connection for the whole
/// run. Jobs run one after another in catalog order; the first failure stops
/// the run.
pub struct Orchestrator {
    source: Arc<dyn SearchSource>,
    store: Arc<dyn DocumentStore>,
    jobs: Vec<JobSpec>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: completed, failed or cancelled.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Jobs in the run.
    pub jobs_total: usize,

    /// Jobs that reached `Done`.
    pub jobs_success: usize,

    /// Jobs that failed (at most one, the run stops there).
    pub jobs_failed: usize,

    /// Jobs never started because an earlier one failed.
    pub jobs_skipped: Vec<String>,

    /// Records written across all jobs.
    pub records_written: u64,

    /// Records skipped for lacking a primary key.
    pub records_rejected: u64,

    /// Per-job results in run order.
    pub jobs: Vec<JobResult>,

    /// Error that stopped the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationResult {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether every job reached `Done`.
    pub fn succeeded(&self) -> bool {
        self.status == "completed"
    }
}

/// Health check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Whether every source core answered.
    pub source_connected: bool,

    /// Total source ping time in milliseconds.
    pub source_latency_ms: u64,

    /// First source error, if any.
    pub source_error: Option<String>,

    /// Whether the target answered.
    pub target_connected: bool,

    /// Target ping time in milliseconds.
    pub target_latency_ms: u64,

    /// Target error, if any.
    pub target_error: Option<String>,

    /// Both sides reachable.
    pub healthy: bool,
}

impl Orchestrator {
    /// Build the source client and connect to the target.
    ///
    /// The target is pinged before any job starts, so an unreachable store
    /// fails here with `MigrateError::Connection`.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let source = SolrClient::new(&config.source)?;
        info!(
            "Source: {} at {}",
            source.source_type(),
            config.source.core_url("")
        );

        let store = MongoStore::connect(&config.target).await?;

        Ok(Self::from_parts(Arc::new(source), Arc::new(store)))
    }

    /// Build both clients without contacting either service.
    ///
    /// For [`Orchestrator::health_check`], which reports an unreachable
    /// target instead of failing on it.
    pub async fn unconnected(config: Config) -> Result<Self> {
        config.validate()?;

        let source = SolrClient::new(&config.source)?;
        let store = MongoStore::open(&config.target).await?;

        Ok(Self::from_parts(Arc::new(source), Arc::new(store)))
    }

    /// Assemble an orchestrator from already-built clients, running the
    /// default catalog.
    pub fn from_parts(source: Arc<dyn SearchSource>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            source,
            store,
            jobs: default_jobs(),
        }
    }

    /// Replace the job list.
    pub fn with_jobs(mut self, jobs: Vec<JobSpec>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Restrict the run to the named collections, keeping catalog order.
    pub fn only(mut self, collections: &[String]) -> Result<Self> {
        self.jobs = select_jobs(self.jobs, collections)?;
        Ok(self)
    }

    /// Jobs this orchestrator will run, in order.
    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    /// Run all jobs and close the target connection.
    pub async fn run(self, cancel: &CancellationToken) -> Result<MigrationResult> {
        let (result, outcome) = self.run_with_summary(cancel).await;
        outcome.map(|()| result)
    }

    /// Run all jobs and close the target connection, returning the summary
    /// even when a job failed.
    pub async fn run_with_summary(
        self,
        cancel: &CancellationToken,
    ) -> (MigrationResult, Result<()>) {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting migration run: {} ({} jobs)", run_id, self.jobs.len());

        let mut results = Vec::with_capacity(self.jobs.len());
        let mut outcome = Ok(());

        for spec in &self.jobs {
            let mut job = MigrationJob::new(spec.clone());
            let run = job
                .run(self.source.as_ref(), self.store.as_ref(), cancel)
                .await;
            results.push(job.into_result());

            if let Err(e) = run {
                outcome = Err(e);
                break;
            }
        }

        // Teardown on every path, including cancellation.
        self.store.close().await;
        info!("Target connection closed");

        let completed_at = Utc::now();
        let result = self.summarize(run_id, started_at, completed_at, results, &outcome);

        match &outcome {
            Ok(()) => info!(
                "Migration {}: {} jobs, {} records written, {} rejected in {:.1}s",
                result.status,
                result.jobs_total,
                result.records_written,
                result.records_rejected,
                result.duration_seconds
            ),
            Err(e) => {
                error!("Migration {}: {}", result.status, e);
                if !result.jobs_skipped.is_empty() {
                    warn!("Not started: {}", result.jobs_skipped.join(", "));
                }
            }
        }

        (result, outcome)
    }

    fn summarize(
        &self,
        run_id: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        jobs: Vec<JobResult>,
        outcome: &Result<()>,
    ) -> MigrationResult {
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let status = match outcome {
            Ok(()) => "completed",
            Err(MigrateError::Cancelled) => "cancelled",
            Err(_) => "failed",
        };

        let jobs_success = jobs.iter().filter(|j| j.succeeded()).count();
        let jobs_failed = jobs.len() - jobs_success;
        let jobs_skipped = self.jobs[jobs.len()..]
            .iter()
            .map(|s| s.target_collection.clone())
            .collect();

        MigrationResult {
            run_id,
            status: status.to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            jobs_total: self.jobs.len(),
            jobs_success,
            jobs_failed,
            jobs_skipped,
            records_written: jobs.iter().map(|j| j.records_written).sum(),
            records_rejected: jobs.iter().map(|j| j.records_rejected).sum(),
            jobs,
            error: outcome.as_ref().err().map(|e| e.to_string()),
        }
    }

    /// Ping every source core in the run and the target.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let source_start = Instant::now();
        let mut source_error = None;
        for spec in &self.jobs {
            if let Err(e) = self.source.ping(&spec.source_core).await {
                source_error = Some(e.to_string());
                break;
            }
        }
        let source_latency_ms = source_start.elapsed().as_millis() as u64;

        let target_start = Instant::now();
        let target_error = self.store.ping().await.err().map(|e| e.to_string());
        let target_latency_ms = target_start.elapsed().as_millis() as u64;

        let source_connected = source_error.is_none();
        let target_connected = target_error.is_none();

        Ok(HealthCheckResult {
            source_connected,
            source_latency_ms,
            source_error,
            target_connected,
            target_latency_ms,
            target_error,
            healthy: source_connected && target_connected,
        })
    }

    /// Close the target connection without running.
    pub async fn close(self) {
        self.store.close().await;
    }
}
