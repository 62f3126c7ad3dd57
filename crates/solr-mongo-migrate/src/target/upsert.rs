//! Idempotent batch writes against one target collection.

use tracing::debug;

use super::DocumentStore;
use crate::core::NormalizedRecord;
use crate::error::{MigrateError, Result};

/// Writes successive batches of normalized records to one collection.
///
/// Every write replaces whole documents keyed by `_id`, so re-sending a
/// batch converges to the same stored state.
pub struct BatchUpserter<'a> {
    store: &'a dyn DocumentStore,
    collection: String,
    batches_written: usize,
    records_written: u64,
}

impl<'a> BatchUpserter<'a> {
    /// Create an upserter for a collection.
    pub fn new(store: &'a dyn DocumentStore, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            batches_written: 0,
            records_written: 0,
        }
    }

    /// Write one batch. An empty batch issues no request.
    ///
    /// Failures are reported as `MigrateError::Write` carrying the 0-based
    /// index of the failed batch.
    pub async fn upsert(&mut self, records: &[NormalizedRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let batch = self.batches_written;
        let written = self
            .store
            .replace_batch(&self.collection, records)
            .await
            .map_err(|e| match e {
                MigrateError::Write { message, .. } => {
                    MigrateError::write(self.collection.as_str(), batch, message)
                }
                other => MigrateError::write(self.collection.as_str(), batch, other),
            })?;

        debug!(
            "{}: batch {} wrote {} of {} records",
            self.collection,
            batch,
            written,
            records.len()
        );

        self.batches_written += 1;
        self.records_written += written;
        Ok(written)
    }

    /// Batches successfully written so far.
    pub fn batches_written(&self) -> usize {
        self.batches_written
    }

    /// Records successfully written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}
