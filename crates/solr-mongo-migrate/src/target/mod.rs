//! Target document store operations.

mod mongo;
mod upsert;

pub use mongo::MongoStore;
pub use upsert::BatchUpserter;

use async_trait::async_trait;

use crate::core::NormalizedRecord;
use crate::error::Result;

/// Trait for target document store operations.
///
/// The pipeline only ever empties a collection and replaces documents by
/// primary key; it never reads from the store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Delete every document in a collection. Returns the number deleted.
    async fn clear(&self, collection: &str) -> Result<u64>;

    /// Replace-or-insert each record by `_id` in a single round trip.
    ///
    /// Returns the number of records matched or inserted.
    async fn replace_batch(&self, collection: &str, records: &[NormalizedRecord]) -> Result<u64>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Get the store type.
    fn store_type(&self) -> &str;

    /// Close all connections.
    async fn close(&self);
}
