//! Source search service access.
//!
//! - [`SearchSource`]: one cursor-paginated page fetch against a core
//! - [`SolrClient`]: the HTTP implementation
//! - [`SourceCursor`]: lazy, non-restartable page sequence over one core

mod cursor;
mod solr;

pub use cursor::{CursorPage, SourceCursor};
pub use solr::SolrClient;

use async_trait::async_trait;

use crate::core::RawRecord;
use crate::error::Result;

/// Start-of-stream cursor token.
pub const CURSOR_START: &str = "*";

/// A single page request: match-all, sorted ascending by `sort_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Core to query.
    pub core: String,
    /// Records per page.
    pub rows: usize,
    /// Primary-key field the cursor is relative to.
    pub sort_field: String,
    /// Cursor token to start from.
    pub cursor: String,
}

/// One page of results plus the token for the next page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records in primary-key order.
    pub records: Vec<RawRecord>,
    /// Token to request the following page. None if the service sent none.
    pub next_cursor: Option<String>,
}

/// Read-only access to a cursor-paginated search service.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Fetch one page. Failures surface as `MigrateError::SourceUnavailable`.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;

    /// Cheap reachability probe for a core.
    async fn ping(&self, core: &str) -> Result<()>;

    /// Source type identifier.
    fn source_type(&self) -> &str;
}
