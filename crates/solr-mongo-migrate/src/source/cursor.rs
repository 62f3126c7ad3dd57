//! Cursor-driven deep pagination over one core.

use tracing::debug;

use super::{PageRequest, SearchSource, CURSOR_START};
use crate::core::RawRecord;
use crate::error::Result;

/// Records from one fetch and whether the stream has ended.
///
/// A final page may still carry records (the service can return the last
/// records together with an unchanged token); they must be processed.
#[derive(Debug, Default)]
pub struct CursorPage {
    /// Records in ascending primary-key order.
    pub records: Vec<RawRecord>,
    /// True when no further page will be produced.
    pub done: bool,
}

/// Lazy, finite, non-restartable sequence of pages over one core.
///
/// Holds only the current token, never more than one page of records.
pub struct SourceCursor<'a> {
    source: &'a dyn SearchSource,
    core: String,
    page_size: usize,
    sort_field: String,
    token: String,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a> SourceCursor<'a> {
    /// Open a cursor at the start of the core.
    pub fn open(
        source: &'a dyn SearchSource,
        core: impl Into<String>,
        page_size: usize,
        sort_field: impl Into<String>,
    ) -> Self {
        Self {
            source,
            core: core.into(),
            page_size: page_size.max(1),
            sort_field: sort_field.into(),
            token: CURSOR_START.to_string(),
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page.
    ///
    /// The stream ends when a page is empty or the returned token equals the
    /// one just used. Once ended, further calls return an empty final page
    /// without contacting the source. Errors end the stream as well.
    pub async fn next(&mut self) -> Result<CursorPage> {
        if self.exhausted {
            return Ok(CursorPage {
                records: Vec::new(),
                done: true,
            });
        }

        let request = PageRequest {
            core: self.core.clone(),
            rows: self.page_size,
            sort_field: self.sort_field.clone(),
            cursor: self.token.clone(),
        };

        let page = match self.source.fetch_page(&request).await {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        if page.records.is_empty() {
            debug!("{}: empty page at cursor {}, stream finished", self.core, self.token);
            self.exhausted = true;
            return Ok(CursorPage {
                records: Vec::new(),
                done: true,
            });
        }

        match page.next_cursor {
            Some(next) if next != self.token => {
                self.token = next;
            }
            Some(_) | None => {
                debug!("{}: cursor {} did not advance, stream finished", self.core, self.token);
                self.exhausted = true;
            }
        }

        Ok(CursorPage {
            records: page.records,
            done: self.exhausted,
        })
    }

    /// Current token (the one the next fetch will use).
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the stream has ended.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of fetches issued so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Core this cursor reads.
    pub fn core(&self) -> &str {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::source::Page;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<Page>>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchSource for ScriptedSource {
        async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
            self.requests.lock().unwrap().push(request.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page::default()))
        }

        async fn ping(&self, _core: &str) -> Result<()> {
            Ok(())
        }

        fn source_type(&self) -> &str {
            "scripted"
        }
    }

    fn page(ids: &[i64], next: Option<&str>) -> Result<Page> {
        Ok(Page {
            records: ids
                .iter()
                .map(|id| match json!({ "id": id }) {
                    serde_json::Value::Object(map) => map,
                    _ => unreachable!(),
                })
                .collect(),
            next_cursor: next.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_cursor_advances_tokens() {
        let source = ScriptedSource::new(vec![
            page(&[1, 2], Some("AoE1")),
            page(&[3, 4], Some("AoE2")),
            page(&[], Some("AoE2")),
        ]);
        let mut cursor = SourceCursor::open(&source, "d3_posts", 2, "id");

        let first = cursor.next().await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert!(!first.done);
        assert_eq!(cursor.token(), "AoE1");

        let second = cursor.next().await.unwrap();
        assert_eq!(second.records.len(), 2);
        assert!(!second.done);

        let third = cursor.next().await.unwrap();
        assert!(third.records.is_empty());
        assert!(third.done);

        let tokens: Vec<String> = source.requests().into_iter().map(|r| r.cursor).collect();
        assert_eq!(tokens, vec!["*", "AoE1", "AoE2"]);
    }

    #[tokio::test]
    async fn test_cursor_stalled_token_ends_stream_but_keeps_records() {
        let source = ScriptedSource::new(vec![page(&[1, 2], Some("*"))]);
        let mut cursor = SourceCursor::open(&source, "d3_users", 1000, "id");

        let only = cursor.next().await.unwrap();
        assert_eq!(only.records.len(), 2);
        assert!(only.done);
        assert!(cursor.is_exhausted());
    }

    #[tokio::test]
    async fn test_cursor_missing_token_treated_as_stall() {
        let source = ScriptedSource::new(vec![page(&[1], None)]);
        let mut cursor = SourceCursor::open(&source, "d3_users", 1000, "id");
        assert!(cursor.next().await.unwrap().done);
    }

    #[tokio::test]
    async fn test_cursor_not_restartable() {
        let source = ScriptedSource::new(vec![page(&[], Some("*"))]);
        let mut cursor = SourceCursor::open(&source, "d3_users", 1000, "id");

        assert!(cursor.next().await.unwrap().done);
        let again = cursor.next().await.unwrap();
        assert!(again.done);
        assert!(again.records.is_empty());
        assert_eq!(source.requests().len(), 1);
        assert_eq!(cursor.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn test_cursor_request_shape() {
        let source = ScriptedSource::new(vec![page(&[], None)]);
        let mut cursor = SourceCursor::open(&source, "ftp_links", 3000, "id");
        cursor.next().await.unwrap();

        let requests = source.requests();
        assert_eq!(
            requests[0],
            PageRequest {
                core: "ftp_links".to_string(),
                rows: 3000,
                sort_field: "id".to_string(),
                cursor: "*".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_cursor_error_aborts() {
        let source = ScriptedSource::new(vec![Err(MigrateError::source_unavailable(
            "d3_posts",
            "connection refused",
        ))]);
        let mut cursor = SourceCursor::open(&source, "d3_posts", 1000, "id");

        let err = cursor.next().await.unwrap_err();
        assert!(matches!(err, MigrateError::SourceUnavailable { .. }));
        assert!(cursor.is_exhausted());
        assert!(cursor.next().await.unwrap().done);
    }
}
