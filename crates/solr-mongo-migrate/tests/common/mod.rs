//! In-memory source and store used by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use solr_mongo_migrate::{
    DocumentStore, FieldValue, MigrateError, NormalizedRecord, Page, PageRequest, RawRecord,
    Result, SearchSource,
};
use tokio_util::sync::CancellationToken;

pub fn raw(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Serves each core's records in the order given, with opaque offset tokens.
/// Past the end it returns an empty page and echoes the token, as Solr does.
#[derive(Default)]
pub struct MemorySource {
    cores: HashMap<String, Vec<RawRecord>>,
    requests: Mutex<Vec<PageRequest>>,
    cancel_on_fetch: Option<(usize, CancellationToken)>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_core(mut self, core: &str, records: Vec<RawRecord>) -> Self {
        self.cores.insert(core.to_string(), records);
        self
    }

    /// Fire `token` during the `nth` fetch (0-based) and never answer it.
    pub fn cancel_on_fetch(mut self, nth: usize, token: CancellationToken) -> Self {
        self.cancel_on_fetch = Some((nth, token));
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn offset(token: &str) -> usize {
    token
        .strip_prefix("AoE")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl SearchSource for MemorySource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        self.requests.lock().unwrap().push(request.clone());

        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some((nth, token)) = &self.cancel_on_fetch {
            if n == *nth {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }

        let records = self
            .cores
            .get(&request.core)
            .ok_or_else(|| MigrateError::source_unavailable(&request.core, "HTTP 404: no such core"))?;

        let start = offset(&request.cursor).min(records.len());
        let end = (start + request.rows).min(records.len());
        let next = if start == end {
            request.cursor.clone()
        } else {
            format!("AoE{}", end)
        };

        Ok(Page {
            records: records[start..end].to_vec(),
            next_cursor: Some(next),
        })
    }

    async fn ping(&self, core: &str) -> Result<()> {
        if self.cores.contains_key(core) {
            Ok(())
        } else {
            Err(MigrateError::source_unavailable(core, "HTTP 404: no such core"))
        }
    }

    fn source_type(&self) -> &str {
        "memory"
    }
}

/// Collections keyed by `_id`, with optional write failure injection.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, NormalizedRecord>>>,
    batches: Mutex<Vec<(String, Vec<FieldValue>)>>,
    fail_collection: Option<String>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write to `collection`.
    pub fn failing_on(collection: &str) -> Self {
        Self {
            fail_collection: Some(collection.to_string()),
            ..Default::default()
        }
    }

    /// Put a leftover document into a collection.
    pub fn seed(&self, collection: &str, id: i64) {
        let record = NormalizedRecord::new(FieldValue::Int(id), BTreeMap::new());
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(key(&record), record);
    }

    pub fn documents(&self, collection: &str) -> Vec<NormalizedRecord> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ids(&self, collection: &str) -> Vec<FieldValue> {
        self.documents(collection)
            .into_iter()
            .map(|r| r.id().clone())
            .collect()
    }

    /// Ids of each batch written to `collection`, in write order.
    pub fn batches(&self, collection: &str) -> Vec<Vec<FieldValue>> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, ids)| ids.clone())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn key(record: &NormalizedRecord) -> String {
    format!("{:?}", record.id())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn clear(&self, collection: &str) -> Result<u64> {
        let removed = self
            .collections
            .lock()
            .unwrap()
            .remove(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0);
        Ok(removed)
    }

    async fn replace_batch(&self, collection: &str, records: &[NormalizedRecord]) -> Result<u64> {
        if self.fail_collection.as_deref() == Some(collection) {
            return Err(MigrateError::write(collection, 0, "injected write failure"));
        }

        self.batches.lock().unwrap().push((
            collection.to_string(),
            records.iter().map(|r| r.id().clone()).collect(),
        ));

        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        for record in records {
            docs.insert(key(record), record.clone());
        }
        Ok(records.len() as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn store_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// `n` dirty-schema records with ids 1..=n.
pub fn dirty_records(n: usize) -> Vec<RawRecord> {
    (1..=n)
        .map(|i| {
            raw(json!({
                "id": i.to_string(),
                "version": "1",
                "_version_": 1_700_000_000_000_i64 + i as i64,
                "user_id": (i % 7).to_string(),
                "post_id": (i % 11).to_string(),
                "body": format!("comment {i}"),
                "created": "2021-05-01T00:00:00Z",
            }))
        })
        .collect()
}

/// `n` ftp link records keyed by `CommentId`.
pub fn ftp_link_records(n: usize) -> Vec<RawRecord> {
    (1..=n)
        .map(|i| {
            raw(json!({
                "id": format!("link-{i}"),
                "CommentId": i.to_string(),
                "UserId": "3",
                "PostId": "4",
                "IsExtracted": true,
                "Longitude": "12.5",
                "Latitude": "0",
            }))
        })
        .collect()
}

/// `n` ftp post records.
pub fn ftp_post_records(n: usize) -> Vec<RawRecord> {
    (1..=n)
        .map(|i| {
            raw(json!({
                "id": i.to_string(),
                "Title": "t",
                "IsFound": i % 2 == 0,
                "Longitude": "0",
                "Latitude": "48.1",
                "FoundById": "",
                "FoundDate": "2020-01-02T03:04:05Z",
            }))
        })
        .collect()
}

/// A source holding `n` records in every catalog core.
pub fn full_source(n: usize) -> MemorySource {
    MemorySource::new()
        .with_core("d3_posts", dirty_records(n))
        .with_core("d3_users", dirty_records(n))
        .with_core("d3_comments", dirty_records(n))
        .with_core("ftp_links", ftp_link_records(n))
        .with_core("ftp_posts", ftp_post_records(n))
}
