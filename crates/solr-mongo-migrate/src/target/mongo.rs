//! MongoDB target store.

use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, info};

use super::DocumentStore;
use crate::config::TargetConfig;
use crate::core::NormalizedRecord;
use crate::error::{MigrateError, Result};

const APP_NAME: &str = "solr-mongo-migrate";

/// Server document size limit assumed until `hello` reports the real one.
const DEFAULT_MAX_BSON_SIZE: usize = 16 * 1024 * 1024;

/// Bytes an entry costs inside the `updates` array beyond its own encoding:
/// element type, decimal index key and key terminator.
const ARRAY_ENTRY_OVERHEAD: usize = 1 + 7 + 1;

/// MongoDB store bound to one database.
pub struct MongoStore {
    client: Client,
    database: Database,
    max_bson_size: usize,
}

impl MongoStore {
    /// Connect and verify the server answers before any job starts.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut store = Self::open(config).await?;
        store.ping().await?;
        store.max_bson_size = store.server_max_bson_size().await;
        info!(
            "Connected to MongoDB database {} (max document size {} bytes)",
            config.database, store.max_bson_size
        );

        Ok(store)
    }

    /// Build the client without contacting the server.
    ///
    /// Connection problems surface on first use, e.g. from [`DocumentStore::ping`].
    pub async fn open(config: &TargetConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.connection_string())
            .await
            .map_err(|e| MigrateError::connection(e, "parsing target connection string"))?;
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)
            .map_err(|e| MigrateError::connection(e, "creating target client"))?;
        let database = client.database(&config.database);

        Ok(Self {
            client,
            database,
            max_bson_size: DEFAULT_MAX_BSON_SIZE,
        })
    }

    /// The bound database name.
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn server_max_bson_size(&self) -> usize {
        let reply = match self.database.run_command(doc! { "hello": 1 }).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("hello failed, assuming {} byte documents: {}", DEFAULT_MAX_BSON_SIZE, e);
                return DEFAULT_MAX_BSON_SIZE;
            }
        };
        match reply.get("maxBsonObjectSize") {
            Some(Bson::Int32(n)) if *n > 0 => *n as usize,
            Some(Bson::Int64(n)) if *n > 0 => *n as usize,
            _ => DEFAULT_MAX_BSON_SIZE,
        }
    }
}

fn update_entry(record: &NormalizedRecord) -> Document {
    doc! {
        "q": record.id_filter(),
        "u": record.to_document(),
        "upsert": true,
    }
}

fn update_command(collection: &str, updates: Vec<Document>) -> Document {
    doc! {
        "update": collection,
        "updates": updates,
        "ordered": true,
    }
}

fn encoded_len(collection: &str, document: &Document) -> Result<usize> {
    bson::to_vec(document)
        .map(|bytes| bytes.len())
        .map_err(|e| MigrateError::write(collection, 0, format!("encoding document: {}", e)))
}

/// Build ordered `update` commands carrying one upsert per record.
///
/// A page that encodes within `limit` bytes becomes a single command.
/// Larger pages are cut into consecutive commands that each fit, keeping
/// record order. A record too large on its own travels alone and is left to
/// the server to reject.
fn replace_commands(
    collection: &str,
    records: &[NormalizedRecord],
    limit: usize,
) -> Result<Vec<Document>> {
    let base = encoded_len(collection, &update_command(collection, Vec::new()))?;

    let mut commands = Vec::new();
    let mut current: Vec<Document> = Vec::new();
    let mut size = base;

    for record in records {
        let entry = update_entry(record);
        let entry_size = encoded_len(collection, &entry)? + ARRAY_ENTRY_OVERHEAD;

        if !current.is_empty() && size + entry_size > limit {
            commands.push(update_command(collection, std::mem::take(&mut current)));
            size = base;
        }

        size += entry_size;
        current.push(entry);
    }

    if !current.is_empty() {
        commands.push(update_command(collection, current));
    }

    Ok(commands)
}

fn part_message(message: impl ToString, part: usize, parts: usize) -> String {
    if parts > 1 {
        format!("{} (command {} of {})", message.to_string(), part + 1, parts)
    } else {
        message.to_string()
    }
}

/// Pull the first write error out of an `update` reply, if any.
fn reply_error(reply: &Document) -> Option<String> {
    if let Ok(errors) = reply.get_array("writeErrors") {
        if let Some(Bson::Document(first)) = errors.first() {
            let code = first.get_i32("code").unwrap_or_default();
            let message = first.get_str("errmsg").unwrap_or("unknown write error");
            return Some(format!(
                "{} write error(s), first: code {}: {}",
                errors.len(),
                code,
                message
            ));
        }
    }

    if let Ok(wc) = reply.get_document("writeConcernError") {
        let message = wc.get_str("errmsg").unwrap_or("unknown write concern error");
        return Some(format!("write concern error: {}", message));
    }

    None
}

fn reply_count(reply: &Document, fallback: usize) -> u64 {
    match reply.get("n") {
        Some(Bson::Int32(n)) => *n as u64,
        Some(Bson::Int64(n)) => *n as u64,
        _ => fallback as u64,
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn clear(&self, collection: &str) -> Result<u64> {
        let result = self
            .database
            .collection::<Document>(collection)
            .delete_many(doc! {})
            .await
            .map_err(|e| MigrateError::connection(e, format!("clearing collection {}", collection)))?;

        debug!("{}: deleted {} documents", collection, result.deleted_count);
        Ok(result.deleted_count)
    }

    async fn replace_batch(&self, collection: &str, records: &[NormalizedRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let commands = replace_commands(collection, records, self.max_bson_size)?;
        let parts = commands.len();
        if parts > 1 {
            debug!(
                "{}: {} records exceed {} bytes, sending {} update commands",
                collection,
                records.len(),
                self.max_bson_size,
                parts
            );
        }

        let mut written = 0;
        for (part, command) in commands.into_iter().enumerate() {
            let sent = command.get_array("updates").map(Vec::len).unwrap_or(0);

            let reply = self
                .database
                .run_command(command)
                .await
                .map_err(|e| MigrateError::write(collection, 0, part_message(e, part, parts)))?;

            if let Some(message) = reply_error(&reply) {
                return Err(MigrateError::write(
                    collection,
                    0,
                    part_message(message, part, parts),
                ));
            }

            written += reply_count(&reply, sent);
        }

        Ok(written)
    }

    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| MigrateError::connection(e, "pinging target"))?;
        Ok(())
    }

    fn store_type(&self) -> &str {
        "mongodb"
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        debug!("MongoDB client shut down");
    }
}
