//! Solr implementation of [`SearchSource`] over HTTP.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Page, PageRequest, SearchSource};
use crate::config::SourceConfig;
use crate::core::RawRecord;
use crate::error::{MigrateError, Result};

/// Longest slice of an error body quoted back in error messages.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: SelectBody,
    #[serde(rename = "nextCursorMark")]
    next_cursor_mark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    #[serde(default)]
    docs: Vec<RawRecord>,
}

/// HTTP client for Solr cursor-mark deep paging.
pub struct SolrClient {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl SolrClient {
    /// Create a client from source configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let base_url = config.core_url("");
        let mut client = Self::with_base_url(base_url, config.timeout())?;
        client.username = config.username.clone();
        client.password = config.password.clone();
        Ok(client)
    }

    /// Create a client for cores under `base_url` (e.g. `http://solr:8983/solr`).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MigrateError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        })
    }

    fn get(&self, core: &str, handler: &str) -> RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, core, handler);
        let request = self.client.get(url);
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, core: &str, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MigrateError::source_unavailable(core, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(MigrateError::source_unavailable(
                core,
                format!("HTTP {}: {}", status, body.trim()),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl SearchSource for SolrClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let rows = request.rows.to_string();
        let sort = format!("{} asc", request.sort_field);

        debug!(
            "{}: requesting {} rows from cursor {}",
            request.core, request.rows, request.cursor
        );

        let http = self.get(&request.core, "select").query(&[
            ("q", "*:*"),
            ("rows", rows.as_str()),
            ("sort", sort.as_str()),
            ("cursorMark", request.cursor.as_str()),
            ("wt", "json"),
        ]);

        let body: SelectResponse = self
            .send(&request.core, http)
            .await?
            .json()
            .await
            .map_err(|e| {
                MigrateError::source_unavailable(&request.core, format!("invalid response: {}", e))
            })?;

        Ok(Page {
            records: body.response.docs,
            next_cursor: body.next_cursor_mark,
        })
    }

    async fn ping(&self, core: &str) -> Result<()> {
        let http = self.get(core, "admin/ping").query(&[("wt", "json")]);
        self.send(core, http).await?;
        Ok(())
    }

    fn source_type(&self) -> &str {
        "solr"
    }
}
