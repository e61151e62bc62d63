//! HTTP artifact store client.
//!
//! Speaks a small JSON protocol against the store's retention API:
//! `POST /api/v1/search` resolves a query, `POST /api/v1/delete` removes a
//! batch of items. Deletes are issued in fixed-size batches with bounded
//! concurrency; searches are single requests.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::query::{SearchQuery, StoreItem};
use crate::traits::{ArtifactStore, ResultSet};

/// Items per delete request.
const DELETE_BATCH_SIZE: usize = 100;

/// Store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store base URL.
    pub base_url: String,
    /// Bearer token (optional for anonymous stores).
    pub token: Option<String>,
    /// Worker count for store-communicating steps.
    pub threads: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            base_url: std::env::var("REAPER_SERVER")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            token: std::env::var("REAPER_TOKEN").ok(),
            threads: std::env::var("REAPER_THREADS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(3),
        }
    }
}

impl StoreConfig {
    /// Create a config from `REAPER_SERVER` / `REAPER_TOKEN` /
    /// `REAPER_THREADS` environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a config for a specific server.
    pub fn new(base_url: &str) -> Self {
        StoreConfig {
            base_url: base_url.to_string(),
            token: None,
            threads: 3,
        }
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the worker count for store-communicating steps.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<StoreItem>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    items: &'a [StoreItem],
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    deleted: u64,
}

/// HTTP implementation of [`ArtifactStore`].
pub struct HttpArtifactStore {
    config: StoreConfig,
    http_client: reqwest::Client,
}

impl HttpArtifactStore {
    /// Create a new client against the given store.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        if config.base_url.is_empty() {
            return Err(StoreError::Config("store base URL is empty".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("reaper-store/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpArtifactStore {
            config,
            http_client,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(StoreConfig::from_env())
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/api/v1/{}", self.config.base_url.trim_end_matches('/'), suffix)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        suffix: &str,
        body: &B,
    ) -> StoreResult<R> {
        let url = self.endpoint(suffix);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn delete_batch(&self, batch: Vec<StoreItem>) -> StoreResult<u64> {
        let response: DeleteResponse = self
            .post_json("delete", &DeleteRequest { items: &batch })
            .await?;
        debug!(
            requested = batch.len(),
            deleted = response.deleted,
            "Delete batch finished"
        );
        Ok(response.deleted)
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn search(&self, query: &SearchQuery) -> StoreResult<ResultSet> {
        debug!(container = %query.container, "Searching store");
        let response: SearchResponse = self.post_json("search", query).await?;
        debug!(
            container = %query.container,
            matched = response.items.len(),
            "Search finished"
        );
        Ok(ResultSet::new(response.items))
    }

    async fn delete(&self, results: ResultSet) -> StoreResult<u64> {
        if results.is_empty() {
            return Ok(0);
        }

        let items = results.into_items();
        let total = items.len();
        let batches: Vec<Vec<StoreItem>> = items
            .chunks(DELETE_BATCH_SIZE)
            .map(|chunk| chunk.to_vec())
            .collect();

        // Batch completion order is irrelevant: counts are summed.
        let counts: Vec<u64> = stream::iter(batches)
            .map(|batch| self.delete_batch(batch))
            .buffer_unordered(self.config.threads.max(1))
            .try_collect()
            .await?;

        let deleted = counts.into_iter().sum();
        info!(requested = total, deleted, "Store delete finished");
        Ok(deleted)
    }
}
