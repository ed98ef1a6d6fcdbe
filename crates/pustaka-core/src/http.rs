//! HTTP client implementing [`RemoteStore`] against the remote block store's
//! REST surface.
//!
//! All requests are plain request/response round trips with the timeout
//! enforced by the underlying client. Non-success statuses become
//! [`Error::Api`]; no retries are performed here.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::source::{Paginated, RemoteStore};
use crate::types::{Block, Page};
use crate::{Error, Result};

/// HTTP-backed remote store client.
pub struct HttpStore {
    client: Client,
    config: StoreConfig,
}

impl HttpStore {
    /// Creates a client for the given store configuration.
    pub fn new(config: StoreConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config("store base_url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pustaka/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WireError>(&body)
                .map_or(body, |wire| wire.message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn data_source_id(&self, collection_id: &str) -> Result<String> {
        let request = self
            .client
            .get(self.url(&format!("/v1/databases/{collection_id}")));
        let response = self.authorize(request).send().await?;
        let database: WireDatabase = Self::read_json(response).await?;

        // Older store versions have no separate data sources and are queried
        // by the collection id directly.
        let id = database
            .data_sources
            .into_iter()
            .next()
            .map_or_else(|| collection_id.to_string(), |source| source.id);
        info!(collection_id, data_source_id = %id, "resolved data source");
        Ok(id)
    }

    async fn query_data_source(
        &self,
        data_source_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Page>> {
        let mut body = json!({ "page_size": self.config.page_size });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        debug!(data_source_id, ?cursor, "querying data source page");
        let request = self
            .client
            .post(self.url(&format!("/v1/data_sources/{data_source_id}/query")))
            .json(&body);
        let response = self.authorize(request).send().await?;
        Self::read_json(response).await
    }

    async fn get_page(&self, page_id: &str) -> Result<Page> {
        let request = self.client.get(self.url(&format!("/v1/pages/{page_id}")));
        let response = self.authorize(request).send().await?;
        Self::read_json(response).await
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Block>> {
        let mut request = self
            .client
            .get(self.url(&format!("/v1/blocks/{block_id}/children")))
            .query(&[("page_size", self.config.page_size.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("start_cursor", cursor)]);
        }
        debug!(block_id, ?cursor, "listing block children page");
        let response = self.authorize(request).send().await?;
        Self::read_json(response).await
    }

    async fn search_pages(&self, query: &str, limit: usize) -> Result<Vec<Page>> {
        let body = json!({
            "query": query,
            "page_size": limit,
            "filter": { "property": "object", "value": "page" },
        });
        let request = self.client.post(self.url("/v1/search")).json(&body);
        let response = self.authorize(request).send().await?;
        let batch: Paginated<Page> = Self::read_json(response).await?;
        let mut results = batch.results;
        results.truncate(limit);
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireDatabase {
    #[serde(default)]
    data_sources: Vec<WireDataSource>,
}

#[derive(Debug, Deserialize)]
struct WireDataSource {
    id: String,
}
