//! reqwest-backed Graphiti client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{
    episodes_path, MemoryService, API_KEY_HEADER, APPEND_PATH, GROUPED_QUERY_PATH, HEALTH_PATH,
    LEGACY_QUERY_PATH,
};
use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result};
use crate::models::{
    AppendRequest, EpisodesResponse, GroupedQueryResponse, LegacyQueryResponse, QueryRequest,
};
use crate::session::SessionId;

/// Longest error body kept in a `Status` error
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Graphiti HTTP client with a fixed timeout and API key header.
#[derive(Debug, Clone)]
pub struct HttpMemoryService {
    client: Client,
    base_url: Url,
}

impl HttpMemoryService {
    /// Build a client from a validated config.
    pub fn new(config: &MemoryConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.api_url)
            .map_err(|e| MemoryError::Config(format!("Invalid API URL '{}': {}", config.api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::Config(format!(
                "API URL cannot carry a path: {}",
                config.api_url
            )));
        }

        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            MemoryError::Config("API key contains characters not allowed in a header".to_string())
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each segment.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn endpoint_url(&self, path: &str) -> Url {
        self.url(path.split('/').filter(|s| !s.is_empty()))
    }

    /// Send a request and map non-2xx statuses to errors.
    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> Result<Response> {
        tracing::debug!(endpoint, "graphiti request");
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(MemoryError::NotFound {
                endpoint: endpoint.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        let response = self.execute(endpoint, request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MemoryService for HttpMemoryService {
    async fn query_grouped(&self, request: &QueryRequest) -> Result<GroupedQueryResponse> {
        let builder = self.client.post(self.endpoint_url(GROUPED_QUERY_PATH)).json(request);
        self.fetch_json(GROUPED_QUERY_PATH, builder).await
    }

    async fn query_legacy(&self, request: &QueryRequest) -> Result<LegacyQueryResponse> {
        let builder = self.client.post(self.endpoint_url(LEGACY_QUERY_PATH)).json(request);
        self.fetch_json(LEGACY_QUERY_PATH, builder).await
    }

    async fn recent_episodes(&self, session: &SessionId, limit: usize) -> Result<EpisodesResponse> {
        let url = self.url(["memory", "users", session.as_str(), "episodes"]);
        let builder = self.client.get(url).query(&[("limit", limit)]);
        self.fetch_json(&episodes_path(session), builder).await
    }

    async fn append(&self, request: &AppendRequest) -> Result<()> {
        let builder = self.client.post(self.endpoint_url(APPEND_PATH)).json(request);
        self.execute(APPEND_PATH, builder).await?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let builder = self.client.get(self.endpoint_url(HEALTH_PATH));
        self.execute(HEALTH_PATH, builder).await?;
        Ok(())
    }
}
