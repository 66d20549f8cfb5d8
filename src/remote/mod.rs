//! Graphiti memory service access.
//!
//! One trait method is one HTTP request. Callers decide how failures degrade;
//! nothing in this layer retries.

pub mod client;
#[cfg(test)]
pub mod mock;

pub use client::HttpMemoryService;
#[cfg(test)]
pub use mock::{MockCall, MockMemoryService, MockReply};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AppendRequest, EpisodesResponse, GroupedQueryResponse, LegacyQueryResponse, QueryRequest,
};
use crate::session::SessionId;

pub const GROUPED_QUERY_PATH: &str = "/memory/query/grouped";
pub const LEGACY_QUERY_PATH: &str = "/memory/query";
pub const APPEND_PATH: &str = "/memory/append";
pub const HEALTH_PATH: &str = "/health";
/// API key header sent on every request (lowercase for `HeaderName::from_static`)
pub const API_KEY_HEADER: &str = "x-api-key";

/// Path of the recent-episodes endpoint for a session (unencoded, for logs)
pub fn episodes_path(session: &SessionId) -> String {
    format!("/memory/users/{}/episodes", session)
}

#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Facts partitioned by source (`POST /memory/query/grouped`)
    async fn query_grouped(&self, request: &QueryRequest) -> Result<GroupedQueryResponse>;

    /// Flat fact list from the legacy endpoint (`POST /memory/query`)
    async fn query_legacy(&self, request: &QueryRequest) -> Result<LegacyQueryResponse>;

    /// Most recent episodes of a session
    async fn recent_episodes(&self, session: &SessionId, limit: usize) -> Result<EpisodesResponse>;

    /// Store one turn (`POST /memory/append`); the response body is ignored
    async fn append(&self, request: &AppendRequest) -> Result<()>;

    async fn health(&self) -> Result<()>;
}
