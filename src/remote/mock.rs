//! Scripted memory service for unit tests.
//!
//! Replies are queued per endpoint; an endpoint with an empty queue answers
//! with an empty success. Every call is recorded.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{
    episodes_path, MemoryService, APPEND_PATH, GROUPED_QUERY_PATH, HEALTH_PATH, LEGACY_QUERY_PATH,
};
use crate::error::{MemoryError, Result};
use crate::models::{
    AppendRequest, EpisodesResponse, GroupedQueryResponse, LegacyQueryResponse, QueryRequest, Role,
};
use crate::session::SessionId;

/// Scripted outcome of one call
#[derive(Debug, Clone)]
pub enum MockReply<T> {
    Ok(T),
    /// HTTP 404
    NotFound,
    /// Any other non-2xx status
    Status(u16),
    /// Transport failure such as a timeout
    Unavailable,
}

impl<T> MockReply<T> {
    fn into_result(self, endpoint: &str) -> Result<T> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::NotFound => Err(MemoryError::NotFound {
                endpoint: endpoint.to_string(),
            }),
            Self::Status(status) => Err(MemoryError::Status {
                endpoint: endpoint.to_string(),
                status,
                body: "scripted failure".to_string(),
            }),
            Self::Unavailable => Err(MemoryError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{} timed out", endpoint),
            ))),
        }
    }
}

/// A recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    QueryGrouped(QueryRequest),
    QueryLegacy(QueryRequest),
    RecentEpisodes { session: SessionId, limit: usize },
    Append(AppendRequest),
    Health,
}

#[derive(Debug, Default)]
pub struct MockMemoryService {
    grouped: Mutex<VecDeque<MockReply<GroupedQueryResponse>>>,
    legacy: Mutex<VecDeque<MockReply<LegacyQueryResponse>>>,
    episodes: Mutex<VecDeque<MockReply<EpisodesResponse>>>,
    appends: Mutex<HashMap<Role, MockReply<()>>>,
    health: Mutex<Option<MockReply<()>>>,
    calls: Mutex<Vec<MockCall>>,
}

fn next<T: Default>(queue: &Mutex<VecDeque<MockReply<T>>>) -> MockReply<T> {
    queue
        .lock()
        .ok()
        .and_then(|mut q| q.pop_front())
        .unwrap_or_else(|| MockReply::Ok(T::default()))
}

impl MockMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grouped(self, reply: MockReply<GroupedQueryResponse>) -> Self {
        if let Ok(mut q) = self.grouped.lock() {
            q.push_back(reply);
        }
        self
    }

    pub fn with_legacy(self, reply: MockReply<LegacyQueryResponse>) -> Self {
        if let Ok(mut q) = self.legacy.lock() {
            q.push_back(reply);
        }
        self
    }

    pub fn with_episodes(self, reply: MockReply<EpisodesResponse>) -> Self {
        if let Ok(mut q) = self.episodes.lock() {
            q.push_back(reply);
        }
        self
    }

    /// Reply used for every append of the given role
    pub fn with_append(self, role: Role, reply: MockReply<()>) -> Self {
        if let Ok(mut m) = self.appends.lock() {
            m.insert(role, reply);
        }
        self
    }

    pub fn with_health(self, reply: MockReply<()>) -> Self {
        if let Ok(mut h) = self.health.lock() {
            *h = Some(reply);
        }
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn grouped_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::QueryGrouped(_)))
    }

    pub fn legacy_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::QueryLegacy(_)))
    }

    pub fn episode_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::RecentEpisodes { .. }))
    }

    /// Recorded append requests, in call order
    pub fn appended(&self) -> Vec<AppendRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Append(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl MemoryService for MockMemoryService {
    async fn query_grouped(&self, request: &QueryRequest) -> Result<GroupedQueryResponse> {
        self.record(MockCall::QueryGrouped(request.clone()));
        next(&self.grouped).into_result(GROUPED_QUERY_PATH)
    }

    async fn query_legacy(&self, request: &QueryRequest) -> Result<LegacyQueryResponse> {
        self.record(MockCall::QueryLegacy(request.clone()));
        next(&self.legacy).into_result(LEGACY_QUERY_PATH)
    }

    async fn recent_episodes(&self, session: &SessionId, limit: usize) -> Result<EpisodesResponse> {
        self.record(MockCall::RecentEpisodes {
            session: session.clone(),
            limit,
        });
        next(&self.episodes).into_result(&episodes_path(session))
    }

    async fn append(&self, request: &AppendRequest) -> Result<()> {
        self.record(MockCall::Append(request.clone()));
        let reply = self
            .appends
            .lock()
            .ok()
            .and_then(|m| m.get(&request.role).cloned())
            .unwrap_or(MockReply::Ok(()));
        reply.into_result(APPEND_PATH)
    }

    async fn health(&self) -> Result<()> {
        self.record(MockCall::Health);
        let reply = self
            .health
            .lock()
            .ok()
            .and_then(|h| h.clone())
            .unwrap_or(MockReply::Ok(()));
        reply.into_result(HEALTH_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QueryRequest {
        QueryRequest {
            user_id: "s1".to_string(),
            query: "tea".to_string(),
            limit: 10,
        }
    }

    #[tokio::test]
    async fn test_unscripted_calls_succeed_empty() {
        let mock = MockMemoryService::new();
        let grouped = mock.query_grouped(&request()).await.unwrap();
        assert!(grouped.groups.is_empty());
        assert!(mock.health().await.is_ok());
        assert_eq!(mock.grouped_calls(), 1);
    }

    #[tokio::test]
    async fn test_replies_are_consumed_in_order() {
        let mock = MockMemoryService::new()
            .with_grouped(MockReply::NotFound)
            .with_grouped(MockReply::Status(500));

        assert!(mock.query_grouped(&request()).await.unwrap_err().is_not_found());
        let err = mock.query_grouped(&request()).await.unwrap_err();
        assert!(matches!(err, MemoryError::Status { status: 500, .. }));
        assert!(mock.query_grouped(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_append_reply_per_role() {
        let mock = MockMemoryService::new().with_append(Role::User, MockReply::Unavailable);
        let user = AppendRequest::new("s1", "hi", Role::User, "test", "t");
        let assistant = AppendRequest::new("s1", "hello", Role::Assistant, "test", "t");

        assert!(mock.append(&user).await.is_err());
        assert!(mock.append(&assistant).await.is_ok());
        assert_eq!(mock.appended().len(), 2);
    }
}
