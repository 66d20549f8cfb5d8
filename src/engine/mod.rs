//! The conversational memory adapter.
//!
//! [`GraphitiMemory`] fuses long-term facts from the Graphiti service with a
//! bounded window of recent turns. Loads never fail: every remote problem
//! degrades to less context. Saves commit to the short-term buffer before
//! returning and push the turns to the service in the background.

pub mod fusion;
pub mod render;
pub mod writeback;

pub use fusion::LongTermFacts;
pub use render::NO_HISTORY;
pub use writeback::{AppendStatus, WriteBack, WriteBackReport};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::{InMemoryBuffer, ShortTermBuffer};
use crate::config::MemoryConfig;
use crate::error::Result;
use crate::observe::{MemoryEvent, MemoryObserver, Operation, TracingObserver};
use crate::remote::{HttpMemoryService, MemoryService};
use crate::session::SessionId;

/// Variables handed to the host, keyed by the configured memory key
pub type MemoryVariables = HashMap<String, String>;

/// Memory contract expected by conversational hosts.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Names of the variables produced by [`ConversationMemory::load_context`]
    fn memory_keys(&self) -> Vec<String>;

    /// Context for the next reply. Always yields exactly one variable.
    async fn load_context(&self, utterance: &str, session: &SessionId) -> MemoryVariables;

    /// Record a completed turn pair. The buffer is updated before this
    /// returns; remote persistence continues behind the returned handle.
    async fn save_turn(&mut self, user_text: &str, assistant_text: &str, session: &SessionId) -> WriteBack;

    /// Empty the short-term buffer of a session. Long-term memory is kept.
    async fn clear(&mut self, session: &SessionId);
}

/// Tunables taken from [`MemoryConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySettings {
    pub context_window_length: usize,
    pub search_limit: usize,
    pub memory_key: String,
    pub source: String,
}

impl From<&MemoryConfig> for MemorySettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            context_window_length: config.context_window_length,
            search_limit: config.search_limit,
            memory_key: config.memory_key.clone(),
            source: config.source.clone(),
        }
    }
}

pub struct GraphitiMemory {
    service: Arc<dyn MemoryService>,
    buffer: Box<dyn ShortTermBuffer>,
    observer: Arc<dyn MemoryObserver>,
    settings: MemorySettings,
}

impl GraphitiMemory {
    /// Adapter over an existing service, with an in-process buffer and
    /// tracing output.
    pub fn new(config: &MemoryConfig, service: Arc<dyn MemoryService>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            service,
            buffer: Box::new(InMemoryBuffer::new()),
            observer: Arc::new(TracingObserver),
            settings: MemorySettings::from(config),
        })
    }

    /// Adapter talking HTTP to the configured server
    pub fn from_config(config: &MemoryConfig) -> Result<Self> {
        let service = HttpMemoryService::new(config)?;
        Self::new(config, Arc::new(service))
    }

    pub fn with_buffer(mut self, buffer: Box<dyn ShortTermBuffer>) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn MemoryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn buffer(&self) -> &dyn ShortTermBuffer {
        self.buffer.as_ref()
    }

    /// Probe the service. Never consulted by loads or saves.
    pub async fn health(&self) -> Result<()> {
        self.service.health().await
    }

    fn observe(&self, event: MemoryEvent) {
        self.observer.record(&event);
    }
}

#[async_trait]
impl ConversationMemory for GraphitiMemory {
    fn memory_keys(&self) -> Vec<String> {
        vec![self.settings.memory_key.clone()]
    }

    async fn load_context(&self, utterance: &str, session: &SessionId) -> MemoryVariables {
        let (text, facts, recent) = self.fuse(utterance, session).await;

        let facts = match &facts {
            LongTermFacts::Empty => "none".to_string(),
            LongTermFacts::Grouped(groups) => format!("{} groups", groups.len()),
            LongTermFacts::Flat(hits) => format!("{} legacy facts", hits.len()),
        };
        self.observe(
            MemoryEvent::ok(Operation::LoadContext, session.as_str())
                .with_details(format!("facts: {}, recent turns: {}", facts, recent)),
        );

        let mut variables = MemoryVariables::new();
        variables.insert(self.settings.memory_key.clone(), text);
        variables
    }

    async fn save_turn(&mut self, user_text: &str, assistant_text: &str, session: &SessionId) -> WriteBack {
        self.write_back(user_text, assistant_text, session).await
    }

    async fn clear(&mut self, session: &SessionId) {
        match self.buffer.clear(session).await {
            Ok(()) => self.observe(MemoryEvent::ok(Operation::ClearBuffer, session.as_str())),
            Err(e) => self.observe(MemoryEvent::failed(Operation::ClearBuffer, session.as_str()).with_details(e.to_string())),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{fact, memory_with, session};
    use super::*;
    use crate::buffer::FileBuffer;
    use crate::models::{
        Episode, EpisodesResponse, GroupedQueryResponse, LegacyQueryResponse, Role, SourceGroup, SourceType,
    };
    use crate::remote::{MockMemoryService, MockReply};
    use tempfile::TempDir;

    fn history(memory: &MemoryVariables) -> &str {
        memory.get("chat_history").map(String::as_str).unwrap()
    }

    fn episode(role: Role, content: &str) -> Episode {
        Episode {
            id: None,
            content: content.to_string(),
            role,
            timestamp: "2024-01-15T10:00:00Z".to_string(),
            metadata: None,
        }
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MemoryConfig::new("http://graphiti.test", "");
        assert!(GraphitiMemory::new(&config, Arc::new(MockMemoryService::new())).is_err());
    }

    #[test]
    fn test_memory_keys() {
        let mut config = MemoryConfig::new("http://graphiti.test", "k");
        config.memory_key = "history".to_string();
        let memory = GraphitiMemory::new(&config, Arc::new(MockMemoryService::new())).unwrap();
        assert_eq!(memory.memory_keys(), vec!["history".to_string()]);
    }

    // -------------------------------------------------------------------------
    // load_context
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_yields_single_variable() {
        let (memory, _, _) = memory_with(MockMemoryService::new(), 5);

        let vars = memory.load_context("hello", &session()).await;

        assert_eq!(vars.len(), 1);
        assert_eq!(history(&vars), NO_HISTORY);
    }

    #[tokio::test]
    async fn test_load_with_everything_failing_is_placeholder() {
        let mock = MockMemoryService::new()
            .with_grouped(MockReply::Unavailable)
            .with_episodes(MockReply::Unavailable);
        let (memory, _, observer) = memory_with(mock, 5);

        let vars = memory.load_context("hello", &session()).await;

        assert_eq!(history(&vars), NO_HISTORY);
        assert!(observer.of(Operation::LoadContext)[0].success);
    }

    #[tokio::test]
    async fn test_load_fuses_grouped_facts_and_episodes() {
        let mock = MockMemoryService::new()
            .with_grouped(MockReply::Ok(GroupedQueryResponse {
                groups: vec![SourceGroup {
                    source_type: SourceType::Conversation,
                    source_name: None,
                    facts: vec![fact("Alice likes green tea", 0.87)],
                }],
                total_facts: 1,
            }))
            .with_episodes(MockReply::Ok(EpisodesResponse {
                episodes: vec![
                    episode(Role::User, "What tea do I like?"),
                    episode(Role::Assistant, "Green tea."),
                ],
                total: None,
            }));
        let (memory, _, _) = memory_with(mock, 5);

        let vars = memory.load_context("tea?", &session()).await;

        assert_eq!(
            history(&vars),
            "=== Relevant Facts from Long-term Memory ===\n\n💬 From conversation:\n  1. Alice likes green tea (confidence: 0.87)\n\n=== Recent Conversation ===\nUser: What tea do I like?\nAssistant: Green tea."
        );
    }

    #[tokio::test]
    async fn test_load_legacy_fallback_with_buffer_fallback() {
        let mock = MockMemoryService::new()
            .with_grouped(MockReply::NotFound)
            .with_legacy(MockReply::Ok(LegacyQueryResponse {
                hits: vec![fact("Bob is vegetarian", 0.5)],
                total: 1,
            }))
            .with_episodes(MockReply::Status(503));
        let (mut memory, mock, _) = memory_with(mock, 4);

        memory.save_turn("Hi", "Hello!", &session()).await.settle().await;
        let vars = memory.load_context("food?", &session()).await;

        assert_eq!(
            history(&vars),
            "=== Relevant Facts from Long-term Memory ===\n\n1. Bob is vegetarian (confidence: 0.50)\n\n=== Recent Conversation ===\nUser: Hi\nAssistant: Hello!"
        );
        assert_eq!(mock.legacy_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_empty_utterance_skips_facts_only() {
        let (memory, mock, _) = memory_with(MockMemoryService::new(), 5);

        memory.load_context("", &session()).await;

        assert_eq!(mock.grouped_calls(), 0);
        assert_eq!(mock.episode_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_episode_failure_with_empty_buffer() {
        let mock = MockMemoryService::new().with_episodes(MockReply::Unavailable);
        let (memory, _, _) = memory_with(mock, 5);

        let vars = memory.load_context("", &session()).await;
        assert_eq!(history(&vars), NO_HISTORY);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let mock = MockMemoryService::new()
            .with_episodes(MockReply::Unavailable)
            .with_episodes(MockReply::Unavailable);
        let (mut memory, _, _) = memory_with(mock, 5);

        memory.save_turn("for s1", "ok", &SessionId::new("s1")).await.settle().await;

        let s2 = memory.load_context("", &SessionId::new("s2")).await;
        let s1 = memory.load_context("", &SessionId::new("s1")).await;

        assert_eq!(history(&s2), NO_HISTORY);
        assert!(history(&s1).contains("User: for s1"));
    }

    // -------------------------------------------------------------------------
    // clear
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_clear_empties_buffer_only() {
        let mock = MockMemoryService::new().with_episodes(MockReply::Unavailable);
        let (mut memory, mock, observer) = memory_with(mock, 5);

        memory.save_turn("U1", "A1", &session()).await.settle().await;
        let calls_before = mock.calls().len();
        memory.clear(&session()).await;

        assert_eq!(mock.calls().len(), calls_before);
        assert!(observer.of(Operation::ClearBuffer)[0].success);

        let vars = memory.load_context("", &session()).await;
        assert_eq!(history(&vars), NO_HISTORY);
    }

    // -------------------------------------------------------------------------
    // Host-provided buffer
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_file_buffer_carries_window_between_adapters() {
        let temp = TempDir::new().unwrap();

        let (memory, _, _) = memory_with(MockMemoryService::new(), 5);
        let mut memory = memory.with_buffer(Box::new(FileBuffer::new(temp.path())));
        memory.save_turn("U1", "A1", &session()).await.settle().await;
        drop(memory);

        let (memory, _, _) = memory_with(MockMemoryService::new().with_episodes(MockReply::Unavailable), 5);
        let memory = memory.with_buffer(Box::new(FileBuffer::new(temp.path())));
        let vars = memory.load_context("", &session()).await;

        assert_eq!(history(&vars), "=== Recent Conversation ===\nUser: U1\nAssistant: A1");
    }
}
