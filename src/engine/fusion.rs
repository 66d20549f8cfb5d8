//! Query fusion: long-term facts with endpoint fallback, plus recent turns.

use chrono::Utc;

use super::GraphitiMemory;
use crate::models::{Fact, QueryRequest, SourceGroup, Turn};
use crate::observe::{MemoryEvent, Operation};
use crate::session::SessionId;

/// Facts retrieved for one load
#[derive(Debug, Clone, PartialEq)]
pub enum LongTermFacts {
    Empty,
    /// From the grouped endpoint
    Grouped(Vec<SourceGroup>),
    /// From the legacy endpoint
    Flat(Vec<Fact>),
}

impl GraphitiMemory {
    /// Fetch facts and recent turns concurrently and render them.
    pub(crate) async fn fuse(&self, utterance: &str, session: &SessionId) -> (String, LongTermFacts, usize) {
        let (facts, recent) = tokio::join!(
            self.long_term_facts(utterance, session),
            self.recent_turns(session)
        );
        let text = super::render::compose(&facts, &recent);
        (text, facts, recent.len())
    }

    /// Grouped query first; exactly one legacy retry when the grouped
    /// endpoint does not exist. Every other failure yields no facts.
    pub(crate) async fn long_term_facts(&self, utterance: &str, session: &SessionId) -> LongTermFacts {
        if utterance.is_empty() {
            return LongTermFacts::Empty;
        }

        let request = QueryRequest {
            user_id: session.as_str().to_string(),
            query: utterance.to_string(),
            limit: self.settings.search_limit,
        };

        match self.service.query_grouped(&request).await {
            Ok(response) => {
                self.observe(MemoryEvent::ok(Operation::GroupedQuery, session.as_str()).with_details(format!(
                    "{} facts in {} groups",
                    response.total_facts,
                    response.groups.len()
                )));
                LongTermFacts::Grouped(response.groups)
            }
            Err(e) if e.is_not_found() => {
                self.observe(
                    MemoryEvent::failed(Operation::GroupedQuery, session.as_str())
                        .with_details("grouped endpoint not available, falling back to legacy"),
                );
                self.legacy_facts(&request, session).await
            }
            Err(e) => {
                self.observe(MemoryEvent::failed(Operation::GroupedQuery, session.as_str()).with_details(e.to_string()));
                LongTermFacts::Empty
            }
        }
    }

    async fn legacy_facts(&self, request: &QueryRequest, session: &SessionId) -> LongTermFacts {
        match self.service.query_legacy(request).await {
            Ok(response) => {
                self.observe(
                    MemoryEvent::ok(Operation::LegacyQuery, session.as_str())
                        .with_details(format!("{} facts", response.hits.len())),
                );
                LongTermFacts::Flat(response.hits)
            }
            Err(e) => {
                self.observe(MemoryEvent::failed(Operation::LegacyQuery, session.as_str()).with_details(e.to_string()));
                LongTermFacts::Empty
            }
        }
    }

    /// Recent episodes from the service, or the short-term buffer when the
    /// service call fails.
    pub(crate) async fn recent_turns(&self, session: &SessionId) -> Vec<Turn> {
        let window = self.settings.context_window_length;

        match self.service.recent_episodes(session, window).await {
            Ok(response) => {
                self.observe(
                    MemoryEvent::ok(Operation::RecentEpisodes, session.as_str())
                        .with_details(format!("{} episodes", response.episodes.len())),
                );
                let now = Utc::now();
                response
                    .episodes
                    .into_iter()
                    .map(|episode| episode.into_turn(now))
                    .collect()
            }
            Err(e) => {
                self.observe(MemoryEvent::failed(Operation::RecentEpisodes, session.as_str()).with_details(e.to_string()));
                self.buffered_turns(session, window).await
            }
        }
    }

    async fn buffered_turns(&self, session: &SessionId, window: usize) -> Vec<Turn> {
        match self.buffer.recent(session, window).await {
            Ok(turns) => {
                self.observe(
                    MemoryEvent::ok(Operation::BufferFallback, session.as_str())
                        .with_details(format!("{} buffered turns", turns.len())),
                );
                turns
            }
            Err(e) => {
                self.observe(MemoryEvent::failed(Operation::BufferFallback, session.as_str()).with_details(e.to_string()));
                Vec::new()
            }
        }
    }
}
