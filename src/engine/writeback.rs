//! Turn persistence: synchronous buffer commit, background remote appends.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::GraphitiMemory;
use crate::error::Result;
use crate::models::{AppendRequest, Role, Turn};
use crate::observe::{MemoryEvent, Operation};
use crate::session::SessionId;

/// Outcome of one remote append
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum AppendStatus {
    Saved,
    /// Empty text, never sent
    Skipped,
    Failed(String),
}

/// Outcome of both appends of a turn pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteBackReport {
    pub user: AppendStatus,
    pub assistant: AppendStatus,
}

impl WriteBackReport {
    pub fn all_saved(&self) -> bool {
        self.user == AppendStatus::Saved && self.assistant == AppendStatus::Saved
    }
}

enum PendingAppend {
    Skipped,
    Spawned(JoinHandle<AppendStatus>),
}

impl PendingAppend {
    async fn settle(self) -> AppendStatus {
        match self {
            Self::Skipped => AppendStatus::Skipped,
            Self::Spawned(handle) => handle
                .await
                .unwrap_or_else(|e| AppendStatus::Failed(format!("append task aborted: {}", e))),
        }
    }
}

/// Handle to the remote appends of one save.
///
/// Dropping it leaves the appends running on the runtime. Awaiting
/// [`WriteBack::settle`] waits for both and reports how they ended.
pub struct WriteBack {
    user: PendingAppend,
    assistant: PendingAppend,
}

impl WriteBack {
    pub async fn settle(self) -> WriteBackReport {
        let (user, assistant) = tokio::join!(self.user.settle(), self.assistant.settle());
        WriteBackReport { user, assistant }
    }
}

/// Only the empty string counts as empty; whitespace is content
pub(crate) fn has_text(text: &str) -> bool {
    !text.is_empty()
}

impl GraphitiMemory {
    pub(crate) async fn write_back(&mut self, user_text: &str, assistant_text: &str, session: &SessionId) -> WriteBack {
        let now = Utc::now();
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        self.commit_to_buffer(user_text, assistant_text, session, now).await;

        WriteBack {
            user: self.spawn_append(session, user_text, Role::User, &timestamp),
            assistant: self.spawn_append(session, assistant_text, Role::Assistant, &timestamp),
        }
    }

    async fn commit_to_buffer(
        &mut self,
        user_text: &str,
        assistant_text: &str,
        session: &SessionId,
        now: DateTime<Utc>,
    ) {
        // Both halves are buffered, even empty ones, so the window stays in pairs
        let turns = [Turn::user(user_text, now), Turn::assistant(assistant_text, now)];

        match self.push_within_window(session, &turns).await {
            Ok(evicted) => self.observe(
                MemoryEvent::ok(Operation::BufferCommit, session.as_str())
                    .with_details(format!("{} turns added, {} evicted", turns.len(), evicted)),
            ),
            Err(e) => self.observe(MemoryEvent::failed(Operation::BufferCommit, session.as_str()).with_details(e.to_string())),
        }
    }

    /// Append, then evict oldest-first down to the window. Returns the
    /// number of evicted turns.
    async fn push_within_window(&mut self, session: &SessionId, turns: &[Turn]) -> Result<usize> {
        self.buffer.push(session, turns).await?;
        let excess = self
            .buffer
            .len(session)
            .await?
            .saturating_sub(self.settings.context_window_length);
        if excess > 0 {
            self.buffer.drop_oldest(session, excess).await?;
        }
        Ok(excess)
    }

    fn spawn_append(&self, session: &SessionId, text: &str, role: Role, timestamp: &str) -> PendingAppend {
        if !has_text(text) {
            return PendingAppend::Skipped;
        }

        let request = AppendRequest::new(session.as_str(), text, role, &self.settings.source, timestamp);
        let service = Arc::clone(&self.service);
        let observer = Arc::clone(&self.observer);
        let session = session.to_string();

        PendingAppend::Spawned(tokio::spawn(async move {
            match service.append(&request).await {
                Ok(()) => {
                    observer.record(
                        &MemoryEvent::ok(Operation::AppendTurn, session).with_details(format!("{} turn saved", role)),
                    );
                    AppendStatus::Saved
                }
                Err(e) => {
                    observer.record(
                        &MemoryEvent::failed(Operation::AppendTurn, session).with_details(format!("{} turn: {}", role, e)),
                    );
                    AppendStatus::Failed(e.to_string())
                }
            }
        }))
    }
}
