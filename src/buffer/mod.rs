//! Short-term turn buffers.
//!
//! A buffer keeps the most recent turns of each session in creation order.
//! Eviction policy lives in the write-back engine; stores only provide the
//! primitives below.

pub mod file;

pub use file::FileBuffer;

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};

use crate::error::Result;
use crate::models::Turn;
use crate::session::SessionId;

/// Ordered per-session turn store, either held in-process or provided by the host.
#[async_trait]
pub trait ShortTermBuffer: Send + Sync {
    /// All turns of the session, oldest first
    async fn turns(&self, session: &SessionId) -> Result<Vec<Turn>>;

    /// Append turns to the end of the session
    async fn push(&mut self, session: &SessionId, turns: &[Turn]) -> Result<()>;

    /// Remove up to `count` turns from the front of the session
    async fn drop_oldest(&mut self, session: &SessionId, count: usize) -> Result<()>;

    async fn clear(&mut self, session: &SessionId) -> Result<()>;

    async fn len(&self, session: &SessionId) -> Result<usize> {
        Ok(self.turns(session).await?.len())
    }

    /// The last `limit` turns, oldest first
    async fn recent(&self, session: &SessionId, limit: usize) -> Result<Vec<Turn>> {
        let mut turns = self.turns(session).await?;
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.split_off(skip))
    }
}

/// Buffer held in process memory; lives as long as the adapter.
#[derive(Debug, Default)]
pub struct InMemoryBuffer {
    sessions: HashMap<SessionId, VecDeque<Turn>>,
}

impl InMemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShortTermBuffer for InMemoryBuffer {
    async fn turns(&self, session: &SessionId) -> Result<Vec<Turn>> {
        Ok(self
            .sessions
            .get(session)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn push(&mut self, session: &SessionId, turns: &[Turn]) -> Result<()> {
        self.sessions
            .entry(session.clone())
            .or_default()
            .extend(turns.iter().cloned());
        Ok(())
    }

    async fn drop_oldest(&mut self, session: &SessionId, count: usize) -> Result<()> {
        if let Some(turns) = self.sessions.get_mut(session) {
            let count = count.min(turns.len());
            turns.drain(..count);
        }
        Ok(())
    }

    async fn clear(&mut self, session: &SessionId) -> Result<()> {
        self.sessions.remove(session);
        Ok(())
    }

    async fn len(&self, session: &SessionId) -> Result<usize> {
        Ok(self.sessions.get(session).map_or(0, VecDeque::len))
    }
}
