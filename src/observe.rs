//! Observability hook passed into the adapter.
//!
//! Every degradation point reports a [`MemoryEvent`] instead of printing, so
//! hosts choose where events go and tests can assert on them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Memory operation an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GroupedQuery,
    LegacyQuery,
    RecentEpisodes,
    BufferFallback,
    LoadContext,
    BufferCommit,
    AppendTurn,
    ClearBuffer,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupedQuery => "groupedQuery",
            Self::LegacyQuery => "legacyQuery",
            Self::RecentEpisodes => "recentEpisodes",
            Self::BufferFallback => "bufferFallback",
            Self::LoadContext => "loadContext",
            Self::BufferCommit => "bufferCommit",
            Self::AppendTurn => "appendTurn",
            Self::ClearBuffer => "clearBuffer",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::GroupedQuery,
            Self::LegacyQuery,
            Self::RecentEpisodes,
            Self::BufferFallback,
            Self::LoadContext,
            Self::BufferCommit,
            Self::AppendTurn,
            Self::ClearBuffer,
        ]
        .into_iter()
        .find(|op| op.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("Unknown operation: {}", s))
    }
}

/// One observed step of a load, save or clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub session: String,
    pub success: bool,
    pub details: Option<String>,
}

impl MemoryEvent {
    pub fn new(operation: Operation, session: impl Into<String>, success: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            session: session.into(),
            success,
            details: None,
        }
    }

    pub fn ok(operation: Operation, session: impl Into<String>) -> Self {
        Self::new(operation, session, true)
    }

    pub fn failed(operation: Operation, session: impl Into<String>) -> Self {
        Self::new(operation, session, false)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Sink for memory events
pub trait MemoryObserver: Send + Sync {
    fn record(&self, event: &MemoryEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MemoryObserver for TracingObserver {
    fn record(&self, event: &MemoryEvent) {
        let details = event.details.as_deref().unwrap_or("-");
        if event.success {
            tracing::info!(
                operation = event.operation.as_str(),
                session = %event.session,
                details,
                "graphiti memory"
            );
        } else {
            tracing::warn!(
                operation = event.operation.as_str(),
                session = %event.session,
                details,
                "graphiti memory degraded"
            );
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<MemoryEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MemoryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events for one operation, in recording order
    pub fn of(&self, operation: Operation) -> Vec<MemoryEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.operation == operation)
            .collect()
    }
}

impl MemoryObserver for RecordingObserver {
    fn record(&self, event: &MemoryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sends each event to several observers
#[derive(Default, Clone)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn MemoryObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn MemoryObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl MemoryObserver for FanoutObserver {
    fn record(&self, event: &MemoryEvent) {
        for observer in &self.observers {
            observer.record(event);
        }
    }
}
