//! Long-term fact payloads exchanged with the Graphiti query endpoints.

use serde::{Deserialize, Serialize};

/// Body of both the grouped and the legacy fact query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub user_id: String,
    pub query: String,
    pub limit: usize,
}

/// A fact returned by the server, read-only on this side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fact {
    pub fact: String,
    pub score: f64,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Fact {
    /// `<fact> (confidence: <score>)` with the score rounded to two decimals,
    /// ties away from zero
    pub fn annotated(&self) -> String {
        let rounded = (self.score * 100.0).round() / 100.0;
        format!("{} (confidence: {:.2})", self.fact, rounded)
    }
}

/// Provenance of a fact group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    File,
    Conversation,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceGroup {
    pub source_type: SourceType,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub facts: Vec<Fact>,
}

/// Response of `POST /memory/query/grouped`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupedQueryResponse {
    #[serde(default)]
    pub groups: Vec<SourceGroup>,
    #[serde(default)]
    pub total_facts: usize,
}

/// Response of the legacy `POST /memory/query`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LegacyQueryResponse {
    #[serde(default)]
    pub hits: Vec<Fact>,
    #[serde(default)]
    pub total: usize,
}
