//! Episode payloads: recent turns read from and appended to Graphiti.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::turn::{Role, Turn};

/// One stored conversation episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    pub role: Role,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Episode {
    /// Convert to a turn, keeping the server timestamp when it parses.
    pub fn into_turn(self, fallback: DateTime<Utc>) -> Turn {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(fallback);
        Turn::new(self.role, self.content, timestamp)
    }
}

/// Response of `GET /memory/users/{id}/episodes`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodesResponse {
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppendMetadata {
    pub role: Role,
    pub source: String,
    pub session_id: String,
    pub timestamp: String,
}

/// Body of `POST /memory/append`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppendRequest {
    pub user_id: String,
    pub text: String,
    pub role: Role,
    pub metadata: AppendMetadata,
}

impl AppendRequest {
    pub fn new(session_id: &str, text: &str, role: Role, source: &str, timestamp: &str) -> Self {
        Self {
            user_id: session_id.to_string(),
            text: text.to_string(),
            role,
            metadata: AppendMetadata {
                role,
                source: source.to_string(),
                session_id: session_id.to_string(),
                timestamp: timestamp.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episodes_response_deserialization() {
        let json = r#"{
            "episodes": [
                {"content": "hi", "role": "user", "timestamp": "2024-01-15T10:00:00Z"},
                {"id": "e2", "content": "hello", "role": "assistant", "timestamp": "2024-01-15T10:00:01Z"}
            ],
            "total": 2
        }"#;
        let response: EpisodesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.episodes.len(), 2);
        assert_eq!(response.episodes[0].role, Role::User);
        assert_eq!(response.episodes[1].id.as_deref(), Some("e2"));
        assert_eq!(response.total, Some(2));
    }

    #[test]
    fn test_episodes_response_without_total() {
        let response: EpisodesResponse = serde_json::from_str(r#"{"episodes": []}"#).unwrap();
        assert!(response.episodes.is_empty());
        assert!(response.total.is_none());
    }

    #[test]
    fn test_episode_into_turn_parses_timestamp() {
        let episode = Episode {
            id: None,
            content: "hi".to_string(),
            role: Role::User,
            timestamp: "2024-01-15T10:00:00Z".to_string(),
            metadata: None,
        };
        let fallback = Utc::now();
        let turn = episode.into_turn(fallback);
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "hi");
        assert_ne!(turn.timestamp, fallback);
    }

    #[test]
    fn test_episode_into_turn_uses_fallback_for_bad_timestamp() {
        let episode = Episode {
            id: None,
            content: "hi".to_string(),
            role: Role::Assistant,
            timestamp: "yesterday".to_string(),
            metadata: None,
        };
        let fallback = Utc::now();
        assert_eq!(episode.into_turn(fallback).timestamp, fallback);
    }

    #[test]
    fn test_append_request_shape() {
        let request = AppendRequest::new("user-1", "hello", Role::User, "graphiti-memory", "2024-01-15T10:00:00.000Z");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["role"], "user");
        assert_eq!(json["metadata"]["role"], "user");
        assert_eq!(json["metadata"]["source"], "graphiti-memory");
        assert_eq!(json["metadata"]["session_id"], "user-1");
        assert_eq!(json["metadata"]["timestamp"], "2024-01-15T10:00:00.000Z");
    }
}
