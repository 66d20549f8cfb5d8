use serde::Serialize;
use std::collections::HashMap;

use crate::engine::WriteBackReport;

// ============================================================================
// Base Response Types
// ============================================================================

/// Wrapper for successful responses with data
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// ============================================================================
// Memory Operation Responses
// ============================================================================

/// Response for load-context
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadContextData {
    pub session_id: String,
    pub memory: HashMap<String, String>,
}

/// Response for save-turn
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTurnData {
    pub session_id: String,
    pub memory_saved: bool,
    pub remote: WriteBackReport,
}

/// Response for clear
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearData {
    pub session_id: String,
    pub cleared: bool,
}

/// Response for health
#[derive(Debug, Serialize)]
pub struct HealthData {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================================================
// Log Responses
// ============================================================================

/// Single log entry
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub operation: String,
    pub session: String,
    #[serde(flatten)]
    pub details: serde_json::Value,
}

/// Response for reading logs
#[derive(Debug, Serialize)]
pub struct LogsData {
    pub entries: Vec<LogEntry>,
    pub count: usize,
}

/// Response for clearing logs
#[derive(Debug, Serialize)]
pub struct ClearLogsData {
    pub cleared: usize,
}

// ============================================================================
// Tests
// ============================================================================
