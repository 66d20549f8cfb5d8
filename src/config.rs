use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MemoryError, Result};

pub const DEFAULT_CONTEXT_WINDOW: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_MEMORY_KEY: &str = "chat_history";
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_SOURCE: &str = "graphiti-memory";

const MAX_CONTEXT_WINDOW: usize = 50;
const MAX_SEARCH_LIMIT: usize = 100;

/// Adapter configuration loaded from `<data_dir>/config.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    /// Base URL of the Graphiti server
    #[serde(default)]
    pub api_url: String,
    /// Static key sent as `X-API-KEY`
    #[serde(default)]
    pub api_key: String,
    /// Default session key when the host supplies none
    #[serde(default)]
    pub session_key: Option<String>,
    /// Number of recent turns kept and rendered
    #[serde(default = "default_context_window")]
    pub context_window_length: usize,
    /// Maximum number of long-term facts per query
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Key of the rendered context in the output map
    #[serde(default = "default_memory_key")]
    pub memory_key: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Provenance tag written into append metadata
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_memory_key() -> String {
    DEFAULT_MEMORY_KEY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            session_key: None,
            context_window_length: DEFAULT_CONTEXT_WINDOW,
            search_limit: DEFAULT_SEARCH_LIMIT,
            memory_key: default_memory_key(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            source: default_source(),
        }
    }
}

impl MemoryConfig {
    /// Create a config for the given server with all other fields defaulted
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Load config from the standard location (`<data_dir>/config.json`)
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_from_path(&Self::config_path(data_dir))
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                MemoryError::Config(format!("Failed to read config file: {}", e))
            })?;
            let config: MemoryConfig = serde_json::from_str(&content).map_err(|e| {
                MemoryError::Config(format!("Failed to parse config JSON: {}", e))
            })?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Default data directory (`~/.graphiti-memory`)
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".graphiti-memory")
    }

    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.json")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check every field the adapter depends on.
    ///
    /// A failure here is the only error that reaches the host; runtime
    /// remote failures always degrade instead.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(MemoryError::Config("API URL is required".to_string()));
        }
        let url = Url::parse(&self.api_url)
            .map_err(|e| MemoryError::Config(format!("Invalid API URL '{}': {}", self.api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MemoryError::Config(format!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(MemoryError::Config("API key is required".to_string()));
        }
        if !(1..=MAX_CONTEXT_WINDOW).contains(&self.context_window_length) {
            return Err(MemoryError::Config(format!(
                "Context window length must be between 1 and {}, got {}",
                MAX_CONTEXT_WINDOW, self.context_window_length
            )));
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.search_limit) {
            return Err(MemoryError::Config(format!(
                "Search limit must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT, self.search_limit
            )));
        }
        if self.memory_key.trim().is_empty() {
            return Err(MemoryError::Config("Memory key must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(MemoryError::Config("Timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
