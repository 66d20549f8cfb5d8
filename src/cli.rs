// CLI Parser - Clap derive definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::MemoryConfig;

/// graphiti-memory: conversational memory backed by a Graphiti server
#[derive(Parser, Debug)]
#[command(name = "graphiti-memory")]
#[command(version)]
#[command(about = "Long-term facts and recent turns from a Graphiti server, for chat hosts")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides applied on top of `<data_dir>/config.json`
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Base URL of the Graphiti server
    #[arg(long, global = true, env = "GRAPHITI_API_URL")]
    pub api_url: Option<String>,

    /// API key sent with every request
    #[arg(long, global = true, env = "GRAPHITI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory holding config.json, logs and session buffers
    #[arg(long, global = true, env = "GRAPHITI_MEMORY_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Session key; a UUID is generated when none is available
    #[arg(long, global = true, env = "GRAPHITI_SESSION_KEY")]
    pub session: Option<String>,

    /// Number of recent turns kept and rendered
    #[arg(long = "window", global = true)]
    pub context_window_length: Option<usize>,

    /// Maximum number of long-term facts
    #[arg(long, global = true)]
    pub search_limit: Option<usize>,

    /// Key of the rendered context in the output
    #[arg(long, global = true)]
    pub memory_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", global = true)]
    pub timeout_secs: Option<u64>,
}

impl GlobalArgs {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(MemoryConfig::default_data_dir)
    }

    /// Overwrite config fields with the flags that were given
    pub fn apply(&self, config: &mut MemoryConfig) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            config.api_key = key.clone();
        }
        if let Some(window) = self.context_window_length {
            config.context_window_length = window;
        }
        if let Some(limit) = self.search_limit {
            config.search_limit = limit;
        }
        if let Some(key) = &self.memory_key {
            config.memory_key = key.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render memory context for the next reply
    LoadContext {
        /// The user's current utterance (may be empty)
        #[arg(default_value = "")]
        utterance: String,
    },

    /// Record a completed user/assistant turn
    SaveTurn {
        /// What the user said
        user: String,
        /// What the assistant replied
        assistant: String,
    },

    /// Forget the short-term window of a session
    Clear,

    /// Process one workflow item (JSON object) read from stdin
    Run,

    /// Check that the server is reachable
    Health,

    /// View operation logs
    Logs {
        /// Number of log entries
        #[arg(default_value = "50")]
        n: usize,
        /// Filter by operation type
        operation: Option<String>,
    },

    /// Clear all logs
    ClearLogs,
}

// ============================================================================
// Tests
// ============================================================================
