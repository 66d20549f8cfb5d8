use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Endpoint not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("Graphiti returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short-term buffer error: {0}")]
    Buffer(String),
}

impl MemoryError {
    /// True when the endpoint itself does not exist on the server.
    ///
    /// This is the only failure class the fact query treats differently:
    /// it triggers the single fallback to the legacy endpoint.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
