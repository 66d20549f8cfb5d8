//! Session identifiers.
//!
//! A session key partitions both the short-term buffer and every remote call.
//! The core carries it verbatim; only the host-side resolver may mint one.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque per-user/session key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-name-safe form of the key.
    ///
    /// ASCII alphanumerics, `-`, `_` and `.` are kept; every other byte is
    /// written as `%XX`, so distinct keys never share a file.
    pub fn file_stem(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for byte in self.0.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_') {
                out.push(byte as char);
            } else if byte == b'.' && !out.is_empty() {
                out.push('.');
            } else {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
        out
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Resolve the session key handed over by the host.
///
/// Candidates are tried in order; the first one with non-whitespace content is
/// used verbatim. When none qualifies a fresh UUID v4 is generated.
pub fn resolve_session<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> SessionId {
    candidates
        .into_iter()
        .flatten()
        .find(|c| !c.trim().is_empty())
        .map(SessionId::new)
        .unwrap_or_else(|| SessionId::new(Uuid::new_v4().to_string()))
}
