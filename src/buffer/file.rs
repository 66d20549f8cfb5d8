//! File-backed short-term buffer.
//!
//! Each session is stored at `<dir>/<session-file-stem>.json` as a JSON array
//! of turns, so the window survives across short-lived host processes.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use super::ShortTermBuffer;
use crate::error::{MemoryError, Result};
use crate::models::Turn;
use crate::session::SessionId;

#[derive(Debug, Clone)]
pub struct FileBuffer {
    dir: PathBuf,
}

impl FileBuffer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding one session's turns
    pub fn session_path(&self, session: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", session.file_stem()))
    }

    fn load(&self, session: &SessionId) -> Result<Vec<Turn>> {
        let path = self.session_path(session);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            MemoryError::Buffer(format!("Corrupt buffer file {}: {}", path.display(), e))
        })
    }

    fn store(&self, session: &SessionId, turns: &[Turn]) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let content = serde_json::to_string_pretty(turns)?;
        // Readers see either the old file or the new one, never a partial write
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", session.file_stem(), std::process::id()));
        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, self.session_path(session)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ShortTermBuffer for FileBuffer {
    async fn turns(&self, session: &SessionId) -> Result<Vec<Turn>> {
        self.load(session)
    }

    async fn push(&mut self, session: &SessionId, turns: &[Turn]) -> Result<()> {
        let mut stored = self.load(session)?;
        stored.extend_from_slice(turns);
        self.store(session, &stored)
    }

    async fn drop_oldest(&mut self, session: &SessionId, count: usize) -> Result<()> {
        let mut stored = self.load(session)?;
        if count == 0 || stored.is_empty() {
            return Ok(());
        }
        let count = count.min(stored.len());
        stored.drain(..count);
        self.store(session, &stored)
    }

    async fn clear(&mut self, session: &SessionId) -> Result<()> {
        let path = self.session_path(session);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
