//! File-based operation log for memory events.
//!
//! Logs to `<data_dir>/logs/memory.log` with 1MB rotation.

use crate::error::Result;
use crate::observe::{MemoryEvent, MemoryObserver, Operation};
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "memory.log";
const LOG_DIR_NAME: &str = "logs";
const MAX_LOG_SIZE: u64 = 1_048_576; // 1MB
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format an event as a single log line.
///
/// Format: `[2024-01-24 10:30:45] OK groupedQuery <session> <details>`.
/// Newlines in details are flattened so one event stays one line.
pub fn to_log_line(event: &MemoryEvent) -> String {
    let status = if event.success { "OK" } else { "ERR" };
    let details = event
        .details
        .as_deref()
        .map(|d| d.replace(['\n', '\r'], " "))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{}] {} {} {} {}",
        event.timestamp.format(TIMESTAMP_FORMAT),
        status,
        event.operation,
        escape_session(&event.session),
        details
    )
}

/// Parse a log line written by [`to_log_line`].
pub fn from_log_line(line: &str) -> Option<MemoryEvent> {
    if !line.starts_with('[') {
        return None;
    }

    let timestamp_end = line.find(']')?;
    let timestamp_str = &line[1..timestamp_end];
    let rest = line.get(timestamp_end + 2..)?.trim();
    let parts: Vec<&str> = rest.splitn(4, ' ').collect();
    if parts.len() < 3 {
        return None;
    }

    let success = parts[0] == "OK";
    let operation = parts[1].parse::<Operation>().ok()?;
    let session = unescape_session(parts[2]);
    let details = parts.get(3).map(|s| s.to_string()).filter(|s| s != "-");

    let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())?;

    Some(MemoryEvent {
        timestamp,
        operation,
        session,
        success,
        details,
    })
}

// Sessions are opaque and may contain spaces; keep the log columnar.
fn escape_session(session: &str) -> String {
    if session.is_empty() {
        return "-".to_string();
    }
    session.replace('%', "%25").replace(' ', "%20")
}

fn unescape_session(session: &str) -> String {
    if session == "-" {
        return String::new();
    }
    session.replace("%20", " ").replace("%25", "%")
}

/// Get the log file path under a data directory, creating the log directory.
pub fn get_log_path(data_dir: &Path) -> Result<PathBuf> {
    let log_dir = data_dir.join(LOG_DIR_NAME);

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    Ok(log_dir.join(LOG_FILE_NAME))
}

fn needs_rotation(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| metadata.len() >= MAX_LOG_SIZE)
        .unwrap_or(false)
}

/// Rotate log file (rename to .old, start fresh).
fn rotate_log(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let old_path = path.with_extension("log.old");
    if old_path.exists() {
        fs::remove_file(&old_path)?;
    }
    fs::rename(path, &old_path)?;

    Ok(())
}

/// Append an event to the log file.
pub fn log(path: &Path, event: &MemoryEvent) -> Result<()> {
    if needs_rotation(path) {
        rotate_log(path)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", to_log_line(event))?;
    writer.flush()?;

    Ok(())
}

/// Read log entries.
///
/// - `limit`: Maximum number of entries to return (most recent first)
/// - `operation`: Optional filter by operation name
pub fn read_logs(path: &Path, limit: usize, operation: Option<&str>) -> Result<Vec<MemoryEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);

    let mut entries: Vec<MemoryEvent> = reader
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| from_log_line(&line))
        .filter(|entry| operation.map_or(true, |op| entry.operation.as_str().eq_ignore_ascii_case(op)))
        .collect();

    entries.reverse();
    entries.truncate(limit);

    Ok(entries)
}

/// Clear all logs, returning the number of lines removed.
pub fn clear_logs(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let count = BufReader::new(File::open(path)?).lines().count();
    File::create(path)?;

    let old_path = path.with_extension("log.old");
    if old_path.exists() {
        fs::remove_file(&old_path)?;
    }

    Ok(count)
}

/// Observer appending every event to the log file.
///
/// Write failures are reported through `tracing` and otherwise ignored; the
/// log must never affect a conversation turn.
#[derive(Debug, Clone)]
pub struct FileLogObserver {
    path: PathBuf,
}

impl FileLogObserver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Observer writing to `<data_dir>/logs/memory.log`
    pub fn in_data_dir(data_dir: &Path) -> Result<Self> {
        Ok(Self::new(get_log_path(data_dir)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryObserver for FileLogObserver {
    fn record(&self, event: &MemoryEvent) {
        if let Err(e) = log(&self.path, event) {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to write memory log");
        }
    }
}
