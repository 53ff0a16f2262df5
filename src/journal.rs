//! Run journal.
//!
//! An append-only NDJSON log of what scripts did to the outside world: one
//! line when a script starts, one per side-effecting filter call, and one
//! when it finishes or fails. Enabled with `journal.enabled` in config.
//!
//! # Entry Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: `script_start`, `effect`, `script_finish`, `script_fail`, `debug_halt`
//! - `actor`: `user@HOST`
//! - `script`: path of the running script
//! - `filter`: filter name for `effect` entries
//! - `details`: freeform object

use crate::error::{Result, SiestaError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions that can be journaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAction {
    ScriptStart,
    Effect,
    ScriptFinish,
    ScriptFail,
    DebugHalt,
}

/// A journal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub ts: DateTime<Utc>,
    pub action: JournalAction,
    pub actor: String,
    pub script: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub details: Value,
}

/// Appends entries for one script run.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    script: String,
    actor: String,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>, script: &Path) -> Self {
        Self {
            path: path.into(),
            script: script.display().to_string(),
            actor: get_actor_string(),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a script-level action.
    pub fn record(&self, action: JournalAction, details: Value) -> Result<()> {
        self.append(&self.entry(action, None, details))
    }

    /// Record a side-effecting filter call.
    pub fn record_effect(&self, filter: &str, details: Value) -> Result<()> {
        self.append(&self.entry(JournalAction::Effect, Some(filter), details))
    }

    fn entry(&self, action: JournalAction, filter: Option<&str>, details: Value) -> Entry {
        Entry {
            ts: Utc::now(),
            action,
            actor: self.actor.clone(),
            script: self.script.clone(),
            filter: filter.map(str::to_string),
            details,
        }
    }

    /// Append one entry as a single JSON line, creating the file if needed.
    fn append(&self, entry: &Entry) -> Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| SiestaError::Io(format!("failed to serialize journal entry: {}", e)))?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|e| {
                SiestaError::Io(format!(
                    "failed to create journal directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                SiestaError::Io(format!(
                    "failed to open journal '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", line).map_err(|e| {
            SiestaError::Io(format!(
                "failed to write journal '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Get the actor string for journal entries.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Read all entries from a journal file.
pub fn read_entries(path: &Path) -> Result<Vec<Entry>> {
    let content = fs::read_to_string(path).map_err(|e| {
        SiestaError::Io(format!("failed to read journal '{}': {}", path.display(), e))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| SiestaError::Io(format!("malformed journal line: {}", e)))
        })
        .collect()
}
