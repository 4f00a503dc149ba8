//! Persistent sync state
//!
//! Records which remote page each local document and directory was mirrored
//! to, plus the content hash seen at the time. Stored as JSON in the working
//! directory and rewritten in full after every completed unit of work.
//!
//! ## File format
//!
//! ```json
//! {
//!   "destinationPageId": "0f1e...",
//!   "files": {
//!     "A/B/note.md": {
//!       "pageId": "9a8b...",
//!       "contentHash": "e3b0...",
//!       "lastSynced": "2026-10-16T08:00:00+00:00"
//!     }
//!   },
//!   "directories": { ".": { "pageId": "0f1e..." }, "A": { "pageId": "77aa..." } }
//! }
//! ```

use crate::core::error::SyncError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default state file name, relative to the current directory
pub const STATE_FILE: &str = ".vault2notion-state.json";

/// Synced document entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub page_id: String,
    pub content_hash: String,
    /// RFC 3339
    pub last_synced: String,
}

/// Synced directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub page_id: String,
}

/// State bound to one destination page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub destination_page_id: String,
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
    #[serde(default)]
    pub directories: BTreeMap<String, DirectoryEntry>,
}

impl SyncState {
    /// Fresh state for a destination
    pub fn new(destination_page_id: impl Into<String>) -> Self {
        Self {
            destination_page_id: destination_page_id.into(),
            files: BTreeMap::new(),
            directories: BTreeMap::new(),
        }
    }

    /// Check that this state belongs to `destination`
    ///
    /// Mixing two trees in one state file would put pages under the wrong
    /// parent, so a mismatch is always an error.
    pub fn ensure_destination(&self, destination: &str) -> Result<(), SyncError> {
        if self.destination_page_id != destination {
            return Err(SyncError::DestinationMismatch {
                stored: self.destination_page_id.clone(),
                requested: destination.to_string(),
            });
        }
        Ok(())
    }

    pub fn file(&self, rel_path: &str) -> Option<&FileEntry> {
        self.files.get(rel_path)
    }

    pub fn directory_page(&self, rel_dir: &str) -> Option<&str> {
        self.directories.get(rel_dir).map(|d| d.page_id.as_str())
    }

    pub fn record_file(&mut self, rel_path: impl Into<String>, entry: FileEntry) {
        self.files.insert(rel_path.into(), entry);
    }

    pub fn record_directory(&mut self, rel_dir: impl Into<String>, page_id: impl Into<String>) {
        self.directories.insert(
            rel_dir.into(),
            DirectoryEntry {
                page_id: page_id.into(),
            },
        );
    }
}

/// Load/save contract for sync state
pub trait StateStore {
    /// Load the state for `destination`, or a fresh one if none exists
    ///
    /// # Errors
    ///
    /// [`SyncError::DestinationMismatch`] when the stored state belongs to a
    /// different destination, or an I/O / parse failure.
    fn load(&self, destination: &str) -> Result<SyncState, SyncError>;

    /// Overwrite the stored state
    fn save(&self, state: &SyncState) -> Result<(), SyncError>;
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`STATE_FILE`] in the current directory
    pub fn in_current_dir() -> Self {
        Self::new(STATE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<SyncState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {:?}", self.path))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("Invalid state file {:?}", self.path))?;
        Ok(Some(state))
    }

    /// Write to a sibling temp file, then rename over the state file
    ///
    /// A crash mid-save leaves the previous state intact.
    fn write(&self, state: &SyncState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write state file {:?}", self.path))?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self, destination: &str) -> Result<SyncState, SyncError> {
        match self.read().map_err(SyncError::State)? {
            Some(state) => {
                state.ensure_destination(destination)?;
                Ok(state)
            }
            None => Ok(SyncState::new(destination)),
        }
    }

    fn save(&self, state: &SyncState) -> Result<(), SyncError> {
        self.write(state).map_err(SyncError::State)
    }
}
