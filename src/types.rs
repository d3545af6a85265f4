//! Shared types for the listing client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Directory Listing ───────────────────────────────────────────────

/// Type of a remote filesystem entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// One entry decoded from a directory listing (LIST or MLSD output).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    /// Filename as transmitted. Never empty for a decoded entry; any
    /// re-encoding for display is the caller's job.
    pub name: String,
    pub kind: EntryKind,
    /// Byte size. `None` when the listing carries no size for the entry
    /// (e.g. Windows `<DIR>` rows) — distinct from `Some(0)`.
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    pub permissions: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub link_target: Option<String>,
    /// Raw line from the server (for debugging).
    pub raw: Option<String>,
    /// MLSD fact map (e.g. "type" → "file", "size" → "1234").
    #[serde(default)]
    pub facts: HashMap<String, String>,
}

impl ListingEntry {
    /// An entry with only name and kind set.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: None,
            modified: None,
            permissions: None,
            owner: None,
            group: None,
            link_target: None,
            raw: None,
            facts: HashMap::new(),
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────────

/// Lifecycle of a listing session.
///
/// `Finished`, `Failed` and `Cancelled` are terminal: no transitions leave
/// them, and a session that reached one must be discarded, not reused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Connecting,
    Receiving,
    Finished,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }
}

/// Configuration for a single listing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConfig {
    /// Upper bound for a single transport read, in bytes.
    #[serde(default = "default_chunk")]
    pub chunk_size: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Inactivity timeout between reads in seconds (0 = disabled).
    #[serde(default = "default_read_timeout")]
    pub read_timeout_sec: u64,
    /// Invoke the status callback for non-terminal progress too.
    /// Terminal status is always reported regardless of this flag.
    #[serde(default)]
    pub report_intermediate: bool,
}

fn default_chunk() -> usize {
    32_768
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_read_timeout() -> u64 {
    30
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk(),
            connect_timeout_sec: default_connect_timeout(),
            read_timeout_sec: default_read_timeout(),
            report_intermediate: false,
        }
    }
}

/// Snapshot handed to the status callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub state: SessionState,
    /// Human-readable status line (e.g. "Connection opened", "Done").
    pub status: String,
    /// True once the session reached a terminal state.
    pub done: bool,
    /// True iff the terminal state is `Failed`.
    pub failed: bool,
    /// Number of entries decoded so far.
    pub entry_count: usize,
}
