//! Categorised error type for the listing client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised listing error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListError {
    pub kind: ListErrorKind,
    pub message: String,
    /// URL of the session that produced the error, if known.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListErrorKind {
    /// Caller-supplied URL is absent or malformed.
    InvalidUrl,
    /// The transport could not be opened.
    OpenFailed,
    /// A read from an open transport failed.
    ReadFailed,
    /// No data arrived within the inactivity window.
    Timeout,
    /// Bytes that can never form a valid listing entry.
    MalformedListing,
}

pub type ListResult<T> = Result<T, ListError>;

// ── Construction helpers ─────────────────────────────────────────────

impl ListError {
    pub fn new(kind: ListErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::new(ListErrorKind::InvalidUrl, msg)
    }

    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::new(ListErrorKind::OpenFailed, msg)
    }

    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::new(ListErrorKind::ReadFailed, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ListErrorKind::Timeout, msg)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ListErrorKind::MalformedListing, msg)
    }
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(url) = &self.url {
            write!(f, "[{:?}] {} ({})", self.kind, self.message, url)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ListError {}

impl From<std::io::Error> for ListError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout(format!("I/O timeout: {}", e))
        } else {
            Self::read_failed(e.to_string())
        }
    }
}
