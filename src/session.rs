//! Listing session — the state machine that drives one directory listing
//! from `Idle` to a terminal state.
//!
//! Lifecycle: validate URL → open transport → read bounded chunks → feed the
//! parse buffer → aggregate entries → exactly one terminal status callback.
//! The transport is released exactly once on every terminal path, and a
//! session that reached a terminal state ignores any further driving.

use crate::buffer::ParseBuffer;
use crate::error::{ListError, ListResult};
use crate::transport::ListingTransport;
use crate::types::{ListConfig, ListingEntry, SessionState, StatusUpdate};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use url::Url;
use uuid::Uuid;

/// Handle for cancelling a running session from another task.
///
/// Cloneable; `cancel` is idempotent and effective from any state.
#[derive(Clone)]
pub struct CancelHandle {
    tx: mpsc::Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // A full channel means a cancel is already pending.
        let _ = self.tx.try_send(());
    }
}

/// A single-use directory-listing session.
///
/// Owns its transport, parse buffer and decoded entries. Once it reaches a
/// terminal state it must be discarded; a new listing needs a new session.
pub struct ListSession {
    id: String,
    url: String,
    config: ListConfig,
    state: SessionState,
    status: String,
    entries: Vec<ListingEntry>,
    buffer: ParseBuffer,
    transport: Box<dyn ListingTransport>,
    released: bool,
    cancel_tx: mpsc::Sender<()>,
    cancel_rx: mpsc::Receiver<()>,
}

impl ListSession {
    /// Create a session over an injected transport with default config.
    pub fn new(url: impl Into<String>, transport: Box<dyn ListingTransport>) -> Self {
        Self::with_config(url, transport, ListConfig::default())
    }

    pub fn with_config(
        url: impl Into<String>,
        transport: Box<dyn ListingTransport>,
        config: ListConfig,
    ) -> Self {
        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            config,
            state: SessionState::Idle,
            status: String::new(),
            entries: Vec::new(),
            buffer: ParseBuffer::new(),
            transport,
            released: false,
            cancel_tx,
            cancel_rx,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current or terminal human-readable status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn done(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn failed(&self) -> bool {
        self.state == SessionState::Failed
    }

    /// Entries decoded so far, in decode order.
    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ListingEntry> {
        self.entries
    }

    /// Handle for cancelling this session, usable from any task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
        }
    }

    // ─── Drive ───────────────────────────────────────────────────

    /// Run the session to a terminal state.
    ///
    /// `on_status` is invoked exactly once with `done == true`; non-terminal
    /// updates are reported only when `config.report_intermediate` is set.
    /// Calling `list` on a session that already ran is ignored.
    pub async fn list<F>(&mut self, mut on_status: F)
    where
        F: FnMut(&StatusUpdate),
    {
        if self.state != SessionState::Idle {
            warn!(
                "session {}: list() called in state {:?}, ignoring",
                self.id, self.state
            );
            return;
        }

        // Cancel requested before the session even started.
        if self.cancel_rx.try_recv().is_ok() {
            self.finish(SessionState::Cancelled, "Cancelled", &mut on_status)
                .await;
            return;
        }

        if let Err(e) = validate_url(&self.url) {
            info!("session {}: {}", self.id, e);
            self.finish(SessionState::Failed, "Failed: invalid URL", &mut on_status)
                .await;
            return;
        }

        self.state = SessionState::Connecting;
        info!("session {}: opening listing stream for {}", self.id, self.url);

        let opened = {
            let cancel_rx = &mut self.cancel_rx;
            let transport = self.transport.as_mut();
            tokio::select! {
                biased;
                _ = cancel_rx.recv() => None,
                r = transport.open() => Some(r),
            }
        };
        match opened {
            None => {
                self.finish(SessionState::Cancelled, "Cancelled", &mut on_status)
                    .await;
                return;
            }
            Some(Err(e)) => {
                debug!("session {}: open failed: {}", self.id, e);
                self.finish(
                    SessionState::Failed,
                    "Failed: couldn't open stream",
                    &mut on_status,
                )
                .await;
                return;
            }
            Some(Ok(())) => {
                self.state = SessionState::Receiving;
                self.status = "Connection opened".to_string();
                self.report_progress(&mut on_status);
            }
        }

        // A zero-sized read would be indistinguishable from end of stream.
        let mut chunk = vec![0u8; self.config.chunk_size.max(1)];

        loop {
            let step = {
                let cancel_rx = &mut self.cancel_rx;
                let transport = self.transport.as_mut();
                let read_timeout_sec = self.config.read_timeout_sec;
                tokio::select! {
                    biased;
                    _ = cancel_rx.recv() => ReadStep::Cancelled,
                    step = read_step(transport, &mut chunk, read_timeout_sec) => step,
                }
            };

            match step {
                ReadStep::Cancelled => {
                    self.finish(SessionState::Cancelled, "Cancelled", &mut on_status)
                        .await;
                    return;
                }
                ReadStep::TimedOut => {
                    let msg = format!(
                        "Connection failed: no data for {}s",
                        self.config.read_timeout_sec
                    );
                    self.finish(SessionState::Failed, &msg, &mut on_status).await;
                    return;
                }
                ReadStep::Data(Err(e)) => {
                    debug!("session {}: read failed: {}", self.id, e);
                    let msg = if e.message.is_empty() {
                        "Connection failed for some unknown reason".to_string()
                    } else {
                        format!("Connection failed: {}", e.message)
                    };
                    self.finish(SessionState::Failed, &msg, &mut on_status).await;
                    return;
                }
                ReadStep::Data(Ok(0)) => {
                    self.finish(SessionState::Finished, "Done", &mut on_status)
                        .await;
                    return;
                }
                ReadStep::Data(Ok(n)) => {
                    let mut fed = self.buffer.feed(&chunk[..n]);
                    if !fed.entries.is_empty() {
                        debug!(
                            "session {}: decoded {} entries ({} total)",
                            self.id,
                            fed.entries.len(),
                            self.entries.len() + fed.entries.len()
                        );
                        self.entries.append(&mut fed.entries);
                        self.report_progress(&mut on_status);
                    }
                    if let Some(err) = fed.error {
                        info!("session {}: {}", self.id, err);
                        self.finish(SessionState::Failed, "Failed to parse", &mut on_status)
                            .await;
                        return;
                    }
                }
            }
        }
    }

    // ─── Terminal transition ─────────────────────────────────────

    async fn finish<F>(&mut self, state: SessionState, status: &str, on_status: &mut F)
    where
        F: FnMut(&StatusUpdate),
    {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.status = status.to_string();
        self.release().await;
        info!(
            "session {}: {} ({} entries)",
            self.id,
            status,
            self.entries.len()
        );
        on_status(&self.snapshot());
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.transport.close().await;
        }
    }

    fn snapshot(&self) -> StatusUpdate {
        StatusUpdate {
            state: self.state,
            status: self.status.clone(),
            done: self.done(),
            failed: self.failed(),
            entry_count: self.entries.len(),
        }
    }

    fn report_progress<F>(&self, on_status: &mut F)
    where
        F: FnMut(&StatusUpdate),
    {
        if self.config.report_intermediate {
            on_status(&self.snapshot());
        }
    }
}

enum ReadStep {
    Data(ListResult<usize>),
    TimedOut,
    Cancelled,
}

async fn read_step(
    transport: &mut dyn ListingTransport,
    chunk: &mut [u8],
    timeout_sec: u64,
) -> ReadStep {
    if timeout_sec == 0 {
        return ReadStep::Data(transport.read(chunk).await);
    }
    match timeout(Duration::from_secs(timeout_sec), transport.read(chunk)).await {
        Ok(r) => ReadStep::Data(r),
        Err(_) => ReadStep::TimedOut,
    }
}

// ─── URL validation ──────────────────────────────────────────────────

/// Validate that `url` is a well-formed `ftp://` URL with a host.
pub fn validate_url(url: &str) -> ListResult<Url> {
    if url.trim().is_empty() {
        return Err(ListError::invalid_url("URL is empty"));
    }
    let parsed =
        Url::parse(url).map_err(|e| ListError::invalid_url(e.to_string()).with_url(url))?;
    if parsed.scheme() != "ftp" {
        return Err(
            ListError::invalid_url(format!("unsupported scheme '{}'", parsed.scheme()))
                .with_url(url),
        );
    }
    if parsed.host_str().is_none() {
        return Err(ListError::invalid_url("URL has no host").with_url(url));
    }
    Ok(parsed)
}
