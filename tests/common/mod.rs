//! Shared test fixture: a scripted in-memory transport with error injection.

use async_trait::async_trait;
use ftpls::error::{ListError, ListResult};
use ftpls::transport::ListingTransport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One scripted transport event, consumed per `read` call.
pub enum Script {
    /// Deliver these bytes as one chunk (must fit the session's read buffer).
    Chunk(Vec<u8>),
    /// Fail the read with this error.
    ReadError(ListError),
    /// Never resolve — the session must time out or be cancelled.
    Stall,
}

impl Script {
    pub fn chunk(s: &str) -> Self {
        Self::Chunk(s.as_bytes().to_vec())
    }
}

pub struct ScriptedTransport {
    script: VecDeque<Script>,
    fail_open: bool,
    closed: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    /// A transport that delivers `script` events, then EOF.
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: script.into(),
            fail_open: false,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_open() -> Self {
        let mut t = Self::new(Vec::new());
        t.fail_open = true;
        t
    }

    /// Counter of `close` calls, readable after the session consumed us.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl ListingTransport for ScriptedTransport {
    async fn open(&mut self) -> ListResult<()> {
        if self.fail_open {
            Err(ListError::open_failed("scripted open failure"))
        } else {
            Ok(())
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> ListResult<usize> {
        match self.script.pop_front() {
            None => Ok(0),
            Some(Script::Chunk(bytes)) => {
                assert!(
                    bytes.len() <= buf.len(),
                    "scripted chunk larger than the session's read buffer"
                );
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Script::ReadError(e)) => Err(e),
            Some(Script::Stall) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
