//! Transport capability — the byte source a listing session reads from.
//!
//! The session core carries no FTP protocol logic; whatever produces the raw
//! listing bytes (an OS-provided FTP stream, a data connection negotiated by
//! an external control client, a test fixture) is injected behind
//! [`ListingTransport`].

use crate::error::{ListError, ListResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

/// A non-blocking byte source for one listing session.
#[async_trait]
pub trait ListingTransport: Send {
    /// Establish the underlying stream.
    async fn open(&mut self) -> ListResult<()>;

    /// Read up to `buf.len()` bytes. `Ok(0)` signals end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> ListResult<usize>;

    /// Release the underlying stream. Safe to call more than once.
    async fn close(&mut self);
}

// ─── TCP ─────────────────────────────────────────────────────────────

/// TCP transport connecting to the host and port of an `ftp://` URL.
pub struct TcpTransport {
    host: String,
    port: u16,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            stream: None,
        }
    }

    /// Build a transport from a parsed FTP URL (port defaults to 21).
    pub fn from_url(url: &Url, connect_timeout: Duration) -> ListResult<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| ListError::invalid_url("URL has no host").with_url(url.as_str()))?;
        Ok(Self::new(host, url.port().unwrap_or(21), connect_timeout))
    }
}

#[async_trait]
impl ListingTransport for TcpTransport {
    async fn open(&mut self) -> ListResult<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let tcp = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ListError::open_failed(format!("TCP connect to {} timed out", addr)))?
            .map_err(|e| ListError::open_failed(format!("TCP connect to {}: {}", addr, e)))?;
        tcp.set_nodelay(true).ok();
        self.stream = Some(tcp);
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> ListResult<usize> {
        match self.stream.as_mut() {
            Some(tcp) => Ok(tcp.read(buf).await?),
            None => Err(ListError::read_failed("transport is not open")),
        }
    }

    async fn close(&mut self) {
        if let Some(mut tcp) = self.stream.take() {
            tcp.shutdown().await.ok();
        }
    }
}

// ─── Pre-established stream ──────────────────────────────────────────

/// Wraps an already-established stream, e.g. a data connection handed over
/// by an external FTP control client after PASV negotiation.
pub struct StreamTransport<S> {
    stream: Option<S>,
}

impl<S: AsyncRead + Unpin + Send> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

#[async_trait]
impl<S: AsyncRead + Unpin + Send> ListingTransport for StreamTransport<S> {
    async fn open(&mut self) -> ListResult<()> {
        if self.stream.is_some() {
            Ok(())
        } else {
            Err(ListError::open_failed("stream already released"))
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> ListResult<usize> {
        match self.stream.as_mut() {
            Some(s) => Ok(s.read(buf).await?),
            None => Err(ListError::read_failed("transport is not open")),
        }
    }

    async fn close(&mut self) {
        self.stream = None;
    }
}
