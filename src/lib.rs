//! # ftpls — Streaming FTP Directory-Listing Client
//!
//! Given an `ftp://` URL and a transport that yields the raw bytes of a
//! directory listing, a [`ListSession`] streams the response, incrementally
//! decodes complete entries across arbitrary chunk boundaries, and reports
//! terminal status through a caller-supplied callback.
//!
//! Architecture:
//! - `types` — data structures, enums, config
//! - `error` — categorised error type
//! - `parser` — incremental Unix / Windows / MLSD entry decoder
//! - `buffer` — chunk accumulator with a fixed-point decode loop
//! - `transport` — injectable byte-source capability (TCP or any stream)
//! - `session` — the listing state machine and status reporting
//!
//! The FTP control protocol (login, PASV/PORT, reply parsing) is a
//! collaborator, not part of this crate: whatever negotiates the data
//! connection hands the raw listing stream over, e.g. via
//! [`transport::StreamTransport`].

pub mod buffer;
pub mod error;
pub mod parser;
pub mod session;
pub mod transport;
pub mod types;

pub use buffer::{FeedResult, ParseBuffer};
pub use error::{ListError, ListErrorKind, ListResult};
pub use session::{validate_url, CancelHandle, ListSession};
pub use transport::{ListingTransport, StreamTransport, TcpTransport};
pub use types::*;
