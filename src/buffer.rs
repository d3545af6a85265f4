//! Incremental parse buffer — accumulates stream chunks and drains every
//! complete entry from them.

use crate::error::ListError;
use crate::parser::{self, Decoded};
use crate::types::ListingEntry;
use bytes::{Buf, BytesMut};

/// Entries drained by one [`ParseBuffer::feed`] call, plus the error that
/// stopped decoding, if any. Entries decoded before the failure point are
/// still returned.
#[derive(Debug, Default)]
pub struct FeedResult {
    pub entries: Vec<ListingEntry>,
    pub error: Option<ListError>,
}

/// Accumulates not-yet-decoded listing bytes across reads.
///
/// Owned by a single session. After a decode error the buffer is poisoned:
/// every further `feed` yields no entries and returns the same error.
#[derive(Debug, Default)]
pub struct ParseBuffer {
    pending: BytesMut,
    poisoned: Option<ListError>,
}

impl ParseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes buffered but not yet decodable into a complete entry.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Append `chunk`, then decode entries until no complete record remains.
    ///
    /// Runs to a fixed point: one call can yield any number of entries,
    /// including zero when the data so far ends mid-record. The undecoded
    /// remainder is retained for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> FeedResult {
        if let Some(err) = &self.poisoned {
            return FeedResult {
                entries: Vec::new(),
                error: Some(err.clone()),
            };
        }

        self.pending.extend_from_slice(chunk);

        let mut entries = Vec::new();
        loop {
            match parser::decode_entry(&self.pending) {
                Ok(Decoded::Entry { entry, consumed }) => {
                    debug_assert!(consumed > 0 && consumed <= self.pending.len());
                    self.pending.advance(consumed);
                    entries.push(entry);
                }
                Ok(Decoded::Skip { consumed }) => {
                    self.pending.advance(consumed);
                }
                Ok(Decoded::Incomplete) => {
                    return FeedResult {
                        entries,
                        error: None,
                    };
                }
                Err(err) => {
                    self.poisoned = Some(err.clone());
                    return FeedResult {
                        entries,
                        error: Some(err),
                    };
                }
            }
        }
    }
}
