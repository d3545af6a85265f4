//! Chunk-boundary properties of the decoder and parse buffer: the decoded
//! entry sequence must not depend on how the stream was sliced into chunks.

use ftpls::parser::{self, Decoded};
use ftpls::{ListingEntry, ParseBuffer};

const LISTING: &str = "total 5\n\
    drwxr-xr-x   2 root root  4096 Mar  1 09:30 pub\r\n\
    -rw-r--r--   1 user group  1234 Jan  1 12:00 readme.txt\r\n\
    lrwxrwxrwx   1 root root    22 Jan  5  2025 latest -> releases/v2\r\n\
    type=file;size=1024;modify=20260101120000; example.bin\r\n\
    01-01-26  12:00AM      <DIR> My Documents\r\n";

fn feed_all(buffer: &mut ParseBuffer, chunks: &[&[u8]]) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for chunk in chunks {
        let result = buffer.feed(chunk);
        assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
        entries.extend(result.entries);
    }
    entries
}

#[test]
fn one_shot_reference_sequence() {
    let mut buffer = ParseBuffer::new();
    let entries = feed_all(&mut buffer, &[LISTING.as_bytes()]);
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].name, "pub");
    assert_eq!(entries[1].name, "readme.txt");
    assert_eq!(entries[2].name, "latest");
    assert_eq!(entries[2].link_target.as_deref(), Some("releases/v2"));
    assert_eq!(entries[3].name, "example.bin");
    assert_eq!(entries[4].name, "My Documents");
    assert!(buffer.pending().is_empty());
}

#[test]
fn byte_at_a_time_matches_one_shot() {
    let mut whole = ParseBuffer::new();
    let expected = feed_all(&mut whole, &[LISTING.as_bytes()]);

    let mut trickled = ParseBuffer::new();
    let bytes = LISTING.as_bytes();
    let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
    let entries = feed_all(&mut trickled, &chunks);

    assert_eq!(entries, expected);
    assert_eq!(trickled.pending(), whole.pending());
}

#[test]
fn every_split_offset_matches_one_shot() {
    let bytes = LISTING.as_bytes();
    let mut whole = ParseBuffer::new();
    let expected = feed_all(&mut whole, &[bytes]);

    for split in 0..=bytes.len() {
        let mut buffer = ParseBuffer::new();
        let entries = feed_all(&mut buffer, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(entries, expected, "entry sequence diverged at split {}", split);
    }
}

#[test]
fn decoder_never_over_reads() {
    let bytes = LISTING.as_bytes();
    for len in 0..=bytes.len() {
        match parser::decode_entry(&bytes[..len]).expect("valid prefix must not error") {
            Decoded::Entry { consumed, .. } => {
                assert!(consumed > 0, "entry with zero consumed at len {}", len);
                assert!(consumed <= len, "over-read at len {}", len);
            }
            Decoded::Skip { consumed } => {
                assert!(consumed > 0 && consumed <= len);
            }
            Decoded::Incomplete => {}
        }
    }
}

#[test]
fn windows_listing_split_mid_record() {
    let listing = b"01-01-26  12:00AM       1234 a.txt\r\n01-01-26  12:00PM      <DIR> b\r\n";
    let mut whole = ParseBuffer::new();
    let expected = feed_all(&mut whole, &[listing.as_slice()]);
    assert_eq!(expected.len(), 2);

    let mut buffer = ParseBuffer::new();
    let entries = feed_all(&mut buffer, &[&listing[..40], &listing[40..]]);
    assert_eq!(entries, expected);
}
