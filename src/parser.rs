//! Incremental LIST / MLSD entry decoder.
//!
//! Listing entries arrive newline-framed inside an unbounded byte stream.
//! [`decode_entry`] consumes at most one frame per call and reports how many
//! bytes the frame occupied, so the caller can feed chunks of any size and
//! split records at arbitrary byte offsets.
//!
//! Supported line grammars, tried in order:
//! 1. **MLSD facts** (RFC 3659): `type=file;size=1234;modify=20260101120000; file.txt`
//! 2. **Unix-style** (`ls -l`): `-rwxr-xr-x 1 owner group 1234 Jan  1 12:00 file.txt`
//! 3. **Windows/IIS-style**: `01-01-26  12:00AM       1234 file.txt`
//!
//! A complete line matching none of these is a `MalformedListing` error.
//! Blank lines, `total N` headers and `.` / `..` rows are consumed without
//! producing an entry.

use crate::error::{ListError, ListResult};
use crate::types::{EntryKind, ListingEntry};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Longest line that can still become a valid entry. A longer run without a
/// terminator is unrecoverable garbage, even before the newline shows up.
pub const MAX_LINE_LEN: usize = 4096;

/// Outcome of one [`decode_entry`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A complete entry occupying `consumed` leading bytes of the input.
    Entry {
        entry: ListingEntry,
        consumed: usize,
    },
    /// `consumed` leading bytes carried no entry (blank line, `total`
    /// header, `.` / `..` row).
    Skip { consumed: usize },
    /// The buffered data ends mid-record; feed more bytes and retry.
    Incomplete,
}

/// Decode at most one newline-framed entry from the head of `input`.
///
/// Pure: all buffering state lives with the caller, and the same input
/// always produces the same outcome. `consumed` never exceeds `input.len()`
/// and is never zero when an entry is returned.
pub fn decode_entry(input: &[u8]) -> ListResult<Decoded> {
    let Some(nl) = input.iter().position(|&b| b == b'\n') else {
        if input.len() > MAX_LINE_LEN {
            return Err(ListError::malformed(format!(
                "listing line exceeds {} bytes without a terminator",
                MAX_LINE_LEN
            )));
        }
        return Ok(Decoded::Incomplete);
    };

    let consumed = nl + 1;
    let frame = input[..nl].strip_suffix(b"\r").unwrap_or(&input[..nl]);

    // The wire encoding is unspecified; decode lossily and leave any
    // re-interpretation of the name to the display layer.
    let line = String::from_utf8_lossy(frame);
    let line = line.trim();

    if line.is_empty() || is_total_header(line) {
        return Ok(Decoded::Skip { consumed });
    }

    let entry = parse_line(line).ok_or_else(|| {
        ListError::malformed(format!(
            "unrecognized listing line: '{}'",
            truncate(line, 80)
        ))
    })?;

    if entry.name == "." || entry.name == ".." {
        return Ok(Decoded::Skip { consumed });
    }

    Ok(Decoded::Entry { entry, consumed })
}

/// `ls -l` output often starts with a `total N` block-count header.
fn is_total_header(line: &str) -> bool {
    match line.strip_prefix("total") {
        Some(rest) => !rest.is_empty() && rest.trim().chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Parse a single complete listing line.
fn parse_line(line: &str) -> Option<ListingEntry> {
    // MLSD fact lines are the most distinctive; try them first.
    if line.contains(';') && line.contains('=') {
        if let Some(e) = parse_mlsd(line) {
            return Some(e);
        }
    }

    if let Some(e) = parse_unix(line) {
        return Some(e);
    }

    parse_windows(line)
}

// ─── MLSD parser ─────────────────────────────────────────────────────

/// Parse an MLSD fact line: `fact1=val1;fact2=val2; filename`
fn parse_mlsd(line: &str) -> Option<ListingEntry> {
    // Everything up to "; " is the fact list; the remainder is the name.
    let (facts_str, name) = if let Some(pos) = line.find("; ") {
        (&line[..pos + 1], line[pos + 2..].to_string())
    } else if let Some(pos) = line.rfind(' ') {
        (&line[..pos], line[pos + 1..].to_string())
    } else {
        return None;
    };

    if name.is_empty() {
        return None;
    }

    let mut facts: HashMap<String, String> = HashMap::new();
    for segment in facts_str.split(';') {
        if let Some((k, v)) = segment.trim().split_once('=') {
            facts.insert(k.to_lowercase(), v.to_string());
        }
    }
    if facts.is_empty() {
        return None;
    }

    let kind = match facts.get("type").map(|v| v.to_lowercase()) {
        Some(t) if t == "dir" || t == "cdir" || t == "pdir" => EntryKind::Directory,
        Some(t) if t == "file" => EntryKind::File,
        Some(t) if t.starts_with("os.unix=slink") || t.starts_with("os.unix=symlink") => {
            EntryKind::Symlink
        }
        _ => EntryKind::Unknown,
    };

    Some(ListingEntry {
        size: facts.get("size").and_then(|v| v.parse::<u64>().ok()),
        modified: facts.get("modify").and_then(|v| parse_mlsd_time(v)),
        permissions: facts.get("unix.mode").cloned(),
        owner: facts.get("unix.owner").cloned(),
        group: facts.get("unix.group").cloned(),
        raw: Some(line.to_string()),
        facts,
        ..ListingEntry::new(name, kind)
    })
}

/// Parse an MLSD timestamp: `YYYYMMDDHHmmSS[.fraction]`
fn parse_mlsd_time(s: &str) -> Option<DateTime<Utc>> {
    let base = s.get(..14).unwrap_or(s);
    NaiveDateTime::parse_from_str(base, "%Y%m%d%H%M%S")
        .ok()
        .map(|dt| Utc.from_utc_datetime(&dt))
}

// ─── Unix-style parser ───────────────────────────────────────────────

lazy_static! {
    static ref UNIX_RE: Regex = Regex::new(
        r"(?x)
        ^(?P<mode>[dlcbps-][rwxsStT-]{9})\+?\s+                        # permissions (optional ACL marker)
        (?P<links>\d+)\s+                                               # hard-link count
        (?P<owner>\S+)\s+                                               # owner
        (?P<group>\S+)\s+                                               # group
        (?P<size>\d+)\s+                                                # size in bytes
        (?P<date>[A-Za-z]{3}\s+\d{1,2}\s+(?:\d{4}|\d{1,2}:\d{2}))\s+   # 'Mon DD YYYY' or 'Mon DD HH:MM'
        (?P<name>.+)$                                                   # name ('link -> target' for symlinks)
        ",
    )
    .unwrap();
}

/// Parse a Unix `ls -l` line:
/// ```text
/// drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
/// -rw-r--r--   1 user group  1234 Jan  1  2025 file.txt
/// lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
/// ```
fn parse_unix(line: &str) -> Option<ListingEntry> {
    let caps = UNIX_RE.captures(line)?;

    let mode = &caps["mode"];
    let kind = match mode.as_bytes()[0] {
        b'd' => EntryKind::Directory,
        b'l' => EntryKind::Symlink,
        b'-' => EntryKind::File,
        _ => EntryKind::Unknown,
    };

    let name_raw = &caps["name"];
    let (name, link_target) = match name_raw.split_once(" -> ") {
        Some((n, t)) if kind == EntryKind::Symlink => (n.to_string(), Some(t.to_string())),
        _ => (name_raw.to_string(), None),
    };
    if name.is_empty() {
        return None;
    }

    Some(ListingEntry {
        size: caps["size"].parse::<u64>().ok(),
        modified: parse_unix_date(&caps["date"]),
        permissions: Some(mode.to_string()),
        owner: Some(caps["owner"].to_string()),
        group: Some(caps["group"].to_string()),
        link_target,
        raw: Some(line.to_string()),
        ..ListingEntry::new(name, kind)
    })
}

/// Parse the Unix date column: `Mon DD HH:MM` (recent) or `Mon DD YYYY`.
fn parse_unix_date(s: &str) -> Option<DateTime<Utc>> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != 3 {
        return None;
    }
    let compact = fields.join(" ");

    if fields[2].contains(':') {
        // "Jan 1 12:00" — servers omit the year for recent entries.
        let with_year = format!("{} {}", Utc::now().year(), compact);
        NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M")
            .ok()
            .map(|dt| Utc.from_utc_datetime(&dt))
    } else {
        // "Jan 1 2025"
        NaiveDate::parse_from_str(&compact, "%b %d %Y")
            .ok()
            .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
    }
}

// ─── Windows-style parser ────────────────────────────────────────────

lazy_static! {
    static ref WINDOWS_RE: Regex = Regex::new(
        r"(?x)
        ^(?P<date>\d{2}-\d{2}-\d{2,4})\s+       # date
        (?P<time>\d{1,2}:\d{2}(?:AM|PM)?)\s+    # time
        (?P<size><DIR>|\d+)\s+                  # size or <DIR>
        (?P<name>.+)$                           # filename
        ",
    )
    .unwrap();
}

/// Parse a Windows / IIS style line:
/// ```text
/// 01-01-26  12:00AM       1234 file.txt
/// 01-01-26  12:00PM      <DIR> Directory Name
/// ```
fn parse_windows(line: &str) -> Option<ListingEntry> {
    let caps = WINDOWS_RE.captures(line)?;

    let (kind, size) = match &caps["size"] {
        "<DIR>" => (EntryKind::Directory, None),
        digits => (EntryKind::File, digits.parse::<u64>().ok()),
    };

    Some(ListingEntry {
        size,
        modified: parse_windows_date(&caps["date"], &caps["time"]),
        raw: Some(line.to_string()),
        ..ListingEntry::new(caps["name"].to_string(), kind)
    })
}

fn parse_windows_date(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let combined = format!("{} {}", date, time);
    for format in ["%m-%d-%y %I:%M%p", "%m-%d-%y %H:%M", "%m-%d-%Y %I:%M%p", "%m-%d-%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&combined, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(input: &str) -> ListingEntry {
        match decode_entry(input.as_bytes()).unwrap() {
            Decoded::Entry { entry, .. } => entry,
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn test_unix_file() {
        let e = entry("-rw-r--r--   1 user group  1234 Jan  1 12:00 readme.txt\r\n");
        assert_eq!(e.name, "readme.txt");
        assert_eq!(e.kind, EntryKind::File);
        assert_eq!(e.size, Some(1234));
        assert_eq!(e.owner.as_deref(), Some("user"));
        assert_eq!(e.group.as_deref(), Some("group"));
        assert!(e.modified.is_some());
    }

    #[test]
    fn test_unix_dir() {
        let e = entry("drwxr-xr-x   2 root root  4096 Mar  1 09:30 subdir\n");
        assert_eq!(e.kind, EntryKind::Directory);
        assert_eq!(e.permissions.as_deref(), Some("drwxr-xr-x"));
    }

    #[test]
    fn test_unix_symlink() {
        let e = entry("lrwxrwxrwx   1 root root    22 Jan  5 08:00 link -> /var/target\n");
        assert_eq!(e.kind, EntryKind::Symlink);
        assert_eq!(e.name, "link");
        assert_eq!(e.link_target.as_deref(), Some("/var/target"));
    }

    #[test]
    fn test_unix_year_date() {
        let e = entry("-rw-r--r--   1 user group  99 Jan  1  2025 old.txt\n");
        let modified = e.modified.expect("year-form date should parse");
        assert_eq!(modified.year(), 2025);
    }

    #[test]
    fn test_mlsd() {
        let e = entry("type=file;size=1024;modify=20260101120000; example.bin\n");
        assert_eq!(e.name, "example.bin");
        assert_eq!(e.kind, EntryKind::File);
        assert_eq!(e.size, Some(1024));
        assert_eq!(e.facts.get("type").map(String::as_str), Some("file"));
    }

    #[test]
    fn test_windows_dir_has_no_size() {
        let e = entry("01-01-26  12:00AM      <DIR> My Documents\n");
        assert_eq!(e.kind, EntryKind::Directory);
        assert_eq!(e.name, "My Documents");
        assert_eq!(e.size, None);
    }

    #[test]
    fn test_windows_file() {
        let e = entry("01-01-26  12:00PM       1234 file.txt\n");
        assert_eq!(e.kind, EntryKind::File);
        assert_eq!(e.size, Some(1234));
        assert!(e.modified.is_some());
    }

    #[test]
    fn test_incomplete_without_newline() {
        let partial = b"drwxr-xr-x   2 root root  4096 Mar  1 09:30 sub";
        assert_eq!(decode_entry(partial).unwrap(), Decoded::Incomplete);
        assert_eq!(decode_entry(b"").unwrap(), Decoded::Incomplete);
    }

    #[test]
    fn test_no_over_read() {
        let two = b"type=dir;; a\ntype=dir;; b\n";
        match decode_entry(two).unwrap() {
            Decoded::Entry { entry, consumed } => {
                assert_eq!(entry.name, "a");
                assert_eq!(consumed, b"type=dir;; a\n".len());
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_dots_blanks_and_total() {
        for line in ["type=cdir;; .\n", "type=pdir;; ..\n", "\r\n", "total 12\n"] {
            match decode_entry(line.as_bytes()).unwrap() {
                Decoded::Skip { consumed } => assert_eq!(consumed, line.len()),
                other => panic!("expected skip for {:?}, got {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_malformed_line() {
        let err = decode_entry(b"this is not a listing line\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ListErrorKind::MalformedListing);
    }

    #[test]
    fn test_unterminated_garbage_is_malformed() {
        let run = vec![b'x'; MAX_LINE_LEN + 1];
        let err = decode_entry(&run).unwrap_err();
        assert_eq!(err.kind, crate::error::ListErrorKind::MalformedListing);
    }
}
