//! Archive index listings
//!
//! The index service answers `output=json` queries with a table: the first
//! row names the columns, every following row is one capture.

use crate::archive::time_window::parse_archive_timestamp;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Fields requested from the index, in query order
pub const INDEX_FIELDS: [&str; 4] = ["timestamp", "original", "statuscode", "digest"];

/// One capture listed by the archive index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// 14-digit UTC capture timestamp
    pub timestamp: String,

    /// URL as it was captured
    pub original_url: String,

    /// HTTP status of the capture, as listed (may be "-")
    pub status_code: String,

    /// Content fingerprint of the capture
    pub digest: String,
}

impl IndexEntry {
    pub fn new(
        timestamp: impl Into<String>,
        original_url: impl Into<String>,
        status_code: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            original_url: original_url.into(),
            status_code: status_code.into(),
            digest: digest.into(),
        }
    }

    /// Capture time, or None when the timestamp does not parse
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        parse_archive_timestamp(&self.timestamp)
    }
}

/// Parses an index response body into entries
///
/// A body that is not a JSON table, or a table with only a header row,
/// yields no entries. Rows that are too short for the header, or that hold
/// something other than a string in a needed column, are skipped.
///
/// # Example
///
/// ```
/// use wayback_mirror::archive::parse_index_listing;
///
/// let body = br#"[["timestamp","original","statuscode","digest"],
///                 ["20200101000000","http://example.com/","200","AAA"]]"#;
/// let entries = parse_index_listing(body);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].digest, "AAA");
/// ```
pub fn parse_index_listing(body: &[u8]) -> Vec<IndexEntry> {
    let table: Vec<Vec<Value>> = match serde_json::from_slice(body) {
        Ok(table) => table,
        Err(e) => {
            if !body.iter().all(u8::is_ascii_whitespace) {
                tracing::error!("Invalid JSON in index response: {}", e);
            }
            return Vec::new();
        }
    };

    let Some((header, rows)) = table.split_first() else {
        tracing::debug!("Empty index listing");
        return Vec::new();
    };

    let column = |name: &str| header.iter().position(|c| c.as_str() == Some(name));
    let (Some(ts), Some(orig), Some(status), Some(digest)) = (
        column("timestamp"),
        column("original"),
        column("statuscode"),
        column("digest"),
    ) else {
        tracing::error!("Index listing header is missing columns: {:?}", header);
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let cell = |index: usize| row.get(index).and_then(Value::as_str);
            let entry = match (cell(ts), cell(orig), cell(status), cell(digest)) {
                (Some(ts), Some(orig), Some(status), Some(digest)) => {
                    IndexEntry::new(ts, orig, status, digest)
                }
                _ => {
                    tracing::debug!("Skipping incomplete index row: {:?}", row);
                    return None;
                }
            };
            Some(entry)
        })
        .collect()
}
