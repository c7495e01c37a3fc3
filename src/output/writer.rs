//! File-system snapshot writer
//!
//! Snapshots are laid out as one directory per live URL, mirroring the
//! URL's host and path, with one file per capture:
//!
//! ```text
//! website/
//!   example.com/
//!     20200101000000.snapshot
//!     blog/
//!       post-1/
//!         20200315120000.snapshot
//! ```

use crate::archive::TIMESTAMP_FORMAT;
use crate::output::traits::{OutputError, OutputResult, SnapshotSink};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use url::Url;

/// Extension of every stored snapshot file
const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Writes snapshots below a root directory
#[derive(Debug, Clone)]
pub struct FileSnapshotWriter {
    directory: PathBuf,
    unix_filenames: bool,
}

impl FileSnapshotWriter {
    /// Creates a writer rooted at `directory`
    ///
    /// When `unix_filenames` is set, files are named by the capture's Unix
    /// timestamp instead of `YYYYmmddHHMMSS`.
    pub fn new(directory: impl Into<PathBuf>, unix_filenames: bool) -> Self {
        Self {
            directory: directory.into(),
            unix_filenames,
        }
    }

    /// Path the capture of `url` at `archived_at` is stored under
    pub fn snapshot_path(&self, url: &Url, archived_at: DateTime<Utc>) -> OutputResult<PathBuf> {
        let mut path = self.directory.clone();
        for segment in url_segments(url)? {
            path.push(encode_segment(&segment));
        }

        let stem = if self.unix_filenames {
            archived_at.timestamp().to_string()
        } else {
            archived_at.format(TIMESTAMP_FORMAT).to_string()
        };
        path.push(format!("{}.{}", stem, SNAPSHOT_EXTENSION));
        Ok(path)
    }
}

impl SnapshotSink for FileSnapshotWriter {
    fn write_snapshot(
        &self,
        url: &Url,
        archived_at: DateTime<Utc>,
        body: &[u8],
    ) -> OutputResult<PathBuf> {
        let path = self.snapshot_path(url, archived_at)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;

        tracing::debug!("Wrote {} bytes to {}", body.len(), path.display());
        Ok(path)
    }

    fn name(&self) -> &str {
        "files"
    }
}

/// Splits a URL into directory names: `host[:port]`, then each path segment
///
/// The query string stays attached to the last segment so that pages
/// differing only by query do not overwrite each other.
fn url_segments(url: &Url) -> OutputResult<Vec<String>> {
    let host = url
        .host_str()
        .ok_or_else(|| OutputError::Write(format!("URL has no host: {}", url)))?;

    let mut segments = vec![match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }];

    segments.extend(
        url.path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    if let Some(query) = url.query() {
        if let Some(last) = segments.last_mut() {
            last.push('?');
            last.push_str(query);
        }
    }

    Ok(segments)
}

#[cfg(windows)]
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

#[cfg(not(windows))]
fn encode_segment(segment: &str) -> String {
    segment.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;
    use tempfile::TempDir;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 12, 30, 0).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_root_snapshot_path() {
        let writer = FileSnapshotWriter::new("website", false);
        let path = writer
            .snapshot_path(&url("http://example.com/"), instant())
            .unwrap();
        assert_eq!(
            path,
            Path::new("website/example.com/20200101123000.snapshot")
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_nested_path_with_port_and_query() {
        let writer = FileSnapshotWriter::new("out", false);
        let path = writer
            .snapshot_path(&url("http://example.com:8080/blog/post?id=7"), instant())
            .unwrap();
        assert_eq!(
            path,
            Path::new("out/example.com:8080/blog/post?id=7/20200101123000.snapshot")
        );
    }

    #[test]
    fn test_unix_filenames() {
        let writer = FileSnapshotWriter::new("website", true);
        let path = writer
            .snapshot_path(&url("https://example.com/about"), instant())
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "1577881800.snapshot"
        );
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let writer = FileSnapshotWriter::new(dir.path(), false);

        let path = writer
            .write_snapshot(&url("http://example.com/a/b/"), instant(), b"<html>v1</html>")
            .unwrap();

        assert!(path.starts_with(dir.path().join("example.com").join("a").join("b")));
        assert_eq!(std::fs::read(&path).unwrap(), b"<html>v1</html>");
    }

    #[test]
    fn test_distinct_captures_kept_side_by_side() {
        let dir = TempDir::new().unwrap();
        let writer = FileSnapshotWriter::new(dir.path(), false);
        let page = url("http://example.com/");
        let later = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();

        writer.write_snapshot(&page, instant(), b"old").unwrap();
        writer.write_snapshot(&page, later, b"new").unwrap();

        let count = std::fs::read_dir(dir.path().join("example.com"))
            .unwrap()
            .count();
        assert_eq!(count, 2);
    }
}
