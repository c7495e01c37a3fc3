//! Output sink trait and errors
//!
//! This module defines the trait interface for snapshot sinks.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for archived page versions
///
/// Implementations must be safe to share with the crawl loop.
pub trait SnapshotSink: Send + Sync {
    /// Stores the body of one capture of `url`
    ///
    /// # Arguments
    ///
    /// * `url` - The live URL the capture stands for
    /// * `archived_at` - When the archive recorded it
    /// * `body` - The raw captured content
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Where the snapshot was stored
    /// * `Err(OutputError)` - The snapshot could not be stored
    fn write_snapshot(
        &self,
        url: &Url,
        archived_at: DateTime<Utc>,
        body: &[u8],
    ) -> OutputResult<PathBuf>;

    /// Returns the name of this sink
    fn name(&self) -> &str;
}
