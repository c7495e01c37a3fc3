//! Output module for storing snapshots and reporting on a run
//!
//! This module handles:
//! - Writing archived page versions to disk
//! - Recording and printing crawl statistics

pub mod stats;
mod traits;
mod writer;

pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, SnapshotSink};
pub use writer::FileSnapshotWriter;

use crate::config::OutputConfig;

/// Builds the file writer described by the output configuration
pub fn file_writer(config: &OutputConfig) -> FileSnapshotWriter {
    FileSnapshotWriter::new(&config.directory, config.unix_filenames)
}
