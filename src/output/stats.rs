//! Crawl statistics
//!
//! Counters kept by the crawl loop and printed once the run ends.

use crate::archive::Disposition;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Requests that left the frontier
    pub requests_dispatched: u64,

    /// Index lookups issued in place of live requests
    pub index_queries: u64,

    /// Snapshot fetches scheduled from index listings
    pub snapshot_requests: u64,

    /// Snapshots written to the output
    pub snapshots_saved: u64,

    /// Total bytes of snapshot content written
    pub bytes_written: u64,

    /// URLs with nothing archived inside the time window
    pub not_archived: u64,

    /// Requests re-issued after a server error
    pub retries: u64,

    /// Error responses handed on after retries ran out
    pub error_responses: u64,

    /// Exchanges that failed without any response
    pub fetch_failures: u64,

    /// Discovered links queued for resolution
    pub links_followed: u64,

    /// Snapshots that could not be written
    pub write_failures: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts what the mediator did with a response
    pub fn record(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::FannedOut(count) => self.snapshot_requests += *count as u64,
            Disposition::NotArchived => self.not_archived += 1,
            Disposition::Retried => self.retries += 1,
            Disposition::Surfaced(_) => self.error_responses += 1,
            Disposition::PassedThrough | Disposition::Restored => {}
        }
    }

    /// Counts one stored snapshot
    pub fn record_snapshot(&mut self, bytes: usize) {
        self.snapshots_saved += 1;
        self.bytes_written += bytes as u64;
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Mirror Statistics ===\n");

    println!("Requests:");
    println!("  Dispatched: {}", stats.requests_dispatched);
    println!("  Index queries: {}", stats.index_queries);
    println!("  Snapshot fetches scheduled: {}", stats.snapshot_requests);
    println!("  Links followed: {}", stats.links_followed);
    println!();

    println!("Results:");
    println!(
        "  Snapshots saved: {} ({} bytes)",
        stats.snapshots_saved, stats.bytes_written
    );
    println!("  URLs not archived: {}", stats.not_archived);
    println!();

    let problems =
        stats.retries + stats.error_responses + stats.fetch_failures + stats.write_failures;
    if problems > 0 {
        println!("Problems:");
        println!("  Retries: {}", stats.retries);
        println!("  Error responses: {}", stats.error_responses);
        println!("  Fetch failures: {}", stats.fetch_failures);
        println!("  Write failures: {}", stats.write_failures);
        println!();
    }

    let rate = if stats.elapsed.as_secs_f64() > 0.0 {
        stats.requests_dispatched as f64 / stats.elapsed.as_secs_f64()
    } else {
        0.0
    };
    println!(
        "Completed in {:.1}s ({:.2} requests/sec)",
        stats.elapsed.as_secs_f64(),
        rate
    );
}
