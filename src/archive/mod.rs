//! Archive resolution protocol
//!
//! This module contains the core of the mirror:
//! - Time window parsing for the configured capture range
//! - Index listing parsing and snapshot selection
//! - Request contexts correlating index queries and snapshot fetches
//! - The mediator that rewrites requests and responses

mod context;
mod endpoints;
mod index;
mod mediator;
mod selector;
mod time_window;

pub use context::{FetchRequest, FetchResponse, RequestContext};
pub use endpoints::{ArchiveEndpoints, DEFAULT_ARCHIVE_BASE, DEFAULT_INDEX_PATH};
pub use index::{parse_index_listing, IndexEntry, INDEX_FIELDS};
pub use mediator::{Disposition, Interception, Mediator, ResponseOutcome, DEFAULT_MAX_ATTEMPTS};
pub use selector::{select_snapshots, SelectedSnapshot};
pub use time_window::{
    parse_archive_timestamp, TimeRangeSpec, TimeSpec, TimeWindow, TIMESTAMP_FORMAT,
};
