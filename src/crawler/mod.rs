//! Crawler module for fetching and following archived pages
//!
//! This module contains the fetch engine that the resolution mediator sits
//! in, including:
//! - HTTP fetching
//! - HTML parsing and link extraction
//! - Request scheduling and pacing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_mirror, Coordinator};
pub use fetcher::{build_http_client, describe_error, fetch};
pub use parser::{parse_html, ParsedPage};
pub use scheduler::{QueuedRequest, Scheduler};
