//! Scheduler for managing the crawl frontier and dispatch pacing
//!
//! This module handles:
//! - Priority queue management for pending requests
//! - Duplicate suppression on canonical URLs
//! - Respecting a minimum delay between dispatches
//! - Holding back re-issued requests until their retry backoff has passed

use crate::archive::{FetchRequest, RequestContext};
use crate::url::canonicalize_url;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

/// Priority of snapshot fetches and retries (served first)
const PRIORITY_SNAPSHOT: u32 = 0;

/// Priority of index queries
const PRIORITY_INDEX: u32 = 1;

/// Priority of unresolved live URLs
const PRIORITY_ORIGINAL: u32 = 2;

/// Cap on the backoff exponent
const MAX_BACKOFF_SHIFT: u32 = 10;

/// A request queued for fetching with priority information
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    /// The request to dispatch
    pub request: FetchRequest,

    /// Priority value (lower is higher priority)
    pub priority: u32,

    /// Insertion order, for FIFO within a priority
    pub seq: u64,
}

impl QueuedRequest {
    fn new(request: FetchRequest, seq: u64) -> Self {
        Self {
            priority: priority_of(&request),
            request,
            seq,
        }
    }
}

// Lower priority values, then lower sequence numbers, are popped first
impl Ord for QueuedRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedRequest {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedRequest {}

/// Frontier priority of a request
///
/// Work that finishes an already started resolution goes before work that
/// starts a new one, which keeps the frontier from growing unboundedly.
fn priority_of(request: &FetchRequest) -> u32 {
    if request.retry_times > 0 {
        return PRIORITY_SNAPSHOT;
    }
    match request.context() {
        RequestContext::Snapshot { .. } => PRIORITY_SNAPSHOT,
        RequestContext::IndexQuery { .. } => PRIORITY_INDEX,
        RequestContext::Original => PRIORITY_ORIGINAL,
    }
}

/// Scheduler manages the frontier queue and dispatch pacing
pub struct Scheduler {
    /// Frontier priority queue of pending requests
    frontier: BinaryHeap<QueuedRequest>,

    /// Canonical URLs already enqueued
    seen: HashSet<String>,

    /// Minimum time between two dispatches
    download_delay: Duration,

    /// When the last request left the frontier
    last_dispatch: Option<Instant>,

    /// Wait before the first re-issue of a failed request
    retry_delay: Duration,

    /// Re-issued requests with the instant they become ready
    deferred: Vec<(Instant, QueuedRequest)>,

    next_seq: u64,
}

impl Scheduler {
    /// Creates an empty scheduler
    ///
    /// # Arguments
    ///
    /// * `download_delay` - Minimum time between two dispatches
    /// * `retry_delay` - Wait before the first re-issue of a failed request,
    ///   doubled for every further one
    pub fn new(download_delay: Duration, retry_delay: Duration) -> Self {
        Self {
            frontier: BinaryHeap::new(),
            seen: HashSet::new(),
            download_delay,
            last_dispatch: None,
            retry_delay,
            deferred: Vec::new(),
            next_seq: 0,
        }
    }

    /// Adds a request to the frontier
    ///
    /// Requests marked `dont_filter` are always accepted. Any other request
    /// is dropped if a request for the same canonical URL was enqueued
    /// before.
    ///
    /// # Returns
    ///
    /// `true` if the request was queued, `false` if it was a duplicate
    pub fn enqueue(&mut self, request: FetchRequest) -> bool {
        let key = canonicalize_url(request.url()).to_string();
        let fresh = self.seen.insert(key);

        if !fresh && !request.dont_filter {
            tracing::trace!("Filtered duplicate request: {}", request.url());
            return false;
        }

        let backoff = self.retry_backoff(request.retry_times);
        let queued = QueuedRequest::new(request, self.next_seq);
        self.next_seq += 1;

        if backoff.is_zero() {
            self.frontier.push(queued);
        } else {
            tracing::debug!(
                "Holding {} for {:?} before retry {}",
                queued.request.url(),
                backoff,
                queued.request.retry_times
            );
            self.deferred.push((Instant::now() + backoff, queued));
        }
        true
    }

    /// Backoff before dispatching a request re-issued `retry_times` times
    fn retry_backoff(&self, retry_times: u32) -> Duration {
        if retry_times == 0 {
            return Duration::ZERO;
        }
        let shift = (retry_times - 1).min(MAX_BACKOFF_SHIFT);
        self.retry_delay.saturating_mul(1 << shift)
    }

    /// Moves deferred requests whose backoff has passed into the frontier
    fn promote_ready(&mut self, now: Instant) {
        if self.deferred.is_empty() {
            return;
        }
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|(ready_at, _)| *ready_at <= now);
        self.deferred = waiting;
        self.frontier.extend(ready.into_iter().map(|(_, queued)| queued));
    }

    /// Takes the next ready request without waiting
    pub fn pop(&mut self) -> Option<FetchRequest> {
        self.promote_ready(Instant::now());
        self.frontier.pop().map(|queued| queued.request)
    }

    /// Gets the next request to dispatch
    ///
    /// Waits until the download delay since the previous dispatch has
    /// passed. Returns None when no request is ready, which includes the
    /// case of retries still in backoff.
    pub async fn next_request(&mut self) -> Option<FetchRequest> {
        self.promote_ready(Instant::now());
        if self.frontier.is_empty() {
            return None;
        }

        if let Some(wait) = self.time_until_next_dispatch(Instant::now()) {
            tracing::trace!("Waiting {:?} before next dispatch", wait);
            tokio::time::sleep(wait).await;
        }

        self.last_dispatch = Some(Instant::now());
        self.pop()
    }

    /// Time left before another request may be dispatched, if any
    fn time_until_next_dispatch(&self, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let ready_at = last + self.download_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Sleeps until the earliest deferred retry is ready
    ///
    /// Returns false right away if no retry is waiting.
    pub async fn wait_for_deferred(&mut self) -> bool {
        let Some(ready_at) = self.deferred.iter().map(|(at, _)| *at).min() else {
            return false;
        };

        let wait = ready_at.saturating_duration_since(Instant::now());
        tracing::trace!("Waiting {:?} for a retry to become ready", wait);
        tokio::time::sleep(wait).await;
        self.promote_ready(Instant::now());
        true
    }

    /// Returns the number of ready requests in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns the number of retries still in backoff
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Returns whether nothing is queued or waiting
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty() && self.deferred.is_empty()
    }
}
