//! Resolution mediator
//!
//! Sits between the fetch engine and its consumer. Requests for live URLs
//! are turned into index queries; index responses fan out into snapshot
//! fetches; snapshot responses are handed back under the live URL.
//!
//! # Request Flow
//!
//! ```text
//! Original ──on_request──▶ IndexQuery ──on_response──▶ Snapshot × N ──on_response──▶ surfaced
//!                                         └─ no snapshots ─▶ 404 for the original URL
//! ```
//!
//! The mediator holds only read-only configuration. All correlation state
//! travels with each request in its [`RequestContext`].

use crate::archive::context::{FetchRequest, FetchResponse, RequestContext};
use crate::archive::endpoints::ArchiveEndpoints;
use crate::archive::index::parse_index_listing;
use crate::archive::selector::select_snapshots;
use crate::archive::time_window::TimeWindow;
use crate::url::index_target;
use crate::UrlResult;

/// Default number of attempts, first fetch included, for a request answered
/// with a server error
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Result of intercepting an outbound request
#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    /// Send the request as it is
    PassThrough(FetchRequest),

    /// Send this request in place of the original
    Substitute(FetchRequest),
}

impl Interception {
    /// The request that should actually be fetched
    pub fn into_request(self) -> FetchRequest {
        match self {
            Self::PassThrough(request) | Self::Substitute(request) => request,
        }
    }

    pub fn is_substitute(&self) -> bool {
        matches!(self, Self::Substitute(_))
    }
}

/// What the mediator did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not part of the protocol, handed on unchanged
    PassedThrough,

    /// Snapshot content handed on under the original URL
    Restored,

    /// Server error, the request was scheduled again
    Retried,

    /// The index listed nothing worth fetching in the window
    NotArchived,

    /// The index query produced this many snapshot fetches
    FannedOut(usize),

    /// An error status handed on without retrying
    Surfaced(u16),
}

/// Requests to schedule plus the response to hand to the consumer
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    /// Requests for the fetch engine, in order
    pub schedule: Vec<FetchRequest>,

    /// Response for the consumer, if any
    pub surface: Option<FetchResponse>,

    pub disposition: Disposition,
}

impl ResponseOutcome {
    fn surfaced(response: FetchResponse, disposition: Disposition) -> Self {
        Self {
            schedule: Vec::new(),
            surface: Some(response),
            disposition,
        }
    }
}

/// Request/response interceptor implementing the archive resolution protocol
#[derive(Debug, Clone)]
pub struct Mediator {
    window: TimeWindow,
    endpoints: ArchiveEndpoints,
    max_attempts: u32,
}

impl Mediator {
    /// Creates a mediator for `window` against the given archive
    pub fn new(window: TimeWindow, endpoints: ArchiveEndpoints) -> Self {
        Self {
            window,
            endpoints,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets how many fetches a request gets before a server error is surfaced
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn endpoints(&self) -> &ArchiveEndpoints {
        &self.endpoints
    }

    /// Intercepts an outbound request
    ///
    /// The archive's robots.txt and requests already tagged as index queries
    /// or snapshot fetches pass through. Any other request is replaced by an
    /// index query for its URL. A URL that cannot be turned into a query is
    /// logged and passes through untouched.
    pub fn on_request(&self, request: FetchRequest) -> Interception {
        if request.url() == self.endpoints.robots_url() {
            return Interception::PassThrough(request);
        }

        if request.context().is_synthesized() {
            return Interception::PassThrough(request);
        }

        match self.build_index_request(&request) {
            Ok(query) => {
                tracing::debug!("Built index URL: {}", query.url());
                Interception::Substitute(query)
            }
            Err(e) => {
                tracing::error!("Error building index request for {}: {}", request.url(), e);
                Interception::PassThrough(request)
            }
        }
    }

    /// Intercepts an inbound response for `request`
    ///
    /// # Response Handling
    ///
    /// | Request context | Condition | Outcome |
    /// |-----------------|-----------|---------|
    /// | IndexQuery | nothing selected | 404 for the original URL |
    /// | IndexQuery | N snapshots selected | N snapshot fetches + 200 acknowledgement |
    /// | any other | status >= 500, attempts left | copy with retry counter + 1 |
    /// | any other | status >= 400 | surfaced as-is |
    /// | Snapshot | success | surfaced under the original URL |
    /// | Original | success | surfaced as-is |
    ///
    /// Responses surfaced for snapshot fetches always carry the original URL
    /// and the capture time.
    pub fn on_response(&self, request: &FetchRequest, response: FetchResponse) -> ResponseOutcome {
        if let RequestContext::IndexQuery { original } = request.context() {
            return self.handle_index_response(original, &response);
        }

        if response.status >= 400 {
            tracing::warn!("Received {} for {}", response.status, response.url);

            if response.status >= 500 && request.retry_times + 1 < self.max_attempts {
                let retry = request.retried();
                tracing::debug!(
                    "Retrying {} (attempt {} of {})",
                    retry.url(),
                    retry.retry_times + 1,
                    self.max_attempts
                );
                return ResponseOutcome {
                    schedule: vec![retry],
                    surface: None,
                    disposition: Disposition::Retried,
                };
            }

            let status = response.status;
            return ResponseOutcome::surfaced(
                restore_identity(request, response),
                Disposition::Surfaced(status),
            );
        }

        match request.context() {
            RequestContext::Snapshot { .. } => ResponseOutcome::surfaced(
                restore_identity(request, response),
                Disposition::Restored,
            ),
            _ => ResponseOutcome::surfaced(response, Disposition::PassedThrough),
        }
    }

    /// Builds the index query for a live request
    pub fn build_index_request(&self, request: &FetchRequest) -> UrlResult<FetchRequest> {
        let target = index_target(request.url())?;
        let url = self.endpoints.index_url(&target)?;
        Ok(FetchRequest::synthesized(
            url,
            RequestContext::IndexQuery {
                original: Box::new(request.clone()),
            },
            request.depth,
        ))
    }

    /// Builds one fetch per snapshot selected from an index body
    ///
    /// Snapshots whose archive URL cannot be built are logged and skipped.
    pub fn build_snapshot_requests(&self, original: &FetchRequest, body: &[u8]) -> Vec<FetchRequest> {
        let entries = parse_index_listing(body);
        let selected = select_snapshots(&entries, &self.window);

        selected
            .into_iter()
            .filter_map(|snapshot| {
                match self
                    .endpoints
                    .snapshot_url(&snapshot.entry.timestamp, &snapshot.entry.original_url)
                {
                    Ok(url) => Some(FetchRequest::synthesized(
                        url.clone(),
                        RequestContext::Snapshot {
                            original: Box::new(original.clone()),
                            archived_url: url,
                            archived_at: snapshot.instant,
                        },
                        original.depth,
                    )),
                    Err(e) => {
                        tracing::error!("Error building snapshot request: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    fn handle_index_response(
        &self,
        original: &FetchRequest,
        response: &FetchResponse,
    ) -> ResponseOutcome {
        tracing::trace!(
            "Index response for {} ({} bytes, status {})",
            original.url(),
            response.body.len(),
            response.status
        );

        let snapshots = self.build_snapshot_requests(original, &response.body);
        if snapshots.is_empty() {
            tracing::info!("No snapshots found for {}", original.url());
            return ResponseOutcome::surfaced(
                FetchResponse::new(original.url().clone(), 404),
                Disposition::NotArchived,
            );
        }

        for snapshot in &snapshots {
            tracing::debug!("Enqueued snapshot request: {}", snapshot.url());
        }

        let count = snapshots.len();
        ResponseOutcome {
            schedule: snapshots,
            surface: Some(FetchResponse::new(original.url().clone(), 200)),
            disposition: Disposition::FannedOut(count),
        }
    }
}

/// Puts a snapshot response back under its original URL and stamps its capture time
fn restore_identity(request: &FetchRequest, mut response: FetchResponse) -> FetchResponse {
    if let RequestContext::Snapshot {
        original,
        archived_at,
        ..
    } = request.context()
    {
        response.url = original.url().clone();
        response.archived_at = Some(*archived_at);
    }
    response
}
