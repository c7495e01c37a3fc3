//! Requests, responses and the context that correlates them
//!
//! Every request carries a [`RequestContext`] naming which of the three
//! protocol states it belongs to. The context is fixed when the request is
//! built and cannot be reassigned afterwards.

use chrono::{DateTime, Utc};
use url::Url;

/// Correlation context carried by an in-flight request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestContext {
    /// A request for a live URL that has not been resolved yet
    Original,

    /// The index lookup performed on behalf of `original`
    IndexQuery { original: Box<FetchRequest> },

    /// A fetch of one archived capture of `original`
    Snapshot {
        original: Box<FetchRequest>,
        archived_url: Url,
        archived_at: DateTime<Utc>,
    },
}

impl RequestContext {
    /// Returns true for the two kinds the mediator synthesizes itself
    pub fn is_synthesized(&self) -> bool {
        !matches!(self, Self::Original)
    }
}

/// A request handed to the fetch engine
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    url: Url,
    context: RequestContext,

    /// Number of times this request has been re-issued after a server error
    pub retry_times: u32,

    /// Exempt from duplicate suppression in the scheduler
    pub dont_filter: bool,

    /// Link depth from the seed that led here
    pub depth: u32,
}

impl FetchRequest {
    /// Creates an unresolved request for a live URL
    pub fn new(url: Url) -> Self {
        Self {
            url,
            context: RequestContext::Original,
            retry_times: 0,
            dont_filter: false,
            depth: 0,
        }
    }

    /// Sets the link depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Builds a request with a synthesized context
    pub(crate) fn synthesized(url: Url, context: RequestContext, depth: u32) -> Self {
        Self {
            url,
            context,
            retry_times: 0,
            dont_filter: true,
            depth,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Copy of this request for another attempt
    pub fn retried(&self) -> Self {
        let mut copy = self.clone();
        copy.retry_times += 1;
        copy.dont_filter = true;
        copy
    }
}

/// A response delivered back from the fetch engine
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,

    /// Capture time when the content came from an archived snapshot
    pub archived_at: Option<DateTime<Utc>>,
}

impl FetchResponse {
    pub fn new(url: Url, status: u16) -> Self {
        Self {
            url,
            status,
            content_type: None,
            body: Vec::new(),
            archived_at: None,
        }
    }

    pub fn with_body(mut self, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self.body = body.into();
        self
    }

    /// True when the body looks like an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_new_request_is_original() {
        let request = FetchRequest::new(url("https://example.com/"));
        assert_eq!(request.context(), &RequestContext::Original);
        assert!(!request.context().is_synthesized());
        assert!(!request.dont_filter);
    }

    #[test]
    fn test_synthesized_context_exposes_original() {
        let original = FetchRequest::new(url("https://example.com/"));
        let query = FetchRequest::synthesized(
            url("https://archive.test/cdx?url=example.com"),
            RequestContext::IndexQuery {
                original: Box::new(original.clone()),
            },
            0,
        );

        assert!(query.context().is_synthesized());
        assert!(matches!(
            query.context(),
            RequestContext::IndexQuery { original: inner } if **inner == original
        ));
        assert!(query.dont_filter);
    }

    #[test]
    fn test_retried_copy_increments_counter() {
        let request = FetchRequest::new(url("https://example.com/")).with_depth(2);
        let retry = request.retried().retried();

        assert_eq!(retry.retry_times, 2);
        assert!(retry.dont_filter);
        assert_eq!(retry.depth, 2);
        assert_eq!(retry.url(), request.url());
        assert_eq!(request.retry_times, 0);
    }

    #[test]
    fn test_response_html_detection() {
        let page = FetchResponse::new(url("https://example.com/"), 200)
            .with_body(Some("Text/HTML; charset=utf-8"), "<html></html>");
        assert!(page.is_html());

        let image = FetchResponse::new(url("https://example.com/a.png"), 200)
            .with_body(Some("image/png"), vec![0u8, 1, 2]);
        assert!(!image.is_html());

        assert!(!FetchResponse::new(url("https://example.com/"), 404).is_html());
    }
}
