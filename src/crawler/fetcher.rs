//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests returning status, content type and body bytes
//! - Error classification for logging

use crate::archive::{FetchRequest, FetchResponse};
use crate::MirrorError;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use wayback_mirror::config::Config;
/// use wayback_mirror::crawler::build_http_client;
///
/// let config = Config::from_domains(vec!["example.com".to_string()]);
/// let client = build_http_client(&config.user_agent_string()).unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a request's URL with a plain GET
///
/// Every HTTP status is returned as a response; only transport failures
/// (connection refused, timeouts, redirect loops, body read errors) are
/// errors. The response URL is the final URL after redirects.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `request` - The request to fetch
///
/// # Returns
///
/// * `Ok(FetchResponse)` - The server answered
/// * `Err(MirrorError::Http)` - The exchange failed
pub async fn fetch(client: &Client, request: &FetchRequest) -> Result<FetchResponse, MirrorError> {
    let url = request.url();
    let http_error = |source: reqwest::Error| MirrorError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url.clone()).send().await.map_err(http_error)?;

    let status = response.status().as_u16();
    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.bytes().await.map_err(http_error)?;

    tracing::trace!("Fetched {} ({}, {} bytes)", final_url, status, body.len());

    Ok(FetchResponse::new(final_url, status).with_body(content_type.as_deref(), body.to_vec()))
}

/// Short description of a transport failure for logs and statistics
pub fn describe_error(error: &MirrorError) -> &'static str {
    match error {
        MirrorError::Http { source, .. } if source.is_timeout() => "Request timeout",
        MirrorError::Http { source, .. } if source.is_connect() => "Connection refused",
        MirrorError::Http { source, .. } if source.is_redirect() => "Redirect error",
        MirrorError::Http { .. } => "Request failed",
        _ => "Unexpected error",
    }
}
