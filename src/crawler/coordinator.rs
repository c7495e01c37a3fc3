//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the mirroring process, including:
//! - Seeding the frontier with the configured domains
//! - Passing every request and response through the resolution mediator
//! - Running fetches concurrently up to the configured bound
//! - Storing archived versions and following their links

use crate::archive::{FetchRequest, FetchResponse, Mediator};
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, describe_error, fetch};
use crate::crawler::parser::parse_html;
use crate::crawler::scheduler::Scheduler;
use crate::output::{file_writer, CrawlStatistics, SnapshotSink};
use crate::url::LinkFilter;
use crate::MirrorError;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// How many completed fetches between progress reports
const PROGRESS_INTERVAL: u64 = 50;

type FetchOutcome = (FetchRequest, Result<FetchResponse, MirrorError>);

/// Main crawler coordinator structure
pub struct Coordinator {
    mediator: Mediator,
    filter: LinkFilter,
    scheduler: Scheduler,
    client: Client,
    sink: Box<dyn SnapshotSink>,
    stats: CrawlStatistics,
    concurrency: usize,
    max_depth: Option<u32>,
}

impl Coordinator {
    /// Creates a coordinator writing snapshots to the configured directory
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, with the seeds queued
    /// * `Err(MirrorError)` - Failed to initialize
    pub fn new(config: Config) -> Result<Self, MirrorError> {
        let sink = file_writer(&config.output);
        Self::with_sink(config, Box::new(sink))
    }

    /// Creates a coordinator writing snapshots to `sink`
    pub fn with_sink(config: Config, sink: Box<dyn SnapshotSink>) -> Result<Self, MirrorError> {
        let mediator = config.mediator()?;
        let filter = config.link_filter()?;
        let client = build_http_client(&config.user_agent_string())?;

        let mut scheduler = Scheduler::new(
            Duration::from_millis(config.crawler.download_delay),
            Duration::from_millis(config.crawler.retry_delay),
        );
        for seed in config.seed_urls()? {
            tracing::debug!("Seeding frontier with {}", seed);
            scheduler.enqueue(FetchRequest::new(seed));
        }

        tracing::info!(
            "Mirroring {} into {} sink, window {}",
            filter.allowed_domains().join(", "),
            sink.name(),
            mediator.window()
        );

        Ok(Self {
            mediator,
            filter,
            scheduler,
            client,
            sink,
            stats: CrawlStatistics::new(),
            concurrency: config.crawler.concurrency.max(1) as usize,
            max_depth: config.mirror.max_depth,
        })
    }

    /// Runs the main crawl loop
    ///
    /// The loop keeps up to `concurrency` fetches in flight. Mediator calls
    /// and scheduling happen here, one completed fetch at a time. When
    /// nothing is in flight but retries are in backoff, the loop sleeps
    /// until the first of them is ready. The run ends once the frontier is
    /// empty and nothing is in flight.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - The run finished
    /// * `Err(MirrorError)` - A fetch task panicked or was cancelled
    pub async fn run(mut self) -> Result<CrawlStatistics, MirrorError> {
        let start_time = Instant::now();
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut completed: u64 = 0;

        loop {
            while in_flight.len() < self.concurrency {
                let Some(request) = self.scheduler.next_request().await else {
                    break;
                };
                self.dispatch(request, &mut in_flight);
            }

            if in_flight.is_empty() {
                if self.scheduler.wait_for_deferred().await {
                    continue;
                }
                tracing::info!("Frontier is empty, mirror complete");
                break;
            }

            let Some(joined) = in_flight.join_next().await else {
                continue;
            };

            let (request, result) = joined?;
            self.handle_completion(request, result);

            completed += 1;
            if completed % PROGRESS_INTERVAL == 0 {
                let rate = completed as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} requests completed, {} snapshots saved, {} in frontier, {:.2} requests/sec",
                    completed,
                    self.stats.snapshots_saved,
                    self.scheduler.frontier_size(),
                    rate
                );
            }
        }

        self.stats.elapsed = start_time.elapsed();
        tracing::info!(
            "Mirror completed: {} snapshots saved in {:?}",
            self.stats.snapshots_saved,
            self.stats.elapsed
        );

        Ok(self.stats)
    }

    /// Passes a request through the mediator and starts fetching it
    fn dispatch(&mut self, request: FetchRequest, in_flight: &mut JoinSet<FetchOutcome>) {
        let interception = self.mediator.on_request(request);
        if interception.is_substitute() {
            self.stats.index_queries += 1;
        }

        let request = interception.into_request();
        tracing::debug!("Dispatching {}", request.url());
        self.stats.requests_dispatched += 1;

        let client = self.client.clone();
        in_flight.spawn(async move {
            let result = fetch(&client, &request).await;
            (request, result)
        });
    }

    /// Routes a finished fetch through the mediator
    fn handle_completion(&mut self, request: FetchRequest, result: Result<FetchResponse, MirrorError>) {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} for {}: {}", describe_error(&e), request.url(), e);
                self.stats.fetch_failures += 1;
                return;
            }
        };

        let outcome = self.mediator.on_response(&request, response);
        self.stats.record(&outcome.disposition);

        for scheduled in outcome.schedule {
            self.scheduler.enqueue(scheduled);
        }

        if let Some(surfaced) = outcome.surface {
            self.handle_surfaced(request.depth, surfaced);
        }
    }

    /// Mirror policy for a response handed on by the mediator
    ///
    /// Only archived versions are kept: acknowledgements, not-found results
    /// and live responses carry no capture time and are ignored, and so are
    /// error statuses. HTML versions have their links followed.
    fn handle_surfaced(&mut self, depth: u32, response: FetchResponse) {
        let Some(archived_at) = response.archived_at else {
            tracing::trace!("Ignoring {} for {} (not a snapshot)", response.status, response.url);
            return;
        };

        if response.status >= 400 {
            tracing::warn!(
                "Skipping snapshot of {} from {}: status {}",
                response.url,
                archived_at,
                response.status
            );
            return;
        }

        match self
            .sink
            .write_snapshot(&response.url, archived_at, &response.body)
        {
            Ok(path) => {
                self.stats.record_snapshot(response.body.len());
                tracing::info!("Saved {} ({}) to {}", response.url, archived_at, path.display());
            }
            Err(e) => {
                self.stats.write_failures += 1;
                tracing::error!("Failed to save snapshot of {}: {}", response.url, e);
            }
        }

        if response.is_html() {
            self.follow_links(depth, &response);
        }
    }

    /// Queues the in-scope links of an archived page for resolution
    fn follow_links(&mut self, depth: u32, response: &FetchResponse) {
        let next_depth = depth + 1;
        if let Some(max_depth) = self.max_depth {
            if next_depth > max_depth {
                tracing::trace!("Not following links of {}: depth limit", response.url);
                return;
            }
        }

        let html = String::from_utf8_lossy(&response.body);
        let parsed = parse_html(&html, &response.url);

        let mut queued = 0;
        for link in parsed.links {
            if !self.filter.is_followable(&link) {
                continue;
            }
            if self
                .scheduler
                .enqueue(FetchRequest::new(link).with_depth(next_depth))
            {
                queued += 1;
            }
        }

        self.stats.links_followed += queued;
        tracing::debug!(
            "Queued {} new links from {} ({})",
            queued,
            response.url,
            parsed.title.as_deref().unwrap_or("untitled")
        );
    }
}

/// Runs a complete mirror with the configured file output
///
/// # Example
///
/// ```no_run
/// use wayback_mirror::config::load_config;
/// use wayback_mirror::crawler::run_mirror;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("mirror.toml"))?;
/// let stats = run_mirror(config).await?;
/// println!("{} snapshots saved", stats.snapshots_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_mirror(config: Config) -> Result<CrawlStatistics, MirrorError> {
    Coordinator::new(config)?.run().await
}
