use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::{CacheError, CacheHandle};
use crate::entry::Entry;
use crate::parser::{self, ParseError};

pub const USER_AGENT: &str = concat!("webrss/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for the per-cycle fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Maximum number of feeds fetched at the same time
    pub concurrency: usize,
    /// Upper bound for one fetch: request, body and parse
    pub timeout: Duration,
    /// Larger bodies are rejected
    pub max_body_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: 16,
            timeout: Duration::from_secs(30),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Why one feed produced no entries this cycle. Every variant carries the
/// feed URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url}: invalid URL: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{url}: request failed: {source}")]
    Network {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url}: timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("{url}: HTTP status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("{url}: response larger than {limit} bytes")]
    ResponseTooLarge { url: String, limit: usize },
    #[error("{url}: {source}")]
    Parse { url: String, source: ParseError },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Network { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::HttpStatus { url, .. }
            | FetchError::ResponseTooLarge { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Default)]
pub struct PollReport {
    /// Entries of every feed that succeeded, in completion order
    pub entries: Vec<Entry>,
    pub failures: Vec<FetchError>,
    /// Number of fetches launched
    pub fetched: usize,
}

pub struct Fetcher {
    client: Client,
    settings: FetchSettings,
}

impl Fetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches and parses a single feed. There are no retries; a failed feed
    /// is tried again on the next cycle.
    pub async fn fetch(&self, url: &str) -> Result<Vec<Entry>, FetchError> {
        let target = validate_url(url)?;

        match tokio::time::timeout(self.settings.timeout, self.fetch_url(url, target)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.settings.timeout,
            }),
        }
    }

    async fn fetch_url(&self, url: &str, target: Url) -> Result<Vec<Entry>, FetchError> {
        debug!(url = %url, "Fetching feed");

        let mut response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = self.read_body(url, &mut response).await?;
        let entries = parser::parse(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })?;

        debug!(url = %url, entries = entries.len(), "Parsed feed");
        Ok(entries)
    }

    async fn read_body(&self, url: &str, response: &mut Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.settings.max_body_bytes;
        let too_large = || FetchError::ResponseTooLarge {
            url: url.to_string(),
            limit,
        };

        if response
            .content_length()
            .is_some_and(|length| length > limit as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?
        {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Fetches every non-empty URL, at most `concurrency` at a time, and
    /// waits for all of them. Failures are logged and reported, never raised.
    pub async fn poll_once(&self, urls: &[String]) -> PollReport {
        let targets: Vec<String> = urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();
        info!(feeds = targets.len(), "Polling feeds");

        let results: Vec<Result<Vec<Entry>, FetchError>> = stream::iter(targets)
            .map(|url| async move { self.fetch(&url).await })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = PollReport {
            fetched: results.len(),
            ..PollReport::default()
        };
        for result in results {
            match result {
                Ok(mut entries) => report.entries.append(&mut entries),
                Err(e) => report.failures.push(e),
            }
        }

        for failure in &report.failures {
            warn!(url = %failure.url(), error = %failure, "Feed fetch failed");
        }
        info!(
            feeds = report.fetched,
            failed = report.failures.len(),
            entries = report.entries.len(),
            "Done fetching"
        );
        report
    }
}

fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Feeds the cache forever: first the restored snapshot (or a live poll when
/// there is none), then one poll per `period`.
///
/// A cycle that overruns the period is followed by a single catch-up tick;
/// later ticks stay on the original schedule.
pub async fn start_background_refresh(
    fetcher: Arc<Fetcher>,
    cache: CacheHandle,
    urls: Arc<Vec<String>>,
    period: Duration,
    restored: Option<Vec<Entry>>,
) {
    let initial = match restored {
        Some(entries) => {
            info!(entries = entries.len(), "Restoring persisted snapshot");
            entries
        }
        None => {
            info!("No persisted snapshot, starting initial feed fetch");
            fetcher.poll_once(&urls).await.entries
        }
    };
    if !deliver(&cache, initial).await {
        return;
    }

    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;
        info!("Starting scheduled feed refresh");
        let report = fetcher.poll_once(&urls).await;
        if !deliver(&cache, report.entries).await {
            return;
        }
    }
}

/// Returns false once the cache actor is gone.
async fn deliver(cache: &CacheHandle, entries: Vec<Entry>) -> bool {
    match cache.install(entries).await {
        Ok(()) => true,
        // Already reported by the actor; the snapshot is still served.
        Err(CacheError::Persist(_)) => true,
        Err(CacheError::Closed) => {
            error!("Cache actor stopped, ending feed refresh");
            false
        }
    }
}
