use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::fetcher::FetchSettings;

pub const DEFAULT_CACHE_PATH: &str = "rss.json";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STATIC_DIR: &str = "style";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_RECENT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No feed URLs given; pass them as arguments or use --feeds")]
    NoFeeds,
    #[error("Failed to read feed list {}: {source}", path.display())]
    FeedList {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid duration '{0}' (expected e.g. 90s, 15m, 1h30m)")]
    InvalidDuration(String),
    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,
}

/// Command line flags. Every flag overrides the matching config file value.
#[derive(Debug, Default, Parser)]
#[command(
    name = "webrss",
    version,
    about = "Polls Atom and RSS feeds and serves the latest entries as a web page"
)]
pub struct Args {
    /// Feed URLs to poll
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// File containing a list of feed URLs, one per line
    #[arg(long, value_name = "FILE")]
    pub feeds: Option<PathBuf>,

    /// File for storing feed results
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Duration between feed polls [default: 1h]
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub freq: Option<Duration>,

    /// HTTP listen address [default: 0.0.0.0:3000]
    #[arg(long, value_name = "ADDR")]
    pub http: Option<String>,

    /// Directory served under /style/ [default: style]
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// How far back the front page reaches [default: 24h]
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub window: Option<Duration>,

    /// Maximum number of feeds fetched at once [default: 16]
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-feed fetch timeout [default: 30s]
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Optional TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Contents of the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub feeds: Vec<String>,
    pub feeds_file: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub poll_interval: Option<String>,
    pub http: Option<String>,
    pub static_dir: Option<PathBuf>,
    pub recent_window: Option<String>,
    pub fetch: FetchFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchFileConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub max_body_bytes: Option<usize>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Feed URLs in the order given; never empty
    pub urls: Vec<String>,
    pub cache_path: PathBuf,
    pub poll_interval: Duration,
    pub http_addr: String,
    pub static_dir: PathBuf,
    pub recent_window: Duration,
    pub fetch: FetchSettings,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    /// Merges flags over file values over defaults.
    ///
    /// URLs are the positional arguments, then the feed list file, then the
    /// file's `feeds` array, with blank entries dropped.
    pub fn resolve(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let mut urls = args.urls;
        if let Some(path) = args.feeds.as_ref().or(file.feeds_file.as_ref()) {
            urls.extend(read_feed_list(path)?);
        }
        urls.extend(file.feeds);
        let urls: Vec<String> = urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(ConfigError::NoFeeds);
        }

        let defaults = FetchSettings::default();
        let concurrency = args
            .concurrency
            .or(file.fetch.concurrency)
            .unwrap_or(defaults.concurrency);
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        Ok(Self {
            urls,
            cache_path: args
                .cache
                .or(file.cache)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH)),
            poll_interval: pick_duration(
                args.freq,
                file.poll_interval.as_deref(),
                DEFAULT_POLL_INTERVAL,
            )?,
            http_addr: args
                .http
                .or(file.http)
                .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            static_dir: args
                .static_dir
                .or(file.static_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            recent_window: pick_duration(
                args.window,
                file.recent_window.as_deref(),
                DEFAULT_RECENT_WINDOW,
            )?,
            fetch: FetchSettings {
                concurrency,
                timeout: pick_duration(args.timeout, file.fetch.timeout.as_deref(), defaults.timeout)?,
                max_body_bytes: file.fetch.max_body_bytes.unwrap_or(defaults.max_body_bytes),
            },
        })
    }
}

fn pick_duration(
    flag: Option<Duration>,
    file: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match (flag, file) {
        (Some(duration), _) => Ok(duration),
        (None, Some(text)) => parse_duration(text),
        (None, None) => Ok(default),
    }
}

/// Reads a newline-delimited URL list. Blank lines are skipped.
pub fn read_feed_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FeedList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parses durations such as `90s`, `15m`, `1h30m` or `500ms`. Units are
/// `ms`, `s`, `m`, `h` and `d`; zero is rejected.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(value.to_string());

    let mut rest = value.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let amount: u32 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ms" => Duration::from_millis(1),
            "s" => Duration::from_secs(1),
            "m" => Duration::from_secs(60),
            "h" => Duration::from_secs(60 * 60),
            "d" => Duration::from_secs(24 * 60 * 60),
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total = unit
            .checked_mul(amount)
            .and_then(|part| total.checked_add(part))
            .ok_or_else(invalid)?;
    }

    if total.is_zero() {
        return Err(invalid());
    }
    Ok(total)
}
