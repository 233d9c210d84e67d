use crate::config::cli::Args;
use crate::error::Result;
use clap::Parser;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, UPGRADE_INSECURE_REQUESTS,
};
use reqwest::Client;
use std::time::Duration;

pub(crate) mod cli;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Per-attempt timeout for page fetches.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_FETCH_ATTEMPTS: u32 = 3;
/// Base of the exponential backoff between fetch attempts.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
/// Pause between two consecutive pages of the same strategy.
pub const PAGE_DELAY: Duration = Duration::from_millis(500);

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);
pub const PREFETCH_THRESHOLDS: [usize; 3] = [2, 3, 4];

pub const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:8001"];

/// Retry and pacing knobs for the scraping layer.
#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub page_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: MAX_FETCH_ATTEMPTS,
            base_delay: RETRY_BASE_DELAY,
            page_delay: PAGE_DELAY,
        }
    }
}

pub struct Config {
    pub args: Args,
    pub http_client: Client,
    pub fetch: FetchSettings,
}

impl Config {
    pub fn new() -> Result<Self> {
        let args = Args::parse();
        let http_client = build_http_client()?;

        Ok(Self {
            args,
            http_client,
            fetch: FetchSettings::default(),
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.args.host.clone(), self.args.port)
    }
}

/// Builds the shared client with a browser-like default header set.
/// Accept-Encoding is left to reqwest, which decodes gzip and brotli bodies.
pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;

    Ok(client)
}
