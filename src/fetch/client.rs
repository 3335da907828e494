// src/fetch/client.rs
// =============================================================================
// This module downloads pages, one rate-limited GET at a time.
//
// Key functionality:
// - Waits for the token bucket before every request
// - Binds the request to a FetchContext, so the deadline or a cancel()
//   aborts the download too, not just the wait
// - Sorts transport failures (timeout, DNS, TLS...) for the logs
// - Optionally treats 4xx/5xx answers as failures
//
// Rust concepts:
// - Builder pattern: Client::builder() configures the HTTP client
// - tokio::select!: Race the download against the context
// =============================================================================

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use super::context::FetchContext;
use super::limiter::TokenBucket;
use crate::error::PageError;

// Everything needed to build a Fetcher
//
// The defaults match what each page fetch uses: one request per second,
// bursts of up to three, and a 30 second ceiling per request.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Tokens added to the bucket per second
    pub rate: f64,
    /// Maximum number of requests that can go out back to back
    pub burst: u32,
    /// Overall timeout for a single request
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Fail with HttpStatus on 4xx/5xx instead of returning the body
    pub reject_error_status: bool,
    /// Honour HTTP_PROXY / HTTPS_PROXY from the environment
    pub system_proxy: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            burst: 3,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("page-digest/", env!("CARGO_PKG_VERSION")).to_string(),
            reject_error_status: false,
            system_proxy: true,
        }
    }
}

pub struct Fetcher {
    client: Client,
    limiter: TokenBucket,
    request_timeout: Duration,
    reject_error_status: bool,
}

impl Fetcher {
    // Creates a fetcher with the given rate limit and default settings
    //
    // Parameters:
    //   rate: requests per second allowed in the long run
    //   burst: requests allowed back to back before waiting kicks in
    pub fn new(rate: f64, burst: u32) -> Result<Self, PageError> {
        Self::with_config(FetcherConfig {
            rate,
            burst,
            ..FetcherConfig::default()
        })
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self, PageError> {
        let limiter = TokenBucket::new(config.rate, config.burst)?;

        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| PageError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            limiter,
            request_timeout: config.request_timeout,
            reject_error_status: config.reject_error_status,
        })
    }

    // Fetches a URL and returns the response body
    //
    // Steps:
    // 1. Wait for the rate limiter (or give up when ctx ends)
    // 2. Send the GET, racing it against ctx
    // 3. Read the whole body
    //
    // Returns: the raw body bytes, or the first error hit along the way
    pub async fn get(&self, ctx: &FetchContext, url: &str) -> Result<Vec<u8>, PageError> {
        self.limiter
            .acquire(ctx)
            .await
            .map_err(|reason| PageError::RateLimit {
                url: url.to_string(),
                reason,
            })?;

        // Never let the request outlive the context
        let timeout = self.request_timeout.min(ctx.remaining());

        tokio::select! {
            biased;
            _ = ctx.done() => {
                warn!(url, "request abandoned: context ended");
                Err(PageError::Cancelled {
                    url: url.to_string(),
                    elapsed: ctx.elapsed(),
                })
            }
            result = self.download(url, timeout) => result,
        }
    }

    async fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, PageError> {
        let transport = |source: reqwest::Error| {
            warn!(url, kind = categorize_error(&source), "transport error");
            PageError::Transport {
                url: url.to_string(),
                source,
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if self.reject_error_status && (status.is_client_error() || status.is_server_error()) {
            return Err(PageError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        info!(url, status = status.as_u16(), bytes = body.len(), "fetched page");
        Ok(body.to_vec())
    }
}

// Puts a reqwest error into a coarse bucket for logging
//
// reqwest errors can happen for many reasons:
// - Request timeout
// - Too many redirects
// - DNS resolution failure
// - SSL certificate issues
fn categorize_error(error: &reqwest::Error) -> &'static str {
    let text = error.to_string().to_lowercase();

    if error.is_timeout() {
        "timeout"
    } else if error.is_redirect() {
        "too_many_redirects"
    } else if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
        "tls"
    } else if error.is_connect() && text.contains("dns") {
        "dns"
    } else if error.is_connect() {
        "connect"
    } else if error.is_body() || error.is_decode() {
        "body"
    } else {
        "other"
    }
}
