// src/error.rs
// =============================================================================
// This module defines every way a page can fail on its way through the
// pipeline.
//
// One enum, one variant per failure kind:
// - Entropy:     the OS could not give us random bytes for a salt
// - RateLimit:   the deadline ran out before the rate limiter let us through
// - Transport:   DNS, connection, TLS or timeout failure while fetching
// - HttpStatus:  the server answered with an error status (strict mode only)
// - Parse:       the payload could not be turned into an HTML document
// - HashCompute: a hash primitive refused its input (not expected to happen)
// - InvalidUrl:  the URL is unparsable or not http/https
// - Config:      the rate limiter was given nonsense parameters
// - SaltFormat:  a hex salt handed back to us is malformed
//
// Rust concepts:
// - thiserror: Derives std::error::Error and Display from attributes
// - #[source]: Links an error to the lower-level error that caused it
// =============================================================================

use std::fmt;
use std::time::Duration;

use thiserror::Error;

// The stages a page moves through in the pipeline.
//
// Idle -> Fetching -> Parsing -> Extracting -> Hashing -> Done
//
// Any stage can fail, which moves the page to Failed. Errors remember
// which stage they came from so reports can say where things broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Parsing,
    Extracting,
    Hashing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::Extracting => "extracting",
            Stage::Hashing => "hashing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to generate salt: {0}")]
    Entropy(#[source] rand::Error),

    #[error("rate limiter error for {url}: {reason}")]
    RateLimit { url: String, reason: RateLimitReason },

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} was cancelled after {elapsed:?}")]
    Cancelled { url: String, elapsed: Duration },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to parse HTML from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("failed to compute hashes: {0}")]
    HashCompute(String),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid rate limiter configuration: {0}")]
    Config(String),

    #[error("invalid salt: {0}")]
    SaltFormat(String),
}

// Why the rate limiter refused to admit a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    /// The next token arrives after the context deadline
    WouldExceedDeadline,
    /// The deadline passed while we were waiting
    DeadlineExceeded,
    /// Someone cancelled the context while we were waiting
    Cancelled,
}

impl fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RateLimitReason::WouldExceedDeadline => "wait would exceed context deadline",
            RateLimitReason::DeadlineExceeded => "context deadline exceeded",
            RateLimitReason::Cancelled => "context cancelled",
        };
        f.write_str(text)
    }
}

impl PageError {
    // Which pipeline stage produces this kind of error
    //
    // Salt and configuration problems happen before a page is even
    // touched, so they belong to Idle.
    pub fn stage(&self) -> Stage {
        match self {
            PageError::Entropy(_)
            | PageError::Config(_)
            | PageError::SaltFormat(_)
            | PageError::InvalidUrl { .. } => Stage::Idle,
            PageError::RateLimit { .. }
            | PageError::Transport { .. }
            | PageError::Cancelled { .. }
            | PageError::HttpStatus { .. } => Stage::Fetching,
            PageError::Parse { .. } => Stage::Parsing,
            PageError::HashCompute(_) => Stage::Hashing,
        }
    }

    // The URL the error is about, when there is one
    pub fn url(&self) -> Option<&str> {
        match self {
            PageError::RateLimit { url, .. }
            | PageError::Transport { url, .. }
            | PageError::Cancelled { url, .. }
            | PageError::HttpStatus { url, .. }
            | PageError::Parse { url, .. }
            | PageError::InvalidUrl { url, .. } => Some(url),
            _ => None,
        }
    }

    // Short machine-friendly label used in the JSON report
    pub fn kind(&self) -> &'static str {
        match self {
            PageError::Entropy(_) => "entropy",
            PageError::RateLimit { .. } => "rate_limit",
            PageError::Transport { .. } | PageError::Cancelled { .. } => "transport",
            PageError::HttpStatus { .. } => "http_status",
            PageError::Parse { .. } => "parse",
            PageError::HashCompute(_) => "hash_compute",
            PageError::InvalidUrl { .. } => "invalid_url",
            PageError::Config(_) => "config",
            PageError::SaltFormat(_) => "salt_format",
        }
    }
}
