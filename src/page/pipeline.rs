// src/page/pipeline.rs
// =============================================================================
// This module runs one page through every step:
//
//   Idle -> Fetching -> Parsing -> Extracting -> Hashing -> Done
//
// 1. Fetching:   rate-limited GET with a 30 second deadline
// 2. Parsing:    bytes -> HTML tree (scraper)
// 3. Extracting: tree -> title
// 4. Hashing:    title -> DigestSet
//
// If any step fails, the page is Failed and the error is handed straight
// back to the caller. Nothing is retried.
//
// Each call builds its own Fetcher (and so its own token bucket). Pages are
// meant to be processed one after another.
// =============================================================================

use std::borrow::Cow;
use std::time::Duration;

use scraper::Html;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::title;
use crate::digest::{DigestEngine, DigestSet};
use crate::error::{PageError, Stage};
use crate::fetch::{FetchContext, Fetcher, FetcherConfig};

// What we learned about one page
//
// Fields are private so a PageInfo can't be edited after the fact: the
// digests always belong to the title next to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    url: String,
    title: String,
    hashes: DigestSet,
}

impl PageInfo {
    pub fn url(&self) -> &str {
        &self.url
    }

    // The page title; empty if the page had none
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn hashes(&self) -> &DigestSet {
        &self.hashes
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetcher: FetcherConfig,
    /// Deadline for the whole fetch: rate limiter wait plus download
    pub deadline: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            deadline: Duration::from_secs(30),
        }
    }
}

// Keeps track of which stage a page is in and logs every move
struct StageTracker<'a> {
    url: &'a str,
    stage: Stage,
}

impl<'a> StageTracker<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            stage: Stage::Idle,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(url = self.url, from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }

    // Records the failure and passes the error through untouched
    fn fail(&self, error: PageError) -> PageError {
        warn!(url = self.url, stage = %self.stage, error = %error, "pipeline failed");
        error
    }
}

// Fetches a page with the default settings (1 req/s, burst 3, 30 s)
pub async fn fetch_page(url: &str, engine: &DigestEngine) -> Result<PageInfo, PageError> {
    fetch_page_with(url, engine, &PipelineConfig::default()).await
}

// Fetches a page and fingerprints its title
//
// Parameters:
//   url: the page to fetch (http or https)
//   engine: the digest engine whose salt goes into the derivation
//   config: rate limit, timeouts and status policy
//
// Returns: the finished PageInfo, or the error from whichever stage broke
pub async fn fetch_page_with(
    url: &str,
    engine: &DigestEngine,
    config: &PipelineConfig,
) -> Result<PageInfo, PageError> {
    let mut tracker = StageTracker::new(url);

    check_url(url).map_err(|e| tracker.fail(e))?;
    let fetcher = Fetcher::with_config(config.fetcher.clone()).map_err(|e| tracker.fail(e))?;
    let ctx = FetchContext::with_timeout(config.deadline);

    tracker.advance(Stage::Fetching);
    let body = fetcher.get(&ctx, url).await.map_err(|e| tracker.fail(e))?;

    run_stages(&mut tracker, &body, engine)
}

// Runs parse -> extract -> hash on a payload we already have
//
// Useful when the bytes came from somewhere other than the network
// (a cache, a test fixture...).
pub fn process_document(
    url: &str,
    body: &[u8],
    engine: &DigestEngine,
) -> Result<PageInfo, PageError> {
    let mut tracker = StageTracker::new(url);
    run_stages(&mut tracker, body, engine)
}

fn run_stages(
    tracker: &mut StageTracker<'_>,
    body: &[u8],
    engine: &DigestEngine,
) -> Result<PageInfo, PageError> {
    let url = tracker.url;

    tracker.advance(Stage::Parsing);
    let document = parse(url, body);

    tracker.advance(Stage::Extracting);
    let title = title::title_of(&document);
    if title.is_empty() {
        debug!(url, "no title found");
    }

    tracker.advance(Stage::Hashing);
    let hashes = engine.hash_title(&title).map_err(|e| tracker.fail(e))?;

    tracker.advance(Stage::Done);
    Ok(PageInfo {
        url: url.to_string(),
        title,
        hashes,
    })
}

// Turns the raw body into an HTML tree
//
// Bytes that aren't valid UTF-8 (a Latin-1 page, one stray byte...) become
// U+FFFD instead of failing the page. html5ever repairs broken markup on
// its own, so the errors it reports are only logged.
fn parse(url: &str, body: &[u8]) -> Html {
    let text = String::from_utf8_lossy(body);
    if let Cow::Owned(_) = text {
        debug!(url, "payload is not valid UTF-8, replaced bad bytes");
    }

    let document = Html::parse_document(&text);
    if !document.errors.is_empty() {
        debug!(url, count = document.errors.len(), "recovered from HTML parse errors");
    }
    document
}

// Only http and https URLs are fetched
//
// Examples:
//   "https://example.com" -> Ok
//   "ftp://example.com"   -> InvalidUrl
//   "not a url"           -> InvalidUrl
fn check_url(url: &str) -> Result<(), PageError> {
    let parsed = Url::parse(url).map_err(|e| PageError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(PageError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
