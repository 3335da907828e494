// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command: give it some URLs (or none, to use the
// built-in list) and it fetches each page, fingerprints its title and
// prints the result.
//
// All the knobs here end up in a PipelineConfig, which is what the
// library actually reads.
// =============================================================================

use std::time::Duration;

use clap::Parser;
use page_digest::fetch::FetcherConfig;
use page_digest::PipelineConfig;

// Pages fetched when no URL is given on the command line
pub const DEFAULT_URLS: [&str; 2] = ["https://golang.org", "https://pkg.go.dev"];

#[derive(Parser, Debug)]
#[command(
    name = "page-digest",
    version = "0.1.0",
    about = "Fetch web pages under a rate limit and fingerprint their titles",
    long_about = "page-digest fetches each URL through a token bucket rate limiter, extracts \
                  the page title and prints its SHA3-256, BLAKE2b-256 and PBKDF2 digests, \
                  followed by an integrity check of the title."
)]
pub struct Cli {
    /// URLs to fetch, one after another
    ///
    /// Defaults to https://golang.org and https://pkg.go.dev
    #[arg(default_values = DEFAULT_URLS)]
    pub urls: Vec<String>,

    /// Requests per second allowed in the long run
    #[arg(long, default_value_t = 1.0)]
    pub rate: f64,

    /// Requests that may go out back to back before the limit kicks in
    #[arg(long, default_value_t = 3)]
    pub burst: u32,

    /// Deadline in seconds for each page (rate limiter wait + download)
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Treat HTTP 4xx/5xx answers as failures
    #[arg(long)]
    pub fail_on_status: bool,

    /// Reuse a hex-encoded salt instead of generating one
    ///
    /// Pass the "salt" value from an earlier run to reproduce its
    /// pbkdf2-sha3 values.
    #[arg(long, value_name = "HEX")]
    pub salt: Option<String>,

    /// Output results in JSON format instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    // Builds the library configuration from the parsed flags
    pub fn pipeline_config(&self) -> PipelineConfig {
        let timeout = Duration::from_secs(self.timeout);
        PipelineConfig {
            fetcher: FetcherConfig {
                rate: self.rate,
                burst: self.burst,
                request_timeout: timeout,
                reject_error_status: self.fail_on_status,
                ..FetcherConfig::default()
            },
            deadline: timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["page-digest"]).unwrap();
        assert_eq!(cli.urls, DEFAULT_URLS.to_vec());
        assert_eq!(cli.rate, 1.0);
        assert_eq!(cli.burst, 3);
        assert_eq!(cli.timeout, 30);
        assert!(!cli.json);
        assert!(cli.salt.is_none());
    }

    #[test]
    fn test_urls_and_flags() {
        let cli = Cli::try_parse_from([
            "page-digest",
            "https://example.com",
            "https://www.rust-lang.org",
            "--rate",
            "2.5",
            "--burst",
            "5",
            "--timeout",
            "10",
            "--fail-on-status",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.urls, vec!["https://example.com", "https://www.rust-lang.org"]);
        let config = cli.pipeline_config();
        assert_eq!(config.fetcher.rate, 2.5);
        assert_eq!(config.fetcher.burst, 5);
        assert!(config.fetcher.reject_error_status);
        assert_eq!(config.deadline, Duration::from_secs(10));
        assert_eq!(config.fetcher.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_bad_burst() {
        assert!(Cli::try_parse_from(["page-digest", "--burst", "many"]).is_err());
    }
}
