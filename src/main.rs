// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls how chatty it is; default: warn)
// 2. Parse command-line arguments using clap
// 3. Create one DigestEngine, so every page shares the same salt
// 4. Fetch and fingerprint each URL in turn; a failed page is reported
//    and we move on to the next one
// 5. Exit with proper code (0 = all pages ok, 1 = some failed, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use page_digest::{fetch_page_with, DigestEngine, PageError, PageInfo, Salt};

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so they never mix with the report (or JSON) on stdout
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = every page was fetched and fingerprinted
//   Ok(1) = at least one page failed
//   Err = we couldn't even start (bad salt, no entropy...)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = cli.pipeline_config();

    let engine = match &cli.salt {
        Some(hex) => DigestEngine::with_salt(Salt::from_hex(hex).context("invalid --salt")?),
        None => DigestEngine::new().context("failed to initialise digest engine")?,
    };

    if !cli.json {
        println!("🔐 Digest engine ready, salt: {}", engine.salt().to_hex());
        println!("{}", "=".repeat(60));
    }

    let mut reports = Vec::new();
    for url in &cli.urls {
        if !cli.json {
            println!("🌐 Fetching and parsing: {}", url);
        }

        let report = match fetch_page_with(url, &engine, &config).await {
            Ok(page) => PageReport::from_page(&engine, page),
            Err(e) => PageReport::from_error(url, &e),
        };

        if !cli.json {
            print_report(&report);
            println!("---");
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// One line of the final report
//
// #[serde(tag = "status")] adds "status": "ok" or "status": "failed" to
// the JSON, and flatten merges the PageInfo fields into the same object.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PageReport {
    Ok {
        #[serde(flatten)]
        page: PageInfo,
        /// None when there was no title to check
        #[serde(skip_serializing_if = "Option::is_none")]
        integrity_valid: Option<bool>,
    },
    Failed {
        url: String,
        stage: String,
        kind: &'static str,
        message: String,
    },
}

impl PageReport {
    // Wraps a fetched page and re-checks its title against the stored digest
    fn from_page(engine: &DigestEngine, page: PageInfo) -> Self {
        let integrity_valid = if page.title().is_empty() {
            None
        } else {
            page.hashes()
                .blake2b_256()
                .map(|digest| engine.validate_integrity(page.title(), digest))
        };
        PageReport::Ok {
            page,
            integrity_valid,
        }
    }

    fn from_error(url: &str, error: &PageError) -> Self {
        PageReport::Failed {
            url: url.to_string(),
            stage: error.stage().to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    fn is_ok(&self) -> bool {
        matches!(self, PageReport::Ok { .. })
    }
}

// Prints one page in human-readable form
fn print_report(report: &PageReport) {
    match report {
        PageReport::Ok {
            page,
            integrity_valid,
        } => {
            println!("Site: {}", page.url());
            if page.title().is_empty() {
                println!("⚠️  No page title found");
                return;
            }

            println!("Title: {}", page.title());
            println!("Digests:");
            for (algorithm, value) in page.hashes().iter() {
                println!("  {:<12} {}", algorithm, value);
            }

            match integrity_valid {
                Some(true) => println!("Integrity check: ✅ valid"),
                Some(false) => println!("Integrity check: ❌ MISMATCH"),
                None => {}
            }
        }
        PageReport::Failed {
            url,
            stage,
            message,
            ..
        } => {
            println!("❌ {} failed while {}: {}", url, stage, message);
        }
    }
}
