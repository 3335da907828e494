// src/fetch/mod.rs
// =============================================================================
// This module fetches pages without hammering the servers they live on.
//
// Submodules:
// - context: FetchContext, the deadline + cancel signal for one fetch
// - limiter: TokenBucket, the rate limiter every request goes through
// - client: Fetcher, which glues the limiter to a reqwest HTTP client
// =============================================================================

mod client;
mod context;
mod limiter;

pub use client::{Fetcher, FetcherConfig};
pub use context::{DoneReason, FetchContext};
pub use limiter::TokenBucket;
