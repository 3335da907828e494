// src/lib.rs
// =============================================================================
// page-digest: fetch web pages politely and fingerprint their titles.
//
// Modules, leaves first:
// - digest: SHA3-256, BLAKE2b-256 and PBKDF2 over a title, plus integrity checks
// - fetch: Token bucket rate limiter in front of a reqwest client
// - page: Title extraction and the page pipeline that ties it all together
// - error: PageError, every way a page can fail
//
// The binary in src/main.rs is a thin driver around page::fetch_page_with.
// =============================================================================

pub mod digest;
pub mod error;
pub mod fetch;
pub mod page;

#[cfg(test)]
mod testutil;

pub use digest::{DigestEngine, DigestSet, Salt};
pub use error::{PageError, Stage};
pub use page::{fetch_page, fetch_page_with, PageInfo, PipelineConfig};
