// src/page/mod.rs
// =============================================================================
// This module turns a URL into a fingerprinted page.
//
// Submodules:
// - title: Finds the <title> in a parsed HTML tree
// - pipeline: fetch -> parse -> extract -> hash, producing a PageInfo
// =============================================================================

mod pipeline;
mod title;

pub use pipeline::{fetch_page, fetch_page_with, process_document, PageInfo, PipelineConfig};
pub use title::{extract_title, title_of};
