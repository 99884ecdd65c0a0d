// src/crawl/mod.rs
// =============================================================================
// This module discovers what one version of the website actually contains.
//
// Features:
// - Breadth-first crawling starting from the entry page
// - Only same-tree relative links are followed; external URLs are skipped
// - Visited-set deduplication, so cyclic link graphs terminate
// - Image references are collected alongside pages
// =============================================================================

mod walk;

// Re-export the crawl entry point and its result type
pub use walk::{crawl, Sitemap};
