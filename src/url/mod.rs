//! URL handling module for Lemma-Crawl
//!
//! This module turns raw anchor `href` values into fetchable URLs, derives
//! the stored page path for a URL, and decides which configured site a URL
//! belongs to.

mod normalize;
mod site;

// Re-export main functions
pub use normalize::{is_fetchable, normalize_link};
pub use site::{belongs_to_site, page_path};
