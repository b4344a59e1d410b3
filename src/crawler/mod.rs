//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`PageFetcher`] seam
//! - HTML link and text extraction
//! - The one-level site crawl with cooperative stopping

mod fetcher;
mod parser;
mod site_crawler;

#[cfg(test)]
pub(crate) mod stub;

pub use fetcher::{build_http_client, FetchedPage, HttpFetcher, PageFetcher};
pub use parser::{extract_links, extract_text};
pub use site_crawler::{CrawlReport, SiteCrawler};
