//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: persisted status of a site (`INDEXING`, `INDEXED`, `FAILED`)
//! - `CrawlPhase`: in-memory phase of a single crawl invocation

mod crawl_phase;
mod site_status;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use site_status::SiteStatus;
