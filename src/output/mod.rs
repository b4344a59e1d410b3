//! Output module for reporting indexing results
//!
//! This module handles:
//! - The `{result, error}` envelope returned by every entry point
//! - Per-site statistics loaded from storage

mod response;
pub mod stats;

pub use response::IndexingResponse;
pub use stats::{load_statistics, print_statistics, SiteSummary};
