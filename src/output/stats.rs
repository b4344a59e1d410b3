//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! per-site indexing statistics from the storage layer.

use crate::storage::{SiteRecord, SiteStatistics, Storage, StorageResult};

/// One site and its row counts
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub site: SiteRecord,
    pub stats: SiteStatistics,
}

/// Loads statistics for every stored site
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(Vec<SiteSummary>)` - One entry per site, ordered by site ID
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<Vec<SiteSummary>> {
    let mut summaries = Vec::new();
    for site in storage.list_sites()? {
        let stats = storage.site_statistics(site.id)?;
        summaries.push(SiteSummary { site, stats });
    }
    Ok(summaries)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(summaries: &[SiteSummary]) {
    println!("=== Index Statistics ===\n");

    if summaries.is_empty() {
        println!("No sites have been indexed yet.");
        return;
    }

    let mut totals = SiteStatistics::default();
    for summary in summaries {
        let site = &summary.site;
        println!("{} ({})", site.name, site.url);
        println!(
            "  Status: {} since {}",
            site.status,
            site.status_time.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(error) = &site.last_error {
            println!("  Last error: {}", error);
        }
        println!("  Pages: {}", summary.stats.pages);
        println!("  Lemmas: {}", summary.stats.lemmas);
        println!("  Index entries: {}", summary.stats.index_entries);
        println!();

        totals.pages += summary.stats.pages;
        totals.lemmas += summary.stats.lemmas;
        totals.index_entries += summary.stats.index_entries;
    }

    println!("Total:");
    println!("  Sites: {}", summaries.len());
    println!("  Pages: {}", totals.pages);
    println!("  Lemmas: {}", totals.lemmas);
    println!("  Index entries: {}", totals.index_entries);
}
