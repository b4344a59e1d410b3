use crate::config::types::{Config, IndexingConfig, SiteConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

const MAX_CONCURRENT_SITES: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_indexing_config(&config.indexing)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates indexing run configuration
fn validate_indexing_config(config: &IndexingConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sites < 1 || config.max_concurrent_sites > MAX_CONCURRENT_SITES {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sites must be between 1 and {}, got {}",
            MAX_CONCURRENT_SITES, config.max_concurrent_sites
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates outbound request headers
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // An empty referer is allowed; it is simply sent empty.
    if !config.referer.is_empty() {
        Url::parse(&config.referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the configured site list
///
/// Site URLs are the natural key of a site, so they must be unique.
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                site.url
            )));
        }

        let url = Url::parse(&site.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' must use http or https",
                site.url
            )));
        }

        if !seen.insert(site.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' is configured more than once",
                site.url
            )));
        }
    }

    Ok(())
}
