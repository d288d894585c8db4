// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Two families:
// - CrawlError: fatal conditions that stop a run before (or instead of)
//   traversal. The binary turns these into exit code 2.
// - ViewError: problems reading or driving one view. These never escape the
//   directory level that produced them; the engine logs and counts them.
// =============================================================================

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid root location '{url}': {reason}")]
    InvalidRoot { url: String, reason: String },

    #[error("Could not establish a view session: {0}")]
    Session(String),

    #[error("Word list not found or unreadable: {path}: {source}")]
    WordList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Output error for {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ViewError {
    /// The view mutated between snapshot and read.
    #[error("Stale row reference")]
    Stale,

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("WebDriver command failed: {0}")]
    Driver(String),

    #[error("Context has no location to fetch")]
    MissingLocation,

    #[error("Invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ViewError {
    pub fn is_stale(&self) -> bool {
        matches!(self, ViewError::Stale)
    }
}

/// Validates the root location before any traversal begins.
///
/// Only absolute http(s) URLs with a host are accepted.
pub fn parse_root(url: &str) -> Result<url::Url, CrawlError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CrawlError::InvalidRoot {
            url: url.to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }

    let parsed = url::Url::parse(url).map_err(|e| CrawlError::InvalidRoot {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.host_str().is_none() {
        return Err(CrawlError::InvalidRoot {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root_accepts_http() {
        let url = parse_root("http://ftp.uk.debian.org/debian/").unwrap();
        assert_eq!(url.host_str(), Some("ftp.uk.debian.org"));
    }

    #[test]
    fn test_parse_root_rejects_other_schemes() {
        let err = parse_root("ftp://ftp.uk.debian.org/debian/").unwrap_err();
        assert!(matches!(err, CrawlError::InvalidRoot { .. }));
    }

    #[test]
    fn test_parse_root_rejects_garbage() {
        assert!(parse_root("http://").is_err());
        assert!(parse_root("example.com").is_err());
    }

    #[test]
    fn test_stale_is_detected() {
        assert!(ViewError::Stale.is_stale());
        assert!(!ViewError::MissingLocation.is_stale());
    }
}
