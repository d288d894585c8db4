// src/matcher/mod.rs
// =============================================================================
// This module classifies file names against keyword word lists.
//
// Submodules:
// - fold: width/case folding shared by names and patterns
// - rules: the identity + keyword + exclusion ruleset
// - wordlist: reading the word list files
//
// The engine only sees the Classifier trait: a pure function from a file
// name to an optional tag.
// =============================================================================

mod fold;
mod rules;
mod wordlist;

pub use rules::KeywordMatcher;
pub use wordlist::read_words;

use crate::config::OutputConfig;
use crate::error::CrawlError;

/// Classifies a file name; returns the matched tag, if any.
pub trait Classifier: Send + Sync {
    fn classify(&self, name: &str) -> Option<String>;
}

impl KeywordMatcher {
    /// Builds the matcher from the configured word list files.
    ///
    /// Returns `Ok(None)` when matching is not enabled.
    pub fn from_config(output: &OutputConfig) -> Result<Option<Self>, CrawlError> {
        if !output.matching_enabled() {
            return Ok(None);
        }

        let load = |path: &Option<std::path::PathBuf>| -> Result<Vec<String>, CrawlError> {
            match path {
                Some(path) => read_words(path),
                None => Ok(Vec::new()),
            }
        };

        let identity = load(&output.identity_words)?;
        let keywords = load(&output.search_words)?;
        let exclusions = load(&output.exclusion_words)?;

        tracing::info!(
            "Loaded {} identity word(s), {} keyword(s), {} exclusion word(s)",
            identity.len(),
            keywords.len(),
            exclusions.len()
        );

        Ok(Some(Self::new(&identity, &keywords, &exclusions)))
    }
}
