// src/sink/export.rs
// =============================================================================
// Tabular export of match results.
//
// Table 1 (search_results.csv): SearchWord, Directory, FileName
//   one row per matched file, grouped by the keyword's configured position
//   (stable, so discovery order survives within a keyword)
// Table 2 (search_word_counts.csv): SearchWord, Count
//   one row per configured word in configured order, zero counts included
// =============================================================================

use std::path::Path;

use crate::error::CrawlError;
use crate::model::MatchRecord;

pub fn write_export(
    matches: &[MatchRecord],
    words: &[String],
    results_path: &Path,
    counts_path: &Path,
) -> Result<(), CrawlError> {
    if let Some(parent) = results_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CrawlError::Output {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut ordered: Vec<&MatchRecord> = matches.iter().collect();
    ordered.sort_by_key(|record| keyword_index(words, &record.keyword));

    let mut results = csv::Writer::from_path(results_path)?;
    results.write_record(["SearchWord", "Directory", "FileName"])?;
    for record in ordered {
        results.write_record([&record.keyword, &record.directory, &record.file_name])?;
    }
    results.flush().map_err(|source| CrawlError::Output {
        path: results_path.to_path_buf(),
        source,
    })?;

    let mut counts = csv::Writer::from_path(counts_path)?;
    counts.write_record(["SearchWord", "Count"])?;
    for (word, count) in keyword_counts(matches, words) {
        counts.write_record([word, count.to_string()])?;
    }
    counts.flush().map_err(|source| CrawlError::Output {
        path: counts_path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Wrote {} match(es) to {} and counts to {}",
        matches.len(),
        results_path.display(),
        counts_path.display()
    );
    Ok(())
}

/// Match totals per configured word, in configured order.
pub fn keyword_counts(matches: &[MatchRecord], words: &[String]) -> Vec<(String, usize)> {
    words
        .iter()
        .map(|word| {
            let count = matches.iter().filter(|m| &m.keyword == word).count();
            (word.clone(), count)
        })
        .collect()
}

// Unknown keywords sort after every configured one
fn keyword_index(words: &[String], keyword: &str) -> usize {
    words
        .iter()
        .position(|w| w == keyword)
        .unwrap_or(words.len())
}
