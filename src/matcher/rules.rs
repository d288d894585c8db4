// src/matcher/rules.rs
// =============================================================================
// The keyword ruleset.
//
// Precedence, evaluated on the folded file name:
// 1. Identity rules (organization-name variants), in list order. Every
//    occurrence of a rule is checked; an occurrence lying wholly inside an
//    exclusion word's occurrence is discarded. The first surviving
//    occurrence tags the file with that identity entry.
// 2. General keywords, in list order. First match wins.
//
// Identity entries are literals where `*` means "anything may sit here",
// e.g. `nippon*denki` also matches "Nippon_Electric_Denki". General keywords
// are case-insensitive regular expressions.
// =============================================================================

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use super::fold::{fold, fold_width};
use super::Classifier;

struct Rule {
    tag: String,
    pattern: Regex,
}

pub struct KeywordMatcher {
    identity: Vec<Rule>,
    keywords: Vec<Rule>,
    exclusions: Vec<Regex>,
}

impl KeywordMatcher {
    pub fn new(identity: &[String], keywords: &[String], exclusions: &[String]) -> Self {
        Self {
            identity: identity
                .iter()
                .filter_map(|entry| Some(Rule {
                    tag: entry.clone(),
                    pattern: identity_pattern(entry)?,
                }))
                .collect(),
            keywords: keywords
                .iter()
                .filter_map(|entry| Some(Rule {
                    tag: entry.clone(),
                    pattern: keyword_pattern(entry)?,
                }))
                .collect(),
            exclusions: exclusions.iter().filter_map(|entry| literal_pattern(entry)).collect(),
        }
    }

    /// Identity entries then general keywords, duplicates collapsed, in
    /// configured order. This is the row order of the per-keyword counts.
    pub fn configured_words(&self) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for rule in self.identity.iter().chain(self.keywords.iter()) {
            if !words.contains(&rule.tag) {
                words.push(rule.tag.clone());
            }
        }
        words
    }

    fn excluded_spans(&self, folded: &str) -> Vec<Range<usize>> {
        self.exclusions
            .iter()
            .flat_map(|ex| ex.find_iter(folded).map(|m| m.range()))
            .collect()
    }
}

impl Classifier for KeywordMatcher {
    fn classify(&self, name: &str) -> Option<String> {
        let folded = fold(name);
        let excluded = self.excluded_spans(&folded);

        for rule in &self.identity {
            let survives = rule
                .pattern
                .find_iter(&folded)
                .any(|m| !is_covered(&m.range(), &excluded));
            if survives {
                return Some(rule.tag.clone());
            }
        }

        self.keywords
            .iter()
            .find(|rule| rule.pattern.is_match(&folded))
            .map(|rule| rule.tag.clone())
    }
}

fn is_covered(span: &Range<usize>, excluded: &[Range<usize>]) -> bool {
    excluded
        .iter()
        .any(|ex| ex.start <= span.start && span.end <= ex.end)
}

fn identity_pattern(entry: &str) -> Option<Regex> {
    let entry = entry.trim();
    if entry.trim_matches('*').is_empty() {
        return None;
    }

    let source = entry
        .split('*')
        .map(|part| regex::escape(&fold(part)))
        .collect::<Vec<_>>()
        .join(".*?");

    build(&source)
}

fn keyword_pattern(entry: &str) -> Option<Regex> {
    let source = fold_width(entry.trim());
    if source.is_empty() {
        return None;
    }

    build(&source).or_else(|| {
        tracing::warn!("Keyword '{}' is not a valid pattern; matching it literally", entry);
        literal_pattern(entry)
    })
}

fn literal_pattern(entry: &str) -> Option<Regex> {
    let folded = fold(entry.trim());
    if folded.is_empty() {
        return None;
    }
    build(&regex::escape(&folded))
}

fn build(source: &str) -> Option<Regex> {
    RegexBuilder::new(source).case_insensitive(true).build().ok()
}
