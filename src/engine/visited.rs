// src/engine/visited.rs
//
// Locations entered during a link-based run. A location is inserted before
// the engine descends into it, so the same URL is never entered twice even
// when several pages link to it.

use std::collections::HashSet;

use url::Url;

#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<Url>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as entered. Returns false when it already was.
    ///
    /// Check and insert happen in one call so no caller can observe the
    /// gap between them.
    pub fn insert(&mut self, url: &Url) -> bool {
        self.seen.insert(canonical(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(&canonical(url))
    }
}

// Fragments never change what a server returns
fn canonical(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
