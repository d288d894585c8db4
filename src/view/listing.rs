// src/view/listing.rs
// =============================================================================
// Link-based views: classic directory listing pages.
//
// How it works:
// 1. Fetch the page at the context's location
// 2. Pick out every <a href> in document order
// 3. Resolve each href against the page URL
// 4. Drop pseudo entries and anything on another authority
// 5. Classify: path ends with "/" -> directory, otherwise file
//
// A reference whose resolved host/port differs from the page's is never
// returned.
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::config::{ListingConfig, USER_AGENT};
use crate::error::ViewError;
use crate::model::{Node, NodeHandle, NodeKind, TraversalContext};
use crate::view::{Navigator, Row, Transition, ViewProvider};

// Listing hrefs that point at the listing itself or its parent
const PSEUDO_ENTRIES: [&str; 4] = ["../", "./", "..", "."];

// Fetches listing pages and serves their rows for one level at a time
pub struct LinkView {
    client: Client,
    links: Selector,
    rows: Vec<Node>,
}

impl LinkView {
    pub fn new(config: &ListingConfig) -> Result<Self, ViewError> {
        let links = link_selector(&config.link_selector)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            links,
            rows: Vec::new(),
        })
    }
}

/// Parses the CSS selector that picks entry links out of a listing page.
pub fn link_selector(source: &str) -> Result<Selector, ViewError> {
    Selector::parse(source).map_err(|e| ViewError::InvalidSelector {
        selector: source.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ViewProvider for LinkView {
    async fn snapshot(&mut self, ctx: &TraversalContext) -> Result<usize, ViewError> {
        let url = ctx.location.as_ref().ok_or(ViewError::MissingLocation)?;
        let html = fetch_page(&self.client, url).await?;

        self.rows = extract_listing(&html, url, &ctx.path, &self.links);
        tracing::debug!("{} entries listed at {}", self.rows.len(), url);

        Ok(self.rows.len())
    }

    async fn read_row(&mut self, _ctx: &TraversalContext, index: usize) -> Result<Row, ViewError> {
        // A parsed page cannot change under us, so a miss means the caller
        // is reading past the snapshot.
        self.rows
            .get(index)
            .cloned()
            .map(Row::Node)
            .ok_or(ViewError::Stale)
    }
}

// Link-based descent is a direct fetch of the child URL, so there is no
// shared view to move.
#[derive(Debug, Default)]
pub struct LinkNavigator;

#[async_trait]
impl Navigator for LinkNavigator {
    async fn enter(&mut self, _parent: &TraversalContext, _child: &Node) -> Result<Transition, ViewError> {
        Ok(Transition::Stabilized)
    }

    async fn exit(&mut self, _ctx: &TraversalContext) -> Result<Transition, ViewError> {
        Ok(Transition::Stabilized)
    }

    fn is_stateful(&self) -> bool {
        false
    }
}

// Fetches a listing page and returns its HTML
async fn fetch_page(client: &Client, url: &Url) -> Result<String, ViewError> {
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(ViewError::Http {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    Ok(response.text().await?)
}

// Extracts the directory and file entries of a listing page, in document
// order, deduplicated by resolved URL.
//
// Parameters:
//   html: the listing page
//   page_url: the URL it was fetched from (base for relative links)
//   path: ancestor names of the page, recorded on each node
//   links: which elements are entries; matches without an href are ignored
pub fn extract_listing(html: &str, page_url: &Url, path: &[String], links: &Selector) -> Vec<Node> {
    let document = Html::parse_document(html);

    let mut nodes: Vec<Node> = Vec::new();
    let mut seen: HashMap<Url, usize> = HashMap::new();

    for element in document.select(links) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = element.text().collect::<String>().trim().to_string();

        if PSEUDO_ENTRIES.contains(&href) || PSEUDO_ENTRIES.contains(&text.as_str()) {
            continue;
        }

        let Some(url) = resolve_link(page_url, href) else {
            continue;
        };

        if !same_authority(page_url, &url) || is_self_or_ancestor(page_url, &url) {
            continue;
        }

        // Icon and name links usually point at the same entry; keep the
        // first position and the first non-empty text.
        if let Some(&existing) = seen.get(&url) {
            if nodes[existing].name.is_empty() && !text.is_empty() {
                nodes[existing].name = text;
            }
            continue;
        }

        let kind = if url.path().ends_with('/') {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        seen.insert(url.clone(), nodes.len());
        nodes.push(Node::new(kind, text, NodeHandle::Url(url), path.to_vec()));
    }

    for node in &mut nodes {
        if node.name.is_empty() {
            if let NodeHandle::Url(url) = &node.handle {
                node.name = last_segment(url);
            }
        }
    }

    nodes
}

// Resolves a link (possibly relative) to an absolute URL without fragment
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    // Skip anchors and special protocols
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);

    if url.scheme() == "http" || url.scheme() == "https" {
        Some(url)
    } else {
        None
    }
}

// Host and explicit port must both match. The scheme is not compared, so
// an http listing that links to its https twin stays in bounds.
pub fn same_authority(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

// Sort-order links ("?C=N;O=D") resolve to the page itself, and "Parent
// Directory" links are often written in absolute form.
fn is_self_or_ancestor(page: &Url, candidate: &Url) -> bool {
    let page_path = page.path();
    let candidate_path = candidate.path();

    candidate_path == page_path
        || (candidate_path.ends_with('/') && page_path.starts_with(candidate_path))
}

// Decoded last non-empty path segment, used when a link has no text
fn last_segment(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();

    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
