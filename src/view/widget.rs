// src/view/widget.rs
// =============================================================================
// Click-based views: a tree widget rendered in a browser and driven over
// WebDriver with fantoccini.
//
// The widget is one shared, mutable, ordered list of rows:
// - at the top level every content row is a folder or a file
// - below the top level, row 0 is the "return" row
// - clicking a folder row replaces the rows with that folder's children
//
// Rows are re-rendered on every transition, so element references go stale.
// Nothing here holds on to an element across a transition; navigation
// re-locates its target by index and reference text each time.
// =============================================================================

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::WidgetConfig;
use crate::error::{CrawlError, ViewError};
use crate::model::{Node, NodeHandle, NodeKind, RowHandle, TraversalContext};
use crate::view::stabilize::{wait_two_phase, RowProbe};
use crate::view::{Navigator, Row, Transition, ViewProvider};

// Cells a content row needs: name, (unused), type
const MIN_CELLS: usize = 3;

/// Owns the WebDriver session for one traversal run.
pub struct WidgetSession {
    client: Client,
    config: WidgetConfig,
}

impl WidgetSession {
    pub async fn connect(config: &WidgetConfig) -> Result<Self, CrawlError> {
        let mut builder = ClientBuilder::rustls()
            .map_err(|e| CrawlError::Session(format!("TLS setup failed: {}", e)))?;
        if config.headless {
            builder.capabilities(chrome_capabilities());
        }

        let client = builder.connect(&config.webdriver_url).await.map_err(|e| {
            CrawlError::Session(format!("WebDriver at {}: {}", config.webdriver_url, e))
        })?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Loads the root page, reveals the tree, and waits for its rows.
    pub async fn open(&self, root: &Url) -> Result<(), CrawlError> {
        self.client
            .goto(root.as_str())
            .await
            .map_err(|e| CrawlError::Session(format!("Failed to load {}: {}", root, e)))?;

        if let Some(xpath) = &self.config.activation_xpath {
            let button = self
                .client
                .wait()
                .at_most(self.config.activation_timeout)
                .for_element(Locator::XPath(xpath.as_str()))
                .await
                .map_err(|e| CrawlError::Session(format!("Activation element {} not found: {}", xpath, e)))?;

            button
                .click()
                .await
                .map_err(|e| CrawlError::Session(format!("Activation click failed: {}", e)))?;
        }

        self.wait_for_tree().await
    }

    async fn wait_for_tree(&self) -> Result<(), CrawlError> {
        let ready = self.config.tree_ready_selector();

        for attempt in 1..=self.config.tree_attempts {
            let found = self
                .client
                .wait()
                .at_most(self.config.tree_timeout)
                .for_element(Locator::Css(ready.as_str()))
                .await;

            match found {
                Ok(_) => {
                    tokio::time::sleep(self.config.stabilize.settle).await;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Tree view did not appear (attempt {}/{}): {}",
                        attempt,
                        self.config.tree_attempts,
                        e
                    );
                    if attempt < self.config.tree_attempts {
                        tokio::time::sleep(self.config.stabilize.retry_pause).await;
                    }
                }
            }
        }

        Err(CrawlError::Session(format!(
            "Tree rows '{}' never appeared",
            ready
        )))
    }

    pub fn view(&self) -> WidgetView {
        WidgetView {
            client: self.client.clone(),
            config: self.config.clone(),
            rows: Vec::new(),
        }
    }

    pub fn navigator(&self) -> WidgetNavigator {
        WidgetNavigator {
            client: self.client.clone(),
            config: self.config.clone(),
        }
    }

    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            tracing::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

pub struct WidgetView {
    client: Client,
    config: WidgetConfig,
    rows: Vec<Element>,
}

impl WidgetView {
    // Brings a cell into view inside the widget's scroll container.
    // Best effort: a failed scroll does not stop the read.
    async fn scroll_to(&self, cell: &Element) {
        let container = match self
            .client
            .find(Locator::Css(self.config.scroll_container.as_str()))
            .await
        {
            Ok(container) => container,
            Err(_) => return,
        };

        let args = match (serde_json::to_value(&container), serde_json::to_value(cell)) {
            (Ok(container), Ok(cell)) => vec![container, cell],
            _ => return,
        };

        let script = "if (arguments[0].scrollTop !== arguments[1].offsetTop) \
                      { arguments[0].scrollTop = arguments[1].offsetTop; }";
        if let Err(e) = self.client.execute(script, args).await {
            tracing::debug!("Scroll skipped: {}", e);
        }
    }
}

#[async_trait]
impl ViewProvider for WidgetView {
    async fn snapshot(&mut self, _ctx: &TraversalContext) -> Result<usize, ViewError> {
        self.rows = find_rows(&self.client, &self.config).await?;
        Ok(self.rows.len())
    }

    async fn read_row(&mut self, ctx: &TraversalContext, index: usize) -> Result<Row, ViewError> {
        if ctx.depth > 0 && index == 0 {
            return Ok(Row::Placeholder);
        }

        let row = self.rows.get(index).cloned().ok_or(ViewError::Stale)?;
        let cells = row.find_all(Locator::Css("td")).await.map_err(view_error)?;
        if cells.len() < MIN_CELLS {
            return Ok(Row::Degenerate {
                columns: cells.len(),
            });
        }

        self.scroll_to(&cells[0]).await;

        let name = cells[0].text().await.map_err(view_error)?.trim().to_string();
        let kind = cells[2].text().await.map_err(view_error)?;

        let kind = match kind.trim() {
            "Folder" => NodeKind::Directory,
            "File" => NodeKind::File,
            _ => return Ok(Row::Unclassified { name }),
        };

        let handle = NodeHandle::Row(RowHandle {
            index,
            reference: name.clone(),
        });

        Ok(Row::Node(Node::new(kind, name, handle, ctx.path.clone())))
    }

    fn min_rows(&self) -> usize {
        self.config.min_rows
    }
}

pub struct WidgetNavigator {
    client: Client,
    config: WidgetConfig,
}

impl WidgetNavigator {
    // Finds the first cell of the row the handle points at in the current
    // render. Returns None when the row is gone.
    async fn locate(&self, rows: &[Element], handle: &RowHandle) -> Option<Element> {
        if let Some(row) = rows.get(handle.index) {
            if let Some((cell, text)) = first_cell(row).await {
                if text == handle.reference {
                    return Some(cell);
                }
            }
        }

        let mut texts = Vec::with_capacity(rows.len());
        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            match first_cell(row).await {
                Some((cell, text)) => {
                    texts.push(Some(text));
                    cells.push(Some(cell));
                }
                None => {
                    texts.push(None);
                    cells.push(None);
                }
            }
        }

        let index = fallback_index(&texts, &handle.reference)?;
        tracing::debug!(
            "Row '{}' moved from index {} to {}",
            handle.reference,
            handle.index,
            index
        );
        cells.into_iter().nth(index).flatten()
    }

    async fn activate(&self, target: &Element, previous: usize) -> Result<Transition, ViewError> {
        if let Err(e) = target.click().await {
            return match error_status(&e) {
                Some(ErrorStatus::ElementClickIntercepted) => Ok(Transition::Intercepted),
                Some(ErrorStatus::StaleElementReference) => Ok(Transition::Stale),
                _ => Err(ViewError::Driver(e.to_string())),
            };
        }

        let mut probe = RowCounter {
            client: self.client.clone(),
            selector: self.config.content_row_selector(),
        };
        Ok(wait_two_phase(&mut probe, previous, &self.config.stabilize).await)
    }
}

#[async_trait]
impl Navigator for WidgetNavigator {
    async fn enter(&mut self, _parent: &TraversalContext, child: &Node) -> Result<Transition, ViewError> {
        let NodeHandle::Row(handle) = &child.handle else {
            return Err(ViewError::Driver(format!("'{}' is not a widget row", child.name)));
        };

        let rows = find_rows(&self.client, &self.config).await?;
        let Some(target) = self.locate(&rows, handle).await else {
            return Ok(Transition::Stale);
        };

        self.activate(&target, rows.len()).await
    }

    async fn exit(&mut self, _ctx: &TraversalContext) -> Result<Transition, ViewError> {
        let rows = find_rows(&self.client, &self.config).await?;
        let Some(back) = rows.first() else {
            return Ok(Transition::Stale);
        };

        self.activate(back, rows.len()).await
    }
}

// Counts content rows for the stabilization wait
struct RowCounter {
    client: Client,
    selector: String,
}

#[async_trait]
impl RowProbe for RowCounter {
    async fn row_count(&mut self) -> Result<usize, ViewError> {
        let rows = self
            .client
            .find_all(Locator::Css(self.selector.as_str()))
            .await
            .map_err(view_error)?;
        Ok(rows.len())
    }
}

async fn find_rows(client: &Client, config: &WidgetConfig) -> Result<Vec<Element>, ViewError> {
    client
        .find_all(Locator::Css(config.content_row_selector().as_str()))
        .await
        .map_err(view_error)
}

async fn first_cell(row: &Element) -> Option<(Element, String)> {
    let cell = row.find(Locator::Css("td")).await.ok()?;
    let text = cell.text().await.ok()?;
    Some((cell, text.trim().to_string()))
}

// First row whose reference text matches; unreadable rows never match
fn fallback_index(texts: &[Option<String>], reference: &str) -> Option<usize> {
    texts
        .iter()
        .position(|text| text.as_deref() == Some(reference))
}

fn error_status(err: &CmdError) -> Option<&ErrorStatus> {
    match err {
        CmdError::Standard(wd) => Some(&wd.error),
        _ => None,
    }
}

fn view_error(err: CmdError) -> ViewError {
    match error_status(&err) {
        Some(ErrorStatus::StaleElementReference) => ViewError::Stale,
        _ => ViewError::Driver(err.to_string()),
    }
}

fn chrome_capabilities() -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless",
                "--disable-gpu",
                "--no-sandbox",
                "--window-size=1600,1024"
            ]
        }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_index_finds_moved_row() {
        let texts = vec![
            Some("Back".to_string()),
            Some("b".to_string()),
            None,
            Some("a".to_string()),
        ];
        assert_eq!(fallback_index(&texts, "a"), Some(3));
        assert_eq!(fallback_index(&texts, "missing"), None);
    }

    #[test]
    fn test_chrome_capabilities_are_headless() {
        let caps = chrome_capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless"));
    }
}
