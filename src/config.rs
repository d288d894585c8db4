// src/config.rs
// =============================================================================
// Plain configuration structs built from the command line.
//
// The CLI (src/cli.rs) owns parsing; everything below it only sees these
// structs, so tests can build them directly with struct-update syntax.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

/// Browser-like identification header sent with listing requests.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_LINK_SELECTOR: &str = "a";

pub const DEFAULT_ROW_SELECTOR: &str =
    "div.disclosured__elements > table.companies__table > tbody > tr";

pub const DEFAULT_SCROLL_CONTAINER: &str = "div.disclosured__table";

/// Settings the traversal engine itself reads.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Children of a context at this depth are never read.
    pub max_depth: usize,
    /// Politeness pause before each descent.
    pub delay: Duration,
    /// Bound on snapshot re-reads after stale references within one level.
    pub stale_retries: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            delay: Duration::from_millis(500),
            stale_retries: 3,
        }
    }
}

/// Settings for the link-based listing provider.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub request_timeout: Duration,
    /// CSS selector for entry links on a listing page.
    pub link_selector: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            link_selector: DEFAULT_LINK_SELECTOR.to_string(),
        }
    }
}

/// Two-phase stabilization policy for click-driven transitions.
#[derive(Debug, Clone)]
pub struct StabilizePolicy {
    pub attempts: u32,
    /// Timeout for each phase of an attempt.
    pub phase_timeout: Duration,
    pub poll_interval: Duration,
    pub retry_pause: Duration,
    /// Pause after a successful wait so late rows can land.
    pub settle: Duration,
    /// Row count the new view must exceed.
    pub populated_threshold: usize,
}

impl Default for StabilizePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            phase_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(200),
            retry_pause: Duration::from_secs(1),
            settle: Duration::from_secs(1),
            populated_threshold: 1,
        }
    }
}

/// Settings for the click-based tree widget provider.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub webdriver_url: String,
    pub headless: bool,
    /// CSS selector for the widget's rows (header row included).
    pub row_selector: String,
    /// Optional XPath of an element that must be clicked to reveal the tree.
    pub activation_xpath: Option<String>,
    pub scroll_container: String,
    /// Rows needed before a level counts as non-empty.
    pub min_rows: usize,
    pub activation_timeout: Duration,
    pub tree_timeout: Duration,
    pub tree_attempts: u32,
    pub stabilize: StabilizePolicy,
}

impl WidgetConfig {
    /// Content rows: everything after the header row.
    pub fn content_row_selector(&self) -> String {
        format!("{}:nth-child(n+2)", self.row_selector)
    }

    /// Cells inside content rows; their presence means the tree has rendered.
    pub fn tree_ready_selector(&self) -> String {
        format!("{} td", self.row_selector)
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            row_selector: DEFAULT_ROW_SELECTOR.to_string(),
            activation_xpath: None,
            scroll_container: DEFAULT_SCROLL_CONTAINER.to_string(),
            min_rows: 2,
            activation_timeout: Duration::from_secs(30),
            tree_timeout: Duration::from_secs(20),
            tree_attempts: 3,
            stabilize: StabilizePolicy::default(),
        }
    }
}

/// Where results go and which word lists drive matching.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub out_dir: PathBuf,
    pub json: bool,
    pub search_words: Option<PathBuf>,
    pub identity_words: Option<PathBuf>,
    pub exclusion_words: Option<PathBuf>,
}

impl OutputConfig {
    pub fn matching_enabled(&self) -> bool {
        self.search_words.is_some() || self.identity_words.is_some()
    }

    pub fn items_log(&self) -> PathBuf {
        self.out_dir.join("items.log")
    }

    pub fn run_log(&self) -> PathBuf {
        self.out_dir.join("crawler.log")
    }

    pub fn results_csv(&self) -> PathBuf {
        self.out_dir.join("search_results.csv")
    }

    pub fn counts_csv(&self) -> PathBuf {
        self.out_dir.join("search_word_counts.csv")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            json: false,
            search_words: None,
            identity_words: None,
            exclusion_words: None,
        }
    }
}
