// src/cli.rs
// =============================================================================
// This file defines the command-line interface using the `clap` crate.
//
// Two subcommands, one per kind of source:
// - listing: walk HTML directory listings by following links
// - tree: walk a click-driven tree widget through a WebDriver session
//
// Both share the output and word list flags (OutputArgs). The values are
// converted into the plain config structs in src/config.rs; nothing below
// main.rs sees clap types.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    CrawlConfig, ListingConfig, OutputConfig, StabilizePolicy, WidgetConfig,
    DEFAULT_LINK_SELECTOR, DEFAULT_SCROLL_CONTAINER,
};

#[derive(Parser, Debug)]
#[command(
    name = "tree-crawler",
    version = "0.1.0",
    about = "Enumerate directories and files behind a listing page or tree widget",
    long_about = "tree-crawler walks a remote directory hierarchy depth-first, either by following \
                  links in HTML directory listings or by clicking through a rendered tree widget. \
                  Every directory and file is written to an item log, and file names can be \
                  matched against keyword lists."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl an HTML directory listing by following its links
    ///
    /// Example: tree-crawler listing http://deb.debian.org/debian/pool/ --max-depth 3
    Listing {
        /// Root listing URL (http or https)
        url: String,

        /// Maximum depth; children of deeper directories are not read
        #[arg(long, default_value_t = 5)]
        max_depth: usize,

        /// Pause before each descent, in seconds
        #[arg(long, default_value_t = 0.5)]
        delay: f64,

        /// Request timeout, in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// CSS selector for entry links on each listing page
        #[arg(long, default_value = DEFAULT_LINK_SELECTOR)]
        selector: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Crawl a click-driven tree widget through WebDriver
    ///
    /// Example: tree-crawler tree --url https://example.com/disclosure \
    ///          --selector "table.tree > tbody > tr" --xpath "//button[@id='open']"
    Tree {
        /// Page that hosts the tree widget
        #[arg(long)]
        url: String,

        /// CSS selector for the widget's rows, header row included
        #[arg(long)]
        selector: String,

        /// XPath of an element to click before the tree is shown
        #[arg(long)]
        xpath: Option<String>,

        /// Maximum depth; children of deeper directories are not read
        #[arg(long, default_value_t = 5)]
        max_depth: usize,

        /// Pause before each click, and settle time after it, in seconds
        #[arg(long, default_value_t = 1.0)]
        delay: f64,

        /// WebDriver server URL
        #[arg(long, default_value = "http://localhost:4444")]
        webdriver: String,

        /// Timeout for each phase of the post-click wait, in seconds
        #[arg(long, default_value_t = 10)]
        wait_timeout: u64,

        /// Attempts of the post-click wait before giving up on a directory
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// CSS selector of the element that scrolls the rows
        #[arg(long, default_value = DEFAULT_SCROLL_CONTAINER)]
        scroll_container: String,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory for items.log, crawler.log, and the match tables
    #[arg(long, default_value = "output")]
    pub out_dir: PathBuf,

    /// Print the final report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Keyword list (one regular expression per line)
    #[arg(long)]
    pub search_words: Option<PathBuf>,

    /// Identity word list (one entry per line, `*` allows a gap)
    #[arg(long)]
    pub identity_words: Option<PathBuf>,

    /// Exclusion word list (one literal per line)
    #[arg(long)]
    pub exclusion_words: Option<PathBuf>,
}

impl From<OutputArgs> for OutputConfig {
    fn from(args: OutputArgs) -> Self {
        Self {
            out_dir: args.out_dir,
            json: args.json,
            search_words: args.search_words,
            identity_words: args.identity_words,
            exclusion_words: args.exclusion_words,
        }
    }
}

/// Everything a listing run needs, resolved from the command line.
#[derive(Debug)]
pub struct ListingRun {
    pub url: String,
    pub crawl: CrawlConfig,
    pub listing: ListingConfig,
    pub output: OutputConfig,
}

/// Everything a tree run needs, resolved from the command line.
#[derive(Debug)]
pub struct TreeRun {
    pub url: String,
    pub crawl: CrawlConfig,
    pub widget: WidgetConfig,
    pub output: OutputConfig,
}

#[derive(Debug)]
pub enum RunPlan {
    Listing(ListingRun),
    Tree(TreeRun),
}

impl RunPlan {
    pub fn output(&self) -> &OutputConfig {
        match self {
            RunPlan::Listing(run) => &run.output,
            RunPlan::Tree(run) => &run.output,
        }
    }
}

impl From<Commands> for RunPlan {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Listing {
                url,
                max_depth,
                delay,
                timeout,
                selector,
                output,
            } => RunPlan::Listing(ListingRun {
                url,
                crawl: CrawlConfig {
                    max_depth,
                    delay: seconds(delay),
                    ..Default::default()
                },
                listing: ListingConfig {
                    request_timeout: Duration::from_secs(timeout),
                    link_selector: selector,
                },
                output: output.into(),
            }),
            Commands::Tree {
                url,
                selector,
                xpath,
                max_depth,
                delay,
                webdriver,
                wait_timeout,
                retries,
                scroll_container,
                headless,
                output,
            } => {
                let delay = seconds(delay);
                RunPlan::Tree(TreeRun {
                    url,
                    crawl: CrawlConfig {
                        max_depth,
                        delay,
                        ..Default::default()
                    },
                    widget: WidgetConfig {
                        webdriver_url: webdriver,
                        headless,
                        row_selector: selector,
                        activation_xpath: xpath,
                        scroll_container,
                        stabilize: StabilizePolicy {
                            attempts: retries.max(1),
                            phase_timeout: Duration::from_secs(wait_timeout),
                            settle: delay,
                            ..Default::default()
                        },
                        ..Default::default()
                    },
                    output: output.into(),
                })
            }
        }
    }
}

// Negative or non-finite values mean "no pause"
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[command(flatten)] do?
//    - It splices the fields of another Args struct into this subcommand
//    - OutputArgs is written once and shows up under both subcommands
//
// 2. Why convert into RunPlan instead of passing Commands around?
//    - The rest of the program works with Duration and config structs,
//      not with raw seconds and flag names
//    - Tests can build configs directly without going through clap
//
// 3. What is ..Default::default()?
//    - Struct update syntax: fill every field not listed from Default
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(args: &[&str]) -> RunPlan {
        Cli::try_parse_from(args).unwrap().command.into()
    }

    #[test]
    fn test_listing_defaults() {
        let RunPlan::Listing(run) = plan(&["tree-crawler", "listing", "http://example.com/pub/"]) else {
            panic!("expected a listing run");
        };
        assert_eq!(run.url, "http://example.com/pub/");
        assert_eq!(run.crawl.max_depth, 5);
        assert_eq!(run.crawl.delay, Duration::from_millis(500));
        assert_eq!(run.listing.request_timeout, Duration::from_secs(30));
        assert_eq!(run.listing.link_selector, "a");
        assert_eq!(run.output.out_dir, PathBuf::from("output"));
        assert!(!run.output.matching_enabled());
    }

    #[test]
    fn test_listing_selector_flag() {
        let RunPlan::Listing(run) = plan(&[
            "tree-crawler",
            "listing",
            "http://example.com/pub/",
            "--selector",
            "td.name a",
        ]) else {
            panic!("expected a listing run");
        };
        assert_eq!(run.listing.link_selector, "td.name a");
    }

    #[test]
    fn test_tree_flags_map_to_widget_config() {
        let RunPlan::Tree(run) = plan(&[
            "tree-crawler",
            "tree",
            "--url",
            "https://example.com/list",
            "--selector",
            "table > tbody > tr",
            "--xpath",
            "//button",
            "--delay",
            "2",
            "--wait-timeout",
            "4",
            "--retries",
            "5",
            "--headless",
            "--search-words",
            "words.txt",
        ]) else {
            panic!("expected a tree run");
        };

        assert_eq!(run.widget.row_selector, "table > tbody > tr");
        assert_eq!(run.widget.activation_xpath.as_deref(), Some("//button"));
        assert!(run.widget.headless);
        assert_eq!(run.widget.scroll_container, DEFAULT_SCROLL_CONTAINER);
        assert_eq!(run.widget.stabilize.attempts, 5);
        assert_eq!(run.widget.stabilize.phase_timeout, Duration::from_secs(4));
        assert_eq!(run.widget.stabilize.settle, Duration::from_secs(2));
        assert_eq!(run.crawl.delay, Duration::from_secs(2));
        assert!(run.output.matching_enabled());
    }

    #[test]
    fn test_tree_requires_selector() {
        assert!(Cli::try_parse_from(["tree-crawler", "tree", "--url", "https://example.com"]).is_err());
    }

    #[test]
    fn test_negative_delay_means_no_pause() {
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(0.25), Duration::from_millis(250));
    }
}
