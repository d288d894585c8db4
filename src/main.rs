// src/main.rs
// =============================================================================
// This is the entry point of the crawler.
//
// What happens here:
// 1. Parse command-line arguments and validate the root location
// 2. Set up logging, the item log, and (optionally) the keyword matcher
// 3. Build the view provider + navigator for the chosen mode and run the
//    traversal engine, racing it against Ctrl-C
// 4. Write the match tables, print the report
// 5. Exit with proper code (0 = clean run, 1 = errors were counted, 2 = fatal)
// =============================================================================

mod cli;
mod config;
mod decode;
mod engine;
mod error;
mod logging;
mod matcher;
mod model;
mod sink;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use cli::{Cli, ListingRun, RunPlan, TreeRun};
use config::CrawlConfig;
use engine::TraversalEngine;
use matcher::{Classifier, KeywordMatcher};
use model::{Report, Statistics, TraversalContext};
use sink::ItemLog;
use view::{LinkNavigator, LinkView, WidgetSession};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let plan = RunPlan::from(cli.command);
    let output = plan.output().clone();

    // Nothing is created on disk for a root that can never be crawled
    let root = match &plan {
        RunPlan::Listing(run) => error::parse_root(&run.url)?,
        RunPlan::Tree(run) => error::parse_root(&run.url)?,
    };

    logging::init(&output.run_log()).context("Failed to set up logging")?;
    let items = ItemLog::open(&output.items_log()).context("Failed to open the item log")?;

    let matcher = KeywordMatcher::from_config(&output).context("Failed to load word lists")?;
    let words = matcher
        .as_ref()
        .map(KeywordMatcher::configured_words)
        .unwrap_or_default();
    let classifier = matcher.map(|m| Box::new(m) as Box<dyn Classifier>);

    let report = match plan {
        RunPlan::Listing(run) => crawl_listing(run, root, items, classifier).await?,
        RunPlan::Tree(run) => crawl_tree(run, root, items, classifier).await?,
    };

    if output.matching_enabled() {
        sink::write_export(
            &report.matches,
            &words,
            &output.results_csv(),
            &output.counts_csv(),
        )
        .context("Failed to write match tables")?;
    }

    log_completion(&report);
    print_report(&report, output.json)?;

    Ok(exit_code(&report.stats))
}

async fn crawl_listing(
    run: ListingRun,
    root: Url,
    items: ItemLog,
    classifier: Option<Box<dyn Classifier>>,
) -> Result<Report> {
    log_start(&root, "listing", &run.crawl, Some(("Link", run.listing.link_selector.as_str())));

    let view = LinkView::new(&run.listing).context("Failed to set up the listing view")?;
    let mut engine =
        TraversalEngine::new(view, LinkNavigator, run.crawl, Box::new(items)).with_classifier(classifier);

    Ok(engine.run(TraversalContext::root(Some(root)), interrupt()).await)
}

async fn crawl_tree(
    run: TreeRun,
    root: Url,
    items: ItemLog,
    classifier: Option<Box<dyn Classifier>>,
) -> Result<Report> {
    log_start(&root, "tree", &run.crawl, Some(("Row", run.widget.row_selector.as_str())));

    let session = WidgetSession::connect(&run.widget).await?;
    if let Err(e) = session.open(&root).await {
        session.close().await;
        return Err(e.into());
    }

    let mut engine = TraversalEngine::new(
        session.view(),
        session.navigator(),
        run.crawl,
        Box::new(items),
    )
    .with_classifier(classifier);

    // The widget keeps its own location, so the root context carries none
    let report = engine.run(TraversalContext::root(None), interrupt()).await;

    session.close().await;
    Ok(report)
}

// Resolves on Ctrl-C. If the handler cannot be installed the run simply
// cannot be interrupted.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

fn log_start(root: &Url, mode: &str, crawl: &CrawlConfig, selector: Option<(&str, &str)>) {
    logging::rule();
    info!("Starting crawl of {}", root);
    info!("Mode: {}", mode);
    info!("Max depth: {}", crawl.max_depth);
    info!("Delay: {:.1}s", crawl.delay.as_secs_f64());
    if let Some((kind, selector)) = selector {
        info!("{} selector: {}", kind, selector);
    }
    logging::rule();
}

fn log_completion(report: &Report) {
    logging::rule();
    if report.interrupted {
        info!("Crawl interrupted");
    } else {
        info!("Crawl complete");
    }
    info!("Duration: {:.2}s", report.duration_secs);
    info!("URLs visited: {}", report.visited);
    info!("Directories found: {}", report.stats.directories);
    info!("Files found: {}", report.stats.files);
    info!("Warnings: {}", report.stats.warnings);
    info!("Errors: {}", report.stats.errors);
    info!("Matches: {}", report.stats.matches);
    logging::rule();
}

// Prints the report either as a table or JSON
fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &Report) {
    if !report.matches.is_empty() {
        println!("{:<20} {:<50} {:<40}", "KEYWORD", "DIRECTORY", "FILE");
        println!("{}", "=".repeat(110));

        for record in &report.matches {
            println!(
                "{:<20} {:<50} {:<40}",
                record.keyword,
                truncate(&record.directory, 50),
                record.file_name
            );
        }
        println!();
    }

    let stats = &report.stats;
    println!("📊 Summary:");
    println!("   📁 Directories: {}", stats.directories);
    println!("   📄 Files: {}", stats.files);
    println!("   🔎 Matches: {}", stats.matches);
    println!("   ⚠️  Warnings: {}", stats.warnings);
    println!("   ❌ Errors: {}", stats.errors);
    println!("   🌐 Visited: {}", report.visited);
    println!("   ⏱️  Duration: {:.2}s", report.duration_secs);
    if report.interrupted {
        println!("   ⏹️  Interrupted before completion");
    }
}

// Keeps the last `width` characters, prefixed with "..."
fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (width - 3)).collect();
    format!("...{}", tail)
}

fn exit_code(stats: &Statistics) -> i32 {
    if stats.errors > 0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_follows_error_count() {
        assert_eq!(exit_code(&Statistics::default()), 0);
        assert_eq!(
            exit_code(&Statistics {
                warnings: 4,
                ..Default::default()
            }),
            0
        );
        assert_eq!(
            exit_code(&Statistics {
                errors: 1,
                ..Default::default()
            }),
            1
        );
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "...hijkl");
    }

    #[test]
    fn test_report_json_flattens_statistics() {
        let report = Report {
            stats: Statistics {
                directories: 2,
                files: 1,
                ..Default::default()
            },
            visited: 1,
            duration_secs: 0.5,
            interrupted: false,
            matches: Vec::new(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["directories"], 2);
        assert_eq!(value["files"], 1);
        assert_eq!(value["interrupted"], false);
    }
}
