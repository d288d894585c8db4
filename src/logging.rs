// src/logging.rs
// =============================================================================
// Sets up the running log stream.
//
// Two outputs share one filter:
// - stderr, human-readable, so stdout stays clean for --json
// - <out-dir>/crawler.log, the same events without ANSI colors
//
// The level defaults to `info` and can be overridden with RUST_LOG.
// =============================================================================

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::CrawlError;

pub fn init(run_log: &Path) -> Result<(), CrawlError> {
    let output_error = |source| CrawlError::Output {
        path: run_log.to_path_buf(),
        source,
    };

    if let Some(parent) = run_log.parent() {
        fs::create_dir_all(parent).map_err(output_error)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(run_log)
        .map_err(output_error)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();

    Ok(())
}

/// Logs a `=` rule, as used around the start and completion banners.
pub fn rule() {
    tracing::info!("{}", "=".repeat(60));
}
