// src/sink/mod.rs
// =============================================================================
// Where discovered nodes and match results end up.
//
// - item log: one timestamped, line-flushed record per discovered node
// - export: two CSV tables (matched files, per-keyword counts)
//
// The engine writes through the EventSink trait so tests can capture the
// event stream in memory.
// =============================================================================

mod export;

pub use export::write_export;

use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;

use chrono::Local;

use crate::error::CrawlError;
use crate::model::Node;

/// Receives every discovered node, in discovery order.
pub trait EventSink: Send {
    fn record(&mut self, node: &Node) -> io::Result<()>;
}

/// Append-only `items.log` writer.
pub struct ItemLog {
    writer: LineWriter<File>,
}

impl ItemLog {
    pub fn open(path: &Path) -> Result<Self, CrawlError> {
        let output_error = |source| CrawlError::Output {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(output_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(output_error)?;

        Ok(Self {
            writer: LineWriter::new(file),
        })
    }
}

impl EventSink for ItemLog {
    fn record(&mut self, node: &Node) -> io::Result<()> {
        writeln!(
            self.writer,
            "{} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            format_record(node)
        )
    }
}

/// `DIRECTORY: <location> - Name: <name>` without the timestamp.
pub fn format_record(node: &Node) -> String {
    format!(
        "{}: {} - Name: {}",
        node.kind.label(),
        node.location_display(),
        node.name
    )
}
