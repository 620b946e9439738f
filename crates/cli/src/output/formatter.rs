//! Renders copy progress and results
//!
//! Per-file lines and the final summary go to stdout, warnings and errors to
//! stderr. In JSON mode only the final document reaches stdout.

use std::path::Path;

use serde::Serialize;
use skycp_core::{Direction, SkippedItem, TransferSummary, TransferredItem};

use super::OutputConfig;

const GREEN: &str = "32";
const RED: &str = "31";
const YELLOW: &str = "33";

/// Prints copy output in the mode chosen for this invocation
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Human lines are dropped in quiet and JSON modes
    fn human(&self) -> bool {
        !self.config.quiet && !self.config.json
    }

    /// `symbol` wrapped in an ANSI color when colors are on
    fn mark(&self, color: &str, symbol: &str) -> String {
        if self.colors_enabled() {
            format!("\x1b[{color}m{symbol}\x1b[0m")
        } else {
            symbol.to_string()
        }
    }

    /// Print an error; shown even in quiet mode
    pub fn error(&self, message: &str) {
        if self.config.json {
            let body = serde_json::json!({ "error": message });
            match serde_json::to_string_pretty(&body) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{message}"),
            }
        } else {
            eprintln!("{} {message}", self.mark(RED, "✗"));
        }
    }

    pub fn warning(&self, message: &str) {
        if self.human() {
            eprintln!("{} {message}", self.mark(YELLOW, "⚠"));
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    pub fn println(&self, message: &str) {
        if self.human() {
            println!("{message}");
        }
    }

    /// Dry-run line for one planned copy
    pub fn planned(&self, direction: Direction, local: &Path, remote: &str) {
        self.println(&format!("Would copy: {}", arrow(direction, local, remote, " -> ")));
    }

    pub fn file_started(&self, direction: Direction, local: &Path, remote: &str) {
        self.println(&format!(" ...{}", arrow(direction, local, remote, " to ")));
    }

    pub fn file_completed(&self, direction: Direction, item: &TransferredItem) {
        self.println(&completed_line(direction, item));
    }

    pub fn file_skipped(&self, item: &SkippedItem) {
        self.warning(&skipped_line(item));
    }

    /// Closing lines of a human-mode run
    pub fn summary(&self, summary: &TransferSummary) {
        if !self.human() {
            return;
        }
        println!("{} {}", self.mark(GREEN, "✓"), summary_line(summary));
        if !summary.skipped.is_empty() {
            self.warning(&format!(
                "{} file(s) skipped; see the messages above",
                summary.skipped.len()
            ));
        }
    }
}

/// Byte count in binary units, e.g. `2 KiB`
pub fn human_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// `local` and `remote` in transfer order
fn arrow(direction: Direction, local: &Path, remote: &str, sep: &str) -> String {
    let local = local.display();
    match direction {
        Direction::Upload => format!("{local}{sep}{remote}"),
        Direction::Download => format!("{remote}{sep}{local}"),
    }
}

fn completed_line(direction: Direction, item: &TransferredItem) -> String {
    let size = human_size(item.size_bytes);
    match (direction, &item.location, &item.etag) {
        (Direction::Upload, Some(location), Some(etag)) => {
            format!("    {location} ({size}, etag {etag})")
        }
        (Direction::Upload, Some(location), None) => format!("    {location} ({size})"),
        (Direction::Upload, None, _) => format!("    uploaded {size}"),
        (Direction::Download, ..) => format!("    downloaded {size}"),
    }
}

fn skipped_line(item: &SkippedItem) -> String {
    format!("Skipped {}: {}", item.local.display(), item.reason)
}

fn summary_line(summary: &TransferSummary) -> String {
    let total = human_size(summary.total_bytes);
    match summary.direction {
        Direction::Upload => format!(
            "Uploaded {} file(s) to {} ({total})",
            summary.transferred.len(),
            summary.remote
        ),
        Direction::Download => format!("Downloaded {} ({total})", summary.remote),
    }
}
