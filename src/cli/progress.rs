//! Progress bars and summary reporting for CLI backups.

use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::format::format_bytes;
use crate::stats::SessionStats;
use crate::transfer::TransferProgress;

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates a progress bar for a single file download.
fn make_progress_bar(size: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} - {msg}",
        )
        .expect("progress template is valid")
        .progress_chars("━━╌"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Terminal progress rendering backed by `indicatif`, one bar per in-flight
/// file.
pub struct CliProgress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CliProgress {
    /// Creates an empty progress renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }
}

impl TransferProgress for CliProgress {
    fn on_identifier_estimated(&self, identifier: &str, file_count: usize, total_bytes: u64) {
        let _ = self.multi.println(format!(
            "Total size for Identifier '{identifier}': {} ({file_count} file(s))",
            format_bytes(total_bytes)
        ));
    }

    fn on_file_start(&self, label: &str, total: u64) {
        let bar = self.multi.add(make_progress_bar(total, label));
        self.bars.lock().unwrap().insert(label.to_string(), bar);
    }

    fn on_chunk(&self, label: &str, bytes_done: u64, _bytes_total: u64) {
        if let Some(bar) = self.bars.lock().unwrap().get(label) {
            bar.set_position(bytes_done);
        }
    }

    fn on_file_complete(&self, label: &str, bytes: u64) {
        if let Some(bar) = self.bars.lock().unwrap().remove(label) {
            bar.finish_and_clear();
        }
        let _ = self
            .multi
            .println(format!("  {} - {}", label, format_bytes(bytes)));
    }

    fn on_error(&self, label: &str, error: &str) {
        if let Some(bar) = self.bars.lock().unwrap().remove(label) {
            bar.abandon();
        }
        let _ = self.multi.println(format!("  {label}: {error}"));
    }
}

/// Prints a summary of the run.
pub fn print_summary(stats: &SessionStats) {
    println!("\n{SEPARATOR}");
    println!("Backup Summary");
    println!("{SEPARATOR}");
    println!("  Identifiers backed up: {}", stats.identifiers_processed);
    if stats.identifiers_skipped > 0 {
        println!("  Identifiers skipped:   {}", stats.identifiers_skipped);
    }
    println!("  Files downloaded:      {}", stats.files_downloaded);
    if stats.files_failed > 0 {
        println!("  Files failed:          {}", stats.files_failed);
    }
    println!(
        "  Total size:            {}",
        format_bytes(stats.bytes_downloaded)
    );
    println!("{SEPARATOR}");
}
