//! Session statistics for the final summary.

use std::time::{Duration, Instant};

/// Aggregate counters for one backup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Identifiers whose files were transferred (fully or partially).
    pub identifiers_processed: usize,
    /// Identifiers skipped because resolution or listing failed.
    pub identifiers_skipped: usize,
    /// Files successfully downloaded.
    pub files_downloaded: usize,
    /// Files skipped or failed (access denied, bad status, mid-stream error).
    pub files_failed: usize,
    /// Total bytes written to disk.
    pub bytes_downloaded: u64,
    /// Wall-clock time of the transfer phase.
    pub elapsed: Duration,
}

/// Builder that accumulates counters as the run progresses.
pub struct SessionStatsBuilder {
    stats: SessionStats,
    started: Instant,
}

impl Default for SessionStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStatsBuilder {
    /// Starts a new accumulation, capturing the start time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stats: SessionStats::default(),
            started: Instant::now(),
        }
    }

    /// Records successfully downloaded files and their byte total.
    pub fn add_downloads(&mut self, count: usize, bytes: u64) {
        self.stats.files_downloaded += count;
        self.stats.bytes_downloaded += bytes;
    }

    /// Records skipped or failed files.
    pub fn add_failures(&mut self, count: usize) {
        self.stats.files_failed += count;
    }

    /// Records one identifier that was processed.
    pub fn add_identifier(&mut self) {
        self.stats.identifiers_processed += 1;
    }

    /// Records one identifier skipped before transfer.
    pub fn add_skipped_identifier(&mut self) {
        self.stats.identifiers_skipped += 1;
    }

    /// Finalizes the stats, stamping the elapsed time.
    #[must_use]
    pub fn build(mut self) -> SessionStats {
        self.stats.elapsed = self.started.elapsed();
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_counters() {
        let mut builder = SessionStatsBuilder::new();
        builder.add_identifier();
        builder.add_identifier();
        builder.add_skipped_identifier();
        builder.add_downloads(2, 750);
        builder.add_failures(1);

        let stats = builder.build();
        assert_eq!(stats.identifiers_processed, 2);
        assert_eq!(stats.identifiers_skipped, 1);
        assert_eq!(stats.files_downloaded, 2);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.bytes_downloaded, 750);
    }
}
