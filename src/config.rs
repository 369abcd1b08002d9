//! Configuration types for backup runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default assumed transfer speed for the duration estimate, in bytes/sec
/// (2.75 MiB/s, matching what archive.org sustains in practice).
pub const DEFAULT_ESTIMATE_SPEED: f64 = 2.75 * 1024.0 * 1024.0;

/// Configuration for a backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Number of identifiers processed concurrently.
    pub concurrent_identifiers: usize,
    /// Number of concurrent file downloads within one identifier.
    pub concurrent_files: usize,
    /// Results requested per catalog page.
    pub hits_per_page: u32,
    /// Assumed transfer speed (bytes/sec) for the duration estimate.
    pub estimate_speed: f64,
    /// Whether to remove `.part` files when a download fails.
    pub cleanup_on_error: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            concurrent_identifiers: 4,
            concurrent_files: 3,
            hits_per_page: 999,
            estimate_speed: DEFAULT_ESTIMATE_SPEED,
            cleanup_on_error: true,
        }
    }
}

impl BackupConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of identifiers processed concurrently.
    #[must_use]
    pub const fn with_concurrent_identifiers(mut self, n: usize) -> Self {
        self.concurrent_identifiers = n;
        self
    }

    /// Sets the number of concurrent file downloads per identifier.
    #[must_use]
    pub const fn with_concurrent_files(mut self, n: usize) -> Self {
        self.concurrent_files = n;
        self
    }

    /// Sets the assumed transfer speed for the duration estimate.
    #[must_use]
    pub const fn with_estimate_speed(mut self, bytes_per_sec: f64) -> Self {
        self.estimate_speed = bytes_per_sec;
        self
    }

    /// Sets whether `.part` files are removed on download failure.
    #[must_use]
    pub const fn with_cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }
}

/// Destination path configuration.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Root directory the account's identifiers are mirrored under.
    pub destination_root: PathBuf,
}

impl PathConfig {
    /// Destination root for an account: `{cwd}/{username}` unless overridden.
    #[must_use]
    pub fn for_account(username: &str, override_root: Option<PathBuf>) -> Self {
        let destination_root = override_root.unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(username)
        });
        Self { destination_root }
    }

    /// Directory one identifier's files land in.
    #[must_use]
    pub fn identifier_dir(&self, identifier: &str) -> PathBuf {
        self.destination_root.join(identifier)
    }
}
