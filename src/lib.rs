//! ia-backup - mirror an Internet Archive account's uploads to local storage.
//!
//! The library discovers every identifier owned by an account through the
//! paginated search endpoint, resolves each identifier to its storage
//! endpoint, lists its files, presents a size and duration estimate, and on
//! confirmation streams every file to disk with progress reporting.
//!
//! # Example
//!
//! ```no_run
//! use ia_backup::{Account, BackupConfig, BackupOrchestrator, NoProgress, PathConfig};
//! use ia_backup::orchestrator::{CompletionNotifier, DecisionProvider};
//!
//! struct AlwaysYes;
//! impl DecisionProvider for AlwaysYes {
//!     fn confirm(&self, _prompt: &str) -> bool { true }
//! }
//!
//! struct Quiet;
//! impl CompletionNotifier for Quiet {
//!     fn notify(&self, _title: &str, _message: &str) {}
//! }
//!
//! # async fn example() -> ia_backup::Result<()> {
//! let account = Account::new("some-user");
//! let paths = PathConfig::for_account(account.username(), None);
//! let orchestrator =
//!     BackupOrchestrator::new(reqwest::Client::new(), BackupConfig::default(), paths);
//! let report = orchestrator.run(&account, &AlwaysYes, &Quiet, &NoProgress).await?;
//! println!("downloaded {} file(s)", report.stats.files_downloaded);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod estimate;
pub mod format;
pub mod fs;
pub mod listing;
pub mod orchestrator;
pub mod resolve;
pub mod stats;
pub mod transfer;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use catalog::{Account, CatalogClient, Enumeration};
pub use config::{BackupConfig, PathConfig};
pub use error::{Error, Result};
pub use estimate::SizeEstimate;
pub use format::format_bytes;
pub use fs::{FileSystem, TokioFileSystem};
pub use listing::{FileEntry, FileLister, FileSet, parse_listing};
pub use orchestrator::{BackupOrchestrator, RunOutcome, RunReport};
pub use resolve::{Endpoint, EndpointResolver};
pub use stats::{SessionStats, SessionStatsBuilder};
pub use transfer::{NoProgress, TransferEngine, TransferOutcome, TransferProgress};
