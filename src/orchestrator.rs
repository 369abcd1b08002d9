//! Top-level backup driver.
//!
//! Drives the run through its phases: collect identifiers from the catalog,
//! resolve and list each one to build a size estimate, ask for confirmation,
//! then transfer every listed file. Resolution and listing results are cached
//! per identifier for the lifetime of the run, so the transfer phase never
//! re-fetches what the estimate phase already learned.

use futures::{StreamExt, stream};

use crate::catalog::{Account, CatalogClient};
use crate::config::{BackupConfig, PathConfig};
use crate::error::{Error, Result};
use crate::estimate::SizeEstimate;
use crate::format::format_bytes;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::listing::{FileLister, FileSet};
use crate::resolve::{Endpoint, EndpointResolver};
use crate::stats::{SessionStats, SessionStatsBuilder};
use crate::transfer::{TransferEngine, TransferOutcome, TransferProgress};

/// Yes/no decision point presented before the transfer phase.
pub trait DecisionProvider: Send + Sync {
    /// Returns true when the user accepts the prompt.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Receives the final two-outcome notification.
pub trait CompletionNotifier: Send + Sync {
    /// Delivers a plain-text notification.
    fn notify(&self, title: &str, message: &str);
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every identifier was processed.
    Completed,
    /// The user declined the confirmation prompt.
    Cancelled,
    /// The catalog was unreachable before anything was collected.
    EnumerationFailed,
}

impl RunOutcome {
    /// Process exit code for scriptability.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::EnumerationFailed => 1,
            Self::Cancelled => 2,
        }
    }
}

/// Final report for one run.
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// The estimate presented at the confirmation prompt, when one was built.
    pub estimate: Option<SizeEstimate>,
    /// Transfer-phase counters.
    pub stats: SessionStats,
}

/// Per-identifier result of the estimate phase, cached for the transfer
/// phase. `None` means resolution or listing failed and the identifier is
/// skipped for the rest of the run.
struct IdentifierPlan {
    identifier: String,
    resolved: Option<(Endpoint, FileSet)>,
}

struct IdentifierResult {
    skipped: bool,
    files_downloaded: usize,
    files_failed: usize,
    bytes_downloaded: u64,
}

/// Top-level driver for one account's backup.
pub struct BackupOrchestrator<F: FileSystem = TokioFileSystem> {
    catalog: CatalogClient,
    resolver: EndpointResolver,
    lister: FileLister,
    engine: TransferEngine<F>,
    config: BackupConfig,
    paths: PathConfig,
}

impl BackupOrchestrator<TokioFileSystem> {
    /// Creates an orchestrator wired to the production endpoints, sharing
    /// one HTTP client across every component.
    #[must_use]
    pub fn new(http: reqwest::Client, config: BackupConfig, paths: PathConfig) -> Self {
        let catalog = CatalogClient::new(http.clone(), config.hits_per_page);
        let resolver = EndpointResolver::new(http.clone());
        let lister = FileLister::new(http.clone());
        let engine = TransferEngine::new(http, config.cleanup_on_error);
        Self {
            catalog,
            resolver,
            lister,
            engine,
            config,
            paths,
        }
    }
}

impl<F: FileSystem> BackupOrchestrator<F> {
    /// Creates an orchestrator from pre-built components (used in tests to
    /// point each client at a mock server).
    #[must_use]
    pub fn with_components(
        catalog: CatalogClient,
        resolver: EndpointResolver,
        lister: FileLister,
        engine: TransferEngine<F>,
        config: BackupConfig,
        paths: PathConfig,
    ) -> Self {
        Self {
            catalog,
            resolver,
            lister,
            engine,
            config,
            paths,
        }
    }

    /// Runs the full backup state machine for one account.
    ///
    /// # Errors
    ///
    /// Returns an error only for local I/O failures; every remote failure
    /// is classified, logged and skipped.
    pub async fn run(
        &self,
        account: &Account,
        decision: &dyn DecisionProvider,
        notifier: &dyn CompletionNotifier,
        progress: &dyn TransferProgress,
    ) -> Result<RunReport> {
        // Collecting
        let enumeration = self.catalog.enumerate(account).await;
        if enumeration.is_fatal() {
            if let Some(e) = &enumeration.error {
                log::error!(
                    "could not reach the catalog for '{}': {e}",
                    account.username()
                );
            }
            return Ok(RunReport {
                outcome: RunOutcome::EnumerationFailed,
                estimate: None,
                stats: SessionStats::default(),
            });
        }
        let identifiers = enumeration.identifiers;
        log::info!(
            "collected {} identifier(s) for '{}'",
            identifiers.len(),
            account.username()
        );

        // Estimating: resolve + list every identifier once, caching results.
        let plans: Vec<IdentifierPlan> = stream::iter(identifiers)
            .map(|identifier| self.estimate_identifier(identifier, progress))
            .buffered(self.config.concurrent_identifiers.max(1))
            .collect()
            .await;

        let total_bytes: u64 = plans
            .iter()
            .filter_map(|p| p.resolved.as_ref().map(|(_, set)| set.total_size))
            .sum();
        let estimate = SizeEstimate::for_bytes(total_bytes, self.config.estimate_speed);

        // AwaitingConfirmation
        let prompt = format!(
            "Total size for '{}': {}\nEstimated time to complete the backup: {}\n\nAre you ready to backup this user? (yes/no)",
            account.username(),
            format_bytes(total_bytes),
            estimate
        );
        if !decision.confirm(&prompt) {
            notifier.notify("Backup Cancelled", "The backup process has been cancelled.");
            return Ok(RunReport {
                outcome: RunOutcome::Cancelled,
                estimate: Some(estimate),
                stats: SessionStats::default(),
            });
        }

        // Transferring: bounded identifier pool, cached endpoints reused.
        let mut builder = SessionStatsBuilder::new();
        let results: Vec<Result<IdentifierResult>> = stream::iter(plans.iter())
            .map(|plan| self.transfer_identifier(plan, progress))
            .buffered(self.config.concurrent_identifiers.max(1))
            .collect()
            .await;

        for result in results {
            let result = result?;
            if result.skipped {
                builder.add_skipped_identifier();
                continue;
            }
            builder.add_identifier();
            builder.add_downloads(result.files_downloaded, result.bytes_downloaded);
            builder.add_failures(result.files_failed);
        }
        let stats = builder.build();

        // Done
        notifier.notify(
            "Backup Complete",
            "All identifiers have been successfully backed up!",
        );
        Ok(RunReport {
            outcome: RunOutcome::Completed,
            estimate: Some(estimate),
            stats,
        })
    }

    /// Resolves and lists one identifier for the estimate phase. Failures
    /// contribute zero bytes and mark the identifier as skipped.
    async fn estimate_identifier(
        &self,
        identifier: String,
        progress: &dyn TransferProgress,
    ) -> IdentifierPlan {
        let endpoint = match self.resolver.resolve(&identifier).await {
            Ok(endpoint) => endpoint,
            Err(e @ Error::IdentifierNotFound { .. }) => {
                log::warn!("identifier '{identifier}' has no backing bucket, skipping");
                progress.on_error(&identifier, &e.to_string());
                return IdentifierPlan {
                    identifier,
                    resolved: None,
                };
            }
            Err(e) => {
                log::warn!("failed to resolve '{identifier}': {e}");
                progress.on_error(&identifier, &e.to_string());
                return IdentifierPlan {
                    identifier,
                    resolved: None,
                };
            }
        };

        match self.lister.list(&endpoint).await {
            Ok(files) => {
                log::info!(
                    "identifier '{identifier}': {} file(s), {}",
                    files.len(),
                    format_bytes(files.total_size)
                );
                progress.on_identifier_estimated(&identifier, files.len(), files.total_size);
                IdentifierPlan {
                    identifier,
                    resolved: Some((endpoint, files)),
                }
            }
            Err(e) => {
                log::warn!("failed to list '{identifier}': {e}");
                progress.on_error(&identifier, &e.to_string());
                IdentifierPlan {
                    identifier,
                    resolved: None,
                }
            }
        }
    }

    /// Transfers every file of one identifier, in listing order, with a
    /// bounded file-level pool.
    async fn transfer_identifier(
        &self,
        plan: &IdentifierPlan,
        progress: &dyn TransferProgress,
    ) -> Result<IdentifierResult> {
        let Some((endpoint, files)) = &plan.resolved else {
            log::info!("skipping '{}' (not resolved)", plan.identifier);
            return Ok(IdentifierResult {
                skipped: true,
                files_downloaded: 0,
                files_failed: 0,
                bytes_downloaded: 0,
            });
        };

        log::info!("starting backup for identifier '{}'", plan.identifier);
        let dest_dir = self.paths.identifier_dir(&plan.identifier);

        let outcomes: Vec<Result<TransferOutcome>> = stream::iter(files.entries.iter())
            .map(|entry| self.engine.transfer(endpoint, entry, &dest_dir, progress))
            .buffered(self.config.concurrent_files.max(1))
            .collect()
            .await;

        let mut result = IdentifierResult {
            skipped: false,
            files_downloaded: 0,
            files_failed: 0,
            bytes_downloaded: 0,
        };
        for (entry, outcome) in files.entries.iter().zip(outcomes) {
            match outcome? {
                TransferOutcome::Downloaded(bytes) => {
                    log::info!("downloaded '{}' ({})", entry.key, format_bytes(bytes));
                    result.files_downloaded += 1;
                    result.bytes_downloaded += bytes;
                }
                TransferOutcome::AccessDenied => {
                    log::warn!("access denied to '{}', skipping", entry.key);
                    result.files_failed += 1;
                }
                TransferOutcome::Failed(msg) => {
                    log::warn!("failed to download '{}': {msg}", entry.key);
                    result.files_failed += 1;
                }
            }
        }
        Ok(result)
    }
}
