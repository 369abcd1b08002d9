//! Interactive CLI frontend: banner, prompts and progress rendering.

mod progress;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use console::style;

use crate::catalog::Account;
use crate::config::{BackupConfig, PathConfig};
use crate::orchestrator::{
    BackupOrchestrator, CompletionNotifier, DecisionProvider, RunOutcome,
};

pub use progress::{CliProgress, print_summary};

/// Exit code for bad invocations (missing or empty username), distinct from
/// the run outcomes' 0/1/2.
pub const EXIT_USAGE: i32 = 64;

/// Options parsed from the command line.
#[derive(Debug, Default)]
pub struct CliOptions {
    /// Account to back up; prompted for when absent.
    pub username: Option<String>,
    /// Skip the confirmation prompt.
    pub yes: bool,
    /// Destination root override.
    pub output: Option<PathBuf>,
    /// Identifier-level concurrency override.
    pub concurrency: Option<usize>,
}

/// Builds a configured HTTP client shared by all backup requests.
fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .tcp_keepalive(Duration::from_secs(30))
        .build()
}

fn print_intro() {
    println!("{}", style("Internet Archive Account Backup").bold());
    println!();
    println!("This tool backs up the files associated with an Internet");
    println!("Archive account. Provide the username and your files will be");
    println!("organized into one folder per identifier, with an estimate of");
    println!("how long the backup will take.");
    println!();
}

fn prompt_line(prompt: &str) -> std::io::Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Confirmation via stdin; `--yes` bypasses the prompt.
struct StdinDecision {
    auto_yes: bool,
}

impl DecisionProvider for StdinDecision {
    fn confirm(&self, prompt: &str) -> bool {
        if self.auto_yes {
            return true;
        }
        println!("\n{prompt}");
        matches!(
            prompt_line("> ").as_deref(),
            Ok("yes") | Ok("y") | Ok("Yes") | Ok("YES")
        )
    }
}

/// Prints the completion notification to the terminal.
struct ConsoleNotifier;

impl CompletionNotifier for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str) {
        println!("\n{}: {}", style(title).bold().green(), message);
    }
}

/// Runs one interactive backup and returns the process exit code.
///
/// # Errors
///
/// Returns an error for local I/O failures or when the HTTP client cannot
/// be built; remote failures are handled inside the run.
pub async fn run(options: CliOptions) -> crate::Result<i32> {
    print_intro();

    let username = match options.username {
        Some(username) => username,
        None => prompt_line("Enter the Internet Archive username: ")?,
    };
    let account = Account::new(&username);
    if account.username().is_empty() {
        eprintln!("No username given.");
        return Ok(EXIT_USAGE);
    }

    let mut config = BackupConfig::default();
    if let Some(n) = options.concurrency {
        config = config.with_concurrent_identifiers(n);
    }
    let paths = PathConfig::for_account(account.username(), options.output);

    let http = build_http_client()?;
    let orchestrator = BackupOrchestrator::new(http, config, paths);

    let decision = StdinDecision {
        auto_yes: options.yes,
    };
    let progress = CliProgress::new();

    let report = orchestrator
        .run(&account, &decision, &ConsoleNotifier, &progress)
        .await?;

    if report.outcome == RunOutcome::Completed {
        print_summary(&report.stats);
    }
    Ok(report.outcome.exit_code())
}
