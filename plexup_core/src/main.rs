/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Plex-Up. Checks the local Plex Media Server
    for a pending update, downloads the package, and installs
    it with the host package manager.

  Security / Safety Notes:
    Installs via sudo + dpkg by default. The server token is
    read from CLI, environment, or config and never logged.

  Dependencies:
    clap for CLI parsing, tokio for the async runtime.

  Operational Scope:
    Invoked periodically by cron or a systemd timer; one update
    attempt per invocation.

  Revision History:
    2025-11-02 COD  Authored Plex-Up runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use plexup_core::config::{Overrides, PlexupConfig};
use plexup_core::error::Result;
use plexup_core::installer::CommandInstaller;
use plexup_core::logger::{LogLevel, Logger};
use plexup_core::orchestrator::{Orchestrator, RunOutcome};

/// Command-line arguments for Plex-Up.
#[derive(Debug, Parser)]
#[command(
    name = "plexup",
    version,
    author = "Synavera Systems",
    about = "Update a local Plex Media Server"
)]
struct Cli {
    /// Log file destination (default: ./plexup.log).
    #[arg(short = 'l', long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Logging level. One of: DEBUG, INFO, WARN, ERROR.
    #[arg(short = 'L', long = "log-level", value_name = "LEVEL")]
    log_level: Option<LogLevel>,
    /// Download folder for the update package (default: /tmp).
    #[arg(short = 'd', long, value_name = "DIR")]
    directory: Option<PathBuf>,
    /// Do not apply the update.
    #[arg(short = 'r', long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// With --dry-run, skip the download as well.
    #[arg(long, action = ArgAction::SetTrue, requires = "dry_run")]
    no_fetch: bool,
    /// Output filename to use instead of the downloaded name.
    #[arg(short = 'f', long, value_name = "NAME")]
    filename: Option<String>,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Updater status endpoint.
    #[arg(long, value_name = "URL")]
    status_url: Option<String>,
    /// Plex authentication token.
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    token: Option<String>,
    /// Mirror every log entry to stderr.
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            status_url: self.status_url.clone(),
            token: self.token.clone(),
            directory: self.directory.clone(),
            filename: self.filename.clone(),
            log_file: self.log_file.clone(),
            log_level: self.log_level,
            dry_run: self.dry_run,
            no_fetch: self.no_fetch,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err.console_summary());
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = PlexupConfig::load_from_optional_path(cli.config.as_deref())?;
    let settings = config.resolve(&cli.overrides())?;

    let logger = Logger::new(
        Some(settings.log_file.clone()),
        settings.log_level,
        cli.verbose,
    )?;
    if let Some(path) = logger.path() {
        logger.debug("INIT", format!("Plex-Up starting; logging to {}", path.display()));
    }

    let installer = CommandInstaller::from_config(&settings.install);
    let orchestrator = Orchestrator::new(&settings, installer, &logger)?;
    let outcome = orchestrator.run().await?;

    match &outcome {
        RunOutcome::Idle => println!("→ Plex Media Server is up to date."),
        RunOutcome::DryRun { fetched: Some(fetched) } => println!(
            "→ Dry run: update downloaded to {} and not installed.",
            fetched.local_path.display()
        ),
        RunOutcome::DryRun { fetched: None } => {
            println!("→ Dry run: update available and not downloaded.")
        }
        RunOutcome::Done { fetched, .. } => {
            println!("→ Installed {}. Success!", fetched.filename)
        }
    }

    Ok(outcome.exit_code())
}
