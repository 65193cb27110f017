/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::orchestrator
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Drive one update run: check the server, download the
    advertised package, and install it, stopping at the first
    terminal state.

  Security / Safety Notes:
    Installation is the only privileged step and is never
    reached on dry runs or after a failed download.

  Dependencies:
    status, fetcher, installer, and logger modules.

  Operational Scope:
    Invoked once per process by the binary entry point; the
    external scheduler provides any repetition.

  Revision History:
    2025-11-02 COD  Authored update state machine.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Single linear pass with explicit terminal states
    - Every failure logged with its category and stage
    - Settings read-only; resolved values passed forward
============================================================*/

use std::fmt;
use std::process::ExitCode;

use crate::config::RunSettings;
use crate::error::{Result, UpdateError};
use crate::fetcher::PackageFetcher;
use crate::installer::PackageInstaller;
use crate::logger::Logger;
use crate::status::StatusClient;
use crate::update_info::{ApplyResult, FetchRequest, FetchResult, UpdateStatus};

/// Non-terminal stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checking,
    Downloading,
    Installing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Checking => "Checking",
            Stage::Downloading => "Downloading",
            Stage::Installing => "Installing",
        })
    }
}

/// Successful terminal states of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The server reported no pending update.
    Idle,
    /// An update was found but installation was skipped.
    DryRun { fetched: Option<FetchResult> },
    /// The update was downloaded and installed.
    Done {
        fetched: FetchResult,
        applied: ApplyResult,
    },
}

impl RunOutcome {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::SUCCESS
    }
}

/// Sequences the status check, download, and install for one run.
pub struct Orchestrator<'a, I> {
    settings: &'a RunSettings,
    status: StatusClient,
    fetcher: PackageFetcher,
    installer: I,
    logger: &'a Logger,
}

impl<'a, I: PackageInstaller> Orchestrator<'a, I> {
    pub fn new(settings: &'a RunSettings, installer: I, logger: &'a Logger) -> Result<Self> {
        Ok(Self {
            settings,
            status: StatusClient::new(settings)?,
            fetcher: PackageFetcher::new(settings)?,
            installer,
            logger,
        })
    }

    /// Run to a terminal state. Failures are logged before being returned.
    pub async fn run(&self) -> Result<RunOutcome> {
        let outcome = self.advance().await;
        match &outcome {
            Ok(result) => self.logger.debug("RUN", format!("Finished: {result:?}")),
            Err(err) => self
                .logger
                .error(err.operation(), format!("{}: {err}", err.kind())),
        }
        outcome
    }

    async fn advance(&self) -> Result<RunOutcome> {
        self.enter(Stage::Checking);
        self.logger.debug(
            "CHECK",
            format!("Checking for updates at {}", self.status.endpoint_url()),
        );
        let download_url = match self.status.check().await {
            UpdateStatus::Available { download_url } => {
                self.logger
                    .info("CHECK", format!("Update available: {download_url}"));
                download_url
            }
            UpdateStatus::NotAvailable => {
                self.logger.info("CHECK", "No update available.");
                return Ok(RunOutcome::Idle);
            }
            UpdateStatus::Unknown { reason } => {
                return Err(UpdateError::CheckFailed { reason });
            }
        };

        if self.settings.dry_run && !self.settings.dry_run_fetch {
            self.logger.info(
                "DRYRUN",
                format!("Dry run: skipping download of {download_url}"),
            );
            return Ok(RunOutcome::DryRun { fetched: None });
        }

        self.enter(Stage::Downloading);
        let request = FetchRequest {
            source_url: download_url,
            destination_directory: self.settings.directory.clone(),
            destination_filename: self.settings.filename.clone(),
        };
        let fetched = self.fetcher.fetch(&request, self.logger).await?;

        if self.settings.dry_run {
            self.logger.info(
                "DRYRUN",
                format!(
                    "Dry run: not installing {}",
                    fetched.local_path.display()
                ),
            );
            return Ok(RunOutcome::DryRun {
                fetched: Some(fetched),
            });
        }

        self.enter(Stage::Installing);
        let command = self.installer.describe(&fetched.local_path);
        self.logger.info("INSTALL", format!("Running {command}"));
        let applied = self.installer.install(&fetched.local_path).await?;
        if !applied.succeeded {
            return Err(UpdateError::InstallFailed {
                command,
                exit_code: Some(applied.exit_code),
                reason: "package manager reported failure".into(),
            });
        }

        self.logger.info(
            "INSTALL",
            format!("Installed {} successfully.", fetched.filename),
        );
        Ok(RunOutcome::Done { fetched, applied })
    }

    fn enter(&self, stage: Stage) {
        self.logger.debug("STATE", format!("Entering {stage}"));
    }
}
