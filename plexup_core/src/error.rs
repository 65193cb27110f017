/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Plex-Up error types so every failure path names
    the stage it belongs to and maps to a stable exit code.

  Security / Safety Notes:
    Error contexts never carry the server token; only URLs,
    paths, and command names are exposed.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate terminal failures and
    consolidate exit codes for the binary entry point.

  Revision History:
    2025-11-02 COD  Established update taxonomy for Plex-Up.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Plex-Up operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Enumerates the failure domains surfaced by Plex-Up.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Update check failed: {reason}")]
    CheckFailed { reason: String },
    #[error("Download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },
    #[error("Install via `{command}` failed{}: {reason}", exit_suffix(.exit_code))]
    InstallFailed {
        command: String,
        exit_code: Option<i32>,
        reason: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}

impl UpdateError {
    pub(crate) fn download(url: &str, reason: impl Into<String>) -> Self {
        UpdateError::DownloadFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Category name recorded alongside the failure in the log.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::CheckFailed { .. } => "CheckFailed",
            UpdateError::DownloadFailed { .. } => "DownloadFailed",
            UpdateError::InstallFailed { .. } => "InstallFailed",
            UpdateError::Config(_) => "ConfigError",
            UpdateError::Filesystem(_) => "FilesystemError",
        }
    }

    /// Operation code used when the failure is written to the log.
    pub fn operation(&self) -> &'static str {
        match self {
            UpdateError::CheckFailed { .. } => "CHECK",
            UpdateError::DownloadFailed { .. } => "FETCH",
            UpdateError::InstallFailed { .. } => "INSTALL",
            UpdateError::Config(_) => "CONFIG",
            UpdateError::Filesystem(_) => "LOGGER",
        }
    }

    /// Console line for the binary. Run failures were already logged and
    /// mirrored to stderr by the orchestrator, so only a pointer is printed.
    pub fn console_summary(&self) -> String {
        match self.exit_status() {
            1 => format!("[Plex-Up] Failure ({}). See the log for details.", self.kind()),
            _ => format!("[Plex-Up] {self}"),
        }
    }

    /// Map error category to a deterministic exit code.
    ///
    /// Run failures share code 1 so schedulers only need to test for
    /// non-zero; setup failures use 2 since no update was attempted.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Numeric form of [`UpdateError::exit_code`].
    pub fn exit_status(&self) -> u8 {
        match self {
            UpdateError::CheckFailed { .. }
            | UpdateError::DownloadFailed { .. }
            | UpdateError::InstallFailed { .. } => 1,
            UpdateError::Config(_) | UpdateError::Filesystem(_) => 2,
        }
    }
}
