/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::update_info
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structures passed between the status client, the
    package fetcher, and the installer.

  Security / Safety Notes:
    Pure data containers; no I/O performed in this module.

  Dependencies:
    None beyond std.

  Operational Scope:
    Threaded explicitly through the update workflow so that no
    stage mutates configuration owned by another.

  Revision History:
    2025-11-02 COD  Introduced update workflow data contracts.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Values resolved once and carried forward, never re-derived
============================================================*/

use std::path::PathBuf;

/// Result of querying the media server's updater status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// A newer package exists at `download_url`.
    Available { download_url: String },
    /// The server reports no pending update.
    NotAvailable,
    /// The status could not be determined; `reason` explains why.
    Unknown { reason: String },
}

impl UpdateStatus {
    pub(crate) fn unknown(reason: impl Into<String>) -> Self {
        UpdateStatus::Unknown {
            reason: reason.into(),
        }
    }
}

/// Parameters for a single package download.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub source_url: String,
    pub destination_directory: PathBuf,
    /// Explicit output name; derived from the final URL when absent.
    pub destination_filename: Option<String>,
}

/// A completed download. Only produced when every byte reached disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub local_path: PathBuf,
    /// Filename resolved during the fetch and reused by the installer.
    pub filename: String,
    pub bytes_written: u64,
    /// Lowercase hex SHA-256 of the artifact.
    pub sha256: String,
}

/// Outcome of the package-manager subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    pub exit_code: i32,
    pub succeeded: bool,
}

impl ApplyResult {
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            succeeded: exit_code == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_zero_exit_code_succeeds() {
        assert!(ApplyResult::from_exit_code(0).succeeded);
        assert!(!ApplyResult::from_exit_code(1).succeeded);
        assert!(!ApplyResult::from_exit_code(-1).succeeded);
        assert_eq!(ApplyResult::from_exit_code(100).exit_code, 100);
    }
}
