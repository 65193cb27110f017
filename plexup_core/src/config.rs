/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load the optional Plex-Up TOML configuration and merge it
    with command-line overrides into immutable run settings.

  Security / Safety Notes:
    The server token has no built-in default; it must come from
    the config file, the CLI, or the PLEX_TOKEN environment
    variable, and is never echoed in diagnostics.

  Dependencies:
    serde + toml for parsing, dirs for the default location,
    reqwest::Url for endpoint validation.

  Operational Scope:
    Evaluated once at startup before any network activity.

  Revision History:
    2025-11-02 COD  Authored configuration layer for Plex-Up.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Configuration resolved once, never mutated mid-run
    - Explicit validation with actionable messages
============================================================*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{Result, UpdateError};
use crate::logger::LogLevel;

pub const DEFAULT_STATUS_URL: &str = "http://localhost:32400/updater/status";
const DEFAULT_LOG_FILE: &str = "./plexup.log";
const CONFIG_DIR_NAME: &str = "plexup";
const CONFIG_FILE_NAME: &str = "config.toml";

/// On-disk configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlexupConfig {
    pub server: ServerConfig,
    pub download: DownloadConfig,
    pub install: InstallConfig,
    pub log: LogConfig,
}

/// Media server endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub status_url: String,
    pub token: Option<String>,
    /// Seconds allowed to establish a connection.
    pub connect_timeout: u64,
    /// Seconds allowed for the whole status request.
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            status_url: DEFAULT_STATUS_URL.to_string(),
            token: None,
            connect_timeout: 30,
            request_timeout: 30,
        }
    }
}

/// Where and how the installer package is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub directory: PathBuf,
    pub filename: Option<String>,
    /// Seconds without receiving body data before the download is abandoned.
    pub read_timeout: u64,
    /// Whether a dry run still downloads the package.
    pub dry_run_fetch: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/tmp"),
            filename: None,
            read_timeout: 300,
            dry_run_fetch: true,
        }
    }
}

/// Host package-manager invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Privilege wrapper; empty disables escalation.
    pub escalation_command: String,
    pub package_manager: String,
    pub install_args: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            escalation_command: "/usr/bin/sudo".to_string(),
            package_manager: "/usr/bin/dpkg".to_string(),
            install_args: vec!["-i".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub level: LogLevel,
}

/// Values supplied on the command line; `None` defers to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub status_url: Option<String>,
    pub token: Option<String>,
    pub directory: Option<PathBuf>,
    pub filename: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub dry_run: bool,
    pub no_fetch: bool,
}

/// Fully resolved, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub status_url: String,
    pub token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub read_timeout: Duration,
    pub directory: PathBuf,
    pub filename: Option<String>,
    pub dry_run: bool,
    pub dry_run_fetch: bool,
    pub install: InstallConfig,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
}

impl PlexupConfig {
    /// Load configuration from an explicit path, or from the default
    /// location when present.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load(explicit),
            None => match default_config_path() {
                Some(default) if default.is_file() => Self::load(&default),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a configuration file. A missing file is an error here.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            UpdateError::Config(format!(
                "Failed to read config file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            UpdateError::Config(msg) => UpdateError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| UpdateError::Config(format!("Invalid TOML: {err}")))
    }

    /// Merge command-line overrides and validate the result.
    pub fn resolve(&self, overrides: &Overrides) -> Result<RunSettings> {
        let status_url = overrides
            .status_url
            .clone()
            .unwrap_or_else(|| self.server.status_url.clone());
        Url::parse(&status_url).map_err(|err| {
            UpdateError::Config(format!("Invalid status URL `{status_url}`: {err}"))
        })?;

        let token = overrides
            .token
            .clone()
            .or_else(|| self.server.token.clone())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                UpdateError::Config(
                    "Server token missing; pass --token, set PLEX_TOKEN, or add server.token to the config file"
                        .into(),
                )
            })?;

        let filename = overrides
            .filename
            .clone()
            .or_else(|| self.download.filename.clone());
        if let Some(name) = filename.as_deref() {
            validate_filename(name)?;
        }

        if self.install.package_manager.trim().is_empty() {
            return Err(UpdateError::Config(
                "install.package_manager must not be empty".into(),
            ));
        }

        Ok(RunSettings {
            status_url,
            token,
            connect_timeout: Duration::from_secs(self.server.connect_timeout.max(1)),
            request_timeout: Duration::from_secs(self.server.request_timeout.max(1)),
            read_timeout: Duration::from_secs(self.download.read_timeout.max(1)),
            directory: overrides
                .directory
                .clone()
                .unwrap_or_else(|| self.download.directory.clone()),
            filename,
            dry_run: overrides.dry_run,
            dry_run_fetch: self.download.dry_run_fetch && !overrides.no_fetch,
            install: self.install.clone(),
            log_file: overrides
                .log_file
                .clone()
                .or_else(|| self.log.file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            log_level: overrides.log_level.unwrap_or(self.log.level),
        })
    }
}

/// `$XDG_CONFIG_HOME/plexup/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(UpdateError::Config(format!(
            "Output filename `{name}` must be a plain file name"
        )));
    }
    Ok(())
}
