/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::installer
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Hand the downloaded package to the host package manager
    and report its exit status.

  Security / Safety Notes:
    Runs the package manager through a privilege wrapper
    (sudo by default) unless already executing as root. The
    artifact path is passed as a discrete argument, never
    through a shell.

  Dependencies:
    tokio::process for async command execution, libc for the
    effective uid check.

  Operational Scope:
    Final stage of the update workflow; skipped on dry runs.

  Revision History:
    2025-11-02 COD  Crafted package-manager integration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Exit code as the sole success signal
    - Swappable mechanism behind a narrow trait
============================================================*/

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::InstallConfig;
use crate::error::{Result, UpdateError};
use crate::update_info::ApplyResult;

/// Applies a downloaded package to the host.
#[allow(async_fn_in_trait)]
pub trait PackageInstaller {
    /// Install `package` and report the mechanism's exit status.
    ///
    /// `Err` is reserved for failures to run the mechanism at all; a
    /// mechanism that ran and failed yields `Ok` with `succeeded == false`.
    async fn install(&self, package: &Path) -> Result<ApplyResult>;

    /// Human-readable command line, for logs.
    fn describe(&self, package: &Path) -> String;
}

/// Installs packages by spawning `<escalation> <manager> <args..> <package>`.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    escalation: Option<String>,
    package_manager: String,
    install_args: Vec<String>,
}

impl CommandInstaller {
    /// Build from configuration, dropping the privilege wrapper when the
    /// process already runs as root.
    pub fn from_config(config: &InstallConfig) -> Self {
        let escalation = Some(config.escalation_command.trim())
            .filter(|cmd| !cmd.is_empty() && !running_as_root())
            .map(str::to_string);
        Self::new(
            escalation,
            config.package_manager.clone(),
            config.install_args.clone(),
        )
    }

    pub fn new(
        escalation: Option<String>,
        package_manager: impl Into<String>,
        install_args: Vec<String>,
    ) -> Self {
        Self {
            escalation,
            package_manager: package_manager.into(),
            install_args,
        }
    }

    /// Program and leading arguments; the package path is appended last.
    fn command_prefix(&self) -> (String, Vec<String>) {
        let mut args = Vec::with_capacity(self.install_args.len() + 1);
        let program = match &self.escalation {
            Some(wrapper) => {
                args.push(self.package_manager.clone());
                wrapper.clone()
            }
            None => self.package_manager.clone(),
        };
        args.extend(self.install_args.iter().cloned());
        (program, args)
    }
}

impl PackageInstaller for CommandInstaller {
    async fn install(&self, package: &Path) -> Result<ApplyResult> {
        let (program, args) = self.command_prefix();
        let status = Command::new(&program)
            .args(&args)
            .arg(package)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|err| map_spawn_error(err, &program))?;

        Ok(ApplyResult::from_exit_code(status.code().unwrap_or(-1)))
    }

    fn describe(&self, package: &Path) -> String {
        let (program, args) = self.command_prefix();
        std::iter::once(program)
            .chain(args)
            .chain(std::iter::once(package.display().to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

fn map_spawn_error(err: io::Error, command: &str) -> UpdateError {
    let reason = if err.kind() == io::ErrorKind::NotFound {
        "command not found".to_string()
    } else {
        format!("failed to spawn: {err}")
    };
    UpdateError::InstallFailed {
        command: command.into(),
        exit_code: None,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_escalated_dpkg_command_line() {
        let installer = CommandInstaller::new(
            Some("/usr/bin/sudo".into()),
            "/usr/bin/dpkg",
            vec!["-i".into()],
        );
        assert_eq!(
            installer.describe(Path::new("/tmp/plex.deb")),
            "/usr/bin/sudo /usr/bin/dpkg -i /tmp/plex.deb"
        );
    }

    #[test]
    fn omits_wrapper_when_disabled() {
        let config = InstallConfig {
            escalation_command: "  ".into(),
            ..InstallConfig::default()
        };
        let installer = CommandInstaller::from_config(&config);
        assert_eq!(
            installer.describe(Path::new("/tmp/plex.deb")),
            "/usr/bin/dpkg -i /tmp/plex.deb"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reports_exit_codes() {
        let ok = CommandInstaller::new(None, "true", vec!["-i".into()]);
        let result = ok.install(Path::new("/tmp/plex.deb")).await.unwrap();
        assert_eq!(result, ApplyResult::from_exit_code(0));

        let failing = CommandInstaller::new(None, "false", vec!["-i".into()]);
        let result = failing.install(Path::new("/tmp/plex.deb")).await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert!(!result.succeeded);
    }

    #[tokio::test]
    async fn missing_binary_is_install_failure() {
        let installer = CommandInstaller::new(None, "/nonexistent/plexup-dpkg", vec![]);
        let err = installer
            .install(Path::new("/tmp/plex.deb"))
            .await
            .unwrap_err();
        match err {
            UpdateError::InstallFailed {
                command, exit_code, ..
            } => {
                assert_eq!(command, "/nonexistent/plexup-dpkg");
                assert_eq!(exit_code, None);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
