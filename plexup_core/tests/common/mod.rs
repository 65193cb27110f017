//! Shared fixtures for Plex-Up integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use plexup_core::config::{Overrides, PlexupConfig, RunSettings};
use plexup_core::error::Result;
use plexup_core::installer::PackageInstaller;
use plexup_core::logger::{LogLevel, Logger};
use plexup_core::update_info::ApplyResult;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";
pub const STATUS_PATH: &str = "/updater/status";

/// Scratch layout: downloads and the log live in separate folders.
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn downloads(&self) -> PathBuf {
        self.root.path().join("downloads")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.path().join("logs").join("plexup.log")
    }

    pub fn settings(&self, server: &MockServer) -> RunSettings {
        self.settings_for_base(&server.uri())
    }

    pub fn settings_for_base(&self, base_url: &str) -> RunSettings {
        let overrides = Overrides {
            status_url: Some(format!("{base_url}{STATUS_PATH}")),
            token: Some(TOKEN.into()),
            directory: Some(self.downloads()),
            log_file: Some(self.log_path()),
            log_level: Some(LogLevel::Debug),
            ..Overrides::default()
        };
        PlexupConfig::default().resolve(&overrides).unwrap()
    }

    pub fn logger(&self) -> Logger {
        Logger::new(Some(self.log_path()), LogLevel::Debug, false).unwrap()
    }

    pub fn log_contents(&self) -> String {
        std::fs::read_to_string(self.log_path()).unwrap_or_default()
    }

    /// Names of regular files in the download directory.
    pub fn downloaded_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.downloads()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Installer double that records each package it is asked to apply.
#[derive(Clone)]
pub struct RecordingInstaller {
    exit_code: i32,
    calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl RecordingInstaller {
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl PackageInstaller for RecordingInstaller {
    async fn install(&self, package: &Path) -> Result<ApplyResult> {
        self.calls.borrow_mut().push(package.to_path_buf());
        Ok(ApplyResult::from_exit_code(self.exit_code))
    }

    fn describe(&self, package: &Path) -> String {
        format!("recording-installer {}", package.display())
    }
}

/// Base URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Single-connection HTTP server that reads the request, writes `reply`
/// verbatim, then keeps the socket open for `hold_open` before closing.
pub async fn raw_server(reply: Vec<u8>, hold_open: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&reply).await;
            let _ = socket.flush().await;
            tokio::time::sleep(hold_open).await;
        }
    });
    format!("http://{addr}")
}

/// Response head declaring `declared` body bytes, followed by `sent` bytes.
pub fn short_body_reply(declared: usize, sent: usize) -> Vec<u8> {
    let mut reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {declared}\r\n\r\n"
    )
    .into_bytes();
    reply.extend(payload(sent));
    reply
}

/// Deterministic payload whose bytes differ by position.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
