/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::fetcher
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Stream the advertised installer package to local storage
    and verify that every byte arrived before it is installed.

  Security / Safety Notes:
    Filenames derived from the server URL are reduced to a
    single path component; nothing is written outside the
    configured download directory. Incomplete downloads never
    occupy the final artifact path.

  Dependencies:
    reqwest for HTTP, tokio::fs for async file I/O, sha2 for
    artifact digests, urlencoding for filename decoding.

  Operational Scope:
    Second stage of the update workflow; runs once per
    advertised update.

  Revision History:
    2025-11-02 COD  Implemented staged package download.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Bounded memory: fixed-size chunked writes
    - Staging file plus rename for idempotent reruns
    - Explicit cleanup on every failure path
============================================================*/

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Response, Url};
use sha2::{Digest, Sha256};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::timeout;

use crate::config::RunSettings;
use crate::error::{Result, UpdateError};
use crate::logger::Logger;
use crate::update_info::{FetchRequest, FetchResult};

/// Size of each write issued against the staging file.
pub const CHUNK_SIZE: usize = 1024;
const STAGING_SUFFIX: &str = ".part";
const WRITE_BUFFER: usize = 64 * 1024;
const USER_AGENT: &str = concat!("Plex-Up/", env!("CARGO_PKG_VERSION"), " (linux)");

/// Downloads installer packages over HTTP(S).
#[derive(Clone)]
pub struct PackageFetcher {
    client: reqwest::Client,
    read_timeout: Duration,
}

struct StagedPayload {
    bytes_written: u64,
    sha256: String,
}

impl PackageFetcher {
    /// Construct a fetcher from resolved run settings.
    pub fn new(settings: &RunSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| UpdateError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            read_timeout: settings.read_timeout,
        })
    }

    /// Download `request.source_url` into the destination directory.
    ///
    /// The filename is resolved exactly once, after redirects, and is
    /// returned in the [`FetchResult`] for the install step.
    pub async fn fetch(&self, request: &FetchRequest, logger: &Logger) -> Result<FetchResult> {
        let url = request.source_url.as_str();
        let mut response = match timeout(self.read_timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                return Err(UpdateError::download(url, format!("request failed: {err}")))
            }
            Err(_) => {
                return Err(UpdateError::download(
                    url,
                    format!(
                        "no response within {} seconds",
                        self.read_timeout.as_secs()
                    ),
                ))
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::download(
                url,
                format!("server responded with HTTP {status}"),
            ));
        }

        let final_url = response.url().clone();
        if final_url.as_str() != url {
            logger.debug("FETCH", format!("Redirected to {final_url}"));
        }

        let filename = resolve_filename(request.destination_filename.as_deref(), &final_url)
            .map_err(|reason| UpdateError::download(url, reason))?;

        let directory = &request.destination_directory;
        tokio::fs::create_dir_all(directory).await.map_err(|err| {
            UpdateError::download(
                url,
                format!("failed to create directory {}: {err}", directory.display()),
            )
        })?;

        let destination = directory.join(&filename);
        let staging = staging_path(&destination);
        match tokio::fs::remove_file(&staging).await {
            Ok(()) => logger.warn(
                "FETCH",
                format!("Removed stale partial download {}", staging.display()),
            ),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(UpdateError::download(
                    url,
                    format!("failed to clear {}: {err}", staging.display()),
                ))
            }
        }

        logger.info(
            "FETCH",
            format!("Downloading {final_url} to {}", destination.display()),
        );

        let expected = response.content_length();
        let staged = match self.stream_to_staging(&mut response, &staging).await {
            Ok(staged) => staged,
            Err(reason) => {
                discard_staging(&staging, logger).await;
                return Err(UpdateError::download(url, reason));
            }
        };
        drop(response);

        if let Some(expected) = expected {
            if expected != staged.bytes_written {
                discard_staging(&staging, logger).await;
                return Err(UpdateError::download(
                    url,
                    format!(
                        "size mismatch: expected {expected} bytes, received {}",
                        staged.bytes_written
                    ),
                ));
            }
        }

        if let Err(err) = tokio::fs::rename(&staging, &destination).await {
            discard_staging(&staging, logger).await;
            return Err(UpdateError::download(
                url,
                format!("failed to move download into {}: {err}", destination.display()),
            ));
        }

        logger.info(
            "FETCH",
            format!(
                "Update downloaded: {} ({} bytes, sha256 {})",
                destination.display(),
                staged.bytes_written,
                staged.sha256
            ),
        );

        Ok(FetchResult {
            local_path: destination,
            filename,
            bytes_written: staged.bytes_written,
            sha256: staged.sha256,
        })
    }

    async fn stream_to_staging(
        &self,
        response: &mut Response,
        staging: &Path,
    ) -> std::result::Result<StagedPayload, String> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging)
            .await
            .map_err(|err| format!("failed to create {}: {err}", staging.display()))?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);
        let mut hasher = Sha256::new();
        let mut bytes_written = 0u64;

        loop {
            let chunk = match timeout(self.read_timeout, response.chunk()).await {
                Ok(Ok(Some(chunk))) => chunk,
                Ok(Ok(None)) => break,
                Ok(Err(err)) => {
                    return Err(format!(
                        "transfer interrupted after {bytes_written} bytes: {err}"
                    ))
                }
                Err(_) => {
                    return Err(format!(
                        "no data received for {} seconds after {bytes_written} bytes",
                        self.read_timeout.as_secs()
                    ))
                }
            };

            for block in chunk.chunks(CHUNK_SIZE) {
                writer
                    .write_all(block)
                    .await
                    .map_err(|err| format!("failed to write {}: {err}", staging.display()))?;
                hasher.update(block);
                bytes_written += block.len() as u64;
            }
        }

        writer
            .flush()
            .await
            .map_err(|err| format!("failed to flush {}: {err}", staging.display()))?;
        writer
            .get_ref()
            .sync_all()
            .await
            .map_err(|err| format!("failed to sync {}: {err}", staging.display()))?;

        Ok(StagedPayload {
            bytes_written,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

/// Choose the artifact filename: the override verbatim, otherwise the
/// percent-decoded last path segment of `final_url`.
pub fn resolve_filename(
    override_name: Option<&str>,
    final_url: &Url,
) -> std::result::Result<String, String> {
    if let Some(name) = override_name {
        return Ok(name.to_string());
    }

    let segment = final_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| format!("cannot derive a filename from {final_url}"))?;
    let decoded = urlencoding::decode(segment)
        .map_err(|err| format!("filename segment `{segment}` is not valid UTF-8: {err}"))?;

    if decoded.is_empty() || decoded == "." || decoded == ".." || decoded.contains(['/', '\\']) {
        return Err(format!("refusing unsafe filename `{decoded}` from {final_url}"));
    }
    Ok(decoded.into_owned())
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut staged = destination.as_os_str().to_os_string();
    staged.push(STAGING_SUFFIX);
    PathBuf::from(staged)
}

async fn discard_staging(staging: &Path, logger: &Logger) {
    match tokio::fs::remove_file(staging).await {
        Ok(()) => logger.debug(
            "FETCH",
            format!("Removed partial download {}", staging.display()),
        ),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => logger.warn(
            "FETCH",
            format!(
                "Failed to remove partial download {}: {err}",
                staging.display()
            ),
        ),
    }
}
