/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core::status
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the Plex Media Server updater endpoint and classify
    its answer as available, not available, or unknown.

  Security / Safety Notes:
    The token travels in the X-Plex-Token header only and is
    excluded from every log line and error message.

  Dependencies:
    reqwest for HTTP, quick-xml for the status document.

  Operational Scope:
    First stage of every run; a single request, no retries.

  Revision History:
    2025-11-02 COD  Implemented updater status client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Fail-fast classification with explicit reasons
    - Configurable timeouts
    - Structured response parsing with clear failure modes
============================================================*/

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::redirect::Policy;

use crate::config::RunSettings;
use crate::error::{Result, UpdateError};
use crate::update_info::UpdateStatus;

pub const TOKEN_HEADER: &str = "X-Plex-Token";
const USER_AGENT: &str = concat!("Plex-Up/", env!("CARGO_PKG_VERSION"), " (linux)");

/// Client bound to one updater status endpoint.
#[derive(Clone)]
pub struct StatusClient {
    client: reqwest::Client,
    endpoint_url: String,
    auth_token: String,
}

impl StatusClient {
    /// Construct a client from resolved run settings.
    ///
    /// Redirects are not followed: the token header would otherwise be
    /// forwarded to whatever host the redirect names.
    pub fn new(settings: &RunSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| UpdateError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint_url: settings.status_url.clone(),
            auth_token: settings.token.clone(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Fetch and classify the current update status.
    pub async fn check(&self) -> UpdateStatus {
        let response = match self
            .client
            .get(&self.endpoint_url)
            .header(TOKEN_HEADER, &self.auth_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return UpdateStatus::unknown(format!(
                    "request to {} failed: {err}",
                    self.endpoint_url
                ))
            }
        };

        let status = response.status();
        if !status.is_success() {
            return UpdateStatus::unknown(format!(
                "{} responded with HTTP {status}",
                self.endpoint_url
            ));
        }

        match response.text().await {
            Ok(body) => parse_status(&body),
            Err(err) => UpdateStatus::unknown(format!("failed to read status body: {err}")),
        }
    }
}

/// Classify an updater status document by its root element's
/// `size` and `downloadURL` attributes.
pub fn parse_status(body: &str) -> UpdateStatus {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return classify_element(&element);
            }
            Ok(Event::Eof) => return UpdateStatus::unknown("status body contained no element"),
            Ok(_) => continue,
            Err(err) => {
                return UpdateStatus::unknown(format!(
                    "malformed status body at byte {}: {err}",
                    reader.buffer_position()
                ))
            }
        }
    }
}

fn classify_element(element: &BytesStart<'_>) -> UpdateStatus {
    let size = match attribute(element, b"size") {
        Ok(Some(size)) => size,
        Ok(None) => return UpdateStatus::unknown("status element has no `size` attribute"),
        Err(reason) => return UpdateStatus::unknown(reason),
    };

    match size.as_str() {
        "1" => match attribute(element, b"downloadURL") {
            Ok(Some(url)) if !url.trim().is_empty() => UpdateStatus::Available {
                download_url: url.trim().to_string(),
            },
            Ok(_) => UpdateStatus::unknown("update advertised without a `downloadURL`"),
            Err(reason) => UpdateStatus::unknown(reason),
        },
        "0" => UpdateStatus::NotAvailable,
        other => UpdateStatus::unknown(format!("unexpected `size` value `{other}`")),
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| format!("malformed attribute: {err}"))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| format!("malformed attribute value: {err}"))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
