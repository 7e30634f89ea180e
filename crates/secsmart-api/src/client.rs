// SEC Smart cloud API client
//
// Wraps `reqwest::Client` with bearer authentication, URL construction and
// the vendor's status-code conventions. Two endpoints are covered: reading
// all areas of a device and writing one area's mode.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{AreaModeUpdate, AreasPayload};

/// Default cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sec-smart.app/v1";

/// Async HTTP client for the SEC Smart API.
///
/// Cheap to share behind an `Arc`: every request reads the token and base
/// URL but never mutates them.
pub struct SecSmartClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
    timeout: Duration,
}

impl SecSmartClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// `timeout` should match the one configured on `http`; it labels
    /// timeout errors.
    pub fn from_reqwest(
        base_url: &str,
        token: SecretString,
        http: reqwest::Client,
        timeout: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token,
            timeout,
        })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /devices/{device_id}/areas`
    ///
    /// Returns parsed JSON when the server labels the body as JSON, and the
    /// raw text otherwise.
    pub async fn get_areas(&self, device_id: &str) -> Result<AreasPayload, Error> {
        let url = self.url(&["devices", device_id, "areas"])?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = check_status(resp).await?;

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(bytes = body.len(), is_json, "areas response received");

        if !is_json {
            return Ok(AreasPayload::Text(body));
        }

        serde_json::from_str(&body)
            .map(AreasPayload::Json)
            .map_err(|e| {
                let preview = truncate(&body, 200);
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body: body.clone(),
                }
            })
    }

    /// `PUT /devices/{device_id}/areas/mode` with `{areaid, mode}`.
    ///
    /// The response body is ignored beyond its status.
    pub async fn set_area_mode(
        &self,
        device_id: &str,
        area_id: u8,
        mode: &str,
    ) -> Result<(), Error> {
        let url = self.url(&["devices", device_id, "areas", "mode"])?;
        let body = AreaModeUpdate {
            areaid: area_id,
            mode,
        };
        self.put(url, &body).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn put(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        check_status(resp).await.map(drop)
    }

    /// Append path segments to the base URL, escaping each one.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut full = self.base_url.clone();
        full.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(full)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout: self.timeout,
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Map the vendor's status conventions onto [`Error`].
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();

    if status.is_success() {
        return Ok(resp);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "token rejected".into(),
        });
    }

    let body = resp.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::BAD_REQUEST {
        return Err(Error::BadRequest { body });
    }

    Err(Error::Http {
        status: status.as_u16(),
        body: truncate(&body, 200),
    })
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}
