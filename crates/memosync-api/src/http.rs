//! Shared HTTP plumbing for the Memos API clients
//!
//! Wraps `reqwest::Client` with bearer authentication, base URL
//! construction and the mapping from transport outcomes to the
//! [`MemosError`] taxonomy:
//!
//! | Outcome | Error |
//! |---------|-------|
//! | 401, 403 | `Auth` |
//! | 408, 429, 5xx, connect/timeout failures | `Transient` |
//! | 404, 405, 501, undecodable body, other statuses | `Protocol` |

use std::fmt;
use std::time::Duration;

use memosync_core::ports::MemosError;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Authenticated HTTP access to one Memos server
#[derive(Clone)]
pub struct MemosHttp {
    client: Client,
    base_url: String,
    access_token: String,
}

impl fmt::Debug for MemosHttp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemosHttp")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl MemosHttp {
    /// Creates a client for `base_url`, stripping trailing slashes
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::from_client(Client::new(), base_url, access_token)
    }

    /// Creates a client whose requests fail after `timeout`
    pub fn with_timeout(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::from_client(client, base_url, access_token))
    }

    fn from_client(
        client: Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Creates an authenticated request builder for a path below the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// URL below the base URL built from raw path segments
    ///
    /// Each segment is percent-encoded, so a `#` or `?` in a filename stays
    /// part of the path.
    pub fn segment_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, MemosError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            MemosError::Protocol(format!("invalid memos.api_url '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                MemosError::Protocol(format!(
                    "memos.api_url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated request builder for an absolute URL
    pub fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Sends a request and decodes a JSON body
    ///
    /// `context` names the operation in error messages.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, MemosError> {
        let response = self.send(request, context).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, context))?;
        serde_json::from_str(&body).map_err(|e| {
            MemosError::Protocol(format!(
                "{context}: unexpected response shape ({e}); check memos.api_version"
            ))
        })
    }

    /// Sends a request and returns the raw body bytes
    pub async fn send_bytes(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<Vec<u8>, MemosError> {
        let response = self.send(request, context).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, context))?;
        debug!(context, bytes = bytes.len(), "downloaded body");
        Ok(bytes.to_vec())
    }

    /// Unauthenticated GET of an absolute URL (externally hosted attachments)
    pub async fn get_external(&self, url: &str) -> Result<Vec<u8>, MemosError> {
        let parsed = Url::parse(url)
            .map_err(|e| MemosError::Protocol(format!("invalid external link '{url}': {e}")))?;
        let request = self.client.get(parsed);
        self.send_bytes(request, "fetch external attachment").await
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response, MemosError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, context))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body, context))
    }
}

/// Error body of the gRPC gateway (`{"code": 16, "message": "..."}`) and of
/// the legacy REST API (`{"error": "...", "message": "..."}`)
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} (HTTP {})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} (HTTP {})", trimmed, status.as_u16())
    }
}

/// Maps a non-success HTTP status to a [`MemosError`]
pub fn classify_status(status: StatusCode, body: &str, context: &str) -> MemosError {
    let detail = error_detail(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            MemosError::Auth(format!("{context}: {detail}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            MemosError::Transient(format!("{context}: {detail}"))
        }
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
            MemosError::Protocol(format!(
                "{context}: endpoint not available ({detail}); check memos.api_version"
            ))
        }
        s if s.is_server_error() => MemosError::Transient(format!("{context}: {detail}")),
        _ => MemosError::Protocol(format!("{context}: {detail}")),
    }
}

/// Maps a reqwest transport failure to a [`MemosError`]
pub fn transport_error(err: reqwest::Error, context: &str) -> MemosError {
    if err.is_decode() {
        MemosError::Protocol(format!("{context}: {err}"))
    } else {
        MemosError::Transient(format!("{context}: {err}"))
    }
}
