use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use super::http::{send_with_retry, RetryPolicy};
use super::types::ApiError;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the User-Agent string
fn build_user_agent() -> String {
    std::env::var("RETRO_CABINET_USER_AGENT")
        .unwrap_or_else(|_| format!("retro-cabinet/{}", DEFAULT_VERSION))
}

/// Parse a server base URL.
///
/// The base is always treated as a directory, so `http://host/retro` and
/// `http://host/retro/` both resolve `ref/` to `http://host/retro/ref/`.
pub fn parse_server_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// HTTP client for Retro object-database servers
pub struct ApiClient {
    pub(super) client: Client,
    pub(super) user_agent: String,
    pub(super) session_id: String,
    pub(super) retry: RetryPolicy,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            user_agent: build_user_agent(),
            session_id: Uuid::new_v4().to_string(),
            retry,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Append path segments to a server base URL.
    ///
    /// Segments are percent-encoded individually, so a hash can never
    /// escape its segment.
    pub(super) fn build_url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: base.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a URL and return its body.
    pub(super) async fn get_text(&self, url: &Url) -> Result<String, ApiError> {
        let request_id = Uuid::new_v4().to_string();

        debug!("=== API Request ===");
        debug!("URL: {}", url);

        let response = send_with_retry(self.retry, || {
            self.client
                .get(url.clone())
                .header("Accept", "application/json")
                .header("User-Agent", &self.user_agent)
                .header("x-request-id", &request_id)
                .header("x-request-session-id", &self.session_id)
        })
        .await
        .map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        debug!("=== API Response ===");
        debug!("Status: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("GET {} failed with status {}", url, status);
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// GET a JSON document. An empty body is `None`, not an error.
    pub(super) async fn get_json<R>(
        &self,
        base: &Url,
        segments: &[&str],
    ) -> Result<Option<R>, ApiError>
    where
        R: DeserializeOwned,
    {
        let url = Self::build_url(base, segments)?;
        let body = self.get_text(&url).await?;
        if body.trim().is_empty() {
            debug!("Empty body from {}", url);
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })
    }
}
