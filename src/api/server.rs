//! API client bound to one Retro server.
//!
//! `ServerConnection` wraps a shared `ApiClient` together with the base URL
//! of the server being browsed, so callers do not have to pass the URL to
//! every request. Cloning is cheap and all clones share one
//! `reqwest::Client`, which keeps connections pooled while a history walk
//! issues its sequence of requests.
//!
//! The `RefSource` and `ObjectSource` traits are the seams the history
//! walker and the browser controller are written against.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::client::{parse_server_url, ApiClient};
use super::types::ApiError;
use crate::domain::{Affix, Checkpoint, RefSet};

/// Something that can list refs.
#[async_trait]
pub trait RefSource: Send + Sync {
    async fn fetch_refs(&self) -> Result<RefSet, ApiError>;
}

/// Something that can hand out checkpoints by hash.
///
/// `Ok(None)` means the server answered without a body.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn fetch_checkpoint(&self, hash: &str) -> Result<Option<Checkpoint>, ApiError>;
}

#[derive(Clone)]
pub struct ServerConnection {
    inner: Arc<ApiClient>,
    base_url: Url,
}

impl ServerConnection {
    pub fn new(client: Arc<ApiClient>, base_url: Url) -> Self {
        Self {
            inner: client,
            base_url,
        }
    }

    /// Parse `server_url` and bind it to `client`.
    pub fn connect(client: Arc<ApiClient>, server_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(client, parse_server_url(server_url)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn fetch_affix(&self, hash: &str) -> Result<Option<Affix>, ApiError> {
        self.inner.fetch_affix(&self.base_url, hash).await
    }

    pub async fn fetch_object(&self, hash: &str) -> Result<Option<serde_json::Value>, ApiError> {
        self.inner.fetch_object(&self.base_url, hash).await
    }
}

#[async_trait]
impl RefSource for ServerConnection {
    async fn fetch_refs(&self) -> Result<RefSet, ApiError> {
        self.inner.fetch_refs(&self.base_url).await
    }
}

#[async_trait]
impl ObjectSource for ServerConnection {
    async fn fetch_checkpoint(&self, hash: &str) -> Result<Option<Checkpoint>, ApiError> {
        self.inner.fetch_checkpoint(&self.base_url, hash).await
    }
}

impl std::fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConnection")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.inner.retry_policy())
            .finish()
    }
}
