//! Object database endpoint (`GET /obj/{hash}`).

use url::Url;

use super::client::ApiClient;
use super::types::{AffixPayload, ApiError, CheckpointPayload};
use crate::domain::{Affix, Checkpoint};

impl ApiClient {
    /// Fetch a checkpoint. The payload carries no hash of its own, so the
    /// requested one is attached.
    pub async fn fetch_checkpoint(
        &self,
        server: &Url,
        hash: &str,
    ) -> Result<Option<Checkpoint>, ApiError> {
        let payload: Option<CheckpointPayload> = self.get_json(server, &["obj", hash]).await?;
        Ok(payload.map(|p| p.into_checkpoint(hash)))
    }

    /// Fetch the affix a checkpoint points at.
    pub async fn fetch_affix(&self, server: &Url, hash: &str) -> Result<Option<Affix>, ApiError> {
        let payload: Option<AffixPayload> = self.get_json(server, &["obj", hash]).await?;
        Ok(payload.map(|p| p.into_affix(hash)))
    }

    /// Fetch any object (checkpoint, affix or event) as raw JSON.
    pub async fn fetch_object(
        &self,
        server: &Url,
        hash: &str,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        self.get_json(server, &["obj", hash]).await
    }
}
