mod browse;
mod format;
mod log;
mod refs;
mod settings;
mod show;

pub use browse::run_browse;
pub use log::{run_log, LogOptions};
pub use refs::run_refs;
pub use settings::run_config;
pub use show::run_show;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{ApiClient, ServerConnection};
use crate::config::{Settings, SettingsStore};
use crate::history::HistoryWalker;

/// Resolved settings plus the HTTP client every command shares.
pub struct CommandContext {
    pub settings: Settings,
    pub client: Arc<ApiClient>,
}

impl CommandContext {
    /// Resolve settings (flag > environment > file > default) and build the client.
    pub fn load(server_override: Option<String>, config_dir: Option<String>) -> Result<Self> {
        let store = SettingsStore::new(config_dir)?;
        let mut settings = store.load().with_env();
        if let Some(server) = server_override {
            settings.server_url = server;
        }

        let client = ApiClient::new(settings.timeout(), settings.retry_policy())?;
        Ok(Self {
            settings,
            client: Arc::new(client),
        })
    }

    pub fn connection(&self) -> Result<ServerConnection> {
        ServerConnection::connect(self.client.clone(), &self.settings.server_url)
            .with_context(|| format!("Cannot use server {}", self.settings.server_url))
    }

    pub fn walker(&self, max_depth: Option<usize>) -> HistoryWalker {
        HistoryWalker::new(max_depth.unwrap_or(self.settings.max_depth))
    }
}
