//! Settings storage.
//!
//! Persists browser settings in `~/.retro-cabinet/settings.json` (or a
//! custom config directory). Values are resolved in this order:
//! command-line flag, environment variable, settings file, built-in default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::history::DEFAULT_MAX_DEPTH;

/// Listen address of a locally started Retro server
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

pub const SERVER_URL_ENV: &str = "RETRO_CABINET_SERVER_URL";
pub const DEFAULT_REF_ENV: &str = "RETRO_CABINET_DEFAULT_REF";
pub const MAX_DEPTH_ENV: &str = "RETRO_CABINET_MAX_DEPTH";

const SETTINGS_FILE: &str = "settings.json";

/// Settings as stored in settings.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub server_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ref: Option<String>,
    pub max_depth: usize,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            default_ref: None,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Settings {
    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                self.server_url = url;
            }
        }
        if let Ok(name) = std::env::var(DEFAULT_REF_ENV) {
            if !name.trim().is_empty() {
                self.default_ref = Some(name);
            }
        }
        if let Ok(raw) = std::env::var(MAX_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => self.max_depth = depth,
                _ => warn!("Ignoring {}={:?}: not a positive number", MAX_DEPTH_ENV, raw),
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self.max_retries {
            0 => RetryPolicy::none(),
            n => RetryPolicy::with_max_retries(n),
        }
    }
}

/// Settings file store
pub struct SettingsStore {
    settings_path: PathBuf,
}

impl SettingsStore {
    /// Create a new settings store
    ///
    /// # Arguments
    /// * `config_dir` - Optional custom config directory. Defaults to ~/.retro-cabinet
    pub fn new(config_dir: Option<String>) -> Result<Self> {
        let base_dir = match config_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".retro-cabinet"),
        };

        Ok(Self {
            settings_path: base_dir.join(SETTINGS_FILE),
        })
    }

    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load the stored settings.
    ///
    /// A missing file yields defaults. So does a malformed one, with a warning.
    pub fn load(&self) -> Settings {
        if !self.settings_path.exists() {
            debug!("No settings file at {:?}, using defaults", self.settings_path);
            return Settings::default();
        }

        let content = match std::fs::read_to_string(&self.settings_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings file {:?}: {}", self.settings_path, e);
                return Settings::default();
            }
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse settings file {:?}: {}", self.settings_path, e);
                Settings::default()
            }
        }
    }

    /// Save settings, creating the config directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.settings_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
        }

        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        std::fs::write(&self.settings_path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", self.settings_path))?;

        info!("Settings saved to {:?}", self.settings_path);
        Ok(())
    }

    /// Load, change and save in one step.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut settings = self.load();
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}
