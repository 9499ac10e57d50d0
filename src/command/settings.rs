use anyhow::{Context, Result};

use crate::api::parse_server_url;
use crate::cli::ConfigAction;
use crate::config::{Settings, SettingsStore};

fn print_settings(store: &SettingsStore, settings: &Settings) {
    println!("Settings file: {}", store.settings_path().display());
    println!("   Server URL: {}", settings.server_url);
    println!(
        "   Default ref: {}",
        settings
            .default_ref
            .as_deref()
            .unwrap_or("(last ref listed by the server)")
    );
    println!("   Max depth: {}", settings.max_depth);
    println!("   Timeout: {}s", settings.timeout_secs);
    println!("   Max retries: {}", settings.max_retries);
}

pub fn run_config(action: Option<ConfigAction>, config_dir: Option<String>) -> Result<()> {
    let store = SettingsStore::new(config_dir)?;

    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let settings = store.load().with_env();
            print_settings(&store, &settings);
        }
        ConfigAction::SetServer { url } => {
            let parsed = parse_server_url(&url).context("Refusing to store server URL")?;
            let settings = store.update(|s| s.server_url = url.trim().to_string())?;
            println!("✅ Server set to {}", parsed);
            print_settings(&store, &settings);
        }
        ConfigAction::SetDefaultRef { name } => {
            let settings = store.update(|s| s.default_ref = Some(name))?;
            print_settings(&store, &settings);
        }
        ConfigAction::ClearDefaultRef => {
            let settings = store.update(|s| s.default_ref = None)?;
            print_settings(&store, &settings);
        }
    }

    Ok(())
}
