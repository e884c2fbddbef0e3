//! Settings and well-known file locations.

use anyhow::{Context, Result};
use shared::settings::BridgeSettings;
use std::path::{Path, PathBuf};

pub const ASSISTANT_BIN_ENV: &str = "MAILBRIDGE_ASSISTANT_BIN";
pub const RUNTIME_ENV: &str = "MAILBRIDGE_RUNTIME";

const ACCOUNTS_FILE: &str = "google_accounts.json";
const TOOL_SETTINGS_FILE: &str = "settings.json";

/// Bridge settings file under the per-user config directory.
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Mail Bridge", "MailBridge")
        .map(|p| p.config_dir().join("settings.json"))
}

/// The assistant's own per-user directory (`~/.gemini`).
pub fn assistant_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".gemini"))
}

/// Active-account document maintained by the assistant.
pub fn accounts_path() -> Option<PathBuf> {
    assistant_home().map(|h| h.join(ACCOUNTS_FILE))
}

/// The assistant's settings document, where tool servers are registered.
pub fn tool_settings_path() -> Option<PathBuf> {
    assistant_home().map(|h| h.join(TOOL_SETTINGS_FILE))
}

/// Load settings from `path`, returning `None` if missing or malformed.
pub fn load_settings_from(path: &Path) -> Option<BridgeSettings> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<BridgeSettings>(&contents) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("ignoring malformed settings at {}: {}", path.display(), e);
            None
        }
    }
}

/// Load settings from disk or return defaults, then apply environment overrides.
///
/// The flag reports whether a settings file was found.
pub fn load_settings_or_default() -> (BridgeSettings, bool) {
    let (mut settings, loaded) = match config_path().and_then(|p| load_settings_from(&p)) {
        Some(settings) => (settings, true),
        None => (BridgeSettings::default(), false),
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    (settings, loaded)
}

/// Override binary and runtime from the environment. An empty runtime runs the binary directly.
pub fn apply_env_overrides<F>(settings: &mut BridgeSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bin) = lookup(ASSISTANT_BIN_ENV).filter(|v| !v.trim().is_empty()) {
        settings.assistant_binary = bin.trim().to_string();
    }
    if let Some(runtime) = lookup(RUNTIME_ENV) {
        let runtime = runtime.trim();
        settings.runtime = (!runtime.is_empty()).then(|| runtime.to_string());
    }
}

pub fn save_settings_to(path: &Path, settings: &BridgeSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Save settings to the default location.
pub fn save_settings(settings: &BridgeSettings) -> Result<()> {
    let path = config_path().context("no config directory available")?;
    save_settings_to(&path, settings)
}
