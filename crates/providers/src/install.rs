//! Locating the assistant executable and its host runtime.

use crate::cli_process::CliCommand;
use serde::{Deserialize, Serialize};
use shared::settings::BridgeSettings;
use shared::AssistantError;
use std::path::{Path, PathBuf};

pub const SETUP_INSTRUCTIONS: &str = "Install Node.js and the Gemini CLI (npm install -g @google/gemini-cli), \
     or point `assistant_binary` in settings at an existing installation.";

/// Whether the assistant can be launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallStatus {
    /// Ready to run
    Available { command_path: PathBuf },
    /// Something required is missing
    Unavailable { reason: String },
    /// Present but needs configuration first
    NeedsSetup { instructions: String },
}

impl InstallStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, InstallStatus::Available { .. })
    }
}

/// Resolve a program given as a path or a bare name on PATH.
fn locate(program: &str) -> Option<PathBuf> {
    let trimmed = program.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = Path::new(trimmed);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    which::which(trimmed).ok()
}

/// Resolve the configured runtime and binary into a launchable command.
pub fn resolve_command(settings: &BridgeSettings) -> Result<CliCommand, AssistantError> {
    let runtime = match settings.runtime.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(locate(name).ok_or_else(|| {
            AssistantError::NotInstalled {
                hint: format!("`{}` was not found. {}", name, SETUP_INSTRUCTIONS),
            }
        })?),
        _ => None,
    };

    let binary = locate(&settings.assistant_binary).ok_or_else(|| AssistantError::NotInstalled {
        hint: format!(
            "`{}` was not found. {}",
            settings.assistant_binary, SETUP_INSTRUCTIONS
        ),
    })?;

    Ok(CliCommand {
        runtime,
        binary,
        env: settings.quiet_env.clone(),
    })
}

/// Check installation without launching anything.
pub fn check_install(settings: &BridgeSettings) -> InstallStatus {
    if settings.assistant_binary.trim().is_empty() {
        return InstallStatus::NeedsSetup {
            instructions: SETUP_INSTRUCTIONS.to_string(),
        };
    }
    match resolve_command(settings) {
        Ok(command) => InstallStatus::Available {
            command_path: command.binary,
        },
        Err(e) => InstallStatus::Unavailable {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_unavailable() {
        let settings = BridgeSettings {
            runtime: None,
            assistant_binary: "/definitely/not/here/gemini".into(),
            ..Default::default()
        };
        let status = check_install(&settings);
        assert!(matches!(status, InstallStatus::Unavailable { .. }));
        assert!(matches!(
            resolve_command(&settings),
            Err(AssistantError::NotInstalled { .. })
        ));
    }

    #[test]
    fn test_empty_binary_needs_setup() {
        let settings = BridgeSettings {
            assistant_binary: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            check_install(&settings),
            InstallStatus::NeedsSetup { .. }
        ));
    }

    #[test]
    fn test_existing_file_is_available() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gemini.js");
        std::fs::write(&script, "// stub").unwrap();

        let settings = BridgeSettings {
            runtime: None,
            assistant_binary: script.to_string_lossy().to_string(),
            ..Default::default()
        };
        let status = check_install(&settings);
        assert!(status.is_available());

        let command = resolve_command(&settings).unwrap();
        assert_eq!(command.binary, script);
        assert!(command.runtime.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_runtime_found_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gemini.js");
        std::fs::write(&script, "// stub").unwrap();

        let settings = BridgeSettings {
            runtime: Some("sh".into()),
            assistant_binary: script.to_string_lossy().to_string(),
            ..Default::default()
        };
        let command = resolve_command(&settings).unwrap();
        assert!(command.runtime.is_some());
    }
}
