use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Default source for the diagram renderer loaded after first interaction.
const DEFAULT_DIAGRAM_SCRIPT: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Feature flags for the enhancement layer. A missing file means defaults;
/// everything defaults to enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Gates whether the navigation controller installs any listeners.
    pub client_navigation: bool,
    pub diagrams: bool,
    pub diagram_script_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_navigation: true,
            diagrams: true,
            diagram_script_url: DEFAULT_DIAGRAM_SCRIPT.to_string(),
        }
    }
}

impl Settings {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, SettingsError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }
}
