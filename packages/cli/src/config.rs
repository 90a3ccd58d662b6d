use pagecraft_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Pagecraft configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the file-backed draft store
    #[serde(default = "default_drafts_dir")]
    pub drafts_dir: String,

    /// History and persistence tunables
    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_drafts_dir() -> String {
    ".pagecraft/drafts".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to the drafts directory
    pub fn get_drafts_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.drafts_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drafts_dir: default_drafts_dir(),
            editor: EditorConfig::default(),
        }
    }
}
