//! Local state configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[storage]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Keep the conversation id across runs
    pub persist_conversation: bool,
    /// State file location; defaults to `<data dir>/parley/state.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_conversation: true,
            state_file: None,
        }
    }
}

impl StorageConfig {
    /// Resolved state file path, if one can be determined on this platform.
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state_file
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("parley").join("state.json")))
    }
}
