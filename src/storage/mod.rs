//! Persisted conversation identifier.
//!
//! State lives in a small JSON object on disk. Only the
//! [`CONVERSATION_KEY`] entry is managed here; other keys are preserved.

use crate::config::StorageConfig;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which the conversation id is stored.
pub const CONVERSATION_KEY: &str = "chat_conversation_id";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Generate a fresh conversation id.
pub fn new_conversation_id() -> String {
    format!("conv_{}", uuid::Uuid::new_v4())
}

/// Durable home of the conversation id.
///
/// A disabled store never touches the filesystem and hands out a new id per call.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    path: Option<PathBuf>,
}

impl ConversationStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        if !config.persist_conversation {
            return Self::disabled();
        }
        match config.state_path() {
            Some(path) => Self::open(path),
            None => {
                tracing::warn!("No data directory available, conversation id will not persist");
                Self::disabled()
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// The stored id, if any.
    pub fn get(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        read_state(path)
            .get(CONVERSATION_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
    }

    /// Return the stored id, generating and saving one if none exists.
    pub fn load_or_create(&self) -> Result<String, StorageError> {
        if let Some(id) = self.get() {
            tracing::debug!(conversation_id = %id, "Resumed stored conversation");
            return Ok(id);
        }
        self.rotate()
    }

    /// Replace the stored id with a fresh one.
    pub fn rotate(&self) -> Result<String, StorageError> {
        let id = new_conversation_id();
        if let Some(path) = self.path.as_deref() {
            let mut state = read_state(path);
            state.insert(CONVERSATION_KEY.to_string(), Value::String(id.clone()));
            write_state(path, &state)?;
            tracing::debug!(conversation_id = %id, path = %path.display(), "Stored new conversation id");
        }
        Ok(id)
    }

    /// Forget the stored id.
    pub fn clear(&self) -> Result<(), StorageError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let mut state = read_state(path);
        if state.remove(CONVERSATION_KEY).is_some() {
            write_state(path, &state)?;
        }
        Ok(())
    }
}

/// Missing or unreadable state reads as empty.
fn read_state(path: &Path) -> Map<String, Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read state file");
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!(path = %path.display(), "Ignoring corrupt state file");
            Map::new()
        }
    }
}

fn write_state(path: &Path, state: &Map<String, Value>) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
