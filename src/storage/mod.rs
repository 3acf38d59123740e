//! Durable storage for card packs and archived sessions
//!
//! Everything is kept in a string-keyed JSON key-value store:
//! - `pack-store:v1` holds the [`PackStore`](crate::practice::PackStore)
//! - `archived-sessions:v1` holds the archived session ids
//!
//! Reads are fail-soft (missing or corrupt data degrades to empty defaults)
//! and writes report a [`PersistOutcome`] instead of failing the caller.

mod archived;
mod kv;
mod pack_store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Result of a best-effort durable write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PersistOutcome {
    Saved,
    Failed { error: String },
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    fn from_result(result: Result<()>, what: &str) -> Self {
        match result {
            Ok(()) => Self::Saved,
            Err(e) => {
                log::warn!("Failed to save {}: {}", what, e);
                Self::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Key names used in the key-value store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageKeys {
    pub pack_store: String,
    pub archived_sessions: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            pack_store: "pack-store:v1".to_string(),
            archived_sessions: "archived-sessions:v1".to_string(),
        }
    }
}

/// Typed access to the pack store and archived-session registry
pub struct PracticeStorage<S: KeyValueStore> {
    kv: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> PracticeStorage<S> {
    pub fn new(kv: S) -> Self {
        Self::with_keys(kv, StorageKeys::default())
    }

    pub fn with_keys(kv: S, keys: StorageKeys) -> Self {
        Self { kv, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }
}

impl PracticeStorage<FileKeyValueStore> {
    /// Open file-backed storage under `data_dir`
    pub fn open_dir(data_dir: PathBuf, keys: StorageKeys) -> Result<Self> {
        let kv = FileKeyValueStore::open(data_dir.join("store"))?;
        Ok(Self::with_keys(kv, keys))
    }
}

/// Default per-installation data directory
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|p| p.join("cardpacks"))
        .ok_or(StorageError::DataDirNotFound)
}
