//! Engine configuration
//!
//! Read from `<data dir>/config.toml`:
//! ```toml
//! drawSize = 10
//! packStoreKey = "pack-store:v1"
//! archivedSessionsKey = "archived-sessions:v1"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::practice::DEFAULT_DRAW_SIZE;
use crate::storage::StorageKeys;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Cards per round drawn from a pack
    pub draw_size: usize,
    pub pack_store_key: String,
    pub archived_sessions_key: String,
    /// Overrides the default data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let keys = StorageKeys::default();
        Self {
            draw_size: DEFAULT_DRAW_SIZE,
            pack_store_key: keys.pack_store,
            archived_sessions_key: keys.archived_sessions,
            data_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load `config.toml` from a data directory; a missing file gives defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.draw_size == 0 {
            return Err(ConfigError::Invalid("drawSize must be at least 1".to_string()));
        }
        if self.pack_store_key.is_empty() || self.archived_sessions_key.is_empty() {
            return Err(ConfigError::Invalid("storage keys must not be empty".to_string()));
        }
        if self.pack_store_key == self.archived_sessions_key {
            return Err(ConfigError::Invalid(
                "packStoreKey and archivedSessionsKey must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            pack_store: self.pack_store_key.clone(),
            archived_sessions: self.archived_sessions_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = EngineConfig::load(temp_dir.path()).unwrap();

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.draw_size, 10);
        assert_eq!(config.storage_keys(), StorageKeys::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE), "drawSize = 5\n").unwrap();

        let config = EngineConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.draw_size, 5);
        assert_eq!(config.pack_store_key, "pack-store:v1");
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            EngineConfig::from_toml("drawSize = \"ten\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_toml("drawSize = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml("packStoreKey = \"same\"\narchivedSessionsKey = \"same\""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_data_dir_override() {
        let config = EngineConfig::from_toml("dataDir = \"/tmp/packs\"").unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/packs")));
    }
}
