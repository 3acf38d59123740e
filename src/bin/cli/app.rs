use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use cardpacks_lib::config::EngineConfig;
use cardpacks_lib::practice::{Deck, PackKind, PackStore, SessionRegistry};
use cardpacks_lib::storage::{self, FileKeyValueStore, PracticeStorage};

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub config: EngineConfig,
}

impl App {
    /// Resolve the data directory and load its config
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let base_dir = match data_dir {
            Some(dir) => dir,
            None => storage::default_data_dir().context("Failed to get data directory")?,
        };
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create data directory {}", base_dir.display()))?;

        let config = EngineConfig::load(&base_dir)
            .with_context(|| format!("Failed to load config from {}", base_dir.display()))?;
        let data_dir = config.data_dir.clone().unwrap_or(base_dir);

        log::debug!("Using data directory {}", data_dir.display());
        Ok(Self { data_dir, config })
    }

    pub fn storage(&self) -> Result<PracticeStorage<FileKeyValueStore>> {
        PracticeStorage::open_dir(self.data_dir.clone(), self.config.storage_keys())
            .context("Failed to open pack storage")
    }

    pub fn registry(&self) -> Result<SessionRegistry<FileKeyValueStore>> {
        Ok(SessionRegistry::with_config(self.storage()?, &self.config))
    }

    pub fn load_pack_store(&self) -> Result<PackStore> {
        Ok(self.storage()?.load_pack_store())
    }

    /// Read a deck file produced by the card generator
    pub fn load_deck(path: &Path) -> Result<Deck> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read deck {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deck {}", path.display()))
    }

    pub fn parse_pack(name: &str) -> Result<PackKind> {
        match name.parse::<PackKind>() {
            Ok(pack) => Ok(pack),
            Err(e) => bail!(e),
        }
    }
}
