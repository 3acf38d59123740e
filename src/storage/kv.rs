//! Key-value backends
//!
//! File layout under the store directory:
//! ```text
//! store/
//! ├── pack-store_3av1.json         # one file per key
//! ├── archived-sessions_3av1.json
//! └── batch.journal                # only present while a batch is being applied
//! ```
//!
//! Keys are escaped into file names one-to-one: `[a-z0-9-]` is kept and every
//! other byte becomes `_xx` (lowercase hex), so `a:b` and `a_b` never share a file.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Result, StorageError};

/// String-keyed store of JSON documents
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Write several keys so a reader sees all of them or none after a restart
    fn set_batch(&mut self, entries: &[(String, String)]) -> Result<()>;
}

/// A batch recorded before it is applied
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchJournal {
    id: Uuid,
    created_at: DateTime<Utc>,
    entries: Vec<(String, String)>,
}

const JOURNAL_FILE: &str = "batch.journal";

/// One JSON file per key in a directory
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open the store, creating the directory and finishing any interrupted batch
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        let store = Self { dir };
        store.replay_journal()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key to its file, e.g. `pack-store:v1` -> `pack-store_3av1.json`
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.dir.join(key_file_name(key)?))
    }

    fn journal_path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }

    /// Atomic write (write to .tmp then rename)
    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Drop the journal of a batch that failed while this process was running.
    ///
    /// Left in place, it would be replayed on the next open over any value
    /// written after the failure.
    fn discard_journal(&self) {
        let path = self.journal_path();
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Failed to remove batch journal {}: {}", path.display(), e);
            }
        }
    }

    fn apply(&self, entries: &[(String, String)]) -> Result<()> {
        for (key, value) in entries {
            Self::write_atomic(&self.key_path(key)?, value)?;
        }
        Ok(())
    }

    fn replay_journal(&self) -> Result<()> {
        let path = self.journal_path();
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<BatchJournal>(&content) {
            Ok(journal) => {
                log::info!(
                    "Replaying interrupted batch {} from {}",
                    journal.id,
                    journal.created_at
                );
                self.apply(&journal.entries)?;
            }
            Err(e) => {
                // A torn journal means the batch never started applying
                log::warn!("Discarding unreadable batch journal: {}", e);
            }
        }

        fs::remove_file(&path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        self.discard_journal();
        Self::write_atomic(&path, value)
    }

    fn set_batch(&mut self, entries: &[(String, String)]) -> Result<()> {
        // Validate every key before anything touches disk
        for (key, _) in entries {
            self.key_path(key)?;
        }

        let journal = BatchJournal {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            entries: entries.to_vec(),
        };
        Self::write_atomic(&self.journal_path(), &serde_json::to_string(&journal)?)?;

        if let Err(e) = self.apply(entries) {
            log::warn!("Batch {} failed, discarding its journal: {}", journal.id, e);
            self.discard_journal();
            return Err(e);
        }
        fs::remove_file(self.journal_path())?;
        Ok(())
    }
}

/// Escape a key into a file name, keeping distinct keys in distinct files
fn key_file_name(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    let mut name = String::with_capacity(key.len() + 5);
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => name.push(byte as char),
            _ => {
                let _ = write!(name, "_{:02x}", byte);
            }
        }
    }
    name.push_str(".json");
    Ok(name)
}

/// In-process store for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, as an unavailable backend would
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_batch(&mut self, entries: &[(String, String)]) -> Result<()> {
        self.check_writable()?;
        for (key, value) in entries {
            self.values.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileKeyValueStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(temp_dir.path().join("store")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_get_missing_key() {
        let (store, _temp) = create_test_store();
        assert_eq!(store.get("pack-store:v1").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let (mut store, _temp) = create_test_store();
        store.set("pack-store:v1", "{\"a\":1}").unwrap();

        assert_eq!(store.get("pack-store:v1").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.dir().join("pack-store_3av1.json").exists());
        assert!(!store.dir().join("pack-store_3av1.json.tmp").exists());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let (mut store, _temp) = create_test_store();
        assert!(matches!(store.set("", "x"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_key_file_names_are_distinct() {
        assert_eq!(key_file_name("pack-store:v1").unwrap(), "pack-store_3av1.json");
        assert_eq!(key_file_name(".hidden").unwrap(), "_2ehidden.json");
        assert_ne!(key_file_name("a:b").unwrap(), key_file_name("a_b").unwrap());
        assert_ne!(key_file_name("A").unwrap(), key_file_name("a").unwrap());
        assert_ne!(key_file_name("../x").unwrap(), key_file_name("__x").unwrap());
    }

    #[test]
    fn test_similar_keys_do_not_overwrite_each_other() {
        let (mut store, _temp) = create_test_store();
        store.set("a:b", "packs").unwrap();
        store.set("a_b", "archived").unwrap();

        assert_eq!(store.get("a:b").unwrap().as_deref(), Some("packs"));
        assert_eq!(store.get("a_b").unwrap().as_deref(), Some("archived"));
    }

    #[test]
    fn test_set_batch_writes_all_and_clears_journal() {
        let (mut store, _temp) = create_test_store();
        store
            .set_batch(&[
                ("a:v1".to_string(), "1".to_string()),
                ("b:v1".to_string(), "2".to_string()),
            ])
            .unwrap();

        assert_eq!(store.get("a:v1").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b:v1").unwrap().as_deref(), Some("2"));
        assert!(!store.dir().join(JOURNAL_FILE).exists());
    }

    #[test]
    fn test_open_replays_interrupted_batch() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("store");
        fs::create_dir_all(&dir).unwrap();

        let journal = BatchJournal {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            entries: vec![
                ("a:v1".to_string(), "1".to_string()),
                ("b:v1".to_string(), "2".to_string()),
            ],
        };
        fs::write(dir.join(JOURNAL_FILE), serde_json::to_string(&journal).unwrap()).unwrap();
        // First half applied before the interruption
        fs::write(dir.join("a_3av1.json"), "1").unwrap();

        let store = FileKeyValueStore::open(dir.clone()).unwrap();
        assert_eq!(store.get("a:v1").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b:v1").unwrap().as_deref(), Some("2"));
        assert!(!dir.join(JOURNAL_FILE).exists());
    }

    #[test]
    fn test_failed_batch_does_not_resurface_after_later_write() {
        let (mut store, temp) = create_test_store();
        let dir = temp.path().join("store");

        // A non-empty directory where b's file goes makes the batch fail midway
        let blocker = dir.join("b_3av1.json");
        fs::create_dir_all(blocker.join("inner")).unwrap();

        let result = store.set_batch(&[
            ("a:v1".to_string(), "old".to_string()),
            ("b:v1".to_string(), "1".to_string()),
        ]);
        assert!(result.is_err());
        assert!(!dir.join(JOURNAL_FILE).exists());

        store.set("a:v1", "new").unwrap();
        assert_eq!(store.get("a:v1").unwrap().as_deref(), Some("new"));

        fs::remove_dir_all(&blocker).unwrap();
        let reopened = FileKeyValueStore::open(dir).unwrap();
        assert_eq!(reopened.get("a:v1").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_set_drops_stale_journal() {
        let (mut store, temp) = create_test_store();
        let dir = temp.path().join("store");

        let journal = BatchJournal {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            entries: vec![("a:v1".to_string(), "old".to_string())],
        };
        fs::write(dir.join(JOURNAL_FILE), serde_json::to_string(&journal).unwrap()).unwrap();

        store.set("a:v1", "new").unwrap();
        let reopened = FileKeyValueStore::open(dir).unwrap();
        assert_eq!(reopened.get("a:v1").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_open_discards_torn_journal() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("store");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(JOURNAL_FILE), "{\"id\":").unwrap();

        let store = FileKeyValueStore::open(dir.clone()).unwrap();
        assert_eq!(store.get("a:v1").unwrap(), None);
        assert!(!dir.join(JOURNAL_FILE).exists());
    }

    #[test]
    fn test_memory_store_write_failure() {
        let mut store = MemoryKeyValueStore::new();
        store.set("k", "v").unwrap();
        store.set_fail_writes(true);

        assert!(store.set("k", "w").is_err());
        assert!(store.set_batch(&[("k".to_string(), "w".to_string())]).is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
