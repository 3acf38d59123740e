//! Pack store persistence

use std::collections::BTreeSet;

use super::{KeyValueStore, PersistOutcome, PracticeStorage, Result};
use crate::practice::PackStore;

impl<S: KeyValueStore> PracticeStorage<S> {
    /// Load the pack store, falling back to an empty one on missing or corrupt data
    pub fn load_pack_store(&self) -> PackStore {
        match self.kv.get(&self.keys.pack_store) {
            Ok(Some(content)) => match serde_json::from_str::<PackStore>(&content) {
                Ok(store) => store.normalize(),
                Err(e) => {
                    log::warn!("Pack store is corrupt, starting empty: {}", e);
                    PackStore::default()
                }
            },
            Ok(None) => PackStore::default(),
            Err(e) => {
                log::warn!("Pack store unavailable, starting empty: {}", e);
                PackStore::default()
            }
        }
    }

    /// Save the pack store. Failures are logged and reported, never raised.
    pub fn save_pack_store(&mut self, store: &PackStore) -> PersistOutcome {
        let result = self.write_pack_store(store);
        PersistOutcome::from_result(result, "pack store")
    }

    fn write_pack_store(&mut self, store: &PackStore) -> Result<()> {
        let json = serde_json::to_string(store)?;
        self.kv.set(&self.keys.pack_store, &json)
    }

    /// Save the pack store and the archived-session set in one batch
    pub fn commit_archive(
        &mut self,
        store: &PackStore,
        archived: &BTreeSet<String>,
    ) -> PersistOutcome {
        let result = self.write_archive(store, archived);
        PersistOutcome::from_result(result, "archived round")
    }

    fn write_archive(&mut self, store: &PackStore, archived: &BTreeSet<String>) -> Result<()> {
        let entries = vec![
            (self.keys.pack_store.clone(), serde_json::to_string(store)?),
            (self.keys.archived_sessions.clone(), serde_json::to_string(archived)?),
        ];
        self.kv.set_batch(&entries)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::practice::{Card, CardType, PackKind};
    use crate::storage::{MemoryKeyValueStore, StorageKeys};

    fn card(id: &str) -> Card {
        Card::new(id, CardType::Qa, "front", "back")
    }

    #[test]
    fn test_load_missing_store_is_empty() {
        let storage = PracticeStorage::new(MemoryKeyValueStore::new());
        assert_eq!(storage.load_pack_store(), PackStore::default());
    }

    #[test]
    fn test_load_corrupt_store_is_empty() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("pack-store:v1", "{not json").unwrap();
        let storage = PracticeStorage::new(kv);

        assert_eq!(storage.load_pack_store(), PackStore::default());
    }

    #[test]
    fn test_load_normalizes_deleted_ids() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set(
            "pack-store:v1",
            r#"{"packs":{"favorite":[]},"deletedIds":["c1::draw::5-0","c2"]}"#,
        )
        .unwrap();
        let storage = PracticeStorage::new(kv);

        let store = storage.load_pack_store();
        assert!(store.is_deleted("c1"));
        assert!(store.is_deleted("c2"));
        assert!(store.entries(PackKind::Mastered).is_empty());
    }

    #[test]
    fn test_save_and_reload_in_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir: PathBuf = temp_dir.path().to_path_buf();

        let mut store = PackStore::default();
        store.upsert_at(PackKind::Mastered, &card("m1"), 10);
        store.tombstone("gone");

        {
            let mut storage =
                PracticeStorage::open_dir(data_dir.clone(), StorageKeys::default()).unwrap();
            assert_eq!(storage.save_pack_store(&store), PersistOutcome::Saved);
        }

        let storage = PracticeStorage::open_dir(data_dir, StorageKeys::default()).unwrap();
        assert_eq!(storage.load_pack_store(), store);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set_fail_writes(true);
        let mut storage = PracticeStorage::new(kv);

        let outcome = storage.save_pack_store(&PackStore::default());
        assert!(!outcome.is_saved());
        assert!(matches!(outcome, PersistOutcome::Failed { .. }));
    }

    #[test]
    fn test_commit_archive_writes_both_keys() {
        let mut storage = PracticeStorage::new(MemoryKeyValueStore::new());
        let mut store = PackStore::default();
        store.upsert_at(PackKind::Fuzzy, &card("f1"), 1);
        let archived: BTreeSet<String> = ["msg-1".to_string()].into_iter().collect();

        assert!(storage.commit_archive(&store, &archived).is_saved());
        assert_eq!(storage.load_pack_store(), store);
        assert!(storage.load_archived().contains("msg-1"));
    }

    #[test]
    fn test_custom_keys() {
        let keys = StorageKeys {
            pack_store: "packs:test".to_string(),
            archived_sessions: "archived:test".to_string(),
        };
        let mut storage = PracticeStorage::with_keys(MemoryKeyValueStore::new(), keys);
        storage.save_pack_store(&PackStore::default());

        assert!(storage.kv().get("packs:test").unwrap().is_some());
        assert!(storage.kv().get("pack-store:v1").unwrap().is_none());
    }
}
