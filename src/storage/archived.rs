//! Registry of sessions whose rounds were filed into packs

use std::collections::BTreeSet;

use super::{KeyValueStore, PersistOutcome, PracticeStorage, Result};

impl<S: KeyValueStore> PracticeStorage<S> {
    /// Load archived session ids, falling back to none on missing or corrupt data
    pub fn load_archived(&self) -> BTreeSet<String> {
        match self.kv.get(&self.keys.archived_sessions) {
            Ok(Some(content)) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    log::warn!("Archived sessions are corrupt, starting empty: {}", e);
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                log::warn!("Archived sessions unavailable, starting empty: {}", e);
                BTreeSet::new()
            }
        }
    }

    pub fn save_archived(&mut self, archived: &BTreeSet<String>) -> PersistOutcome {
        let result = self.write_archived(archived);
        PersistOutcome::from_result(result, "archived sessions")
    }

    fn write_archived(&mut self, archived: &BTreeSet<String>) -> Result<()> {
        let json = serde_json::to_string(archived)?;
        self.kv.set(&self.keys.archived_sessions, &json)
    }

    /// Add a session to the registry. Saving is skipped when it is already there.
    pub fn mark_archived(&mut self, session_id: &str) -> PersistOutcome {
        let mut archived = self.load_archived();
        if !archived.insert(session_id.to_string()) {
            return PersistOutcome::Saved;
        }
        self.save_archived(&archived)
    }

    pub fn is_archived(&self, session_id: &str) -> bool {
        self.load_archived().contains(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    #[test]
    fn test_load_missing_registry_is_empty() {
        let storage = PracticeStorage::new(MemoryKeyValueStore::new());
        assert!(storage.load_archived().is_empty());
    }

    #[test]
    fn test_load_corrupt_registry_is_empty() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("archived-sessions:v1", "{\"not\":\"a list\"}").unwrap();
        let storage = PracticeStorage::new(kv);
        assert!(storage.load_archived().is_empty());
    }

    #[test]
    fn test_mark_archived_is_idempotent() {
        let mut storage = PracticeStorage::new(MemoryKeyValueStore::new());

        assert!(storage.mark_archived("msg-1").is_saved());
        assert!(storage.mark_archived("msg-1").is_saved());
        assert!(storage.mark_archived("msg-2").is_saved());

        let archived = storage.load_archived();
        assert_eq!(archived.len(), 2);
        assert!(storage.is_archived("msg-1"));
        assert!(!storage.is_archived("msg-3"));

        let raw = storage.kv().get("archived-sessions:v1").unwrap().unwrap();
        assert_eq!(raw, r#"["msg-1","msg-2"]"#);
    }

    #[test]
    fn test_mark_archived_failure_is_reported() {
        let mut storage = PracticeStorage::new(MemoryKeyValueStore::new());
        storage.kv_mut().set_fail_writes(true);

        assert!(!storage.mark_archived("msg-1").is_saved());
        assert!(!storage.is_archived("msg-1"));
    }
}
