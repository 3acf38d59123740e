//! Owned cache of live sessions and the single path to durable storage
//!
//! Every mutating call takes `&mut self`, so the registry serializes all writes
//! to the shared pack store. After a write, the new snapshot is pushed into
//! every other cached session so none of them can later overwrite it with a
//! stale working copy.

use std::collections::{BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use super::draw::DEFAULT_DRAW_SIZE;
use super::models::{Deck, PackKind, PackStore, Quality};
use super::session::{FiledCards, PackSelection, SessionState};
use super::view::SessionView;
use crate::config::EngineConfig;
use crate::storage::{KeyValueStore, PersistOutcome, PracticeStorage};

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

pub type Result<T> = std::result::Result<T, PracticeError>;

/// Result of an action on a session, with the view to redraw from
#[derive(Debug, Clone)]
pub struct ActionOutcome<T> {
    pub result: T,
    pub view: SessionView,
    /// Durable write made by this action, if any
    pub persisted: Option<PersistOutcome>,
}

pub struct SessionRegistry<S: KeyValueStore> {
    storage: PracticeStorage<S>,
    sessions: HashMap<String, SessionState>,
    /// In-memory authoritative pack store, loaded on first use
    snapshot: Option<PackStore>,
    archived: Option<BTreeSet<String>>,
    /// The archived set has ids a failed write never stored
    archived_dirty: bool,
    draw_size: usize,
    rng: StdRng,
}

impl<S: KeyValueStore> SessionRegistry<S> {
    pub fn new(storage: PracticeStorage<S>) -> Self {
        Self {
            storage,
            sessions: HashMap::new(),
            snapshot: None,
            archived: None,
            archived_dirty: false,
            draw_size: DEFAULT_DRAW_SIZE,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_config(storage: PracticeStorage<S>, config: &EngineConfig) -> Self {
        let mut registry = Self::new(storage);
        registry.draw_size = config.draw_size;
        registry
    }

    /// Use a fixed random source for draws
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn storage(&self) -> &PracticeStorage<S> {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut PracticeStorage<S> {
        &mut self.storage
    }

    // ===== Sessions =====

    /// Get or create the state for a session and return its view.
    ///
    /// The deck is only read the first time a session id is seen.
    pub fn open(&mut self, session_id: &str, deck: &Deck) -> SessionView {
        if !self.sessions.contains_key(session_id) {
            let archived = self.archived_set().contains(session_id);
            let store = self.pack_store().clone();
            let state = SessionState::new(session_id, deck, store, archived)
                .with_draw_size(self.draw_size);

            log::debug!(
                "Opened session {} ({} cards, archived: {})",
                session_id,
                state.queue().len(),
                archived
            );
            self.sessions.insert(session_id.to_string(), state);
        }

        SessionView::from_state(&self.sessions[session_id])
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionState> {
        self.sessions.get(session_id)
    }

    pub fn view(&self, session_id: &str) -> Result<SessionView> {
        self.session(session_id)
            .map(SessionView::from_state)
            .ok_or_else(|| PracticeError::SessionNotFound(session_id.to_string()))
    }

    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Current pack store shared by every session
    pub fn pack_store(&mut self) -> &PackStore {
        let storage = &self.storage;
        self.snapshot.get_or_insert_with(|| storage.load_pack_store())
    }

    fn archived_set(&mut self) -> &mut BTreeSet<String> {
        let storage = &self.storage;
        self.archived.get_or_insert_with(|| storage.load_archived())
    }

    fn state_mut(&mut self, session_id: &str) -> Result<&mut SessionState> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| PracticeError::SessionNotFound(session_id.to_string()))
    }

    fn outcome<T>(
        &self,
        session_id: &str,
        result: T,
        persisted: Option<PersistOutcome>,
    ) -> ActionOutcome<T> {
        ActionOutcome {
            result,
            view: SessionView::from_state(&self.sessions[session_id]),
            persisted,
        }
    }

    // ===== Actions =====

    pub fn mark_quality(
        &mut self,
        session_id: &str,
        quality: Quality,
    ) -> Result<ActionOutcome<bool>> {
        let marked = self.state_mut(session_id)?.mark_quality(quality);
        Ok(self.outcome(session_id, marked, None))
    }

    pub fn restart(&mut self, session_id: &str) -> Result<ActionOutcome<bool>> {
        let restarted = self.state_mut(session_id)?.restart();
        Ok(self.outcome(session_id, restarted, None))
    }

    /// Delete the current card everywhere. Returns the tombstoned base id.
    pub fn delete_card(&mut self, session_id: &str) -> Result<ActionOutcome<Option<String>>> {
        let deleted = self.state_mut(session_id)?.delete_card();
        let persisted = deleted.as_ref().map(|_| self.sync_store(session_id));
        Ok(self.outcome(session_id, deleted, persisted))
    }

    /// Toggle the current card in the favorite pack. Returns the new membership.
    pub fn toggle_favorite(&mut self, session_id: &str) -> Result<ActionOutcome<Option<bool>>> {
        let favorited = self.state_mut(session_id)?.toggle_favorite();
        let persisted = favorited.map(|_| self.sync_store(session_id));
        Ok(self.outcome(session_id, favorited, persisted))
    }

    /// File the round into packs and archive the session in a single durable write
    pub fn save_round_to_packs(&mut self, session_id: &str) -> Result<ActionOutcome<FiledCards>> {
        let filed = self.state_mut(session_id)?.save_round_to_packs();
        let store = self.broadcast_store(session_id);

        self.archived_set().insert(session_id.to_string());
        let archived = self.archived_set().clone();
        let persisted = self.storage.commit_archive(&store, &archived);
        self.archived_dirty = !persisted.is_saved();

        Ok(self.outcome(session_id, filed, Some(persisted)))
    }

    /// Switch the practice source; draws a new round when the queue is empty
    pub fn select_pack(
        &mut self,
        session_id: &str,
        pack: PackKind,
    ) -> Result<ActionOutcome<PackSelection>> {
        let state = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PracticeError::SessionNotFound(session_id.to_string()))?;
        let selection = state.select_pack(pack, &mut self.rng);
        Ok(self.outcome(session_id, selection, None))
    }

    /// Record a session as archived without filing any cards
    pub fn mark_archived(&mut self, session_id: &str) -> PersistOutcome {
        let added = self.archived_set().insert(session_id.to_string());
        if !added && !self.archived_dirty {
            return PersistOutcome::Saved;
        }

        let archived = self.archived_set().clone();
        let persisted = self.storage.save_archived(&archived);
        self.archived_dirty = !persisted.is_saved();
        persisted
    }

    pub fn is_archived(&mut self, session_id: &str) -> bool {
        self.archived_set().contains(session_id)
    }

    // ===== Store sync =====

    /// Make `origin`'s store the shared snapshot and hand it to every other session
    fn broadcast_store(&mut self, origin: &str) -> PackStore {
        let store = self.sessions[origin].store().clone();
        for (id, state) in self.sessions.iter_mut() {
            if id != origin {
                state.adopt_store(store.clone());
            }
        }
        self.snapshot = Some(store.clone());
        store
    }

    fn sync_store(&mut self, origin: &str) -> PersistOutcome {
        let store = self.broadcast_store(origin);
        self.storage.save_pack_store(&store)
    }
}
