//! Per-session practice state and its lifecycle operations
//!
//! A session moves through these derived states:
//!
//! ```text
//! Fresh (queue non-empty) --last card--> RoundComplete (queue empty, not archived)
//! RoundComplete --restart--> Fresh
//! RoundComplete --save_round_to_packs--> Archived (queue empty, archived)
//! Archived/RoundComplete --select_pack + draw--> Fresh
//! ```
//!
//! Operations mutate in place and never persist on their own; the caller
//! (normally [`SessionRegistry`](super::registry::SessionRegistry)) writes the
//! pack store afterwards and re-derives the view.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::Rng;

use super::draw::{draw_cards, DEFAULT_DRAW_SIZE};
use super::identity::base_id;
use super::models::{now_millis, Card, Counts, Deck, PackKind, PackStore, Quality};

/// What a pack selection did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackSelection {
    /// A round is in progress; switching source is not allowed
    Locked,
    /// The pack is selected but has no entries to draw
    Empty,
    /// A new round of this many cards was drawn
    Drawn(usize),
}

/// Cards filed by [`SessionState::save_round_to_packs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiledCards {
    pub fuzzy: usize,
    pub mastered: usize,
}

/// In-memory state of one practice session
#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: String,
    topic: String,
    current_title: String,
    queue: VecDeque<Card>,
    original: Vec<Card>,
    status: HashMap<String, Quality>,
    counts: Counts,
    archived: bool,
    store: PackStore,
    selected_pack: PackKind,
    draw_size: usize,
}

impl SessionState {
    /// Build the state for a session.
    ///
    /// An archived session starts with an empty round. Tombstoned cards and
    /// repeated instance ids in the deck are dropped.
    pub fn new(
        session_id: impl Into<String>,
        deck: &Deck,
        store: PackStore,
        archived: bool,
    ) -> Self {
        let session_id = session_id.into();

        let original: Vec<Card> = if archived {
            Vec::new()
        } else {
            let mut seen = HashSet::new();
            deck.cards
                .iter()
                .filter(|c| !store.is_deleted(&c.id))
                .filter(|c| seen.insert(c.id.clone()))
                .cloned()
                .collect()
        };

        if deck.cards.is_empty() {
            log::debug!("Session {} has no cards to practice", session_id);
        }

        Self {
            session_id,
            topic: deck.topic.clone(),
            current_title: deck.topic.clone(),
            queue: original.iter().cloned().collect(),
            original,
            status: HashMap::new(),
            counts: Counts::default(),
            archived,
            store,
            selected_pack: PackKind::default(),
            draw_size: DEFAULT_DRAW_SIZE,
        }
    }

    /// Override the number of cards a pack draw yields
    pub fn with_draw_size(mut self, draw_size: usize) -> Self {
        self.draw_size = draw_size;
        self
    }

    // ===== Accessors =====

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn title(&self) -> &str {
        &self.current_title
    }

    pub fn queue(&self) -> &VecDeque<Card> {
        &self.queue
    }

    pub fn original(&self) -> &[Card] {
        &self.original
    }

    pub fn status(&self) -> &HashMap<String, Quality> {
        &self.status
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn store(&self) -> &PackStore {
        &self.store
    }

    pub fn selected_pack(&self) -> PackKind {
        self.selected_pack
    }

    pub fn draw_size(&self) -> usize {
        self.draw_size
    }

    /// Card on top of the queue
    pub fn current_card(&self) -> Option<&Card> {
        self.queue.front()
    }

    // ===== Lifecycle operations =====

    /// Record a quality for the current card.
    ///
    /// A "don't know" card goes to the back of the queue and stays in the
    /// round until answered with fuzzy or known. Returns false when the queue
    /// is empty.
    pub fn mark_quality(&mut self, quality: Quality) -> bool {
        let Some(card) = self.queue.pop_front() else {
            return false;
        };

        if let Some(previous) = self.status.insert(card.id.clone(), quality) {
            self.counts.remove(previous);
        }
        self.counts.add(quality);

        log::debug!(
            "Session {}: marked {} as {}",
            self.session_id,
            card.id,
            quality.value()
        );

        if quality == Quality::DontKnow {
            self.queue.push_back(card);
        }
        true
    }

    /// Start the current round over. Returns false when there is no round.
    pub fn restart(&mut self) -> bool {
        if self.original.is_empty() {
            return false;
        }

        self.archived = false;
        self.queue = self.original.iter().cloned().collect();
        self.status.clear();
        self.counts = Counts::default();
        self.current_title = self.topic.clone();
        true
    }

    /// Permanently delete the current card.
    ///
    /// Every instance of the card leaves the round, the packs, and the
    /// status map, and its base id is tombstoned. Returns the deleted base id.
    pub fn delete_card(&mut self) -> Option<String> {
        let id = self.current_card()?.base_id().to_string();

        self.store.tombstone(&id);
        self.purge_deleted();

        log::info!("Session {}: deleted card {}", self.session_id, id);
        Some(id)
    }

    /// Toggle the current card in the favorite pack.
    ///
    /// Returns the new membership, or None when the queue is empty.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        let card = self.current_card()?.clone();

        if self.store.contains(PackKind::Favorite, &card.id) {
            self.store.remove(PackKind::Favorite, &card.id);
            Some(false)
        } else {
            Some(self.store.upsert(PackKind::Favorite, &card))
        }
    }

    /// File the round's fuzzy and known cards into their packs and archive the round.
    ///
    /// "Don't know" cards are not filed; they survive only if favorited.
    pub fn save_round_to_packs(&mut self) -> FiledCards {
        let now = now_millis();
        let mut filed_ids: HashSet<(PackKind, String)> = HashSet::new();

        // Walk the round in order so equal timestamps keep a stable pack order
        for instance in &self.original {
            let Some(quality) = self.status.get(&instance.id) else {
                continue;
            };
            let Some(pack) = quality.target_pack() else {
                continue;
            };

            if self.store.upsert_at(pack, instance, now) {
                filed_ids.insert((pack, instance.base_id().to_string()));
            }
        }

        let filed = FiledCards {
            fuzzy: filed_ids.iter().filter(|(p, _)| *p == PackKind::Fuzzy).count(),
            mastered: filed_ids.iter().filter(|(p, _)| *p == PackKind::Mastered).count(),
        };

        self.queue.clear();
        self.original.clear();
        self.status.clear();
        self.counts = Counts::default();
        self.archived = true;

        log::info!(
            "Session {}: archived round ({} fuzzy, {} mastered)",
            self.session_id,
            filed.fuzzy,
            filed.mastered
        );
        filed
    }

    /// Select a pack as the practice source and draw a round from it.
    ///
    /// Refused while a round is in progress.
    pub fn select_pack<R: Rng>(&mut self, pack: PackKind, rng: &mut R) -> PackSelection {
        if !self.queue.is_empty() {
            return PackSelection::Locked;
        }

        self.selected_pack = pack;
        match self.draw_from_pack(pack, rng) {
            0 => PackSelection::Empty,
            n => PackSelection::Drawn(n),
        }
    }

    /// Replace the round with cards drawn from a pack. Returns the number drawn.
    ///
    /// An empty pack leaves the state untouched.
    pub fn draw_from_pack<R: Rng>(&mut self, pack: PackKind, rng: &mut R) -> usize {
        let drawn = draw_cards(self.store.entries(pack), self.draw_size, now_millis(), rng);
        if drawn.is_empty() {
            return 0;
        }

        let count = drawn.len();
        self.archived = false;
        self.current_title = pack.label().to_string();
        self.queue = drawn.iter().cloned().collect();
        self.original = drawn;
        self.status.clear();
        self.counts = Counts::default();

        log::info!(
            "Session {}: drew {} cards from the {} pack",
            self.session_id,
            count,
            pack
        );
        count
    }

    // ===== Store sync =====

    /// Adopt a newer pack store snapshot, dropping any cards it tombstones
    pub fn adopt_store(&mut self, store: PackStore) {
        self.store = store;
        self.purge_deleted();
    }

    fn purge_deleted(&mut self) {
        let store = &self.store;
        self.queue.retain(|c| !store.is_deleted(&c.id));
        self.original.retain(|c| !store.is_deleted(&c.id));

        let counts = &mut self.counts;
        self.status.retain(|id, quality| {
            if store.is_deleted(base_id(id)) {
                counts.remove(*quality);
                false
            } else {
                true
            }
        });
    }
}
