//! Data models for practice sessions and card packs

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::identity::base_id;

/// Type of flashcard, as produced by the upstream generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// Question and answer
    Qa,
    /// Fill-in-the-blank
    Cloze,
    /// True or false
    Tf,
}

impl Default for CardType {
    fn default() -> Self {
        Self::Qa
    }
}

/// A study card. Immutable once generated; `id` may carry a draw suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(rename = "type", default)]
    pub card_type: CardType,
    pub front: String,
    pub back: String,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        card_type: CardType,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            card_type,
            front: front.into(),
            back: back.into(),
        }
    }

    /// Identity of the underlying card, ignoring any draw suffix
    pub fn base_id(&self) -> &str {
        base_id(&self.id)
    }

    /// Copy of this card carrying a different id
    pub fn with_id(&self, id: String) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    /// Copy of this card carrying its base id
    pub fn to_base(&self) -> Self {
        self.with_id(self.base_id().to_string())
    }
}

/// Input handed to a session by the card generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(topic: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            topic: topic.into(),
            cards,
        }
    }
}

/// Self-assessed recall for the card on top of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quality {
    /// 1: don't know, requeued within the round
    DontKnow,
    /// 2: fuzzy, filed into the fuzzy pack
    Fuzzy,
    /// 3: known, filed into the mastered pack
    Known,
}

impl Quality {
    pub fn value(self) -> u8 {
        match self {
            Self::DontKnow => 1,
            Self::Fuzzy => 2,
            Self::Known => 3,
        }
    }

    /// Pack this quality is filed into when a round is saved
    pub fn target_pack(self) -> Option<PackKind> {
        match self {
            Self::DontKnow => None,
            Self::Fuzzy => Some(PackKind::Fuzzy),
            Self::Known => Some(PackKind::Mastered),
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::DontKnow),
            2 => Ok(Self::Fuzzy),
            3 => Ok(Self::Known),
            other => Err(format!("Quality must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.value()
    }
}

/// The three named packs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    Favorite,
    Fuzzy,
    Mastered,
}

impl Default for PackKind {
    fn default() -> Self {
        Self::Favorite
    }
}

impl PackKind {
    pub const ALL: [PackKind; 3] = [PackKind::Favorite, PackKind::Fuzzy, PackKind::Mastered];

    /// Title shown for a round drawn from this pack
    pub fn label(self) -> &'static str {
        match self {
            Self::Favorite => "Favorites",
            Self::Fuzzy => "Fuzzy",
            Self::Mastered => "Mastered",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Fuzzy => "fuzzy",
            Self::Mastered => "mastered",
        }
    }
}

impl fmt::Display for PackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "favorite" | "favorites" | "fav" => Ok(Self::Favorite),
            "fuzzy" => Ok(Self::Fuzzy),
            "mastered" => Ok(Self::Mastered),
            other => Err(format!(
                "Unknown pack '{}' (expected favorite, fuzzy or mastered)",
                other
            )),
        }
    }
}

/// A card filed into a pack. The card always carries its base id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackEntry {
    pub card: Card,
    /// Epoch milliseconds
    pub added_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packs {
    #[serde(default)]
    pub favorite: Vec<PackEntry>,
    #[serde(default)]
    pub fuzzy: Vec<PackEntry>,
    #[serde(default)]
    pub mastered: Vec<PackEntry>,
}

impl Packs {
    pub fn get(&self, kind: PackKind) -> &[PackEntry] {
        match kind {
            PackKind::Favorite => &self.favorite,
            PackKind::Fuzzy => &self.fuzzy,
            PackKind::Mastered => &self.mastered,
        }
    }

    fn get_mut(&mut self, kind: PackKind) -> &mut Vec<PackEntry> {
        match kind {
            PackKind::Favorite => &mut self.favorite,
            PackKind::Fuzzy => &mut self.fuzzy,
            PackKind::Mastered => &mut self.mastered,
        }
    }
}

/// Number of entries in each pack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackCounts {
    pub favorite: usize,
    pub fuzzy: usize,
    pub mastered: usize,
}

impl PackCounts {
    pub fn get(&self, kind: PackKind) -> usize {
        match kind {
            PackKind::Favorite => self.favorite,
            PackKind::Fuzzy => self.fuzzy,
            PackKind::Mastered => self.mastered,
        }
    }
}

/// The durable, installation-wide pack store.
///
/// A base id in `deleted_ids` is a permanent tombstone: it is never
/// re-inserted into any pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackStore {
    #[serde(default)]
    pub packs: Packs,
    #[serde(default)]
    pub deleted_ids: BTreeSet<String>,
}

impl PackStore {
    /// Bring a freshly loaded store back in line with its invariants
    pub fn normalize(mut self) -> Self {
        self.deleted_ids = self
            .deleted_ids
            .iter()
            .map(|id| base_id(id).to_string())
            .collect();

        for kind in PackKind::ALL {
            let deleted = &self.deleted_ids;
            let pack = self.packs.get_mut(kind);
            for entry in pack.iter_mut() {
                if entry.card.id != entry.card.base_id() {
                    entry.card = entry.card.to_base();
                }
            }
            pack.retain(|e| !deleted.contains(&e.card.id));

            // Last writer wins when an old store holds the same card twice
            pack.sort_by(|a, b| b.added_at.cmp(&a.added_at));
            let mut seen = BTreeSet::new();
            pack.retain(|e| seen.insert(e.card.id.clone()));
        }

        self
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.deleted_ids.contains(base_id(id))
    }

    pub fn entries(&self, kind: PackKind) -> &[PackEntry] {
        self.packs.get(kind)
    }

    pub fn contains(&self, kind: PackKind, id: &str) -> bool {
        let base = base_id(id);
        self.packs.get(kind).iter().any(|e| e.card.id == base)
    }

    pub fn counts(&self) -> PackCounts {
        PackCounts {
            favorite: self.packs.favorite.len(),
            fuzzy: self.packs.fuzzy.len(),
            mastered: self.packs.mastered.len(),
        }
    }

    /// Insert or refresh a card in a pack, stamped with `added_at`.
    ///
    /// Returns false when the card is tombstoned and nothing changed.
    pub fn upsert_at(&mut self, kind: PackKind, card: &Card, added_at: i64) -> bool {
        if self.is_deleted(&card.id) {
            return false;
        }

        let base = card.base_id().to_string();
        let pack = self.packs.get_mut(kind);
        pack.retain(|e| e.card.id != base);
        pack.push(PackEntry {
            card: card.to_base(),
            added_at,
        });
        // Most recently added first; stable so equal stamps keep insertion order
        pack.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        true
    }

    /// Insert or refresh a card in a pack, stamped with the current time
    pub fn upsert(&mut self, kind: PackKind, card: &Card) -> bool {
        self.upsert_at(kind, card, now_millis())
    }

    /// Remove a card from one pack. Returns whether anything was removed.
    pub fn remove(&mut self, kind: PackKind, id: &str) -> bool {
        let base = base_id(id);
        let pack = self.packs.get_mut(kind);
        let len_before = pack.len();
        pack.retain(|e| e.card.id != base);
        pack.len() != len_before
    }

    /// Tombstone a card and drop it from every pack
    pub fn tombstone(&mut self, id: &str) {
        let base = base_id(id);
        for kind in PackKind::ALL {
            self.remove(kind, base);
        }
        self.deleted_ids.insert(base.to_string());
    }
}

/// Running tally of cards by their latest quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub red: usize,
    pub yellow: usize,
    pub green: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.red + self.yellow + self.green
    }

    pub fn get(&self, quality: Quality) -> usize {
        match quality {
            Quality::DontKnow => self.red,
            Quality::Fuzzy => self.yellow,
            Quality::Known => self.green,
        }
    }

    fn bucket(&mut self, quality: Quality) -> &mut usize {
        match quality {
            Quality::DontKnow => &mut self.red,
            Quality::Fuzzy => &mut self.yellow,
            Quality::Known => &mut self.green,
        }
    }

    pub(crate) fn add(&mut self, quality: Quality) {
        *self.bucket(quality) += 1;
    }

    pub(crate) fn remove(&mut self, quality: Quality) {
        let bucket = self.bucket(quality);
        *bucket = bucket.saturating_sub(1);
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
