//! Random re-draw of a practice round from a pack
//!
//! Packs with at least `size` entries yield `size` distinct cards. Smaller
//! packs are sampled with replacement so a round is always full sized; the
//! repeats get their own instance ids.

use rand::seq::SliceRandom;
use rand::Rng;

use super::identity::instance_id;
use super::models::{Card, PackEntry};

/// Cards per drawn round
pub const DEFAULT_DRAW_SIZE: usize = 10;

/// Draw a round of `size` cards from `entries`, stamping instance ids with `drawn_at`
pub fn draw_cards<R: Rng>(
    entries: &[PackEntry],
    size: usize,
    drawn_at: i64,
    rng: &mut R,
) -> Vec<Card> {
    if entries.is_empty() || size == 0 {
        return Vec::new();
    }

    let mut shuffled: Vec<&PackEntry> = entries.iter().collect();
    shuffled.shuffle(rng);

    let picked: Vec<&PackEntry> = if shuffled.len() >= size {
        shuffled.into_iter().take(size).collect()
    } else {
        (0..size)
            .map(|_| shuffled[rng.gen_range(0..shuffled.len())])
            .collect()
    };

    picked
        .into_iter()
        .enumerate()
        .map(|(i, entry)| entry.card.with_id(instance_id(&entry.card.id, drawn_at, i)))
        .collect()
}
