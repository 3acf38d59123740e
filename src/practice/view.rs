//! Read-only projection of a session for display

use serde::Serialize;

use super::models::{Card, Counts, PackCounts, PackKind};
use super::session::SessionState;

/// Everything a host needs to redraw a session after an action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub title: String,
    pub current_card: Option<Card>,
    pub remaining: usize,
    pub counts: Counts,
    pub tally: String,
    pub pack_counts: PackCounts,
    pub selected_pack: PackKind,
    /// Pack switching is locked while a round is in progress
    pub pack_switch_disabled: bool,
    /// Round finished but not yet saved
    pub show_done_overlay: bool,
    /// Round filed into packs; practice continues from a pack
    pub show_archived_hint: bool,
    pub tools_enabled: bool,
    pub favorited: bool,
}

impl SessionView {
    pub fn from_state(state: &SessionState) -> Self {
        let current_card = state.current_card().cloned();
        let remaining = state.queue().len();
        let counts = state.counts();
        let favorited = current_card
            .as_ref()
            .map_or(false, |c| state.store().contains(PackKind::Favorite, &c.id));

        Self {
            session_id: state.session_id().to_string(),
            title: state.title().to_string(),
            remaining,
            counts,
            tally: format_tally(&counts),
            pack_counts: state.store().counts(),
            selected_pack: state.selected_pack(),
            pack_switch_disabled: remaining > 0,
            show_done_overlay: remaining == 0 && !state.is_archived(),
            show_archived_hint: state.is_archived() && remaining == 0,
            tools_enabled: current_card.is_some(),
            favorited,
            current_card,
        }
    }
}

/// Tally line, e.g. `red 0 · yellow 1 · green 2`
pub fn format_tally(counts: &Counts) -> String {
    format!(
        "red {} \u{b7} yellow {} \u{b7} green {}",
        counts.red, counts.yellow, counts.green
    )
}
