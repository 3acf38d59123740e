//! Card identity across re-draws
//!
//! A card drawn back out of a pack gets an instance id of the form
//! `{base}::draw::{drawn_at}-{index}` so several copies can share a queue.
//! Anything that asks "is this the same underlying card" compares base ids.

/// Separator between a base id and its draw suffix
pub const DRAW_SEPARATOR: &str = "::draw::";

/// Strip any draw suffix from a card id
pub fn base_id(id: &str) -> &str {
    match id.split_once(DRAW_SEPARATOR) {
        Some((base, _)) => base,
        None => id,
    }
}

/// Build the instance id for the `index`-th card of a draw made at `drawn_at` (epoch ms)
pub fn instance_id(id: &str, drawn_at: i64, index: usize) -> String {
    format!("{}{}{}-{}", base_id(id), DRAW_SEPARATOR, drawn_at, index)
}

/// Whether the id carries a draw suffix
pub fn is_drawn_instance(id: &str) -> bool {
    id.contains(DRAW_SEPARATOR)
}

/// Whether two ids refer to the same underlying card
pub fn same_card(a: &str, b: &str) -> bool {
    base_id(a) == base_id(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_id_strips_draw_suffix() {
        assert_eq!(base_id("abc::draw::123-0"), "abc");
        assert_eq!(base_id("abc"), "abc");
        assert_eq!(base_id(""), "");
    }

    #[test]
    fn test_base_id_is_idempotent() {
        for id in ["abc", "abc::draw::1-2", "a::draw::1-0::draw::2-1", "::draw::x"] {
            assert_eq!(base_id(base_id(id)), base_id(id));
        }
    }

    #[test]
    fn test_instance_id_round_trips_to_base() {
        let id = instance_id("c1", 1_700_000_000_000, 3);
        assert_eq!(id, "c1::draw::1700000000000-3");
        assert!(is_drawn_instance(&id));
        assert_eq!(base_id(&id), "c1");

        // Re-drawing an instance never stacks suffixes
        let again = instance_id(&id, 5, 0);
        assert_eq!(again, "c1::draw::5-0");
    }

    #[test]
    fn test_same_card() {
        assert!(same_card("c1::draw::1-0", "c1::draw::2-7"));
        assert!(same_card("c1", "c1::draw::2-7"));
        assert!(!same_card("c1", "c2"));
    }
}
