//! Flashcard practice sessions for Cardpacks
//!
//! This module provides:
//! - Card identity across re-draws (base id vs instance id)
//! - Persistent favorite / fuzzy / mastered packs with delete tombstones
//! - Per-session review state with requeue-on-fail
//! - Random re-draw of practice rounds from packs
//! - A read-only view projection for hosts

pub mod draw;
pub mod identity;
pub mod models;
pub mod registry;
pub mod session;
pub mod view;

pub use draw::{draw_cards, DEFAULT_DRAW_SIZE};
pub use identity::{base_id, instance_id};
pub use models::*;
pub use registry::{ActionOutcome, PracticeError, SessionRegistry};
pub use session::{FiledCards, PackSelection, SessionState};
pub use view::SessionView;
