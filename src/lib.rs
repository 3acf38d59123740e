//! Cardpacks: a flashcard practice-session engine
//!
//! A session turns a generated set of cards into a review loop with
//! don't-know / fuzzy / known triage. Finished rounds are filed into
//! persistent favorite / fuzzy / mastered packs, and new rounds can be drawn
//! back out of those packs once the original set is exhausted.

pub mod config;
pub mod practice;
pub mod storage;
