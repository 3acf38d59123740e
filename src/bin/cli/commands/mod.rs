pub mod draw;
pub mod packs;
pub mod practice;
pub mod show;
