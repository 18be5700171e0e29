//! Core traits and types shared by the search engine and the games
//!
//! This crate provides the capability a rules engine must offer so the
//! tree search can drive it without knowing anything about the game:
//! - `RulesEngine`: legal moves, move application, terminal detection, results
//! - `Side` / `GameResult`: two-player bookkeeping shared by every game
//! - `DecodeError`: failure to rebuild a position from its textual snapshot

pub mod outcome;
pub mod rules;

// Re-export main types for convenience
pub use outcome::{GameResult, Side};
pub use rules::{DecodeError, RulesEngine};
