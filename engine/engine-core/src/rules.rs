//! Rules-engine capability consumed by the tree search.
//!
//! The search never interprets positions or moves; it only asks the rules
//! engine what is legal, how a move transforms a position, whether a position
//! is finished and who won.

use crate::outcome::{GameResult, Side};
use std::fmt;

/// Capability any two-player, perfect-information game must provide.
///
/// # Type Parameters
///
/// * `Position` - Independent snapshot of the game; cloning must never alias
///   mutable state between copies
/// * `Move` - A single legal action, small and cheap to clone
///
/// # Example
///
/// ```rust
/// # use engine_core::{DecodeError, GameResult, RulesEngine, Side};
/// #[derive(Debug)]
/// struct Countdown;
///
/// impl RulesEngine for Countdown {
///     type Position = (u8, Side);
///     type Move = u8;
///
///     fn name(&self) -> &'static str { "countdown" }
///     fn initial_position(&self) -> Self::Position { (5, Side::First) }
///     fn side_to_move(&self, position: &Self::Position) -> Side { position.1 }
///     fn legal_moves(&self, position: &Self::Position) -> Vec<u8> {
///         (1..=position.0.min(2)).collect()
///     }
///     fn apply(&self, position: &Self::Position, mv: &u8) -> Self::Position {
///         (position.0 - mv, position.1.opponent())
///     }
///     fn is_terminal(&self, position: &Self::Position) -> bool { position.0 == 0 }
///     fn result(&self, position: &Self::Position) -> Option<GameResult> {
///         // The player who took the last token wins.
///         self.is_terminal(position).then(|| GameResult::win_for(position.1.opponent()))
///     }
///     fn encode(&self, position: &Self::Position) -> String { position.0.to_string() }
///     fn decode(&self, snapshot: &str) -> Result<Self::Position, DecodeError> {
///         let n = snapshot.parse().map_err(|_| DecodeError::Malformed(snapshot.into()))?;
///         Ok((n, Side::First))
///     }
/// }
///
/// let game = Countdown;
/// let start = game.initial_position();
/// assert_eq!(game.legal_moves(&start), vec![1, 2]);
/// ```
pub trait RulesEngine: Send + Sync + fmt::Debug + 'static {
    /// Game position type
    type Position: Clone + Send + Sync + fmt::Debug + 'static;

    /// Move type
    type Move: Clone + Send + Sync + PartialEq + fmt::Debug + fmt::Display + 'static;

    /// Stable identifier of the game (used by configuration and reports)
    fn name(&self) -> &'static str;

    /// Standard starting position
    fn initial_position(&self) -> Self::Position;

    /// Player to move in `position`
    fn side_to_move(&self, position: &Self::Position) -> Side;

    /// All legal moves in `position`, possibly empty
    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    /// Position reached by playing `mv`; the input is left untouched
    fn apply(&self, position: &Self::Position, mv: &Self::Move) -> Self::Position;

    /// Whether the game is over in `position`
    fn is_terminal(&self, position: &Self::Position) -> bool;

    /// Final result, `Some` only when `position` is terminal
    fn result(&self, position: &Self::Position) -> Option<GameResult>;

    /// Opaque textual snapshot that [`RulesEngine::decode`] accepts
    fn encode(&self, position: &Self::Position) -> String;

    /// Rebuild a position from an encoded snapshot
    fn decode(&self, snapshot: &str) -> Result<Self::Position, DecodeError>;
}

/// Error type for snapshot decoding
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid snapshot length: expected {expected} but got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Invalid character '{found}' at offset {offset}")]
    InvalidCharacter { found: char, offset: usize },
    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}
