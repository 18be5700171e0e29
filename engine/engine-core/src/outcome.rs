//! Shared two-player types.
//!
//! Every game in the workspace stores its winner with the same compact
//! code (0 = ongoing, 1 = first player, 2 = second player, 3 = draw), so the
//! conversion lives here instead of being repeated per game.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// The other player.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Player code used by the game boards (1 or 2).
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Side::First => 1,
            Side::Second => 2,
        }
    }

    /// Inverse of [`Side::code`].
    pub fn from_code(code: u8) -> Option<Side> {
        match code {
            1 => Some(Side::First),
            2 => Some(Side::Second),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => write!(f, "first"),
            Side::Second => write!(f, "second"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "white" | "x" | "1" => Ok(Side::First),
            "second" | "black" | "o" | "2" => Ok(Side::Second),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    FirstPlayerWins,
    SecondPlayerWins,
    Draw,
}

impl GameResult {
    /// Winning side, `None` for a draw.
    pub fn winner(self) -> Option<Side> {
        match self {
            GameResult::FirstPlayerWins => Some(Side::First),
            GameResult::SecondPlayerWins => Some(Side::Second),
            GameResult::Draw => None,
        }
    }

    /// Result in which `side` wins.
    pub fn win_for(side: Side) -> GameResult {
        match side {
            Side::First => GameResult::FirstPlayerWins,
            Side::Second => GameResult::SecondPlayerWins,
        }
    }

    /// Decode a board winner code.
    ///
    /// # Arguments
    /// * `winner` - Winner indicator: 0=ongoing, 1=player1 wins, 2=player2 wins, 3=draw
    ///
    /// # Example
    /// ```
    /// use engine_core::GameResult;
    ///
    /// assert_eq!(GameResult::from_winner_code(0), None);
    /// assert_eq!(GameResult::from_winner_code(1), Some(GameResult::FirstPlayerWins));
    /// assert_eq!(GameResult::from_winner_code(3), Some(GameResult::Draw));
    /// ```
    #[inline]
    pub fn from_winner_code(winner: u8) -> Option<GameResult> {
        match winner {
            1 => Some(GameResult::FirstPlayerWins),
            2 => Some(GameResult::SecondPlayerWins),
            3 => Some(GameResult::Draw),
            _ => None,
        }
    }
}
