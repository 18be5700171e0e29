//! Tiny rules engines for unit tests.

use engine_core::{DecodeError, GameResult, RulesEngine, Side};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A game of fixed length where every position offers `width` moves and the
/// final position always ends with the same `outcome`.
///
/// `width == 0` with `length > 0` models a rules engine that stalls (no moves
/// but not terminal); `outcome == None` models one that never reports a result.
#[derive(Debug)]
pub(crate) struct Ladder {
    width: u8,
    length: u8,
    outcome: Option<GameResult>,
    legal_move_calls: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rung {
    pub ply: u8,
    pub to_move: Side,
}

impl Ladder {
    pub fn new(width: u8, length: u8, outcome: Option<GameResult>) -> Self {
        Self {
            width,
            length,
            outcome,
            legal_move_calls: AtomicUsize::new(0),
        }
    }

    pub fn legal_move_calls(&self) -> usize {
        self.legal_move_calls.load(Ordering::SeqCst)
    }
}

impl RulesEngine for Ladder {
    type Position = Rung;
    type Move = u8;

    fn name(&self) -> &'static str {
        "ladder"
    }

    fn initial_position(&self) -> Rung {
        Rung {
            ply: 0,
            to_move: Side::First,
        }
    }

    fn side_to_move(&self, position: &Rung) -> Side {
        position.to_move
    }

    fn legal_moves(&self, position: &Rung) -> Vec<u8> {
        self.legal_move_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_terminal(position) {
            Vec::new()
        } else {
            (0..self.width).collect()
        }
    }

    fn apply(&self, position: &Rung, _mv: &u8) -> Rung {
        Rung {
            ply: position.ply + 1,
            to_move: position.to_move.opponent(),
        }
    }

    fn is_terminal(&self, position: &Rung) -> bool {
        position.ply >= self.length
    }

    fn result(&self, position: &Rung) -> Option<GameResult> {
        if self.is_terminal(position) {
            self.outcome
        } else {
            None
        }
    }

    fn encode(&self, position: &Rung) -> String {
        format!("{}:{}", position.ply, position.to_move.code())
    }

    fn decode(&self, snapshot: &str) -> Result<Rung, DecodeError> {
        let malformed = || DecodeError::Malformed(snapshot.to_string());
        let (ply, side) = snapshot.split_once(':').ok_or_else(malformed)?;
        Ok(Rung {
            ply: ply.parse().map_err(|_| malformed())?,
            to_move: side
                .parse::<u8>()
                .ok()
                .and_then(Side::from_code)
                .ok_or_else(malformed)?,
        })
    }
}
