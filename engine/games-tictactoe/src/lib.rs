//! TicTacToe rules engine
//!
//! This crate provides a complete reference implementation of TicTacToe
//! demonstrating how to implement the `RulesEngine` capability the search
//! consumes.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::RulesEngine;
//! use games_tictactoe::TicTacToe;
//!
//! let game = TicTacToe::new();
//! let start = game.initial_position();
//! assert_eq!(game.legal_moves(&start).len(), 9);
//! ```
//!
//! # Snapshot format
//!
//! `encode` writes the nine cells row by row (`.` empty, `X`, `O`), a `/`,
//! and the side to move: `X.O.X..../O`.

use engine_core::{DecodeError, GameResult, RulesEngine, Side};
use std::fmt;

/// Length of an encoded snapshot: 9 cells, separator, side to move
const SNAPSHOT_LEN: usize = 11;

/// Winning positions (rows, columns, diagonals)
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// TicTacToe game state
///
/// Represents the complete state of a TicTacToe game including the board,
/// current player, and winner information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    /// Board representation: 0=empty, 1=X, 2=O
    board: [u8; 9],
    /// Current player: 1=X, 2=O
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=X, 2=O, 3=draw
    winner: u8,
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; 9],
            current_player: 1, // X goes first
            winner: 0,
        }
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    /// Get legal moves (empty positions)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..9u8)
            .filter(|&pos| self.board[pos as usize] == 0)
            .collect()
    }

    /// Make a move and return the new state
    pub fn make_move(&self, position: u8) -> State {
        if self.is_done() || position >= 9 || self.board[position as usize] != 0 {
            return *self; // Invalid move, return unchanged state
        }

        let mut new_state = *self;
        new_state.board[position as usize] = self.current_player;
        new_state.winner = Self::check_winner(&new_state.board);

        // Alternates on every move, including the last one
        new_state.current_player = if self.current_player == 1 { 2 } else { 1 };

        new_state
    }

    /// Check for winner on the board
    fn check_winner(board: &[u8; 9]) -> u8 {
        for player in [1, 2] {
            if Self::has_line(board, player) {
                return player;
            }
        }

        if board.iter().all(|&cell| cell != 0) {
            return 3; // Draw
        }

        0
    }

    /// Whether `player` owns a complete row, column or diagonal
    fn has_line(board: &[u8; 9], player: u8) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&idx| board[idx] == player))
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// TicTacToe action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Place a piece at the given position (0-8)
    Place(u8),
}

impl Action {
    /// Get the position for this action
    pub fn position(&self) -> u8 {
        match self {
            Action::Place(pos) => *pos,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.position();
        write!(f, "{}{}", (b'a' + pos % 3) as char, 3 - pos / 3)
    }
}

/// TicTacToe rules engine
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl TicTacToe {
    /// Create a new TicTacToe game
    pub fn new() -> Self {
        Self
    }

    fn cell_char(cell: u8) -> char {
        match cell {
            1 => 'X',
            2 => 'O',
            _ => '.',
        }
    }
}

impl RulesEngine for TicTacToe {
    type Position = State;
    type Move = Action;

    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn initial_position(&self) -> State {
        State::new()
    }

    fn side_to_move(&self, position: &State) -> Side {
        Side::from_code(position.current_player).unwrap_or(Side::First)
    }

    fn legal_moves(&self, position: &State) -> Vec<Action> {
        position.legal_moves().into_iter().map(Action::Place).collect()
    }

    fn apply(&self, position: &State, mv: &Action) -> State {
        position.make_move(mv.position())
    }

    fn is_terminal(&self, position: &State) -> bool {
        position.is_done()
    }

    fn result(&self, position: &State) -> Option<GameResult> {
        GameResult::from_winner_code(position.winner)
    }

    fn encode(&self, position: &State) -> String {
        let mut out = String::with_capacity(SNAPSHOT_LEN);
        out.extend(position.board.iter().map(|&cell| Self::cell_char(cell)));
        out.push('/');
        out.push(Self::cell_char(position.current_player));
        out
    }

    fn decode(&self, snapshot: &str) -> Result<State, DecodeError> {
        let chars: Vec<char> = snapshot.chars().collect();
        if chars.len() != SNAPSHOT_LEN {
            return Err(DecodeError::InvalidLength {
                expected: SNAPSHOT_LEN,
                actual: chars.len(),
            });
        }

        let mut board = [0u8; 9];
        for (offset, (slot, &c)) in board.iter_mut().zip(chars.iter()).enumerate() {
            *slot = match c {
                '.' => 0,
                'X' | 'x' => 1,
                'O' | 'o' => 2,
                found => return Err(DecodeError::InvalidCharacter { found, offset }),
            };
        }

        if chars[9] != '/' {
            return Err(DecodeError::InvalidCharacter {
                found: chars[9],
                offset: 9,
            });
        }

        let current_player = match chars[10] {
            'X' | 'x' => 1,
            'O' | 'o' => 2,
            found => return Err(DecodeError::InvalidCharacter { found, offset: 10 }),
        };

        let x_count = board.iter().filter(|&&c| c == 1).count();
        let o_count = board.iter().filter(|&&c| c == 2).count();
        if x_count < o_count || x_count > o_count + 1 {
            return Err(DecodeError::Malformed(format!(
                "piece counts X={} O={} cannot occur",
                x_count, o_count
            )));
        }

        // X moves whenever the counts are level
        let expected_player = if x_count == o_count { 1 } else { 2 };
        if current_player != expected_player {
            return Err(DecodeError::Malformed(format!(
                "{} cannot be to move with X={} O={}",
                Self::cell_char(current_player),
                x_count,
                o_count
            )));
        }

        let x_line = State::has_line(&board, 1);
        let o_line = State::has_line(&board, 2);
        if x_line && o_line {
            return Err(DecodeError::Malformed(
                "both players have a completed line".to_string(),
            ));
        }
        // A line belongs to the player who moved last
        if (x_line && x_count == o_count) || (o_line && x_count > o_count) {
            return Err(DecodeError::Malformed(
                "the winner did not make the last move".to_string(),
            ));
        }

        Ok(State {
            board,
            current_player,
            winner: State::check_winner(&board),
        })
    }
}
