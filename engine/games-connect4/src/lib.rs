//! Connect 4 rules engine
//!
//! Connect 4 is a two-player connection game where players drop colored discs
//! into a 7-column, 6-row vertically suspended grid. The objective is to be
//! the first to form a horizontal, vertical, or diagonal line of four discs.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 5: [35][36][37][38][39][40][41]  <- Top
//! Row 4: [28][29][30][31][32][33][34]
//! Row 3: [21][22][23][24][25][26][27]
//! Row 2: [14][15][16][17][18][19][20]
//! Row 1: [ 7][ 8][ 9][10][11][12][13]
//! Row 0: [ 0][ 1][ 2][ 3][ 4][ 5][ 6]  <- Bottom
//!         Col 0  1  2  3  4  5  6
//! ```
//!
//! # Snapshot format
//!
//! `encode` writes the rows from the top down, exactly as the board is drawn
//! above (`.` empty, `R` red, `Y` yellow), followed by `/` and the side to
//! move. The empty board is 42 dots and `/R`.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::RulesEngine;
//! use games_connect4::{Action, Connect4};
//!
//! let game = Connect4::new();
//! let after = game.apply(&game.initial_position(), &Action::Drop(3));
//! assert_eq!(game.legal_moves(&after).len(), 7);
//! ```

use engine_core::{DecodeError, GameResult, RulesEngine, Side};
use std::fmt;

/// Board dimensions
pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS; // 42

const SNAPSHOT_LEN: usize = BOARD_SIZE + 2;

/// Connect4 game state
///
/// Represents the complete state of a Connect4 game including the board,
/// current player, and winner information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Board representation: 0=empty, 1=Red (player 1), 2=Yellow (player 2)
    /// Stored in row-major order with row 0 at the bottom
    board: [u8; BOARD_SIZE],
    /// Current player: 1=Red, 2=Yellow
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=Red, 2=Yellow, 3=draw
    winner: u8,
    /// Height of each column (0-6 means number of pieces in column)
    column_heights: [u8; COLS],
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; BOARD_SIZE],
            current_player: 1, // Red goes first
            winner: 0,
            column_heights: [0; COLS],
        }
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    /// Number of discs played so far
    pub fn moves_played(&self) -> usize {
        self.column_heights.iter().map(|&h| h as usize).sum()
    }

    /// Get legal moves (columns that are not full)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..COLS as u8)
            .filter(|&col| self.column_heights[col as usize] < ROWS as u8)
            .collect()
    }

    /// Convert column and row to board index
    #[inline]
    fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    /// Drop a piece in the given column and return the new state
    pub fn drop_piece(&self, column: u8) -> State {
        let col = column as usize;

        if self.is_done() || col >= COLS || self.column_heights[col] >= ROWS as u8 {
            return self.clone(); // Invalid move, return unchanged state
        }

        let mut new_state = self.clone();
        let row = self.column_heights[col] as usize;

        new_state.board[Self::pos(col, row)] = self.current_player;
        new_state.column_heights[col] += 1;

        new_state.winner = if new_state.completes_line(col, row) {
            self.current_player
        } else if new_state.is_full() {
            3
        } else {
            0
        };

        // Alternates on every move, including the last one
        new_state.current_player = if self.current_player == 1 { 2 } else { 1 };

        new_state
    }

    fn is_full(&self) -> bool {
        self.column_heights.iter().all(|&h| h >= ROWS as u8)
    }

    /// Whether the piece at (col, row) is part of a line of four
    fn completes_line(&self, col: usize, row: usize) -> bool {
        let player = self.board[Self::pos(col, row)];
        if player == 0 {
            return false;
        }

        // Direction vectors: horizontal, vertical, diagonal /, diagonal \
        let directions: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        directions.iter().any(|&(dc, dr)| {
            1 + self.run_length(col, row, dc, dr, player)
                + self.run_length(col, row, -dc, -dr, player)
                >= 4
        })
    }

    /// Count consecutive `player` pieces starting one step away from (col, row)
    fn run_length(&self, col: usize, row: usize, dc: i32, dr: i32, player: u8) -> usize {
        let mut count = 0;
        let (mut c, mut r) = (col as i32 + dc, row as i32 + dr);
        while c >= 0 && c < COLS as i32 && r >= 0 && r < ROWS as i32 {
            if self.board[Self::pos(c as usize, r as usize)] != player {
                break;
            }
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }

    /// Whether any of `player`'s discs sits in a line of four
    fn has_line(&self, player: u8) -> bool {
        (0..ROWS).any(|row| {
            (0..COLS).any(|col| {
                self.board[Self::pos(col, row)] == player && self.completes_line(col, row)
            })
        })
    }

    /// Winner code derived from the whole board, used when no last move is known
    fn scan_winner(&self) -> u8 {
        for player in [1, 2] {
            if self.has_line(player) {
                return player;
            }
        }
        if self.is_full() {
            3
        } else {
            0
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Connect4 action - drop a piece in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop a piece in the given column (0-6)
    Drop(u8),
}

impl Action {
    /// Get the column for this action
    pub fn column(&self) -> u8 {
        match self {
            Action::Drop(col) => *col,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Connect4 rules engine
#[derive(Debug, Clone, Copy, Default)]
pub struct Connect4;

impl Connect4 {
    /// Create a new Connect4 game
    pub fn new() -> Self {
        Self
    }

    fn cell_char(cell: u8) -> char {
        match cell {
            1 => 'R',
            2 => 'Y',
            _ => '.',
        }
    }
}

impl RulesEngine for Connect4 {
    type Position = State;
    type Move = Action;

    fn name(&self) -> &'static str {
        "connect4"
    }

    fn initial_position(&self) -> State {
        State::new()
    }

    fn side_to_move(&self, position: &State) -> Side {
        Side::from_code(position.current_player).unwrap_or(Side::First)
    }

    fn legal_moves(&self, position: &State) -> Vec<Action> {
        position.legal_moves().into_iter().map(Action::Drop).collect()
    }

    fn apply(&self, position: &State, mv: &Action) -> State {
        position.drop_piece(mv.column())
    }

    fn is_terminal(&self, position: &State) -> bool {
        position.is_done()
    }

    fn result(&self, position: &State) -> Option<GameResult> {
        GameResult::from_winner_code(position.winner)
    }

    fn encode(&self, position: &State) -> String {
        let mut out = String::with_capacity(SNAPSHOT_LEN);
        for row in (0..ROWS).rev() {
            for col in 0..COLS {
                out.push(Self::cell_char(position.board[State::pos(col, row)]));
            }
        }
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

        let mut state = State::new();
        for (offset, &c) in chars[..BOARD_SIZE].iter().enumerate() {
            let row = ROWS - 1 - offset / COLS;
            let col = offset % COLS;
            state.board[State::pos(col, row)] = match c {
                '.' => 0,
                'R' | 'r' => 1,
                'Y' | 'y' => 2,
                found => return Err(DecodeError::InvalidCharacter { found, offset }),
            };
        }

        if chars[BOARD_SIZE] != '/' {
            return Err(DecodeError::InvalidCharacter {
                found: chars[BOARD_SIZE],
                offset: BOARD_SIZE,
            });
        }

        state.current_player = match chars[BOARD_SIZE + 1] {
            'R' | 'r' => 1,
            'Y' | 'y' => 2,
            found => {
                return Err(DecodeError::InvalidCharacter {
                    found,
                    offset: BOARD_SIZE + 1,
                })
            }
        };

        // Discs must rest on the bottom or on another disc
        for col in 0..COLS {
            let height = (0..ROWS)
                .take_while(|&row| state.board[State::pos(col, row)] != 0)
                .count();
            if (height..ROWS).any(|row| state.board[State::pos(col, row)] != 0) {
                return Err(DecodeError::Malformed(format!(
                    "floating disc in column {}",
                    col
                )));
            }
            state.column_heights[col] = height as u8;
        }

        let red = state.board.iter().filter(|&&c| c == 1).count();
        let yellow = state.board.iter().filter(|&&c| c == 2).count();
        if red < yellow || red > yellow + 1 {
            return Err(DecodeError::Malformed(format!(
                "disc counts R={} Y={} cannot occur",
                red, yellow
            )));
        }

        let expected_player = if red == yellow { 1 } else { 2 };
        if state.current_player != expected_player {
            return Err(DecodeError::Malformed(format!(
                "side to move {} does not match disc counts R={} Y={}",
                Self::cell_char(state.current_player),
                red,
                yellow
            )));
        }

        let red_line = state.has_line(1);
        let yellow_line = state.has_line(2);
        if red_line && yellow_line {
            return Err(DecodeError::Malformed(
                "both players have a line of four".to_string(),
            ));
        }
        if (red_line && red == yellow) || (yellow_line && red > yellow) {
            return Err(DecodeError::Malformed(
                "the winner did not make the last move".to_string(),
            ));
        }

        state.winner = state.scan_winner();
        Ok(state)
    }
}
