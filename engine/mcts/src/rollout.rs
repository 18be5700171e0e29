//! Random playouts.
//!
//! A rollout plays uniformly random legal moves on a private copy of a
//! position until the rules engine reports the game over, then scores the
//! result from the starting side's point of view.

use engine_core::{GameResult, RulesEngine, Side};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

pub const WIN_REWARD: f64 = 1.0;
pub const DRAW_REWARD: f64 = 0.5;
pub const LOSS_REWARD: f64 = -1.0;

/// Rules-engine inconsistencies detected during a playout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RolloutError {
    #[error("Position is not terminal but has no legal moves (after {plies} plies)")]
    StalledPosition { plies: u32 },

    #[error("Terminal position reported no result (after {plies} plies)")]
    MissingResult { plies: u32 },
}

/// Result of one playout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutOutcome {
    /// Final result (a draw when the ply cap was hit)
    pub result: GameResult,
    /// Reward relative to the starting side
    pub reward: f64,
    /// Moves played during the rollout
    pub plies: u32,
    /// Stopped by `max_plies` before the game ended
    pub truncated: bool,
}

/// Map a game result to a reward for `perspective`.
#[inline]
pub fn reward(result: GameResult, perspective: Side) -> f64 {
    match result.winner() {
        None => DRAW_REWARD,
        Some(side) if side == perspective => WIN_REWARD,
        Some(_) => LOSS_REWARD,
    }
}

/// Play random moves from `position` until the game ends.
///
/// The input position is never modified. With `max_plies` set, a rollout
/// that reaches the cap is scored as a draw.
pub fn simulate<R, G>(
    rules: &R,
    position: &R::Position,
    starting_side: Side,
    max_plies: Option<u32>,
    rng: &mut G,
) -> Result<RolloutOutcome, RolloutError>
where
    R: RulesEngine,
    G: Rng + ?Sized,
{
    let mut current = position.clone();
    let mut plies = 0u32;

    loop {
        if rules.is_terminal(&current) {
            let result = rules
                .result(&current)
                .ok_or(RolloutError::MissingResult { plies })?;
            return Ok(RolloutOutcome {
                result,
                reward: reward(result, starting_side),
                plies,
                truncated: false,
            });
        }

        if max_plies.is_some_and(|cap| plies >= cap) {
            return Ok(RolloutOutcome {
                result: GameResult::Draw,
                reward: DRAW_REWARD,
                plies,
                truncated: true,
            });
        }

        let moves = rules.legal_moves(&current);
        let mv = moves
            .choose(rng)
            .ok_or(RolloutError::StalledPosition { plies })?;
        current = rules.apply(&current, mv);
        plies += 1;
    }
}
