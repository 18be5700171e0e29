//! Random-rollout Monte Carlo Tree Search (MCTS).
//!
//! This crate provides a game-agnostic MCTS implementation that works with any
//! game implementing the `engine-core` [`RulesEngine`](engine_core::RulesEngine)
//! trait. There is no learned evaluation: every leaf is scored by a uniformly
//! random playout.
//!
//! # Overview
//!
//! Each iteration consists of four phases:
//!
//! 1. **Selection**: Traverse the tree by UCT score, breaking exact ties at
//!    random, until a node without children is reached
//! 2. **Expansion**: A node that was already simulated gets children for a
//!    random sample of its legal moves (a fraction set by the branching divisor)
//! 3. **Rollout**: Play random moves to the end of the game and score the
//!    result for the starting side (win 1, draw 0.5, loss -1)
//! 4. **Backpropagation**: Add one visit and the reward to every node on the
//!    path, then refresh the UCT scores along it
//!
//! # Usage
//!
//! ```rust
//! use mcts::{MctsConfig, MctsSearch};
//! use games_tictactoe::TicTacToe;
//!
//! let mut search = MctsSearch::from_start(TicTacToe::new(), MctsConfig::for_testing()).unwrap();
//! let summary = search.run_iterations(200).unwrap();
//!
//! assert_eq!(summary.stats.root_visits, 200);
//! println!("Most visited move: {:?}", search.best_move());
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `seed`: Seed of the `ChaCha20Rng` driving sampling, tie breaks and rollouts
//! - `branching_divisor`: Fraction of legal moves expanded per node (default: 2)
//! - `root_branching_divisor`: Root expansion at creation (default: every move)
//! - `exploration_constant`: C in the UCT formula (default: sqrt(2))
//! - `max_rollout_plies`: Optional rollout length cap
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        MctsSearch / ParallelSearch           │
//! ├──────────────────────────────────────────────┤
//! │  ┌──────────────┐        ┌───────────────┐   │
//! │  │   MctsTree   │        │  RulesEngine  │   │
//! │  │   (arena)    │        │  (game rules) │   │
//! │  └──────┬───────┘        └───────┬───────┘   │
//! │         ▼                        ▼           │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ select → expand → rollout → backprop   │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod expansion;
pub mod node;
pub mod parallel;
pub mod rollout;
pub mod scoring;
pub mod search;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use config::{ConfigError, MctsConfig};
pub use expansion::{children_to_sample, expand};
pub use node::{MctsNode, NodeId};
pub use parallel::ParallelSearch;
pub use rollout::{reward, simulate, RolloutError, RolloutOutcome};
pub use scoring::{choose_best_child, compute_score, uct_score, EXPLORATION_CONSTANT};
pub use search::{IterationReport, MctsSearch, SearchError, SearchSummary};
pub use tree::{ChildSummary, MctsTree, ScoreUndefined, TreeError, TreeOf, TreeStats};
