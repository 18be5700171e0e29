//! MCTS configuration parameters.

use thiserror::Error;

use crate::scoring::EXPLORATION_CONSTANT;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("branching_divisor must be at least 1")]
    ZeroBranchingDivisor,

    #[error("root_branching_divisor must be at least 1 (use None to skip root expansion)")]
    ZeroRootBranchingDivisor,

    #[error("exploration_constant must be finite and non-negative, got {0}")]
    InvalidExplorationConstant(f64),

    #[error("max_rollout_plies must be at least 1 (use None for unlimited)")]
    ZeroRolloutPlies,
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Seed for the search RNG. Parallel workers derive one stream each.
    pub seed: u64,

    /// Divisor of the legal move count when expanding a node.
    /// 1 creates every child, 2 creates half of them (rounded down, at least one).
    pub branching_divisor: u32,

    /// Divisor used to expand the root when the tree is created.
    /// None leaves the root to the regular search loop.
    pub root_branching_divisor: Option<u32>,

    /// Exploration constant C in the UCT formula.
    /// Higher values encourage exploration, lower values favor exploitation.
    pub exploration_constant: f64,

    /// Rollouts longer than this are stopped and scored as a draw.
    /// None plays every rollout to the end.
    pub max_rollout_plies: Option<u32>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            branching_divisor: 2,
            root_branching_divisor: Some(1),
            exploration_constant: EXPLORATION_CONSTANT,
            max_rollout_plies: None,
        }
    }
}

impl MctsConfig {
    /// Expand every legal move everywhere (plain UCT).
    pub fn full_width() -> Self {
        Self {
            branching_divisor: 1,
            ..Self::default()
        }
    }

    /// Create a fast, fully reproducible config for testing.
    pub fn for_testing() -> Self {
        Self {
            seed: 42,
            branching_divisor: 2,
            root_branching_divisor: Some(1),
            exploration_constant: EXPLORATION_CONSTANT,
            max_rollout_plies: Some(200),
        }
    }

    /// Builder pattern: set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: set the expansion divisor.
    pub fn with_branching_divisor(mut self, divisor: u32) -> Self {
        self.branching_divisor = divisor;
        self
    }

    /// Builder pattern: set (or disable) root expansion at tree creation.
    pub fn with_root_branching_divisor(mut self, divisor: Option<u32>) -> Self {
        self.root_branching_divisor = divisor;
        self
    }

    /// Builder pattern: set the UCT exploration constant.
    pub fn with_exploration_constant(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    /// Builder pattern: cap rollout length.
    pub fn with_max_rollout_plies(mut self, plies: Option<u32>) -> Self {
        self.max_rollout_plies = plies;
        self
    }

    /// Check that every value is usable by the search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branching_divisor == 0 {
            return Err(ConfigError::ZeroBranchingDivisor);
        }
        if self.root_branching_divisor == Some(0) {
            return Err(ConfigError::ZeroRootBranchingDivisor);
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::InvalidExplorationConstant(
                self.exploration_constant,
            ));
        }
        if self.max_rollout_plies == Some(0) {
            return Err(ConfigError::ZeroRolloutPlies);
        }
        Ok(())
    }
}
