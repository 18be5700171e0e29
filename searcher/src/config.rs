//! Configuration for the searcher
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use mcts::MctsConfig;
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Games the runner knows how to build.
pub const SUPPORTED_GAMES: &[&str] = &["tictactoe", "connect4"];

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_env_id() -> String {
    CENTRAL_CONFIG.common.env_id.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.search.seed
}

fn default_branching_divisor() -> u32 {
    CENTRAL_CONFIG.search.branching_divisor
}

fn default_root_branching_divisor() -> u32 {
    CENTRAL_CONFIG.search.root_branching_divisor
}

fn default_exploration_constant() -> f64 {
    CENTRAL_CONFIG.search.exploration_constant
}

fn default_max_rollout_plies() -> u32 {
    CENTRAL_CONFIG.search.max_rollout_plies
}

fn default_workers() -> usize {
    CENTRAL_CONFIG.search.workers
}

fn default_time_limit() -> u64 {
    CENTRAL_CONFIG.search.time_limit_secs
}

fn default_max_iterations() -> i64 {
    CENTRAL_CONFIG.search.max_iterations
}

fn default_report_interval() -> u64 {
    CENTRAL_CONFIG.search.report_interval_secs
}

#[derive(Parser, Debug, Clone)]
#[command(name = "searcher")]
#[command(about = "Random-rollout Monte Carlo tree search runner")]
#[command(
    long_about = "Searches a game position with random-rollout MCTS and reports
visit counts and mean rewards for every root move.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Game to search (tictactoe, connect4)
    #[arg(long, default_value_t = default_env_id())]
    pub env_id: String,

    /// Seed for every random choice the search makes
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Expand 1/N of the legal moves at each node (1 = every move)
    #[arg(long, default_value_t = default_branching_divisor())]
    pub branching_divisor: u32,

    /// Expand 1/N of the root moves before searching (0 to disable)
    #[arg(long, default_value_t = default_root_branching_divisor())]
    pub root_branching_divisor: u32,

    /// Exploration constant C of the UCT score
    #[arg(long, default_value_t = default_exploration_constant())]
    pub exploration_constant: f64,

    /// Stop rollouts after N plies and score them as draws (0 for unlimited)
    #[arg(long, default_value_t = default_max_rollout_plies())]
    pub max_rollout_plies: u32,

    /// Worker threads sharing the tree (1 for single-threaded search)
    #[arg(long, default_value_t = default_workers())]
    pub workers: usize,

    /// Wall-clock limit in seconds (0 to run until Ctrl-C)
    #[arg(long, default_value_t = default_time_limit())]
    pub time_limit_secs: u64,

    /// Maximum iterations (-1 for unlimited)
    #[arg(long, default_value_t = default_max_iterations(), allow_negative_numbers = true)]
    pub max_iterations: i64,

    /// Log a progress record every N seconds (0 to disable)
    #[arg(long, default_value_t = default_report_interval())]
    pub report_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Encoded position to search instead of the initial position
    #[arg(long)]
    pub position: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.env_id.is_empty() {
            return Err(anyhow!("env_id cannot be empty"));
        }

        if !SUPPORTED_GAMES.contains(&self.env_id.as_str()) {
            return Err(anyhow!(
                "unknown env_id '{}', expected one of {}",
                self.env_id,
                SUPPORTED_GAMES.join(", ")
            ));
        }

        if self.workers == 0 {
            return Err(anyhow!("workers must be greater than 0"));
        }

        if self.max_iterations < -1 {
            return Err(anyhow!(
                "max_iterations must be -1 (unlimited) or non-negative, got {}",
                self.max_iterations
            ));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        self.mcts_config().validate()?;

        Ok(())
    }

    /// Search parameters with the zero sentinels mapped to `None`.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig::default()
            .with_seed(self.seed)
            .with_branching_divisor(self.branching_divisor)
            .with_root_branching_divisor(
                (self.root_branching_divisor > 0).then_some(self.root_branching_divisor),
            )
            .with_exploration_constant(self.exploration_constant)
            .with_max_rollout_plies((self.max_rollout_plies > 0).then_some(self.max_rollout_plies))
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_secs > 0).then(|| Duration::from_secs(self.time_limit_secs))
    }

    pub fn iteration_budget(&self) -> Option<u64> {
        u64::try_from(self.max_iterations).ok()
    }

    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval_secs > 0).then(|| Duration::from_secs(self.report_interval_secs))
    }
}
