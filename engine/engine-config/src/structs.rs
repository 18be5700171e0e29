//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_env_id() -> String {
    defaults::env_id().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_branching_divisor() -> u32 {
    defaults::branching_divisor()
}
fn d_root_branching_divisor() -> u32 {
    defaults::root_branching_divisor()
}
fn d_exploration_constant() -> f64 {
    defaults::exploration_constant()
}
fn d_max_rollout_plies() -> u32 {
    defaults::max_rollout_plies()
}
fn d_workers() -> usize {
    defaults::workers()
}
fn d_time_limit() -> u64 {
    defaults::time_limit_secs()
}
fn d_max_iterations() -> i64 {
    defaults::max_iterations()
}
fn d_report_interval() -> u64 {
    defaults::report_interval_secs()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    /// Game to search: "tictactoe" or "connect4"
    #[serde(default = "d_env_id")]
    pub env_id: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            env_id: defaults::env_id().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search configuration for the runner.
///
/// Zero and negative sentinels keep the file format flat: the runner maps
/// them onto `Option`s when it builds the in-crate `mcts::MctsConfig`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default = "d_seed")]
    pub seed: u64,
    #[serde(default = "d_branching_divisor")]
    pub branching_divisor: u32,
    /// 0 = no root expansion at tree creation
    #[serde(default = "d_root_branching_divisor")]
    pub root_branching_divisor: u32,
    #[serde(default = "d_exploration_constant")]
    pub exploration_constant: f64,
    /// 0 = rollouts play to the end of the game
    #[serde(default = "d_max_rollout_plies")]
    pub max_rollout_plies: u32,
    /// 1 = single-threaded search
    #[serde(default = "d_workers")]
    pub workers: usize,
    /// 0 = run until interrupted
    #[serde(default = "d_time_limit")]
    pub time_limit_secs: u64,
    /// -1 = no iteration budget
    #[serde(default = "d_max_iterations")]
    pub max_iterations: i64,
    #[serde(default = "d_report_interval")]
    pub report_interval_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed: defaults::seed(),
            branching_divisor: defaults::branching_divisor(),
            root_branching_divisor: defaults::root_branching_divisor(),
            exploration_constant: defaults::exploration_constant(),
            max_rollout_plies: defaults::max_rollout_plies(),
            workers: defaults::workers(),
            time_limit_secs: defaults::time_limit_secs(),
            max_iterations: defaults::max_iterations(),
            report_interval_secs: defaults::report_interval_secs(),
        }
    }
}
