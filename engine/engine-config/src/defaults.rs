//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so the binary never
//! depends on it being present at runtime.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| match toml::from_str(DEFAULTS_TOML) {
    Ok(config) => config,
    Err(e) => {
        tracing::warn!("config.defaults.toml failed to parse: {}, using fallbacks", e);
        DefaultsConfig::fallback()
    }
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    search: SearchDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    env_id: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct SearchDefaults {
    seed: u64,
    branching_divisor: u32,
    root_branching_divisor: u32,
    exploration_constant: f64,
    max_rollout_plies: u32,
    workers: usize,
    time_limit_secs: u64,
    max_iterations: i64,
    report_interval_secs: u64,
}

impl DefaultsConfig {
    /// Values used only if the embedded file is broken.
    fn fallback() -> Self {
        Self {
            common: CommonDefaults {
                env_id: "tictactoe".into(),
                log_level: "info".into(),
            },
            search: SearchDefaults {
                seed: 42,
                branching_divisor: 2,
                root_branching_divisor: 1,
                exploration_constant: std::f64::consts::SQRT_2,
                max_rollout_plies: 0,
                workers: 1,
                time_limit_secs: 10,
                max_iterations: -1,
                report_interval_secs: 2,
            },
        }
    }
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn env_id() -> &'static str {
    &DEFAULTS.common.env_id
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Search
pub fn seed() -> u64 {
    DEFAULTS.search.seed
}
pub fn branching_divisor() -> u32 {
    DEFAULTS.search.branching_divisor
}
pub fn root_branching_divisor() -> u32 {
    DEFAULTS.search.root_branching_divisor
}
pub fn exploration_constant() -> f64 {
    DEFAULTS.search.exploration_constant
}
pub fn max_rollout_plies() -> u32 {
    DEFAULTS.search.max_rollout_plies
}
pub fn workers() -> usize {
    DEFAULTS.search.workers
}
pub fn time_limit_secs() -> u64 {
    DEFAULTS.search.time_limit_secs
}
pub fn max_iterations() -> i64 {
    DEFAULTS.search.max_iterations
}
pub fn report_interval_secs() -> u64 {
    DEFAULTS.search.report_interval_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        // Parsing the embedded file must not hit the fallback
        let parsed: Result<DefaultsConfig, _> = toml::from_str(DEFAULTS_TOML);
        assert!(parsed.is_ok());
        assert_eq!(env_id(), "tictactoe");
        assert_eq!(log_level(), "info");
    }

    #[test]
    fn test_search_defaults() {
        assert_eq!(seed(), 42);
        assert_eq!(branching_divisor(), 2);
        assert_eq!(root_branching_divisor(), 1);
        assert!((exploration_constant() - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert_eq!(max_rollout_plies(), 0);
        assert_eq!(workers(), 1);
        assert_eq!(time_limit_secs(), 10);
        assert_eq!(max_iterations(), -1);
        assert_eq!(report_interval_secs(), 2);
    }

    #[test]
    fn test_fallback_matches_file() {
        let fallback = DefaultsConfig::fallback();
        assert_eq!(fallback.common.env_id, env_id());
        assert_eq!(fallback.search.seed, seed());
        assert_eq!(fallback.search.branching_divisor, branching_divisor());
        assert_eq!(fallback.search.max_iterations, max_iterations());
    }
}
