//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from a crate directory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the ARBOR_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("ARBOR_CONFIG") {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from ARBOR_CONFIG: {}", path.display());
            return load_from_path(path);
        }
        warn!(
            "ARBOR_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files are logged and replaced by the defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, etc.); unparsable values are ignored with a warning
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!("Ignoring {}={}: not a valid value", $key, raw),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ARBOR_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.env_id, "ARBOR_COMMON_ENV_ID");
    env_override!(config, common.log_level, "ARBOR_COMMON_LOG_LEVEL");

    // Search
    env_override!(config, search.seed, "ARBOR_SEARCH_SEED", parse);
    env_override!(
        config,
        search.branching_divisor,
        "ARBOR_SEARCH_BRANCHING_DIVISOR",
        parse
    );
    env_override!(
        config,
        search.root_branching_divisor,
        "ARBOR_SEARCH_ROOT_BRANCHING_DIVISOR",
        parse
    );
    env_override!(
        config,
        search.exploration_constant,
        "ARBOR_SEARCH_EXPLORATION_CONSTANT",
        parse
    );
    env_override!(
        config,
        search.max_rollout_plies,
        "ARBOR_SEARCH_MAX_ROLLOUT_PLIES",
        parse
    );
    env_override!(config, search.workers, "ARBOR_SEARCH_WORKERS", parse);
    env_override!(
        config,
        search.time_limit_secs,
        "ARBOR_SEARCH_TIME_LIMIT_SECS",
        parse
    );
    env_override!(
        config,
        search.max_iterations,
        "ARBOR_SEARCH_MAX_ITERATIONS",
        parse
    );
    env_override!(
        config,
        search.report_interval_secs,
        "ARBOR_SEARCH_REPORT_INTERVAL_SECS",
        parse
    );

    config
}
