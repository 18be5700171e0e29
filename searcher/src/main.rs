//! Searcher - command-line runner for the random-rollout tree search
//!
//! A process that:
//! 1. Builds the search for the configured game and position
//! 2. Runs it until the time limit, the iteration budget, Ctrl-C or exhaustion
//! 3. Logs a progress record every report interval
//! 4. Prints the root move statistics as text or JSON

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod report;
mod runner;

use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    if config.time_limit().is_none() && config.iteration_budget().is_none() {
        warn!("No time limit or iteration budget set, searching until Ctrl-C");
    }
    info!(
        env_id = %config.env_id,
        seed = config.seed,
        workers = config.workers,
        "Starting search"
    );

    let stop = Arc::new(AtomicBool::new(false));

    // Ctrl-C only raises the stop flag; the search finishes its current
    // iteration and still produces a report.
    let signal_stop = Arc::clone(&stop);
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping search...");
                signal_stop.store(true, Ordering::SeqCst);
            }
            Err(e) => error!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let search_config = config.clone();
    let search_stop = Arc::clone(&stop);
    let run_result =
        tokio::task::spawn_blocking(move || runner::run(&search_config, &search_stop)).await?;

    shutdown_handle.abort();

    match run_result {
        Ok(report) => {
            info!(
                iterations = report.iterations,
                exhausted = report.exhausted,
                "Search completed successfully"
            );
            if config.json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report);
            }
            Ok(())
        }
        Err(e) => {
            error!("Search failed: {}", e);
            Err(e)
        }
    }
}
