//! Search driver.
//!
//! Builds the configured game, runs the search under the configured limits
//! (time, iterations, stop flag, exhaustion) and assembles the final report.

use anyhow::{anyhow, Context, Result};
use engine_core::RulesEngine;
use games_connect4::Connect4;
use games_tictactoe::TicTacToe;
use mcts::{MctsSearch, ParallelSearch, SearchError, SearchSummary, TreeStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::report::{RunInfo, SearchReport};

/// Poll period of the parallel watchdog thread.
const WATCHDOG_TICK: Duration = Duration::from_millis(25);

/// Limits shared by both search modes.
#[derive(Debug, Clone, Copy)]
struct Limits {
    time_limit: Option<Duration>,
    budget: Option<u64>,
    report_every: Option<Duration>,
}

impl Limits {
    fn from_config(config: &Config) -> Self {
        Self {
            time_limit: config.time_limit(),
            budget: config.iteration_budget(),
            report_every: config.report_interval(),
        }
    }
}

/// Periodic progress record, the runner's stand-in for a checkpoint.
struct Progress {
    every: Option<Duration>,
    started: Instant,
    next: Instant,
}

impl Progress {
    fn new(every: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            every,
            started,
            next: started + every.unwrap_or_default(),
        }
    }

    fn due(&self) -> bool {
        self.every.is_some() && Instant::now() >= self.next
    }

    fn log(&mut self, iterations: u64, stats: &TreeStats) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            iterations as f64 / elapsed
        } else {
            0.0
        };
        info!(
            iterations,
            rate = format!("{:.0}/s", rate),
            nodes = stats.total_nodes,
            root_mean_reward = format!("{:.4}", stats.root_mean_reward),
            max_depth = stats.max_depth,
            exhausted_nodes = stats.exhausted_nodes,
            "Search progress"
        );
        if let Some(every) = self.every {
            self.next += every;
        }
    }
}

/// Run the configured search to completion.
pub fn run(config: &Config, stop: &AtomicBool) -> Result<SearchReport> {
    match config.env_id.as_str() {
        "tictactoe" => run_game(TicTacToe::new(), config, stop),
        "connect4" => run_game(Connect4::new(), config, stop),
        other => Err(anyhow!("unknown env_id '{}'", other)),
    }
}

fn run_game<R: RulesEngine>(rules: R, config: &Config, stop: &AtomicBool) -> Result<SearchReport> {
    let position = match &config.position {
        Some(snapshot) => rules
            .decode(snapshot)
            .with_context(|| format!("invalid {} position '{}'", rules.name(), snapshot))?,
        None => rules.initial_position(),
    };
    let starting_side = rules.side_to_move(&position);
    let info = RunInfo {
        env_id: rules.name(),
        position: rules.encode(&position),
        starting_side,
        seed: config.seed,
        workers: config.workers,
    };
    let limits = Limits::from_config(config);
    debug!(position = %info.position, side = %starting_side, ?limits, "Search configured");

    if config.workers > 1 {
        let search = ParallelSearch::new(
            rules,
            position,
            starting_side,
            config.mcts_config(),
            config.workers,
        )?;
        let summary = run_parallel(&search, stop, limits)?;
        let children = search.root_children()?;
        let best_move = search.best_move()?;
        Ok(SearchReport::new(info, &summary, &children, best_move))
    } else {
        let mut search = MctsSearch::new(rules, position, starting_side, config.mcts_config())?;
        let summary = run_single(&mut search, stop, limits)?;
        Ok(SearchReport::new(
            info,
            &summary,
            &search.root_children(),
            search.best_move(),
        ))
    }
}

fn run_single<R: RulesEngine>(
    search: &mut MctsSearch<R>,
    stop: &AtomicBool,
    limits: Limits,
) -> Result<SearchSummary> {
    let mut progress = Progress::new(limits.report_every);
    let deadline = limits.time_limit.map(|limit| progress.started + limit);
    let before = search.iterations();

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("Stop requested");
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("Time limit reached");
            break;
        }
        if limits
            .budget
            .is_some_and(|budget| search.iterations() - before >= budget)
        {
            debug!("Iteration budget reached");
            break;
        }

        match search.iterate() {
            Ok(_) => {}
            Err(SearchError::TreeExhausted) => {
                info!("Search tree exhausted");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        if progress.due() {
            progress.log(search.iterations() - before, &search.stats());
        }
    }

    Ok(SearchSummary {
        iterations: search.iterations() - before,
        exhausted: search.is_exhausted(),
        elapsed: progress.started.elapsed(),
        stats: search.stats(),
    })
}

fn run_parallel<R: RulesEngine>(
    search: &ParallelSearch<R>,
    stop: &AtomicBool,
    limits: Limits,
) -> Result<SearchSummary> {
    let deadline = limits.time_limit.map(|limit| Instant::now() + limit);
    let done = AtomicBool::new(false);

    let summary = std::thread::scope(|scope| {
        scope.spawn(|| watchdog(search, stop, &done, deadline, limits.report_every));
        let result = search.run(stop, limits.budget);
        done.store(true, Ordering::SeqCst);
        result
    })?;

    if summary.exhausted {
        info!("Search tree exhausted");
    }
    Ok(summary)
}

/// Enforce the deadline and log progress while the workers run.
fn watchdog<R: RulesEngine>(
    search: &ParallelSearch<R>,
    stop: &AtomicBool,
    done: &AtomicBool,
    deadline: Option<Instant>,
    report_every: Option<Duration>,
) {
    let mut progress = Progress::new(report_every);
    let before = search.iterations();

    while !done.load(Ordering::SeqCst) && !stop.load(Ordering::Relaxed) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("Time limit reached, stopping workers");
            stop.store(true, Ordering::SeqCst);
            break;
        }
        if progress.due() {
            match search.stats() {
                Ok(stats) => progress.log(search.iterations() - before, &stats),
                Err(e) => {
                    warn!("Progress report failed: {}", e);
                    break;
                }
            }
        }
        std::thread::sleep(WATCHDOG_TICK);
    }
}
