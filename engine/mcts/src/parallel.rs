//! Multi-threaded search over one shared tree.
//!
//! Workers take the tree lock for SELECT+EXPAND, release it for the rollout
//! and take it again for BACKPROPAGATE, so each iteration's ancestor update
//! is applied as one unit. Each worker owns its RNG stream derived from the
//! configured seed.

use engine_core::{RulesEngine, Side};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::MctsConfig;
use crate::rollout::simulate;
use crate::search::{init_tree, select_and_expand, SearchError, SearchSummary};
use crate::tree::{ChildSummary, TreeOf, TreeStats};

/// MCTS search shared by a pool of rayon workers.
pub struct ParallelSearch<R: RulesEngine> {
    rules: R,
    tree: Mutex<TreeOf<R>>,
    config: MctsConfig,
    workers: usize,
    iterations: AtomicU64,
}

impl<R: RulesEngine> ParallelSearch<R> {
    /// Create a search rooted at `position` run by `workers` threads.
    ///
    /// Root expansion uses RNG stream 0; worker `i` uses stream `i + 1`.
    pub fn new(
        rules: R,
        position: R::Position,
        starting_side: Side,
        config: MctsConfig,
        workers: usize,
    ) -> Result<Self, SearchError> {
        if workers == 0 {
            return Err(SearchError::WorkerPool(
                "at least one worker is required".to_string(),
            ));
        }

        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let tree = init_tree(&rules, position, starting_side, &config, &mut rng)?;

        Ok(Self {
            rules,
            tree: Mutex::new(tree),
            config,
            workers,
            iterations: AtomicU64::new(0),
        })
    }

    /// Search the game's initial position for the side that moves first.
    pub fn from_start(rules: R, config: MctsConfig, workers: usize) -> Result<Self, SearchError> {
        let position = rules.initial_position();
        let starting_side = rules.side_to_move(&position);
        Self::new(rules, position, starting_side, config, workers)
    }

    fn lock(&self) -> Result<MutexGuard<'_, TreeOf<R>>, SearchError> {
        self.tree
            .lock()
            .map_err(|_| SearchError::WorkerPool("search tree lock poisoned".to_string()))
    }

    /// Run workers until `stop` is set, `max_iterations` iterations have
    /// completed, or the tree is exhausted. The first worker error stops
    /// every worker and is returned.
    pub fn run(
        &self,
        stop: &AtomicBool,
        max_iterations: Option<u64>,
    ) -> Result<SearchSummary, SearchError> {
        let started = Instant::now();
        let before = self.iterations.load(Ordering::SeqCst);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("mcts-worker-{}", i))
            .build()
            .map_err(|e| SearchError::WorkerPool(e.to_string()))?;

        let halt = AtomicBool::new(false);
        let claimed = AtomicU64::new(0);
        let failure: Mutex<Option<SearchError>> = Mutex::new(None);

        pool.scope(|scope| {
            for worker in 0..self.workers {
                let (halt, claimed, failure) = (&halt, &claimed, &failure);
                scope.spawn(move |_| {
                    let result = self.worker_loop(worker, stop, halt, claimed, max_iterations);
                    halt.store(true, Ordering::SeqCst);
                    match result {
                        Ok(()) | Err(SearchError::TreeExhausted) => {}
                        Err(err) => {
                            warn!(worker, error = %err, "MCTS worker failed");
                            if let Ok(mut slot) = failure.lock() {
                                slot.get_or_insert(err);
                            }
                        }
                    }
                });
            }
        });

        if let Some(err) = failure
            .into_inner()
            .map_err(|_| SearchError::WorkerPool("failure slot poisoned".to_string()))?
        {
            return Err(err);
        }

        let completed = self.iterations.load(Ordering::SeqCst) - before;
        let tree = self.lock()?;
        let summary = SearchSummary {
            iterations: completed,
            exhausted: tree.get(tree.root()).exhausted,
            elapsed: started.elapsed(),
            stats: tree.stats(),
        };
        debug!(
            iterations = summary.iterations,
            workers = self.workers,
            exhausted = summary.exhausted,
            "Parallel search finished"
        );
        Ok(summary)
    }

    fn worker_loop(
        &self,
        worker: usize,
        stop: &AtomicBool,
        halt: &AtomicBool,
        claimed: &AtomicU64,
        max_iterations: Option<u64>,
    ) -> Result<(), SearchError> {
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        rng.set_stream(worker as u64 + 1);

        while !stop.load(Ordering::Relaxed) && !halt.load(Ordering::Relaxed) {
            if let Some(budget) = max_iterations {
                if claimed.fetch_add(1, Ordering::SeqCst) >= budget {
                    break;
                }
            }

            let selection = {
                let mut tree = self.lock()?;
                select_and_expand(&mut *tree, &self.rules, &mut rng)?
            };

            let outcome = simulate(
                &self.rules,
                &selection.position,
                selection.starting_side,
                self.config.max_rollout_plies,
                &mut rng,
            )?;

            {
                let mut tree = self.lock()?;
                tree.backpropagate(
                    selection.node,
                    outcome.reward,
                    self.config.exploration_constant,
                )?;
            }
            self.iterations.fetch_add(1, Ordering::SeqCst);

            trace!(
                worker,
                node = %selection.node,
                depth = selection.depth,
                reward = outcome.reward,
                "MCTS iteration complete"
            );
        }

        Ok(())
    }

    /// Iterations completed since creation.
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::SeqCst)
    }

    /// Snapshot of tree statistics; safe to call while workers run.
    pub fn stats(&self) -> Result<TreeStats, SearchError> {
        Ok(self.lock()?.stats())
    }

    pub fn root_children(&self) -> Result<Vec<ChildSummary<R::Move>>, SearchError> {
        Ok(self.lock()?.root_children())
    }

    /// Most visited root move.
    pub fn best_move(&self) -> Result<Option<R::Move>, SearchError> {
        Ok(self.lock()?.best_move())
    }

    /// Take the finished tree.
    pub fn into_tree(self) -> Result<TreeOf<R>, SearchError> {
        self.tree
            .into_inner()
            .map_err(|_| SearchError::WorkerPool("search tree lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::testing::Ladder;
    use engine_core::GameResult;
    use games_tictactoe::TicTacToe;

    #[test]
    fn test_parallel_budget_is_exact() {
        let search = ParallelSearch::from_start(TicTacToe::new(), MctsConfig::for_testing(), 4).unwrap();
        let stop = AtomicBool::new(false);

        let summary = search.run(&stop, Some(300)).unwrap();
        assert_eq!(summary.iterations, 300);
        assert_eq!(summary.stats.root_visits, 300);
        assert_eq!(search.iterations(), 300);

        // A second run continues the same tree
        let summary = search.run(&stop, Some(100)).unwrap();
        assert_eq!(summary.iterations, 100);
        assert_eq!(summary.stats.root_visits, 400);
    }

    #[test]
    fn test_parallel_counters_add_up() {
        let game = Ladder::new(5, 6, Some(GameResult::FirstPlayerWins));
        let search = ParallelSearch::from_start(game, MctsConfig::for_testing(), 3).unwrap();
        let stop = AtomicBool::new(false);
        search.run(&stop, Some(250)).unwrap();

        let tree = search.into_tree().unwrap();
        for node in tree.arena() {
            assert!((node.cumulative_reward - node.visit_count as f64).abs() < 1e-9);
            let below: u32 = node
                .children
                .iter()
                .map(|&id| tree.get(id).visit_count)
                .sum();
            assert!(node.visit_count >= below, "node {}", node.id);
        }
        assert_eq!(tree.get(NodeId::ROOT).visit_count, 250);
    }

    #[test]
    fn test_parallel_exhaustion_ends_run() {
        let game = Ladder::new(2, 3, Some(GameResult::Draw));
        let search = ParallelSearch::from_start(game, MctsConfig::full_width(), 4).unwrap();
        let stop = AtomicBool::new(false);

        let summary = search.run(&stop, None).unwrap();
        assert!(summary.exhausted);
        assert_eq!(summary.stats.total_nodes, 15);
        assert_eq!(summary.stats.root_visits as u64, summary.iterations);
    }

    #[test]
    fn test_parallel_stop_flag() {
        let search = ParallelSearch::from_start(TicTacToe::new(), MctsConfig::for_testing(), 2).unwrap();
        let stop = AtomicBool::new(true);

        let summary = search.run(&stop, None).unwrap();
        assert_eq!(summary.iterations, 0);
    }

    #[test]
    fn test_parallel_worker_error_is_returned() {
        let game = Ladder::new(2, 4, None);
        let search = ParallelSearch::from_start(game, MctsConfig::for_testing(), 2).unwrap();
        let stop = AtomicBool::new(false);

        assert!(matches!(
            search.run(&stop, Some(50)),
            Err(SearchError::Rollout(_))
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            ParallelSearch::from_start(TicTacToe::new(), MctsConfig::for_testing(), 0),
            Err(SearchError::WorkerPool(_))
        ));
    }
}
