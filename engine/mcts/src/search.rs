//! MCTS search implementation.
//!
//! Each iteration runs the classic loop:
//! 1. Selection: descend from the root by UCT score to a node without children
//! 2. Expansion: a node that was already simulated gets a sample of children,
//!    one of which is simulated instead
//! 3. Rollout: random playout from the selected node
//! 4. Backpropagation: update counters and scores along the path to the root
//!
//! The loop has no natural end; callers stop it with an iteration budget or
//! a shared stop flag. It ends on its own only when every reachable node has
//! been solved.

use engine_core::{RulesEngine, Side};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{ConfigError, MctsConfig};
use crate::expansion::expand;
use crate::node::NodeId;
use crate::rollout::{simulate, RolloutError};
use crate::scoring::choose_best_child;
use crate::tree::{ChildSummary, MctsTree, TreeError, TreeOf, TreeStats};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Rollout error: {0}")]
    Rollout(#[from] RolloutError),

    #[error("Search tree is exhausted: every reachable node is solved")]
    TreeExhausted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// Node the rollout started from
    pub node: NodeId,
    /// Depth of that node below the root
    pub depth: u32,
    /// Reward backpropagated to the root
    pub reward: f64,
    /// Plies played by the rollout
    pub plies: u32,
    /// Children created by expansion during this iteration
    pub children_created: usize,
    /// Expansion found the selected node terminal and marked it exhausted
    pub terminal_discovered: bool,
}

/// Summary of a bounded or cancelled run.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    /// Iterations completed by this call
    pub iterations: u64,
    /// The root is exhausted and no further iteration is possible
    pub exhausted: bool,
    pub elapsed: Duration,
    pub stats: TreeStats,
}

/// Node picked by selection (and possibly created by expansion), ready to
/// be simulated outside any lock.
pub(crate) struct Selection<P> {
    pub node: NodeId,
    pub depth: u32,
    pub position: P,
    pub starting_side: Side,
    pub children_created: usize,
    pub terminal_discovered: bool,
}

/// Build the tree and expand the root when configured to.
pub(crate) fn init_tree<R, G>(
    rules: &R,
    position: R::Position,
    starting_side: Side,
    config: &MctsConfig,
    rng: &mut G,
) -> Result<TreeOf<R>, SearchError>
where
    R: RulesEngine,
    G: Rng + ?Sized,
{
    config.validate()?;

    let side_to_move = rules.side_to_move(&position);
    let mut tree = MctsTree::new(
        position,
        side_to_move,
        starting_side,
        config.seed,
        config.branching_divisor,
    );

    if let Some(divisor) = config.root_branching_divisor {
        match expand(&mut tree, rules, NodeId::ROOT, divisor, rng) {
            Ok(children) => debug!(children = children.len(), "Root expanded"),
            Err(TreeError::TerminalNode(_)) => {
                debug!("Root position is terminal");
                tree.mark_exhausted(NodeId::ROOT);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(tree)
}

/// SELECT, then EXPAND when the selected node was already simulated.
pub(crate) fn select_and_expand<R, G>(
    tree: &mut TreeOf<R>,
    rules: &R,
    rng: &mut G,
) -> Result<Selection<R::Position>, SearchError>
where
    R: RulesEngine,
    G: Rng + ?Sized,
{
    let root = tree.root();
    if tree.get(root).exhausted {
        return Err(SearchError::TreeExhausted);
    }

    let mut current = root;
    let mut depth = 0;
    while tree.get(current).is_expanded() {
        let index = choose_best_child(tree, current, rng)?;
        current = tree.get(current).children[index];
        depth += 1;
    }

    let mut children_created = 0;
    let mut terminal_discovered = false;
    if tree.get(current).visit_count > 0 {
        let divisor = tree.branching_divisor();
        match expand(tree, rules, current, divisor, rng) {
            Ok(children) => {
                children_created = children.len();
                current = children
                    .first()
                    .copied()
                    .ok_or(TreeError::TerminalNode(current))?;
                depth += 1;
            }
            Err(TreeError::TerminalNode(id)) => {
                debug!(node = %id, depth, "Terminal node discovered");
                tree.mark_exhausted(id);
                terminal_discovered = true;
                if tree.get(root).exhausted {
                    debug!(nodes = tree.len(), "Search tree exhausted");
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    let node = tree.get(current);
    Ok(Selection {
        node: current,
        depth,
        position: node.position.clone(),
        starting_side: node.starting_side,
        children_created,
        terminal_discovered,
    })
}

/// Single-threaded MCTS search state.
pub struct MctsSearch<R: RulesEngine> {
    rules: R,
    tree: TreeOf<R>,
    config: MctsConfig,
    rng: ChaCha20Rng,
    iterations: u64,
}

impl<R: RulesEngine> MctsSearch<R> {
    /// Create a new search rooted at `position`, scoring rollouts for
    /// `starting_side`.
    pub fn new(
        rules: R,
        position: R::Position,
        starting_side: Side,
        config: MctsConfig,
    ) -> Result<Self, SearchError> {
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let tree = init_tree(&rules, position, starting_side, &config, &mut rng)?;

        Ok(Self {
            rules,
            tree,
            config,
            rng,
            iterations: 0,
        })
    }

    /// Search the game's initial position for the side that moves first.
    pub fn from_start(rules: R, config: MctsConfig) -> Result<Self, SearchError> {
        let position = rules.initial_position();
        let starting_side = rules.side_to_move(&position);
        Self::new(rules, position, starting_side, config)
    }

    /// Run one full iteration (select -> expand -> rollout -> backpropagate).
    pub fn iterate(&mut self) -> Result<IterationReport, SearchError> {
        let selection = select_and_expand(&mut self.tree, &self.rules, &mut self.rng)?;

        let outcome = simulate(
            &self.rules,
            &selection.position,
            selection.starting_side,
            self.config.max_rollout_plies,
            &mut self.rng,
        )?;

        self.tree.backpropagate(
            selection.node,
            outcome.reward,
            self.config.exploration_constant,
        )?;
        self.iterations += 1;

        trace!(
            node = %selection.node,
            depth = selection.depth,
            reward = outcome.reward,
            plies = outcome.plies,
            "MCTS iteration complete"
        );

        Ok(IterationReport {
            node: selection.node,
            depth: selection.depth,
            reward: outcome.reward,
            plies: outcome.plies,
            children_created: selection.children_created,
            terminal_discovered: selection.terminal_discovered,
        })
    }

    /// Run at most `n` iterations, stopping early if the tree is exhausted.
    pub fn run_iterations(&mut self, n: u64) -> Result<SearchSummary, SearchError> {
        let started = Instant::now();
        let mut completed = 0;
        while completed < n {
            match self.iterate() {
                Ok(_) => completed += 1,
                Err(SearchError::TreeExhausted) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(self.summary(completed, started))
    }

    /// Iterate until `stop` is set or the tree is exhausted.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<SearchSummary, SearchError> {
        let started = Instant::now();
        let mut completed = 0;
        while !stop.load(Ordering::Relaxed) {
            match self.iterate() {
                Ok(_) => completed += 1,
                Err(SearchError::TreeExhausted) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(self.summary(completed, started))
    }

    fn summary(&self, iterations: u64, started: Instant) -> SearchSummary {
        SearchSummary {
            iterations,
            exhausted: self.is_exhausted(),
            elapsed: started.elapsed(),
            stats: self.tree.stats(),
        }
    }

    /// Get the search tree (for inspection and checkpointing).
    pub fn tree(&self) -> &TreeOf<R> {
        &self.tree
    }

    /// Iterations completed since creation.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn is_exhausted(&self) -> bool {
        self.tree.get(self.tree.root()).exhausted
    }

    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }

    pub fn root_children(&self) -> Vec<ChildSummary<R::Move>> {
        self.tree.root_children()
    }

    /// Most visited root move.
    pub fn best_move(&self) -> Option<R::Move> {
        self.tree.best_move()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Ladder;
    use std::collections::HashMap;
    use engine_core::GameResult;
    use games_connect4::Connect4;
    use games_tictactoe::{Action, TicTacToe};

    /// Every non-root expanded node was simulated once before expansion.
    fn assert_counters_consistent<P, M>(tree: &MctsTree<P, M>) {
        for node in tree.arena() {
            let below: u32 = node
                .children
                .iter()
                .map(|&id| tree.get(id).visit_count)
                .sum();
            if node.is_root() {
                assert!(node.visit_count >= below);
            } else if node.is_expanded() {
                assert_eq!(node.visit_count, below + 1, "node {}", node.id);
            } else {
                assert!(node.visit_count <= 2, "leaf {}", node.id);
            }
        }
    }

    #[test]
    fn test_root_visits_equal_iterations() {
        let mut search = MctsSearch::from_start(TicTacToe::new(), MctsConfig::for_testing()).unwrap();

        for i in 1..=150u32 {
            search.iterate().unwrap();
            assert_eq!(search.tree().get(NodeId::ROOT).visit_count, i);
        }
        assert_eq!(search.iterations(), 150);
        assert_counters_consistent(search.tree());
    }

    #[test]
    fn test_counters_are_exact() {
        let game = Ladder::new(6, 5, Some(GameResult::FirstPlayerWins));
        let mut search = MctsSearch::from_start(game, MctsConfig::for_testing()).unwrap();

        let summary = search.run_iterations(120).unwrap();
        assert_eq!(summary.iterations, 120);
        assert_eq!(summary.stats.root_visits, 120);

        // Every rollout is a win for the first player
        for node in search.tree().arena() {
            assert!((node.cumulative_reward - node.visit_count as f64).abs() < 1e-9);
        }
        assert_counters_consistent(search.tree());
    }

    #[test]
    fn test_counters_match_replayed_rewards() {
        let mut search = MctsSearch::from_start(TicTacToe::new(), MctsConfig::for_testing()).unwrap();

        let mut expected: HashMap<NodeId, (u32, f64)> = HashMap::new();
        let (mut wins, mut losses) = (0, 0);
        for _ in 0..300 {
            let report = match search.iterate() {
                Ok(report) => report,
                Err(SearchError::TreeExhausted) => break,
                Err(e) => panic!("iteration failed: {}", e),
            };
            if report.reward > 0.5 {
                wins += 1;
            } else if report.reward < 0.0 {
                losses += 1;
            }
            for id in search.tree().path_to_root(report.node) {
                let entry = expected.entry(id).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += report.reward;
            }
        }
        assert!(wins > 0 && losses > 0, "wins={} losses={}", wins, losses);

        for node in search.tree().arena() {
            let (visits, reward) = expected.get(&node.id).copied().unwrap_or((0, 0.0));
            assert_eq!(node.visit_count, visits, "node {}", node.id);
            assert!(
                (node.cumulative_reward - reward).abs() < 1e-9,
                "node {}: {} != {}",
                node.id,
                node.cumulative_reward,
                reward
            );
        }
    }

    #[test]
    fn test_rewards_follow_starting_side() {
        let game = Ladder::new(2, 4, Some(GameResult::FirstPlayerWins));
        let start = game.initial_position();
        let mut search = MctsSearch::new(game, start, Side::Second, MctsConfig::for_testing()).unwrap();

        search.run_iterations(40).unwrap();

        let root = search.tree().get(NodeId::ROOT);
        assert!((root.cumulative_reward + root.visit_count as f64).abs() < 1e-9);
        assert!(search
            .tree()
            .arena()
            .iter()
            .all(|node| node.starting_side == Side::Second));
    }

    #[test]
    fn test_side_to_move_alternates_by_depth() {
        let mut search = MctsSearch::from_start(TicTacToe::new(), MctsConfig::for_testing()).unwrap();
        search.run_iterations(200).unwrap();

        let tree = search.tree();
        for node in tree.arena() {
            let expected = if tree.depth(node.id) % 2 == 0 {
                Side::First
            } else {
                Side::Second
            };
            assert_eq!(node.side_to_move, expected);
        }
    }

    #[test]
    fn test_same_seed_same_tree() {
        let run = |seed| {
            let config = MctsConfig::for_testing().with_seed(seed);
            let mut search = MctsSearch::from_start(TicTacToe::new(), config).unwrap();
            search.run_iterations(300).unwrap();
            search
                .tree()
                .arena()
                .iter()
                .map(|n| (n.mv, n.visit_count, n.cumulative_reward))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn test_first_iteration_on_expanded_root() {
        let mut search = MctsSearch::from_start(TicTacToe::new(), MctsConfig::for_testing()).unwrap();
        assert_eq!(search.tree().len(), 10);

        let report = search.iterate().unwrap();
        assert_eq!(report.depth, 1);
        assert_eq!(report.children_created, 0);
        assert!(!report.terminal_discovered);
        assert!(search.tree().get(report.node).parent == Some(NodeId::ROOT));
    }

    #[test]
    fn test_root_without_pre_expansion() {
        let config = MctsConfig::for_testing().with_root_branching_divisor(None);
        let mut search = MctsSearch::from_start(TicTacToe::new(), config).unwrap();
        assert_eq!(search.tree().len(), 1);

        // Unvisited root is simulated directly
        let first = search.iterate().unwrap();
        assert_eq!(first.node, NodeId::ROOT);
        assert_eq!(first.depth, 0);

        // Then expanded with the regular divisor: 9 / 2 = 4 children
        let second = search.iterate().unwrap();
        assert_eq!(second.children_created, 4);
        assert_eq!(second.depth, 1);
        assert_eq!(search.tree().get(NodeId::ROOT).children.len(), 4);
        assert_eq!(search.tree().get(NodeId::ROOT).visit_count, 2);
    }

    #[test]
    fn test_small_game_is_exhausted() {
        let game = Ladder::new(2, 2, Some(GameResult::Draw));
        let mut search = MctsSearch::from_start(game, MctsConfig::full_width()).unwrap();

        let summary = search.run_iterations(1000).unwrap();
        assert!(summary.exhausted);
        assert!(summary.iterations < 1000);
        assert_eq!(summary.stats.root_visits as u64, summary.iterations);
        assert_eq!(summary.stats.total_nodes, 7);
        assert_eq!(summary.stats.exhausted_nodes, 7);
        assert!(matches!(search.iterate(), Err(SearchError::TreeExhausted)));
        assert_counters_consistent(search.tree());
    }

    #[test]
    fn test_terminal_root() {
        let game = Ladder::new(3, 0, Some(GameResult::Draw));
        let mut search = MctsSearch::from_start(game, MctsConfig::for_testing()).unwrap();
        assert!(search.is_exhausted());
        assert_eq!(search.run_iterations(10).unwrap().iterations, 0);

        let game = Ladder::new(3, 0, Some(GameResult::Draw));
        let config = MctsConfig::for_testing().with_root_branching_divisor(None);
        let mut search = MctsSearch::from_start(game, config).unwrap();

        let first = search.iterate().unwrap();
        assert!(!first.terminal_discovered);
        let second = search.iterate().unwrap();
        assert!(second.terminal_discovered);
        assert_eq!(second.plies, 0);
        assert!(matches!(search.iterate(), Err(SearchError::TreeExhausted)));
        assert_eq!(search.tree().get(NodeId::ROOT).visit_count, 2);
    }

    #[test]
    fn test_winning_move_is_solved() {
        // X | X | _
        // O | O | _
        // _ | _ | _
        let game = TicTacToe::new();
        let position = game.decode("XX.OO..../X").unwrap();
        let mut search = MctsSearch::new(game, position, Side::First, MctsConfig::full_width()).unwrap();

        search.run_iterations(500).unwrap();

        let children = search.root_children();
        assert_eq!(children.len(), 5);
        let winning = children
            .iter()
            .find(|child| child.mv == Action::Place(2))
            .unwrap();
        assert!(winning.exhausted);
        assert!((winning.mean_reward - 1.0).abs() < 1e-12);
        assert!(children
            .iter()
            .filter(|child| child.mv != Action::Place(2))
            .all(|child| child.mean_reward < 1.0));
    }

    #[test]
    fn test_run_honours_stop_flag() {
        let mut search = MctsSearch::from_start(TicTacToe::new(), MctsConfig::for_testing()).unwrap();
        let stop = AtomicBool::new(true);

        let summary = search.run(&stop).unwrap();
        assert_eq!(summary.iterations, 0);
        assert!(!summary.exhausted);
    }

    #[test]
    fn test_run_until_exhausted() {
        let game = Ladder::new(3, 2, Some(GameResult::SecondPlayerWins));
        let mut search = MctsSearch::from_start(game, MctsConfig::full_width()).unwrap();
        let stop = AtomicBool::new(false);

        let summary = search.run(&stop).unwrap();
        assert!(summary.exhausted);
        assert_eq!(summary.stats.total_nodes, 13);
        assert!((summary.stats.root_mean_reward + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MctsConfig::for_testing().with_branching_divisor(0);
        assert!(matches!(
            MctsSearch::from_start(TicTacToe::new(), config),
            Err(SearchError::InvalidConfig(ConfigError::ZeroBranchingDivisor))
        ));
    }

    #[test]
    fn test_rollout_errors_surface() {
        let game = Ladder::new(0, 3, Some(GameResult::Draw));
        let config = MctsConfig::for_testing().with_root_branching_divisor(None);
        let mut search = MctsSearch::from_start(game, config).unwrap();

        assert!(matches!(
            search.iterate(),
            Err(SearchError::Rollout(RolloutError::StalledPosition { .. }))
        ));
    }

    #[test]
    fn test_connect4_search() {
        let mut search = MctsSearch::from_start(Connect4::new(), MctsConfig::for_testing()).unwrap();
        let summary = search.run_iterations(200).unwrap();

        assert_eq!(summary.stats.root_visits, 200);
        assert_eq!(search.root_children().len(), 7);
        assert!(summary.stats.max_depth >= 2);
        assert!(search.best_move().is_some());
        assert_counters_consistent(search.tree());
    }
}
