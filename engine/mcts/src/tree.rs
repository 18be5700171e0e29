//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices; parents and children refer to each
//! other only through ids.

use engine_core::{RulesEngine, Side};
use std::fmt;
use thiserror::Error;

use crate::node::{MctsNode, NodeId};
use crate::scoring;

/// Tree whose nodes hold the position and move types of rules engine `R`.
pub type TreeOf<R> = MctsTree<<R as RulesEngine>::Position, <R as RulesEngine>::Move>;

/// Why a selection score could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreUndefined {
    /// The root has no parent visit count to compare against
    RootNode,
    /// ln(parent) / 0 is undefined
    Unvisited,
}

impl fmt::Display for ScoreUndefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreUndefined::RootNode => write!(f, "node has no parent"),
            ScoreUndefined::Unvisited => write!(f, "node has never been visited"),
        }
    }
}

/// Errors raised by tree operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// The node's position has no legal moves. Recoverable: the search marks
    /// the node exhausted and never expands it again.
    #[error("Node {0} is terminal: no legal moves to expand")]
    TerminalNode(NodeId),

    #[error("Node {0} has no children to choose from")]
    EmptyChildSet(NodeId),

    #[error("Selection score of node {node} is undefined: {reason}")]
    UndefinedScore { node: NodeId, reason: ScoreUndefined },

    #[error("Node {0} is already expanded")]
    AlreadyExpanded(NodeId),

    #[error("Every child of node {0} is exhausted")]
    Exhausted(NodeId),
}

/// MCTS tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct MctsTree<P, M> {
    /// Arena storing all nodes
    nodes: Vec<MctsNode<P, M>>,

    /// Root node index (always 0)
    root: NodeId,

    /// Seed the search was started with
    seed: u64,

    /// Divisor applied to the legal move count when expanding
    branching_divisor: u32,
}

impl<P, M> MctsTree<P, M> {
    /// Create a new tree holding only the root position.
    pub fn new(
        position: P,
        side_to_move: Side,
        starting_side: Side,
        seed: u64,
        branching_divisor: u32,
    ) -> Self {
        let root_node = MctsNode::new_root(position, side_to_move, starting_side);
        Self {
            nodes: vec![root_node],
            root: NodeId::ROOT,
            seed,
            branching_divisor,
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn branching_divisor(&self) -> u32 {
        self.branching_divisor
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode<P, M> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode<P, M> {
        &mut self.nodes[id.index()]
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[MctsNode<P, M>] {
        &self.nodes
    }

    /// Add a child to a parent node.
    ///
    /// The child inherits the parent's starting side and starts with zeroed
    /// counters. Returns the new child's NodeId.
    pub fn add_child(&mut self, parent_id: NodeId, mv: M, position: P, side_to_move: Side) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let starting_side = self.get(parent_id).starting_side;
        self.nodes.push(MctsNode::new_child(
            id,
            parent_id,
            mv,
            position,
            side_to_move,
            starting_side,
        ));

        self.get_mut(parent_id).children.push(id);
        id
    }

    /// Node ids from `id` up to and including the root.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.get(parent).parent;
        }
        path
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> u32 {
        self.path_to_root(id).len() as u32 - 1
    }

    /// Backpropagate a rollout reward from `leaf_id` to the root.
    ///
    /// Every node on the path gets one more visit and the same reward. Scores
    /// are recomputed afterwards for each non-root node on the path, so each
    /// score sees its parent's updated visit count. Returns the path, leaf first.
    pub fn backpropagate(
        &mut self,
        leaf_id: NodeId,
        reward: f64,
        exploration: f64,
    ) -> Result<Vec<NodeId>, TreeError> {
        let path = self.path_to_root(leaf_id);

        for &id in &path {
            let node = self.get_mut(id);
            node.visit_count += 1;
            node.cumulative_reward += reward;
        }

        for &id in path.iter().filter(|id| !id.is_root()) {
            scoring::compute_score(self, id, exploration)?;
        }

        Ok(path)
    }

    /// Mark a node exhausted and propagate upwards while every sibling is
    /// exhausted too.
    pub fn mark_exhausted(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get_mut(node_id);
            node.exhausted = true;
            current = node.parent;

            if let Some(parent) = current {
                let all_done = self
                    .get(parent)
                    .children
                    .iter()
                    .all(|&child| self.get(child).exhausted);
                if !all_done {
                    break;
                }
            }
        }
    }

    /// Get the most visited child. Ties go to the earliest child.
    pub fn best_child_by_visits(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .rev()
            .max_by_key(|&child| self.get(child).visit_count)
    }

    /// Get statistics about the tree for progress reports.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_mean_reward: root.mean_reward(),
            max_depth: self.compute_max_depth(),
            exhausted_nodes: self.nodes.iter().filter(|n| n.exhausted).count(),
        }
    }

    /// Children are always allocated after their parent, so a single forward
    /// pass over the arena sees every parent depth first.
    fn compute_max_depth(&self) -> u32 {
        let mut depths = vec![0u32; self.nodes.len()];
        let mut max_depth = 0;
        for node in &self.nodes {
            if let Some(parent) = node.parent {
                let depth = depths[parent.index()] + 1;
                depths[node.id.index()] = depth;
                max_depth = max_depth.max(depth);
            }
        }
        max_depth
    }
}

impl<P, M: Clone> MctsTree<P, M> {
    /// Per-child statistics of the root in creation order.
    pub fn root_children(&self) -> Vec<ChildSummary<M>> {
        self.get(self.root)
            .children
            .iter()
            .filter_map(|&id| {
                let node = self.get(id);
                node.mv.clone().map(|mv| ChildSummary {
                    id,
                    mv,
                    visits: node.visit_count,
                    mean_reward: node.mean_reward(),
                    score: node.selection_score,
                    exhausted: node.exhausted,
                })
            })
            .collect()
    }

    /// Most visited move at the root.
    pub fn best_move(&self) -> Option<M> {
        self.best_child_by_visits(self.root)
            .and_then(|id| self.get(id).mv.clone())
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_mean_reward: f64,
    pub max_depth: u32,
    pub exhausted_nodes: usize,
}

/// Statistics of one root child.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSummary<M> {
    pub id: NodeId,
    pub mv: M,
    pub visits: u32,
    pub mean_reward: f64,
    pub score: Option<f64>,
    pub exhausted: bool,
}
