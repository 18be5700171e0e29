//! MCTS tree node representation.
//!
//! Each node owns a snapshot of the game position reached by playing `mv`
//! from its parent. Nodes store the visit statistics used by UCT selection.

use engine_core::{RulesEngine, Side};
use std::fmt;

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root is always the first node allocated.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode<P, M> {
    /// Arena index of this node
    pub id: NodeId,

    /// Parent node index (None for root)
    pub parent: Option<NodeId>,

    /// Move that led to this node from parent (None for root)
    pub mv: Option<M>,

    /// Side to move in `position`
    pub side_to_move: Side,

    /// Side the whole search evaluates rewards for
    pub starting_side: Side,

    /// Owned game position at this node
    pub position: P,

    /// Legal moves at this node, computed at most once
    pub legal_moves: Option<Vec<M>>,

    /// Number of completed rollouts at or below this node
    pub visit_count: u32,

    /// Sum of rollout rewards backpropagated through this node
    pub cumulative_reward: f64,

    /// Last computed UCT score (never set on the root)
    pub selection_score: Option<f64>,

    /// Children in creation order. Empty until node is expanded.
    pub children: Vec<NodeId>,

    /// Known to be terminal, or every child is exhausted.
    /// Exhausted nodes are never selected again.
    pub exhausted: bool,
}

impl<P, M> MctsNode<P, M> {
    /// Create a new root node.
    pub fn new_root(position: P, side_to_move: Side, starting_side: Side) -> Self {
        Self {
            id: NodeId::ROOT,
            parent: None,
            mv: None,
            side_to_move,
            starting_side,
            position,
            legal_moves: None,
            visit_count: 0,
            cumulative_reward: 0.0,
            selection_score: None,
            children: Vec::new(),
            exhausted: false,
        }
    }

    /// Create a new child node.
    pub fn new_child(
        id: NodeId,
        parent: NodeId,
        mv: M,
        position: P,
        side_to_move: Side,
        starting_side: Side,
    ) -> Self {
        Self {
            id,
            parent: Some(parent),
            mv: Some(mv),
            side_to_move,
            starting_side,
            position,
            legal_moves: None,
            visit_count: 0,
            cumulative_reward: 0.0,
            selection_score: None,
            children: Vec::new(),
            exhausted: false,
        }
    }

    /// Legal moves at this node, asking the rules engine only the first time.
    pub fn compute_legal_moves<R>(&mut self, rules: &R) -> &[M]
    where
        R: RulesEngine<Position = P, Move = M>,
    {
        let position = &self.position;
        self.legal_moves
            .get_or_insert_with(|| rules.legal_moves(position))
    }

    /// Mean reward = cumulative_reward / visit_count.
    /// Returns 0.0 if never visited.
    #[inline]
    pub fn mean_reward(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.cumulative_reward / self.visit_count as f64
        }
    }

    /// Check if this node has been expanded (has children).
    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
