//! Expansion policy: grow a random subset of a node's legal moves.

use engine_core::RulesEngine;
use rand::Rng;

use crate::node::NodeId;
use crate::tree::{TreeError, TreeOf};

/// Number of children to create for a node with `legal` moves.
///
/// A single legal move always yields one child; otherwise
/// `max(1, legal / divisor)`. A zero divisor behaves like 1.
#[inline]
pub fn children_to_sample(legal: usize, divisor: u32) -> usize {
    match legal {
        0 => 0,
        1 => 1,
        n => (n / divisor.max(1) as usize).max(1),
    }
}

/// Expand `id` with a uniform sample of its legal moves, without replacement.
///
/// Each child gets the position after its move, the opposite side to move,
/// the parent's starting side and its own legal moves. Children are appended
/// in sampling order and their ids returned in that order.
pub fn expand<R, G>(
    tree: &mut TreeOf<R>,
    rules: &R,
    id: NodeId,
    divisor: u32,
    rng: &mut G,
) -> Result<Vec<NodeId>, TreeError>
where
    R: RulesEngine,
    G: Rng + ?Sized,
{
    if tree.get(id).is_expanded() {
        return Err(TreeError::AlreadyExpanded(id));
    }

    let moves = tree.get_mut(id).compute_legal_moves(rules).to_vec();
    if moves.is_empty() {
        return Err(TreeError::TerminalNode(id));
    }

    let k = children_to_sample(moves.len(), divisor);
    let child_side = tree.get(id).side_to_move.opponent();

    let mut created = Vec::with_capacity(k);
    for index in rand::seq::index::sample(rng, moves.len(), k).iter() {
        let mv = moves[index].clone();
        let position = rules.apply(&tree.get(id).position, &mv);
        let child = tree.add_child(id, mv, position, child_side);
        tree.get_mut(child).compute_legal_moves(rules);
        created.push(child);
    }

    Ok(created)
}
