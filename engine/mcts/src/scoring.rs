//! UCT scoring and child selection.
//!
//! ```text
//! score = cumulative_reward / visits + C * sqrt(ln(parent_visits) / visits)
//! ```
//!
//! Higher scores are better (more promising to explore). Children that have
//! never been scored rank above every scored sibling.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::node::NodeId;
use crate::tree::{MctsTree, ScoreUndefined, TreeError};

/// Default exploration constant C = sqrt(2).
pub const EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

/// Raw UCT value. Callers guarantee `visits > 0` and `parent_visits > 0`.
#[inline]
pub fn uct_score(cumulative_reward: f64, visits: u32, parent_visits: u32, exploration: f64) -> f64 {
    let visits = visits as f64;
    let exploitation = cumulative_reward / visits;
    let exploration_term = exploration * ((parent_visits as f64).ln() / visits).sqrt();
    exploitation + exploration_term
}

/// Compute and store the selection score of `id`.
///
/// Fails with `UndefinedScore` for the root or an unvisited node; no other
/// node is touched.
pub fn compute_score<P, M>(
    tree: &mut MctsTree<P, M>,
    id: NodeId,
    exploration: f64,
) -> Result<f64, TreeError> {
    let node = tree.get(id);
    let parent = node.parent.ok_or(TreeError::UndefinedScore {
        node: id,
        reason: ScoreUndefined::RootNode,
    })?;
    if node.visit_count == 0 {
        return Err(TreeError::UndefinedScore {
            node: id,
            reason: ScoreUndefined::Unvisited,
        });
    }

    let score = uct_score(
        node.cumulative_reward,
        node.visit_count,
        tree.get(parent).visit_count,
        exploration,
    );
    tree.get_mut(id).selection_score = Some(score);
    Ok(score)
}

/// Index (into `children`) of the child with the highest selection score.
///
/// Exact ties are broken uniformly at random. Exhausted children are never
/// chosen.
pub fn choose_best_child<P, M, G>(
    tree: &MctsTree<P, M>,
    id: NodeId,
    rng: &mut G,
) -> Result<usize, TreeError>
where
    G: Rng + ?Sized,
{
    let children = &tree.get(id).children;
    if children.is_empty() {
        return Err(TreeError::EmptyChildSet(id));
    }

    let mut best = f64::NEG_INFINITY;
    let mut tied: Vec<usize> = Vec::new();
    for (index, &child_id) in children.iter().enumerate() {
        let child = tree.get(child_id);
        if child.exhausted {
            continue;
        }

        let score = child.selection_score.unwrap_or(f64::INFINITY);
        if tied.is_empty() || score > best {
            best = score;
            tied.clear();
            tied.push(index);
        } else if score == best {
            tied.push(index);
        }
    }

    tied.choose(rng).copied().ok_or(TreeError::Exhausted(id))
}
