//! Final search report.
//!
//! The report is plain data so it can be printed as a table or serialized
//! to JSON for other tools.

use anyhow::Result;
use engine_core::Side;
use mcts::{ChildSummary, SearchSummary};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics of one root move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveReport {
    #[serde(rename = "move")]
    pub mv: String,
    pub visits: u32,
    pub mean_reward: f64,
    pub score: Option<f64>,
    pub exhausted: bool,
}

/// Serializable outcome of a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub env_id: String,
    /// Encoded root position
    pub position: String,
    pub starting_side: Side,
    pub seed: u64,
    pub workers: usize,
    pub iterations: u64,
    pub exhausted: bool,
    pub elapsed_seconds: f64,
    pub iterations_per_second: f64,
    pub total_nodes: usize,
    pub max_depth: u32,
    pub exhausted_nodes: usize,
    pub root_mean_reward: f64,
    pub children: Vec<MoveReport>,
    pub best_move: Option<String>,
}

/// Identity of the run, filled in by the runner.
pub struct RunInfo<'a> {
    pub env_id: &'a str,
    pub position: String,
    pub starting_side: Side,
    pub seed: u64,
    pub workers: usize,
}

impl SearchReport {
    pub fn new<M: fmt::Display>(
        info: RunInfo<'_>,
        summary: &SearchSummary,
        children: &[ChildSummary<M>],
        best_move: Option<M>,
    ) -> Self {
        let elapsed_seconds = summary.elapsed.as_secs_f64();
        let iterations_per_second = if elapsed_seconds > 0.0 {
            summary.iterations as f64 / elapsed_seconds
        } else {
            0.0
        };

        let mut children: Vec<MoveReport> = children
            .iter()
            .map(|child| MoveReport {
                mv: child.mv.to_string(),
                visits: child.visits,
                mean_reward: child.mean_reward,
                score: child.score,
                exhausted: child.exhausted,
            })
            .collect();
        // Most visited first; the sort is stable so ties keep expansion order
        children.sort_by(|a, b| b.visits.cmp(&a.visits));

        Self {
            env_id: info.env_id.to_string(),
            position: info.position,
            starting_side: info.starting_side,
            seed: info.seed,
            workers: info.workers,
            iterations: summary.iterations,
            exhausted: summary.exhausted,
            elapsed_seconds,
            iterations_per_second,
            total_nodes: summary.stats.total_nodes,
            max_depth: summary.stats.max_depth,
            exhausted_nodes: summary.stats.exhausted_nodes,
            root_mean_reward: summary.stats.root_mean_reward,
            children,
            best_move: best_move.map(|mv| mv.to_string()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "game:        {} [{}]", self.env_id, self.position)?;
        writeln!(
            f,
            "scoring for: {} player (seed {}, {} worker(s))",
            self.starting_side, self.seed, self.workers
        )?;
        writeln!(
            f,
            "iterations:  {} in {:.2}s ({:.0}/s){}",
            self.iterations,
            self.elapsed_seconds,
            self.iterations_per_second,
            if self.exhausted { ", tree solved" } else { "" }
        )?;
        writeln!(
            f,
            "tree:        {} nodes, depth {}, {} exhausted",
            self.total_nodes, self.max_depth, self.exhausted_nodes
        )?;
        writeln!(f)?;
        writeln!(f, "{:>6}  {:>9}  {:>8}  {:>8}", "move", "visits", "mean", "uct")?;
        for child in &self.children {
            let score = match child.score {
                Some(score) => format!("{:8.4}", score),
                None => format!("{:>8}", "-"),
            };
            writeln!(
                f,
                "{:>6}  {:>9}  {:8.4}  {}{}",
                child.mv,
                child.visits,
                child.mean_reward,
                score,
                if child.exhausted { "  solved" } else { "" }
            )?;
        }
        writeln!(f)?;
        match &self.best_move {
            Some(mv) => writeln!(f, "most visited move: {}", mv),
            None => writeln!(f, "most visited move: none (position is terminal)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcts::{NodeId, TreeStats};
    use std::time::Duration;

    fn summary(iterations: u64) -> SearchSummary {
        SearchSummary {
            iterations,
            exhausted: false,
            elapsed: Duration::from_millis(500),
            stats: TreeStats {
                total_nodes: 12,
                root_visits: iterations as u32,
                root_mean_reward: 0.25,
                max_depth: 3,
                exhausted_nodes: 1,
            },
        }
    }

    fn child(index: u32, mv: u8, visits: u32) -> ChildSummary<u8> {
        ChildSummary {
            id: NodeId(index),
            mv,
            visits,
            mean_reward: 0.5,
            score: (visits > 0).then_some(1.25),
            exhausted: false,
        }
    }

    fn info() -> RunInfo<'static> {
        RunInfo {
            env_id: "tictactoe",
            position: ".........".into(),
            starting_side: Side::First,
            seed: 42,
            workers: 1,
        }
    }

    #[test]
    fn test_children_sorted_by_visits() {
        let children = vec![child(1, 0, 3), child(2, 1, 10), child(3, 2, 3), child(4, 3, 0)];
        let report = SearchReport::new(info(), &summary(16), &children, Some(1u8));

        let order: Vec<&str> = report.children.iter().map(|c| c.mv.as_str()).collect();
        assert_eq!(order, vec!["1", "0", "2", "3"]);
        assert_eq!(report.best_move.as_deref(), Some("1"));
        assert_eq!(report.children[3].score, None);
    }

    #[test]
    fn test_rate_computation() {
        let report = SearchReport::new(info(), &summary(100), &[] as &[ChildSummary<u8>], None);
        assert!((report.iterations_per_second - 200.0).abs() < 1e-9);
        assert_eq!(report.total_nodes, 12);
        assert_eq!(report.max_depth, 3);
    }

    #[test]
    fn test_zero_elapsed_rate() {
        let mut summary = summary(0);
        summary.elapsed = Duration::ZERO;
        let report = SearchReport::new(info(), &summary, &[] as &[ChildSummary<u8>], None);
        assert_eq!(report.iterations_per_second, 0.0);
        assert!(!report.iterations_per_second.is_nan());
    }

    #[test]
    fn test_json_roundtrip() {
        let children = vec![child(1, 4, 7)];
        let report = SearchReport::new(info(), &summary(7), &children, Some(4u8));

        let json = report.to_json().unwrap();
        assert!(json.contains("\"move\": \"4\""));
        let parsed: SearchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.iterations, 7);
        assert_eq!(parsed.starting_side, Side::First);
        assert_eq!(parsed.children.len(), 1);
    }

    #[test]
    fn test_text_output() {
        let children = vec![child(1, 4, 7)];
        let report = SearchReport::new(info(), &summary(7), &children, Some(4u8));
        let text = report.to_string();
        assert!(text.contains("most visited move: 4"));
        assert!(text.contains("12 nodes"));

        let empty = SearchReport::new(info(), &summary(0), &[] as &[ChildSummary<u8>], None);
        assert!(empty.to_string().contains("position is terminal"));
    }
}
