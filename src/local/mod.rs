//! # Local Thresholding
//!
//! Sparse thresholds on connectomes tend to shatter the graph into islands.
//! Local thresholding never drops below a spanning structure:
//!
//! ```text
//! ranked candidates ──► Kruskal ──► maximum-weight spanning tree (n-1 edges)
//!                                         │
//!                 round k = 1, 2, ... ◄───┘
//!                 every node nominates its k best-ranked edges not yet kept
//!                 until the target is met or nothing is left to nominate
//!                                         │
//!                 trim to exactly T edges ┘ (tree edges are never trimmed)
//! ```
//!
//! Each round rescans every node's neighbour list, so the cost grows with
//! both `n` and the number of rounds. Targets close to 100% of the possible
//! edges need many rounds and approach a full rescan of the candidate set per
//! round; expect that to dominate runtime for large matrices.

pub mod forest;

use hashbrown::HashSet;
use tracing::debug;

use crate::model::EdgeKey;
use crate::overlay::Diagnostic;
use crate::store::AdjacencyMatrix;
use crate::threshold::{Candidate, ThresholdSpec, candidates, rank};
use crate::{Error, Result};

use self::forest::maximum_spanning_forest;

/// When growth stops.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Goal {
    /// Exactly this many edges (already clamped to the candidate count).
    Count(usize),
    /// Every candidate scoring strictly above the cutoff.
    Above(f64),
}

impl Goal {
    fn admits(&self, candidate: &Candidate) -> bool {
        match self {
            Goal::Count(_) => true,
            Goal::Above(cutoff) => candidate.score > *cutoff,
        }
    }

    fn reached(&self, kept: usize) -> bool {
        matches!(self, Goal::Count(target) if kept >= *target)
    }
}

/// Edges chosen by a local threshold, before they touch any graph.
#[derive(Debug, Clone, Default)]
pub struct LocalSelection {
    /// Final edges in ranking order.
    pub edges: Vec<Candidate>,
    /// How many of `edges` come from the spanning tree.
    pub tree_edges: usize,
    /// Growth rounds that added at least one edge.
    pub rounds: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Connectivity-preserving thresholding over one matrix.
pub struct LocalThresholdEngine<'m> {
    matrix: &'m AdjacencyMatrix,
}

impl<'m> LocalThresholdEngine<'m> {
    pub fn new(matrix: &'m AdjacencyMatrix) -> Self {
        Self { matrix }
    }

    /// The maximum-weight spanning tree alone, in ranking order.
    ///
    /// Fails with `DisconnectedInput` if the nonzero-weight graph has more
    /// than one component.
    pub fn spanning_tree(&self, use_absolute: bool) -> Result<Vec<Candidate>> {
        let mut pool = candidates(self.matrix, use_absolute);
        rank(&mut pool);
        self.tree_from(&pool)
    }

    fn tree_from(&self, ranked: &[Candidate]) -> Result<Vec<Candidate>> {
        let forest = maximum_spanning_forest(self.matrix.n(), ranked);
        if !forest.is_tree() {
            return Err(Error::DisconnectedInput { components: forest.components });
        }
        Ok(forest.edges)
    }

    /// Run local thresholding.
    ///
    /// With no `target` the result is the spanning tree. A count or percent
    /// target grows the tree to exactly that many edges; a value cutoff grows
    /// it by every candidate scoring above the cutoff. Scores use `|w|` when
    /// `use_absolute` is set or the target asks for it.
    pub fn run(&self, target: Option<ThresholdSpec>, use_absolute: bool) -> Result<LocalSelection> {
        let use_absolute = use_absolute || target.is_some_and(|t| t.use_absolute);
        let goal = match target {
            Some(spec) => Some(match spec.target_edges(self.matrix.possible_edges())? {
                Some(count) => Goal::Count(count),
                None => Goal::Above(spec.value),
            }),
            None => None,
        };

        let mut pool = candidates(self.matrix, use_absolute);
        rank(&mut pool);
        let tree = self.tree_from(&pool)?;
        let tree_edges = tree.len();
        let mut diagnostics = Vec::new();

        let goal = match goal {
            None => return Ok(LocalSelection { edges: tree, tree_edges, ..Default::default() }),
            Some(Goal::Count(requested)) if requested <= tree_edges => {
                if requested < tree_edges {
                    diagnostics.push(Diagnostic::target_below_spanning_tree(requested, tree_edges));
                }
                return Ok(LocalSelection { edges: tree, tree_edges, rounds: 0, diagnostics });
            }
            Some(Goal::Count(requested)) if requested > pool.len() => {
                diagnostics.push(Diagnostic::candidates_exhausted(requested, pool.len()));
                Goal::Count(pool.len())
            }
            Some(goal) => goal,
        };

        let (mut grown, rounds) = self.grow(&pool, &tree, goal);

        if let Goal::Count(target) = goal {
            rank(&mut grown);
            grown.truncate(target - tree_edges);
        }

        let mut edges = tree;
        edges.extend(grown);
        rank(&mut edges);
        debug!(edges = edges.len(), tree_edges, rounds, "local threshold selection");

        Ok(LocalSelection { edges, tree_edges, rounds, diagnostics })
    }

    /// k-nearest-neighbour growth rounds on top of `tree`.
    ///
    /// Returns the edges added (in nomination order) and the number of rounds
    /// that added anything.
    fn grow(&self, ranked: &[Candidate], tree: &[Candidate], goal: Goal) -> (Vec<Candidate>, usize) {
        // Per-node lists inherit the global ranking order.
        let mut neighbours: Vec<Vec<Candidate>> = vec![Vec::new(); self.matrix.n()];
        for candidate in ranked.iter().filter(|c| goal.admits(c)) {
            neighbours[candidate.key.a.0].push(*candidate);
            neighbours[candidate.key.b.0].push(*candidate);
        }

        let mut kept: HashSet<EdgeKey> = tree.iter().map(|c| c.key).collect();
        let mut grown = Vec::new();
        let mut rounds = 0;

        for k in 1.. {
            if goal.reached(kept.len()) {
                break;
            }

            let mut nominated = Vec::new();
            let mut seen = HashSet::new();
            for list in &neighbours {
                for candidate in list.iter().filter(|c| !kept.contains(&c.key)).take(k) {
                    if seen.insert(candidate.key) {
                        nominated.push(*candidate);
                    }
                }
            }
            if nominated.is_empty() {
                break;
            }

            rounds = k;
            debug!(round = k, added = nominated.len(), kept = kept.len() + nominated.len(), "growth round");
            for candidate in nominated {
                kept.insert(candidate.key);
                grown.push(candidate);
            }
        }

        (grown, rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::ThresholdKind;

    /// Four regions; strongest links 1-2, 2-3, 0-1 form the spanning tree.
    fn scenario() -> AdjacencyMatrix {
        AdjacencyMatrix::from_rows(vec![
            vec![0.0, 0.6008, 0.2036, 0.1639],
            vec![0.6008, 0.0, 0.8438, 0.2427],
            vec![0.2036, 0.8438, 0.0, 0.6373],
            vec![0.1639, 0.2427, 0.6373, 0.0],
        ])
        .unwrap()
    }

    fn keys(edges: &[Candidate]) -> Vec<EdgeKey> {
        edges.iter().map(|c| c.key).collect()
    }

    #[test]
    fn test_spanning_tree_only() {
        let m = scenario();
        let sel = LocalThresholdEngine::new(&m).run(None, false).unwrap();
        assert_eq!(
            keys(&sel.edges),
            vec![EdgeKey::new(1, 2), EdgeKey::new(2, 3), EdgeKey::new(0, 1)]
        );
        assert_eq!(sel.tree_edges, 3);
        assert_eq!(sel.rounds, 0);
    }

    #[test]
    fn test_one_round_then_trim() {
        // Round 1 nominates (0,2) and (1,3); a target of 4 keeps the better one.
        let m = scenario();
        let sel = LocalThresholdEngine::new(&m)
            .run(Some(ThresholdSpec::total_edges(4)), false)
            .unwrap();
        assert_eq!(
            keys(&sel.edges),
            vec![EdgeKey::new(1, 2), EdgeKey::new(2, 3), EdgeKey::new(0, 1), EdgeKey::new(1, 3)]
        );
        assert_eq!(sel.rounds, 1);
    }

    #[test]
    fn test_full_percent_needs_two_rounds() {
        let m = scenario();
        let sel = LocalThresholdEngine::new(&m)
            .run(Some(ThresholdSpec::edge_percent(100.0)), false)
            .unwrap();
        assert_eq!(sel.edges.len(), 6);
        assert_eq!(sel.rounds, 2);
    }

    #[test]
    fn test_target_below_tree_keeps_tree() {
        let m = scenario();
        let sel = LocalThresholdEngine::new(&m)
            .run(Some(ThresholdSpec::total_edges(1)), false)
            .unwrap();
        assert_eq!(sel.edges.len(), 3);
        assert_eq!(sel.diagnostics, vec![Diagnostic::target_below_spanning_tree(1, 3)]);
    }

    #[test]
    fn test_value_cutoff_keeps_tree_and_qualifying() {
        let m = scenario();
        let sel = LocalThresholdEngine::new(&m)
            .run(Some(ThresholdSpec::value_cutoff(0.62)), false)
            .unwrap();
        // Only 1-2 and 2-3 clear the cutoff; 0-1 stays for connectivity.
        assert_eq!(sel.edges.len(), 3);

        let sel = LocalThresholdEngine::new(&m)
            .run(Some(ThresholdSpec::value_cutoff(0.2)), false)
            .unwrap();
        assert_eq!(
            keys(&sel.edges),
            vec![
                EdgeKey::new(1, 2),
                EdgeKey::new(2, 3),
                EdgeKey::new(0, 1),
                EdgeKey::new(1, 3),
                EdgeKey::new(0, 2),
            ]
        );
    }

    #[test]
    fn test_disconnected_input() {
        let m = AdjacencyMatrix::from_rows(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ])
        .unwrap();
        assert!(matches!(
            LocalThresholdEngine::new(&m).run(None, false),
            Err(Error::DisconnectedInput { components: 2 })
        ));
    }

    #[test]
    fn test_absolute_scores_pick_strong_negatives() {
        let m = AdjacencyMatrix::from_rows(vec![
            vec![0.0, 0.1, -0.9],
            vec![0.1, 0.0, 0.2],
            vec![-0.9, 0.2, 0.0],
        ])
        .unwrap();
        let tree = LocalThresholdEngine::new(&m).spanning_tree(true).unwrap();
        assert_eq!(keys(&tree), vec![EdgeKey::new(0, 2), EdgeKey::new(1, 2)]);

        let tree = LocalThresholdEngine::new(&m).spanning_tree(false).unwrap();
        assert_eq!(keys(&tree), vec![EdgeKey::new(1, 2), EdgeKey::new(0, 1)]);
    }

    #[test]
    fn test_invalid_percent_rejected() {
        let m = scenario();
        assert!(matches!(
            LocalThresholdEngine::new(&m).run(Some(ThresholdSpec::edge_percent(120.0)), false),
            Err(Error::InvalidThresholdValue { kind: ThresholdKind::EdgePercent, .. })
        ));
    }
}
