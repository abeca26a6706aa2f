//! Property-based tests for the thresholding policies.
//!
//! These tests verify invariants that should hold for any symmetric matrix:
//! - Count and percent policies keep the right number of edges, best first
//! - Value cutoffs split candidates exactly at the cutoff
//! - Rebuilds are deterministic and never touch the matrix
//! - Local thresholding always yields a connected graph of the target size,
//!   on dense positive matrices and on sparse mixed-sign ones alike

use connectome_rs::store::AdjacencyMatrix;
use connectome_rs::{Brain, EdgeKey, ThresholdSpec};
use proptest::prelude::*;

/// A weight that is zero about a quarter of the time.
fn arb_weight() -> impl Strategy<Value = f64> {
    prop_oneof![1 => Just(0.0), 3 => -1.0f64..1.0]
}

prop_compose! {
    fn arb_matrix(max_n: usize)(n in 1..=max_n)(
        upper in prop::collection::vec(arb_weight(), n * (n - 1) / 2),
        n in Just(n),
    ) -> Vec<Vec<f64>> {
        symmetric(n, &upper)
    }
}

prop_compose! {
    /// Strictly positive weights: every pair is a candidate, so the graph is
    /// weight-connected.
    fn arb_connected_matrix(max_n: usize)(n in 2..=max_n)(
        upper in prop::collection::vec(0.01f64..1.0, n * (n - 1) / 2),
        n in Just(n),
    ) -> Vec<Vec<f64>> {
        symmetric(n, &upper)
    }
}

/// Mostly zero; otherwise any sign.
fn arb_sparse_weight() -> impl Strategy<Value = f64> {
    prop_oneof![3 => Just(0.0), 1 => -1.0f64..1.0]
}

/// Never zero, either sign.
fn arb_link_weight() -> impl Strategy<Value = f64> {
    prop_oneof![-1.0f64..-0.05, 0.05f64..1.0]
}

prop_compose! {
    /// Mostly-zero, mixed-sign weights laid over a path through every node
    /// in random order, so the candidate graph is connected but thin.
    fn arb_sparse_connected(max_n: usize)(n in 2..=max_n)(
        order in Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        links in prop::collection::vec(arb_link_weight(), n - 1),
        upper in prop::collection::vec(arb_sparse_weight(), n * (n - 1) / 2),
        n in Just(n),
    ) -> Vec<Vec<f64>> {
        let mut rows = symmetric(n, &upper);
        for (pair, w) in order.windows(2).zip(links) {
            rows[pair[0]][pair[1]] = w;
            rows[pair[1]][pair[0]] = w;
        }
        rows
    }
}

fn symmetric(n: usize, upper: &[f64]) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.0; n]; n];
    let mut values = upper.iter();
    for i in 0..n {
        for j in (i + 1)..n {
            let w = values.next().copied().unwrap_or(0.0);
            rows[i][j] = w;
            rows[j][i] = w;
        }
    }
    rows
}

fn brain(rows: Vec<Vec<f64>>) -> Brain {
    let mut brain = Brain::new();
    brain.load_matrix(AdjacencyMatrix::from_rows(rows).unwrap()).unwrap();
    brain
}

/// (key, score) of every nonzero upper-triangle pair.
fn scored_candidates(brain: &Brain, absolute: bool) -> Vec<(EdgeKey, f64)> {
    brain
        .matrix()
        .unwrap()
        .upper_triangle()
        .filter(|(_, w)| *w != 0.0 && !w.is_nan())
        .map(|(k, w)| (k, if absolute { w.abs() } else { w }))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn total_edges_keeps_best(rows in arb_matrix(9), k in 0usize..40, absolute in any::<bool>()) {
        let mut brain = brain(rows);
        let candidates = scored_candidates(&brain, absolute);
        let mut spec = ThresholdSpec::total_edges(k);
        if absolute {
            spec = spec.absolute();
        }
        let result = brain.apply_threshold(spec).unwrap();

        prop_assert_eq!(result.edge_count, k.min(candidates.len()));

        let kept: Vec<EdgeKey> = brain.edges().iter().map(|e| e.key()).collect();
        let worst_kept = candidates
            .iter()
            .filter(|(key, _)| kept.contains(key))
            .map(|(_, s)| *s)
            .fold(f64::INFINITY, f64::min);
        for (key, score) in &candidates {
            if !kept.contains(key) {
                prop_assert!(*score <= worst_kept, "dropped {} scores {} > {}", key, score, worst_kept);
            }
        }
    }

    #[test]
    fn edge_percent_count(rows in arb_matrix(9), p in 0.0f64..=100.0) {
        let mut brain = brain(rows);
        let n = brain.node_count();
        let available = scored_candidates(&brain, false).len();
        let target = (p / 100.0 * (n * n.saturating_sub(1) / 2) as f64).round() as usize;

        let result = brain.apply_threshold(ThresholdSpec::edge_percent(p)).unwrap();
        prop_assert_eq!(result.edge_count, target.min(available));
    }

    #[test]
    fn value_cutoff_splits_exactly(rows in arb_matrix(9), v in -1.0f64..1.0, absolute in any::<bool>()) {
        let mut brain = brain(rows);
        let candidates = scored_candidates(&brain, absolute);
        let mut spec = ThresholdSpec::value_cutoff(v);
        if absolute {
            spec = spec.absolute();
        }
        brain.apply_threshold(spec).unwrap();

        for (key, score) in candidates {
            let kept = brain.edges().iter().any(|e| e.key() == key);
            prop_assert_eq!(kept, score > v, "edge {} score {}", key, score);
        }
    }

    #[test]
    fn rebuild_is_deterministic(rows in arb_matrix(8), k in 0usize..30) {
        let mut brain = brain(rows);
        let matrix = brain.matrix().unwrap().clone();

        brain.apply_threshold(ThresholdSpec::total_edges(k)).unwrap();
        let first = brain.edges().to_vec();
        brain.make_edges_absolute();
        brain.apply_threshold(ThresholdSpec::total_edges(k)).unwrap();

        prop_assert_eq!(brain.edges(), first.as_slice());
        prop_assert_eq!(brain.matrix().unwrap(), &matrix);
    }

    #[test]
    fn local_tree_is_spanning(rows in arb_connected_matrix(10)) {
        let mut brain = brain(rows);
        let n = brain.node_count();
        let result = brain.local_threshold(None, false).unwrap();

        prop_assert_eq!(result.edge_count, n - 1);
        prop_assert!(brain.is_connected());
    }

    #[test]
    fn local_percent_is_connected_and_exact(rows in arb_connected_matrix(10), p in 0.0f64..=100.0) {
        let mut brain = brain(rows);
        let n = brain.node_count();
        let target = (p / 100.0 * (n * (n - 1) / 2) as f64).round() as usize;

        let result = brain.local_threshold(Some(ThresholdSpec::edge_percent(p)), false).unwrap();
        prop_assert!(brain.is_connected());
        prop_assert_eq!(result.edge_count, target.max(n - 1));
    }

    #[test]
    fn edge_transforms(rows in arb_matrix(8)) {
        let mut brain = brain(rows);
        let matrix = brain.matrix().unwrap().clone();
        brain.apply_threshold(ThresholdSpec::keep_all()).unwrap();
        let before: Vec<f64> = brain.edges().iter().map(|e| e.weight).collect();

        brain.make_edges_absolute();
        for (edge, w) in brain.edges().iter().zip(&before) {
            prop_assert!(edge.weight >= 0.0);
            prop_assert_eq!(edge.weight, w.abs());
        }

        brain.binarise();
        prop_assert!(brain.edges().iter().all(|e| e.weight == 1.0));
        prop_assert_eq!(brain.matrix().unwrap(), &matrix);
    }

    #[test]
    fn local_count_on_sparse(rows in arb_sparse_connected(10), k in 0usize..50, absolute in any::<bool>()) {
        let mut brain = brain(rows);
        let n = brain.node_count();
        let available = scored_candidates(&brain, absolute).len();
        let expected = if k <= n - 1 { n - 1 } else { k.min(available) };

        let result = brain.local_threshold(Some(ThresholdSpec::total_edges(k)), absolute).unwrap();
        prop_assert!(brain.is_connected());
        prop_assert_eq!(result.edge_count, expected);
        prop_assert_eq!(brain.edge_count(), expected);
    }

    #[test]
    fn local_cutoff_on_sparse(rows in arb_sparse_connected(10), v in -1.0f64..1.0, absolute in any::<bool>()) {
        let mut brain = brain(rows);
        let candidates = scored_candidates(&brain, absolute);

        brain.local_threshold(None, absolute).unwrap();
        let tree: Vec<EdgeKey> = brain.edges().iter().map(|e| e.key()).collect();

        brain.local_threshold(Some(ThresholdSpec::value_cutoff(v)), absolute).unwrap();
        prop_assert!(brain.is_connected());

        let mut expected = 0;
        for (key, score) in candidates {
            let kept = brain.edges().iter().any(|e| e.key() == key);
            if tree.contains(&key) {
                prop_assert!(kept, "tree edge {} dropped", key);
            } else {
                prop_assert_eq!(kept, score > v, "edge {} score {} cutoff {}", key, score, v);
            }
            if tree.contains(&key) || score > v {
                expected += 1;
            }
        }
        prop_assert_eq!(brain.edge_count(), expected);
    }
}
