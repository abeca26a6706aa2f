//! Maximum-weight spanning forest (Kruskal) over ranked candidates.

use crate::threshold::Candidate;

/// Disjoint-set forest with union by rank and path halving.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    sets: usize,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
            sets: size,
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns false if they were already one.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.sets -= 1;
        true
    }

    /// Number of disjoint sets remaining.
    pub fn sets(&self) -> usize {
        self.sets
    }
}

/// Result of the greedy merge.
#[derive(Debug, Clone, Default)]
pub struct SpanningForest {
    /// Accepted edges, in the order they were merged (ranking order).
    pub edges: Vec<Candidate>,
    /// Trees in the forest; 1 means spanning tree.
    pub components: usize,
}

impl SpanningForest {
    pub fn is_tree(&self) -> bool {
        self.components <= 1
    }
}

/// Greedy merge over `ranked` (which must already be in ranking order):
/// accept each candidate that joins two different components, stop once a
/// single component remains.
pub fn maximum_spanning_forest(node_count: usize, ranked: &[Candidate]) -> SpanningForest {
    let mut sets = UnionFind::new(node_count);
    let mut edges = Vec::with_capacity(node_count.saturating_sub(1));

    for candidate in ranked {
        if sets.sets() <= 1 {
            break;
        }
        if sets.union(candidate.key.a.0, candidate.key.b.0) {
            edges.push(*candidate);
        }
    }

    SpanningForest { edges, components: sets.sets() }
}
