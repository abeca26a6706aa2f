//! # Graph Backend Trait
//!
//! This is THE contract between the thresholding engine and whatever holds
//! the graph. The engine only needs to add nodes, swap edge sets, look up
//! neighbours and ask about connectivity; everything else (shortest paths,
//! centrality, plotting) belongs to collaborators that read the graph after
//! a rebuild.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | Dense in-memory node and edge vectors |

pub mod memory;

use crate::local::forest::maximum_spanning_forest;
use crate::model::*;
use crate::threshold::{Candidate, rank};
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// GraphBackend Trait
// ============================================================================

/// The generic undirected, simple-graph abstraction the engine rebuilds.
///
/// Nodes are dense (`NodeId(0)..NodeId(node_count)`) and never removed.
/// Edges are kept in insertion order; a rebuild inserts them in selection
/// order, so `edges()` reflects the policy's ranking.
pub trait GraphBackend: Send {
    // ========================================================================
    // Nodes
    // ========================================================================

    /// Append a node and return its id.
    fn create_node(&mut self) -> NodeId;

    fn node(&self, id: NodeId) -> Option<&Node>;

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    fn nodes(&self) -> &[Node];

    fn node_count(&self) -> usize {
        self.nodes().len()
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Insert one edge. Fails on self-loops, duplicates, or missing endpoints.
    fn add_edge(&mut self, edge: Edge) -> Result<()>;

    /// Remove an edge. Returns it if it existed.
    fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge>;

    fn edge(&self, key: EdgeKey) -> Option<&Edge>;

    fn edges(&self) -> &[Edge];

    /// Mutable edges, for weight and property updates. Keys cannot be
    /// changed through `Edge`, so the backend's index stays valid.
    fn edges_mut(&mut self) -> &mut [Edge];

    /// Replace the whole edge set. Either every edge is installed or, on
    /// error, the previous edge set is left untouched.
    fn replace_edges(&mut self, edges: Vec<Edge>) -> Result<()>;

    fn clear_edges(&mut self) {
        // An empty set cannot fail validation.
        let _ = self.replace_edges(Vec::new());
    }

    fn has_edge(&self, key: EdgeKey) -> bool {
        self.edge(key).is_some()
    }

    fn edge_count(&self) -> usize {
        self.edges().len()
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Neighbours of `node`, in edge insertion order.
    fn neighbors(&self, node: NodeId) -> Vec<NodeId>;

    /// Connected components, each sorted, ordered by their smallest node.
    fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let n = self.node_count();
        let mut seen = vec![false; n];
        let mut components = Vec::new();

        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut component = vec![NodeId(start)];
            let mut frontier = vec![NodeId(start)];
            while let Some(node) = frontier.pop() {
                for next in self.neighbors(node) {
                    if !seen[next.0] {
                        seen[next.0] = true;
                        component.push(next);
                        frontier.push(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// True when every node can reach every other (vacuously for `n <= 1`).
    fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Largest connected component; ties go to the one with the smallest node.
    fn largest_connected_component(&self) -> Vec<NodeId> {
        self.connected_components()
            .into_iter()
            .fold(Vec::new(), |best, c| if c.len() > best.len() { c } else { best })
    }

    /// Maximum-weight spanning forest of the current edge set.
    fn maximum_spanning_forest(&self) -> Vec<Edge> {
        let mut ranked: Vec<Candidate> = self
            .edges()
            .iter()
            .map(|e| Candidate { key: e.key(), weight: e.weight, score: e.weight })
            .collect();
        rank(&mut ranked);
        maximum_spanning_forest(self.node_count(), &ranked)
            .edges
            .iter()
            .filter_map(|c| self.edge(c.key).cloned())
            .collect()
    }
}
