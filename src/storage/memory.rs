//! In-memory graph backend.
//!
//! This is the reference implementation of `GraphBackend`.
//! Nodes and edges live in plain vectors with a hash index over edge keys
//! and a per-node adjacency list.
//!
//! ## Limitations
//!
//! - **Single writer**: no internal locking. Callers serialise rebuilds.
//! - **Ordered removal is O(E)**: `remove_edge()` keeps insertion order by
//!   shifting the tail, which also reindexes it. Rebuilds go through
//!   `replace_edges()` and never pay this.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::model::*;
use crate::{Error, Result};
use super::GraphBackend;

type Neighbours = SmallVec<[NodeId; 8]>;

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory undirected graph storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// edge key → position in `edges`
    index: HashMap<EdgeKey, usize>,
    /// node → neighbours, in edge insertion order
    adjacency: Vec<Neighbours>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_edge(&self, key: EdgeKey) -> Result<()> {
        if key.is_loop() {
            return Err(Error::InvalidEdge(format!("self-loop on node {}", key.a)));
        }
        if key.b.0 >= self.nodes.len() {
            return Err(Error::InvalidEdge(format!(
                "edge {key} references node {} but graph has {} nodes",
                key.b,
                self.nodes.len()
            )));
        }
        Ok(())
    }

    fn link(&mut self, key: EdgeKey) {
        self.adjacency[key.a.0].push(key.b);
        self.adjacency[key.b.0].push(key.a);
    }
}

// ============================================================================
// GraphBackend impl
// ============================================================================

impl GraphBackend for MemoryBackend {
    // ========================================================================
    // Nodes
    // ========================================================================

    fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id));
        self.adjacency.push(Neighbours::new());
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    // ========================================================================
    // Edges
    // ========================================================================

    fn add_edge(&mut self, edge: Edge) -> Result<()> {
        let key = edge.key();
        self.check_edge(key)?;
        if self.index.contains_key(&key) {
            return Err(Error::InvalidEdge(format!("duplicate edge {key}")));
        }
        self.index.insert(key, self.edges.len());
        self.link(key);
        self.edges.push(edge);
        Ok(())
    }

    fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge> {
        let pos = self.index.remove(&key)?;
        let removed = self.edges.remove(pos);
        for (i, e) in self.edges.iter().enumerate().skip(pos) {
            self.index.insert(e.key(), i);
        }
        self.adjacency[key.a.0].retain(|n| *n != key.b);
        self.adjacency[key.b.0].retain(|n| *n != key.a);
        Some(removed)
    }

    fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.index.get(&key).map(|&i| &self.edges[i])
    }

    fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    fn replace_edges(&mut self, edges: Vec<Edge>) -> Result<()> {
        // Validate everything before touching the current edge set.
        let mut index = HashMap::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            let key = edge.key();
            self.check_edge(key)?;
            if index.insert(key, i).is_some() {
                return Err(Error::InvalidEdge(format!("duplicate edge {key}")));
            }
        }

        for neighbours in &mut self.adjacency {
            neighbours.clear();
        }
        self.index = index;
        self.edges = edges;
        for i in 0..self.edges.len() {
            let key = self.edges[i].key();
            self.link(key);
        }
        Ok(())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(node.0)
            .map(|n| n.to_vec())
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
