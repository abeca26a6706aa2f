//! Edge (undirected connection) in the connectome graph.

use serde::{Deserialize, Serialize};
use super::{NodeId, PropertyMap, Value};

/// Canonical key of an undirected edge: always `a < b`.
///
/// The derived ordering is row-major over the upper triangle of the matrix,
/// which is the tie-break order used by every selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub a: NodeId,
    pub b: NodeId,
}

impl EdgeKey {
    /// Build the canonical key for the unordered pair `{x, y}`.
    pub fn new(x: impl Into<NodeId>, y: impl Into<NodeId>) -> Self {
        let (x, y) = (x.into(), y.into());
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// An undirected, weighted edge.
///
/// Edges are ephemeral: every threshold call replaces the whole edge set, so
/// anything stored in `properties` disappears on rebuild unless the property
/// overlay is asked to reattach it.
///
/// The key is fixed at construction. Backends index edges by key, so code
/// holding `&mut Edge` may change the weight and properties but not the
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    key: EdgeKey,
    /// Weight copied from the matrix at selection time.
    pub weight: f64,
    pub properties: PropertyMap,
}

impl Edge {
    pub fn new(key: EdgeKey, weight: f64) -> Self {
        Self {
            key,
            weight,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> EdgeKey {
        self.key
    }

    pub fn a(&self) -> NodeId {
        self.key.a
    }

    pub fn b(&self) -> NodeId {
        self.key.b
    }

    /// The "other" end of the edge from the given node.
    pub fn other_node(&self, from: NodeId) -> Option<NodeId> {
        if from == self.key.a { Some(self.key.b) }
        else if from == self.key.b { Some(self.key.a) }
        else { None }
    }
}
