//! Node (brain region) in the connectome graph.

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// Node identifier: the row/column index of the region in the adjacency matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(i: usize) -> Self {
        NodeId(i)
    }
}

/// A node in the connectome graph.
///
/// Nodes are created once per matrix (or spatial) import and survive every
/// threshold rebuild together with their properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Anatomical label from the spatial file.
    pub label: Option<String>,
    /// MNI-space coordinates `(x, y, z)`.
    pub position: Option<[f64; 3]>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            label: None,
            position: None,
            properties: PropertyMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
