//! # Property Overlay
//!
//! Named properties live beside the thresholding engine, not inside it.
//! Node properties sit on persistent nodes and survive every rebuild. Edge
//! properties sit on ephemeral edges, so the overlay remembers where they
//! came from and can put them back on a freshly selected edge set.
//!
//! Problems found while attaching properties never abort the batch: each one
//! becomes a [`Diagnostic`] returned to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::RebuildEvent;
use crate::model::{Edge, EdgeKey, NodeId, Value};

// ============================================================================
// Diagnostics
// ============================================================================

/// What a property entry referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyTarget {
    Node(NodeId),
    Edge(EdgeKey),
    /// A line of a property or spatial file that could not be read.
    Line(usize),
}

/// Why a property entry was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningReason {
    NodeOutOfRange { node_count: usize },
    EdgeNotPresent,
    Malformed(String),
}

/// A non-fatal problem reported by a rebuild or an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// One property entry was skipped; the rest of the batch went ahead.
    PropertyImportWarning {
        property: String,
        target: PropertyTarget,
        reason: WarningReason,
    },
    /// Local thresholding was asked for fewer edges than a spanning tree has.
    TargetBelowSpanningTree { requested: usize, retained: usize },
    /// A count/percent policy asked for more edges than there are candidates.
    CandidatesExhausted { requested: usize, available: usize },
}

impl Diagnostic {
    pub fn property_warning(
        property: impl Into<String>,
        target: PropertyTarget,
        reason: WarningReason,
    ) -> Self {
        Self::PropertyImportWarning { property: property.into(), target, reason }.logged()
    }

    pub fn target_below_spanning_tree(requested: usize, retained: usize) -> Self {
        Self::TargetBelowSpanningTree { requested, retained }.logged()
    }

    pub fn candidates_exhausted(requested: usize, available: usize) -> Self {
        Self::CandidatesExhausted { requested, available }.logged()
    }

    pub fn is_property_warning(&self) -> bool {
        matches!(self, Diagnostic::PropertyImportWarning { .. })
    }

    fn logged(self) -> Self {
        warn!(diagnostic = %self, "non-fatal diagnostic");
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::PropertyImportWarning { property, target, reason } => {
                write!(f, "property '{property}' skipped for ")?;
                match target {
                    PropertyTarget::Node(n) => write!(f, "node {n}")?,
                    PropertyTarget::Edge(k) => write!(f, "edge {k}")?,
                    PropertyTarget::Line(l) => write!(f, "line {l}")?,
                }
                match reason {
                    WarningReason::NodeOutOfRange { node_count } => {
                        write!(f, ": node does not exist (graph has {node_count} nodes)")
                    }
                    WarningReason::EdgeNotPresent => write!(f, ": edge not in current graph"),
                    WarningReason::Malformed(msg) => write!(f, ": {msg}"),
                }
            }
            Diagnostic::TargetBelowSpanningTree { requested, retained } => write!(
                f,
                "target of {requested} edges is below the spanning tree; kept {retained}"
            ),
            Diagnostic::CandidatesExhausted { requested, available } => write!(
                f,
                "requested {requested} edges but only {available} nonzero candidates exist"
            ),
        }
    }
}

// ============================================================================
// Edge property records
// ============================================================================

/// One imported edge property: `name` on the pair `(a, b)`.
///
/// Endpoints are kept as raw indices so that entries naming nodes the graph
/// does not have can still be recorded and reported on every reapply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePropertyRecord {
    pub name: String,
    pub a: usize,
    pub b: usize,
    pub value: Value,
}

impl EdgePropertyRecord {
    pub fn new(name: impl Into<String>, a: usize, b: usize, value: impl Into<Value>) -> Self {
        Self { name: name.into(), a, b, value: value.into() }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.a, self.b)
    }
}

/// Attach `records` to the matching entries of `edges`, in record order.
///
/// Records whose nodes do not exist, or whose edge is not in `edges`, are
/// skipped with a warning each.
pub fn apply_edge_records(
    records: &[EdgePropertyRecord],
    edges: &mut [Edge],
    node_count: usize,
) -> Vec<Diagnostic> {
    let index: hashbrown::HashMap<EdgeKey, usize> =
        edges.iter().enumerate().map(|(i, e)| (e.key(), i)).collect();
    let mut diagnostics = Vec::new();

    for record in records {
        let key = record.key();
        if record.a >= node_count || record.b >= node_count {
            diagnostics.push(Diagnostic::property_warning(
                &record.name,
                PropertyTarget::Edge(key),
                WarningReason::NodeOutOfRange { node_count },
            ));
            continue;
        }
        match index.get(&key) {
            Some(&i) => {
                edges[i].properties.insert(record.name.clone(), record.value.clone());
            }
            None => diagnostics.push(Diagnostic::property_warning(
                &record.name,
                PropertyTarget::Edge(key),
                WarningReason::EdgeNotPresent,
            )),
        }
    }
    diagnostics
}

// ============================================================================
// PropertyOverlay trait
// ============================================================================

/// The contract between the rebuild engine and whatever owns edge properties.
pub trait PropertyOverlay: Send {
    /// Remember an edge property so it can be reattached after rebuilds.
    fn record(&mut self, record: EdgePropertyRecord);

    /// Reattach every remembered property to a freshly selected edge set.
    fn reattach_edge_properties(&self, edges: &mut [Edge], node_count: usize) -> Vec<Diagnostic>;

    /// Called after every completed rebuild.
    fn rebuilt(&mut self, _event: &RebuildEvent) {}
}

/// Default overlay: an append-only log of imported edge properties.
#[derive(Debug, Clone, Default)]
pub struct EdgePropertyLedger {
    records: Vec<EdgePropertyRecord>,
    last_rebuild: Option<u64>,
}

impl EdgePropertyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EdgePropertyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number of the last rebuild this ledger was told about.
    pub fn last_rebuild(&self) -> Option<u64> {
        self.last_rebuild
    }
}

impl PropertyOverlay for EdgePropertyLedger {
    fn record(&mut self, record: EdgePropertyRecord) {
        self.records.push(record);
    }

    fn reattach_edge_properties(&self, edges: &mut [Edge], node_count: usize) -> Vec<Diagnostic> {
        apply_edge_records(&self.records, edges, node_count)
    }

    fn rebuilt(&mut self, event: &RebuildEvent) {
        self.last_rebuild = Some(event.sequence);
    }
}
