//! # connectome-rs: Thresholded Brain Graphs
//!
//! Turns a dense, weighted, symmetric connectivity matrix into a sparse
//! undirected graph under one of several retention policies.
//!
//! ## Design Principles
//!
//! 1. **The matrix is the memory**: `AdjacencyStore` is loaded once and never
//!    mutated; every rebuild is computed from it.
//! 2. **Nodes persist, edges don't**: a rebuild replaces the whole edge set,
//!    atomically, and leaves nodes and their properties alone.
//! 3. **Trait at the seam**: `GraphBackend` is the contract between the
//!    thresholding engine and graph storage.
//! 4. **Diagnostics, not prints**: non-fatal problems come back as a list.
//!
//! ## Quick Start
//!
//! ```rust
//! use connectome_rs::{Brain, ThresholdSpec};
//! use connectome_rs::store::AdjacencyMatrix;
//!
//! # fn example() -> connectome_rs::Result<()> {
//! let matrix = AdjacencyMatrix::from_rows(vec![
//!     vec![0.0, 0.6, 0.2],
//!     vec![0.6, 0.0, 0.8],
//!     vec![0.2, 0.8, 0.0],
//! ])?;
//!
//! let mut brain = Brain::new();
//! brain.load_matrix(matrix)?;
//!
//! let result = brain.apply_threshold(ThresholdSpec::total_edges(2))?;
//! assert_eq!(result.edge_count, 2);
//!
//! let result = brain.local_threshold(None, false)?;
//! assert!(brain.is_connected());
//! # let _ = result;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Policies
//!
//! | Call | Result |
//! |------|--------|
//! | `apply_threshold(total_edges(k))` | top `k` candidates |
//! | `apply_threshold(edge_percent(p))` | top `round(p/100 · n(n-1)/2)` |
//! | `apply_threshold(value_cutoff(v))` | candidates with score `> v` |
//! | `local_threshold(target, abs)` | spanning tree, grown to the target |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod store;
pub mod threshold;
pub mod local;
pub mod storage;
pub mod overlay;
pub mod import;
pub mod export;
pub mod config;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{Edge, EdgeKey, Node, NodeId, PropertyMap, Value};
pub use threshold::{ThresholdKind, ThresholdSpec};
pub use storage::{GraphBackend, MemoryBackend};
pub use overlay::{Diagnostic, EdgePropertyLedger, EdgePropertyRecord, PropertyOverlay};
pub use config::{BrainConfig, MatrixFormat};

use import::SpatialFile;
use local::LocalThresholdEngine;
use overlay::{PropertyTarget, WarningReason};
use store::{AdjacencyMatrix, AdjacencyStore};
use threshold::Candidate;

// ============================================================================
// Rebuild results
// ============================================================================

/// What a threshold call hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildResult {
    pub edge_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// A record of one completed rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildEvent {
    /// 1-based, per brain.
    pub sequence: u64,
    pub at: DateTime<Utc>,
    /// Policy used; `None` for a bare local spanning tree.
    pub spec: Option<ThresholdSpec>,
    pub local: bool,
    pub edge_count: usize,
    /// Edges of the previous set that carried properties which were dropped.
    pub properties_dropped: usize,
    pub properties_reapplied: bool,
}

// ============================================================================
// Top-level Brain handle
// ============================================================================

/// The primary entry point: a graph over a loaded adjacency matrix.
///
/// A `Brain` owns its backend, its matrix and its configuration. It is not
/// internally synchronised; concurrent rebuilds must be serialised by the
/// caller (`&mut self` enforces this within one thread).
pub struct Brain<B: GraphBackend = MemoryBackend> {
    backend: B,
    store: AdjacencyStore,
    config: BrainConfig,
    overlay: Box<dyn PropertyOverlay>,
    rebuilds: Vec<RebuildEvent>,
}

impl Brain<MemoryBackend> {
    /// Empty in-memory brain with default configuration.
    pub fn new() -> Self {
        Self::with_config(BrainConfig::default())
    }

    pub fn with_config(config: BrainConfig) -> Self {
        Self::with_backend(MemoryBackend::new(), config)
    }
}

impl Default for Brain<MemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GraphBackend> Brain<B> {
    /// Create a Brain with the given backend. Existing nodes in the backend
    /// fix the node count a matrix must match.
    pub fn with_backend(backend: B, config: BrainConfig) -> Self {
        Self {
            backend,
            store: AdjacencyStore::new(),
            config,
            overlay: Box::new(EdgePropertyLedger::new()),
            rebuilds: Vec::new(),
        }
    }

    /// Replace the default edge-property ledger.
    pub fn with_overlay(mut self, overlay: Box<dyn PropertyOverlay>) -> Self {
        self.overlay = overlay;
        self
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn set_reapply_properties_on_rebuild(&mut self, reapply: bool) {
        self.config.reapply_properties_on_rebuild = reapply;
    }

    pub fn reapply_properties_on_rebuild(&self) -> bool {
        self.config.reapply_properties_on_rebuild
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Install the adjacency matrix and create one node per row.
    ///
    /// If nodes already exist (from spatial info or an earlier matrix) the
    /// matrix must have the same size. Any current edges are cleared; call a
    /// threshold method to build edges.
    pub fn load_matrix(&mut self, matrix: AdjacencyMatrix) -> Result<()> {
        let existing = self.backend.node_count();
        let expected = (existing > 0).then_some(existing);
        let n = matrix.n();
        self.store.load(matrix, expected)?;

        for _ in existing..n {
            self.backend.create_node();
        }
        self.backend.clear_edges();
        info!(nodes = n, "adjacency matrix loaded");
        Ok(())
    }

    /// Read a matrix file using the configured format.
    pub fn read_matrix(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let matrix = import::read_matrix(path, &self.config.matrix, self.config.symmetry_tolerance)?;
        self.load_matrix(matrix)
    }

    /// Attach anatomical labels and coordinates, one entry per node in order.
    ///
    /// Takes a parsed `SpatialFile` or a plain `Vec<SpatialEntry>`. Before any
    /// matrix or nodes exist this creates the nodes; otherwise the file's node
    /// count must match. Unreadable lines leave their node untouched and come
    /// back as warnings.
    pub fn input_spatial_info(&mut self, spatial: impl Into<SpatialFile>) -> Result<Vec<Diagnostic>> {
        let file = spatial.into();
        let n = self.backend.node_count();
        if n == 0 && !self.store.is_loaded() {
            for _ in 0..file.node_count {
                self.backend.create_node();
            }
        } else if file.node_count != n {
            return Err(Error::DimensionMismatch { expected: n, got: file.node_count });
        }

        for (i, entry) in file.entries {
            if let Some(node) = self.backend.node_mut(NodeId(i)) {
                node.label = Some(entry.label);
                node.position = Some(entry.position);
            }
        }
        Ok(file.diagnostics)
    }

    /// Apply spatial text (see `import::parse_spatial`).
    pub fn import_spatial_info(&mut self, text: &str) -> Result<Vec<Diagnostic>> {
        self.input_spatial_info(import::parse_spatial(text))
    }

    pub fn read_spatial_info(&mut self, path: impl AsRef<Path>) -> Result<Vec<Diagnostic>> {
        let file = import::read_spatial(path)?;
        self.input_spatial_info(file)
    }

    /// Set `name` on each listed node. Entries naming missing nodes are
    /// skipped with a warning each.
    pub fn input_node_properties<I, V>(&mut self, name: &str, entries: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = (usize, V)>,
        V: Into<Value>,
    {
        let node_count = self.backend.node_count();
        let mut diagnostics = Vec::new();
        for (index, value) in entries {
            match self.backend.node_mut(NodeId(index)) {
                Some(node) => {
                    node.properties.insert(name.to_string(), value.into());
                }
                None => diagnostics.push(Diagnostic::property_warning(
                    name,
                    PropertyTarget::Node(NodeId(index)),
                    WarningReason::NodeOutOfRange { node_count },
                )),
            }
        }
        diagnostics
    }

    /// Set `name` on each listed edge of the current graph and remember the
    /// entries in the overlay for later reapplication.
    pub fn input_edge_properties<I, V>(&mut self, name: &str, entries: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = (usize, usize, V)>,
        V: Into<Value>,
    {
        let records: Vec<EdgePropertyRecord> = entries
            .into_iter()
            .map(|(a, b, v)| EdgePropertyRecord::new(name, a, b, v))
            .collect();
        let node_count = self.backend.node_count();
        let diagnostics = overlay::apply_edge_records(&records, self.backend.edges_mut(), node_count);
        for record in records {
            self.overlay.record(record);
        }
        diagnostics
    }

    /// Apply a property file (see `import::parse_properties`).
    pub fn import_properties(&mut self, text: &str) -> Result<Vec<Diagnostic>> {
        let file = import::parse_properties(text)?;
        Ok(self.apply_property_file(file))
    }

    pub fn read_properties(&mut self, path: impl AsRef<Path>) -> Result<Vec<Diagnostic>> {
        let file = import::read_properties(path)?;
        Ok(self.apply_property_file(file))
    }

    fn apply_property_file(&mut self, file: import::PropertyFile) -> Vec<Diagnostic> {
        let mut diagnostics = file.diagnostics;
        diagnostics.extend(self.input_node_properties(&file.name, file.nodes));
        diagnostics.extend(self.input_edge_properties(&file.name, file.edges));
        diagnostics
    }

    // ========================================================================
    // Thresholding
    // ========================================================================

    /// Rebuild the edge set from the matrix under `spec`.
    ///
    /// On error the previous edge set is left untouched.
    pub fn apply_threshold(&mut self, spec: ThresholdSpec) -> Result<RebuildResult> {
        let selection = threshold::select(self.store.matrix()?, &spec)?;
        self.rebuild(selection.edges, selection.diagnostics, Some(spec), false)
    }

    /// Rebuild a connected edge set: the maximum-weight spanning tree, grown
    /// by k-nearest-neighbour rounds up to `target` if one is given.
    pub fn local_threshold(
        &mut self,
        target: Option<ThresholdSpec>,
        use_absolute: bool,
    ) -> Result<RebuildResult> {
        let selection = LocalThresholdEngine::new(self.store.matrix()?).run(target, use_absolute)?;
        info!(rounds = selection.rounds, tree_edges = selection.tree_edges, "local threshold");
        self.rebuild(selection.edges, selection.diagnostics, target, true)
    }

    fn rebuild(
        &mut self,
        selected: Vec<Candidate>,
        mut diagnostics: Vec<Diagnostic>,
        spec: Option<ThresholdSpec>,
        local: bool,
    ) -> Result<RebuildResult> {
        let node_count = self.backend.node_count();
        let mut edges: Vec<Edge> = selected
            .into_iter()
            .map(|c| Edge::new(c.key, if self.config.weighted { c.weight } else { 1.0 }))
            .collect();

        let reapply = self.config.reapply_properties_on_rebuild;
        let carrying = self.backend.edges().iter().filter(|e| !e.properties.is_empty()).count();
        if reapply {
            diagnostics.extend(self.overlay.reattach_edge_properties(&mut edges, node_count));
        }

        let edge_count = edges.len();
        self.backend.replace_edges(edges)?;

        let event = RebuildEvent {
            sequence: self.rebuilds.len() as u64 + 1,
            at: Utc::now(),
            spec,
            local,
            edge_count,
            properties_dropped: if reapply { 0 } else { carrying },
            properties_reapplied: reapply,
        };
        let policy = spec.map_or_else(|| "spanning_tree".to_string(), |s| s.to_string());
        info!(
            sequence = event.sequence,
            policy = %policy,
            local,
            edges = edge_count,
            dropped = event.properties_dropped,
            "edge set rebuilt"
        );
        self.overlay.rebuilt(&event);
        self.rebuilds.push(event);

        Ok(RebuildResult { edge_count, diagnostics })
    }

    // ========================================================================
    // Edge transforms
    // ========================================================================

    /// Set every current edge weight to 1. The matrix is not touched.
    pub fn binarise(&mut self) {
        for edge in self.backend.edges_mut() {
            edge.weight = 1.0;
        }
    }

    /// Replace every current edge weight by its absolute value.
    pub fn make_edges_absolute(&mut self) {
        for edge in self.backend.edges_mut() {
            edge.weight = edge.weight.abs();
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn nodes(&self) -> &[Node] {
        self.backend.nodes()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.backend.node(id)
    }

    /// Current edges, in the order the last rebuild selected them.
    pub fn edges(&self) -> &[Edge] {
        self.backend.edges()
    }

    pub fn edge(&self, a: usize, b: usize) -> Option<&Edge> {
        self.backend.edge(EdgeKey::new(a, b))
    }

    pub fn node_count(&self) -> usize {
        self.backend.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.backend.edge_count()
    }

    /// The loaded matrix.
    pub fn matrix(&self) -> Result<&AdjacencyMatrix> {
        self.store.matrix()
    }

    /// `(rows, cols)` of the loaded matrix.
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        let n = self.store.n()?;
        Ok((n, n))
    }

    /// Fraction of possible undirected edges present, `|E| / (n(n-1)/2)`.
    pub fn percent_connected(&self) -> f64 {
        let n = self.backend.node_count();
        if n < 2 {
            return 0.0;
        }
        self.backend.edge_count() as f64 / (n * (n - 1) / 2) as f64
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        self.backend.connected_components()
    }

    pub fn largest_connected_component(&self) -> Vec<NodeId> {
        self.backend.largest_connected_component()
    }

    /// Every rebuild so far, oldest first.
    pub fn rebuild_log(&self) -> &[RebuildEvent] {
        &self.rebuilds
    }

    pub fn overlay(&self) -> &dyn PropertyOverlay {
        self.overlay.as_ref()
    }

    /// Access the underlying backend (for collaborators running graph queries).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected} nodes, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Adjacency matrix is not symmetric at ({row}, {col})")]
    AsymmetricMatrix { row: usize, col: usize },

    #[error("No adjacency matrix loaded")]
    NotInitialized,

    #[error("Invalid threshold type: {0}")]
    InvalidThresholdType(String),

    #[error("Invalid {kind} threshold value {value}: {reason}")]
    InvalidThresholdValue { kind: ThresholdKind, value: f64, reason: String },

    #[error("Input is not weight-connected: spanning forest has {components} components")]
    DisconnectedInput { components: usize },

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
