//! Matrix export: write the current graph back out as a dense matrix.
//!
//! Produces the same text layout `import::parse_matrix` reads, so a
//! thresholded (or binarised) graph can be handed to tools that only speak
//! adjacency matrices:
//!
//! ```text
//! Brain edges → export_matrix() → n × n text, 0 for absent pairs
//!   → import::parse_matrix() → identical nonzero pattern and weights
//! ```

use std::io::Write;

use crate::config::MatrixFormat;
use crate::storage::GraphBackend;
use crate::{Brain, Result};

/// Write the current edge set of `brain` as a dense symmetric matrix.
///
/// Rows are written in node order; absent pairs and the diagonal are `0`.
/// Fields are separated by the format's delimiter, or a single space.
/// Fails with `NotInitialized` before a matrix is loaded.
pub fn export_matrix<B: GraphBackend>(
    brain: &Brain<B>,
    format: &MatrixFormat,
    writer: &mut dyn Write,
) -> Result<()> {
    brain.matrix()?;
    let rows = dense_rows(brain.backend());
    let separator = format.delimiter.map(String::from).unwrap_or_else(|| " ".to_string());

    for row in &rows {
        let fields: Vec<String> = row.iter().map(|w| format_weight(*w)).collect();
        writeln!(writer, "{}", fields.join(&separator))?;
    }
    Ok(())
}

/// Dense weights of the backend's current edges.
fn dense_rows<B: GraphBackend>(backend: &B) -> Vec<Vec<f64>> {
    let n = backend.node_count();
    let mut rows = vec![vec![0.0; n]; n];
    for edge in backend.edges() {
        let (a, b) = (edge.a().index(), edge.b().index());
        rows[a][b] = edge.weight;
        rows[b][a] = edge.weight;
    }
    rows
}

/// Format a weight so it parses back to the same f64.
fn format_weight(w: f64) -> String {
    if w == 0.0 { "0".to_string() } else { format!("{w}") }
}
