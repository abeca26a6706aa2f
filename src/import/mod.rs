//! # Text Importers
//!
//! Readers for the three plain-text inputs a connectome study ships with:
//!
//! - **Adjacency matrix**: one row per line, optional header with
//!   `begins line N` naming the first data line (1-based).
//! - **Spatial info**: `label x y z` per node, in node order.
//! - **Property file**: property name on the first line, then
//!   `node value` or `nodeA nodeB value` lines.
//!
//! Matrix files are all-or-nothing (`Error::Parse`). Spatial and property
//! files are best-effort: bad lines become diagnostics and reading goes on.

use std::path::Path;

use tracing::debug;

use crate::config::MatrixFormat;
use crate::model::Value;
use crate::overlay::{Diagnostic, PropertyTarget, WarningReason};
use crate::store::AdjacencyMatrix;
use crate::{Error, Result};

const DATA_START_MARKER: &str = "begins line";

// ============================================================================
// Adjacency matrix
// ============================================================================

/// Parse a text adjacency matrix.
pub fn parse_matrix(text: &str, format: &MatrixFormat, tolerance: f64) -> Result<AdjacencyMatrix> {
    let start = data_start_line(text)?;
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate().skip(start) {
        let fields = format.fields(line);
        if fields.is_empty() {
            continue;
        }
        let row = fields
            .iter()
            .map(|f| parse_weight(f, format, i + 1))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    debug!(rows = rows.len(), "parsed adjacency matrix");
    AdjacencyMatrix::from_rows_with_tolerance(rows, tolerance)
}

/// Read and parse a matrix file.
pub fn read_matrix(path: impl AsRef<Path>, format: &MatrixFormat, tolerance: f64) -> Result<AdjacencyMatrix> {
    let text = std::fs::read_to_string(path)?;
    parse_matrix(&text, format, tolerance)
}

/// 0-based index of the first data line.
fn data_start_line(text: &str) -> Result<usize> {
    for (i, line) in text.lines().enumerate() {
        if let Some(pos) = line.find(DATA_START_MARKER) {
            let rest = line[pos + DATA_START_MARKER.len()..].trim_start();
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            let n: usize = digits.parse().map_err(|_| Error::Parse {
                line: i + 1,
                message: format!("expected a line number after '{DATA_START_MARKER}'"),
            })?;
            return Ok(n.saturating_sub(1));
        }
    }
    Ok(0)
}

fn parse_weight(field: &str, format: &MatrixFormat, line: usize) -> Result<f64> {
    if field.is_empty() {
        return Err(Error::Parse { line, message: "empty field".into() });
    }
    if field == format.na_token || field.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| Error::Parse {
        line,
        message: format!("'{field}' is not a number"),
    })
}

// ============================================================================
// Spatial info
// ============================================================================

/// Anatomical label and MNI coordinates for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry {
    pub label: String,
    pub position: [f64; 3],
}

/// Contents of one spatial file.
///
/// Every non-blank line stands for one node, in order, even when it cannot
/// be read, so a bad line never shifts the nodes after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialFile {
    /// Readable lines with the node index they describe.
    pub entries: Vec<(usize, SpatialEntry)>,
    /// Nodes the file describes, readable or not.
    pub node_count: usize,
    /// Lines that could not be read.
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Vec<SpatialEntry>> for SpatialFile {
    fn from(entries: Vec<SpatialEntry>) -> Self {
        Self {
            node_count: entries.len(),
            entries: entries.into_iter().enumerate().collect(),
            diagnostics: Vec::new(),
        }
    }
}

/// Property name used in warnings about spatial lines.
const SPATIAL_PROPERTY: &str = "spatial";

/// Parse `label x y z` lines; blank lines are skipped, unreadable lines
/// become diagnostics.
pub fn parse_spatial(text: &str) -> SpatialFile {
    let mut file = SpatialFile::default();
    for (i, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let node = file.node_count;
        file.node_count += 1;
        match spatial_entry(&fields) {
            Ok(entry) => file.entries.push((node, entry)),
            Err(message) => file.diagnostics.push(Diagnostic::property_warning(
                SPATIAL_PROPERTY,
                PropertyTarget::Line(i + 1),
                WarningReason::Malformed(message),
            )),
        }
    }

    debug!(
        nodes = file.node_count,
        skipped = file.diagnostics.len(),
        "parsed spatial info"
    );
    file
}

fn spatial_entry(fields: &[&str]) -> std::result::Result<SpatialEntry, String> {
    let [label, x, y, z, ..] = fields else {
        return Err(format!("expected 'label x y z', got {} fields", fields.len()));
    };
    let coordinate = |f: &str| f.parse::<f64>().map_err(|_| format!("coordinate '{f}' is not a number"));
    Ok(SpatialEntry {
        label: (*label).to_string(),
        position: [coordinate(*x)?, coordinate(*y)?, coordinate(*z)?],
    })
}

pub fn read_spatial(path: impl AsRef<Path>) -> Result<SpatialFile> {
    Ok(parse_spatial(&std::fs::read_to_string(path)?))
}

// ============================================================================
// Property files
// ============================================================================

/// Contents of one property file.
///
/// Node indices are not range-checked here; the graph does that when the
/// entries are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFile {
    pub name: String,
    pub nodes: Vec<(usize, Value)>,
    pub edges: Vec<(usize, usize, Value)>,
    /// Lines that could not be read.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a property file. Only a missing header is fatal.
pub fn parse_properties(text: &str) -> Result<PropertyFile> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let name = match lines.next() {
        Some((_, header)) => header.to_string(),
        None => {
            return Err(Error::Parse { line: 1, message: "missing property name".into() });
        }
    };
    let mut file = PropertyFile { name, ..Default::default() };

    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let malformed = |message: String| {
            Diagnostic::property_warning(
                file.name.clone(),
                PropertyTarget::Line(line_no),
                WarningReason::Malformed(message),
            )
        };
        let index = |f: &str| f.parse::<usize>().map_err(|_| format!("'{f}' is not a node index"));

        let parsed = match fields.as_slice() {
            [node, value] => index(*node).map(|n| file.nodes.push((n, Value::parse_token(*value)))),
            [a, b, value] => index(*a)
                .and_then(|a| Ok((a, index(*b)?)))
                .map(|(a, b)| file.edges.push((a, b, Value::parse_token(*value)))),
            _ => Err(format!("expected 2 or 3 fields, got {}", fields.len())),
        };
        if let Err(message) = parsed {
            let diagnostic = malformed(message);
            file.diagnostics.push(diagnostic);
        }
    }

    debug!(
        property = %file.name,
        nodes = file.nodes.len(),
        edges = file.edges.len(),
        skipped = file.diagnostics.len(),
        "parsed property file"
    );
    Ok(file)
}

pub fn read_properties(path: impl AsRef<Path>) -> Result<PropertyFile> {
    parse_properties(&std::fs::read_to_string(path)?)
}
