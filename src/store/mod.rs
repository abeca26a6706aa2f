//! # Adjacency Store
//!
//! The dense, symmetric weight matrix every rebuild is computed from.
//!
//! The matrix is validated once when it is built and is never written to
//! afterwards: thresholding reads it, binarisation and absolute-value
//! transforms only touch the graph's edges.

use crate::model::{EdgeKey, NodeId};
use crate::{Error, Result};

/// Default relative tolerance for the symmetry check.
pub const DEFAULT_SYMMETRY_TOLERANCE: f64 = 1e-9;

// ============================================================================
// AdjacencyMatrix
// ============================================================================

/// Immutable `n × n` weight matrix, stored row-major.
///
/// NaN entries mean "no measurement" and, like zeros, never become edges.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    n: usize,
    data: Vec<f64>,
}

impl AdjacencyMatrix {
    /// Build a matrix from rows, checking squareness and symmetry.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows_with_tolerance(rows, DEFAULT_SYMMETRY_TOLERANCE)
    }

    pub fn from_rows_with_tolerance(rows: Vec<Vec<f64>>, tolerance: f64) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(Error::DimensionMismatch { expected: n, got: row.len() });
            }
            data.extend(row);
        }
        let matrix = Self { n, data };
        matrix.check_symmetric(tolerance)?;
        Ok(matrix)
    }

    fn check_symmetric(&self, tolerance: f64) -> Result<()> {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let upper = self.data[i * self.n + j];
                let lower = self.data[j * self.n + i];
                if upper.is_nan() && lower.is_nan() {
                    continue;
                }
                let scale = 1.0f64.max(upper.abs()).max(lower.abs());
                // NaN on one side only fails this comparison too.
                if !((upper - lower).abs() <= tolerance * scale) {
                    return Err(Error::AsymmetricMatrix { row: i, col: j });
                }
            }
        }
        Ok(())
    }

    /// Number of nodes (rows).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Weight between `i` and `j`, or `None` if either index is out of range.
    pub fn weight(&self, i: NodeId, j: NodeId) -> Option<f64> {
        if i.0 >= self.n || j.0 >= self.n {
            return None;
        }
        Some(self.data[i.0 * self.n + j.0])
    }

    /// Every upper-triangle pair `(i, j)`, `i < j`, in row-major order.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (EdgeKey, f64)> + '_ {
        (0..self.n).flat_map(move |i| {
            ((i + 1)..self.n).map(move |j| (EdgeKey::new(i, j), self.data[i * self.n + j]))
        })
    }

    /// Number of unordered node pairs, `n(n-1)/2`.
    pub fn possible_edges(&self) -> usize {
        self.n * self.n.saturating_sub(1) / 2
    }
}

// ============================================================================
// AdjacencyStore
// ============================================================================

/// Holder for the (at most one) loaded matrix.
#[derive(Debug, Default)]
pub struct AdjacencyStore {
    matrix: Option<AdjacencyMatrix>,
}

impl AdjacencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `matrix`. When `expected_nodes` is set (nodes already created
    /// by a spatial import or an earlier matrix) the sizes must agree.
    pub fn load(&mut self, matrix: AdjacencyMatrix, expected_nodes: Option<usize>) -> Result<()> {
        if let Some(expected) = expected_nodes {
            if expected != matrix.n() {
                return Err(Error::DimensionMismatch { expected, got: matrix.n() });
            }
        }
        self.matrix = Some(matrix);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.matrix.is_some()
    }

    pub fn matrix(&self) -> Result<&AdjacencyMatrix> {
        self.matrix.as_ref().ok_or(Error::NotInitialized)
    }

    pub fn n(&self) -> Result<usize> {
        Ok(self.matrix()?.n())
    }

    pub fn weight(&self, i: NodeId, j: NodeId) -> Result<f64> {
        let matrix = self.matrix()?;
        matrix.weight(i, j).ok_or_else(|| Error::DimensionMismatch {
            expected: matrix.n(),
            got: i.0.max(j.0) + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.5, 0.1],
            vec![0.5, 0.0, 0.0],
            vec![0.1, 0.0, 0.0],
        ]
    }

    #[test]
    fn test_rejects_non_square() {
        let rows = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(matches!(
            AdjacencyMatrix::from_rows(rows),
            Err(Error::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_rejects_asymmetric() {
        let mut rows = square();
        rows[2][0] = 0.2;
        assert!(matches!(
            AdjacencyMatrix::from_rows(rows),
            Err(Error::AsymmetricMatrix { row: 0, col: 2 })
        ));
    }

    #[test]
    fn test_nan_pairs_are_symmetric() {
        let mut rows = square();
        rows[1][2] = f64::NAN;
        rows[2][1] = f64::NAN;
        assert!(AdjacencyMatrix::from_rows(rows).is_ok());
    }

    #[test]
    fn test_upper_triangle_is_row_major() {
        let m = AdjacencyMatrix::from_rows(square()).unwrap();
        let keys: Vec<EdgeKey> = m.upper_triangle().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![EdgeKey::new(0, 1), EdgeKey::new(0, 2), EdgeKey::new(1, 2)]);
        assert_eq!(m.possible_edges(), 3);
    }

    #[test]
    fn test_store_requires_load() {
        let store = AdjacencyStore::new();
        assert!(matches!(store.n(), Err(Error::NotInitialized)));
    }

    #[test]
    fn test_store_checks_expected_nodes() {
        let mut store = AdjacencyStore::new();
        let m = AdjacencyMatrix::from_rows(square()).unwrap();
        assert!(matches!(
            store.load(m.clone(), Some(4)),
            Err(Error::DimensionMismatch { expected: 4, got: 3 })
        ));
        assert!(!store.is_loaded());
        store.load(m, Some(3)).unwrap();
        assert_eq!(store.weight(NodeId(0), NodeId(1)).unwrap(), 0.5);
    }
}
