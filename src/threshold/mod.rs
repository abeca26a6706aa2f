//! # Threshold Policies
//!
//! Decides which matrix entries become edges. Three policies exist:
//!
//! | Kind | Keeps |
//! |------|-------|
//! | `TotalEdges(k)` | the `k` best-ranked candidates |
//! | `EdgePercent(p)` | the best `round(p/100 · n(n-1)/2)` candidates |
//! | `ValueCutoff(v)` | every candidate with `score > v` |
//!
//! A candidate is any upper-triangle pair with a nonzero, non-NaN weight.
//! Its score is the weight, or its absolute value when `use_absolute` is set.
//! Ranking is score descending, then `(i, j)` ascending, so identical inputs
//! always select identical edge sets.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::EdgeKey;
use crate::overlay::Diagnostic;
use crate::store::AdjacencyMatrix;
use crate::{Error, Result};

// ============================================================================
// ThresholdKind / ThresholdSpec
// ============================================================================

/// The closed set of retention rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdKind {
    TotalEdges,
    EdgePercent,
    ValueCutoff,
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThresholdKind::TotalEdges => "total_edges",
            ThresholdKind::EdgePercent => "edge_percent",
            ThresholdKind::ValueCutoff => "value_cutoff",
        };
        f.write_str(name)
    }
}

impl FromStr for ThresholdKind {
    type Err = Error;

    /// Accepts the snake-case names plus the short forms used by older
    /// notebooks (`totalEdges`, `edgePC`, `tVal`).
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "total_edges" | "totalEdges" | "TotalEdges" => Ok(ThresholdKind::TotalEdges),
            "edge_percent" | "edgePC" | "EdgePercent" => Ok(ThresholdKind::EdgePercent),
            "value_cutoff" | "tVal" | "ValueCutoff" => Ok(ThresholdKind::ValueCutoff),
            other => Err(Error::InvalidThresholdType(other.to_string())),
        }
    }
}

/// A threshold request: which rule, its parameter, and how to score weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub kind: ThresholdKind,
    pub value: f64,
    pub use_absolute: bool,
}

impl ThresholdSpec {
    pub fn new(kind: ThresholdKind, value: f64) -> Self {
        Self { kind, value, use_absolute: false }
    }

    pub fn total_edges(count: usize) -> Self {
        Self::new(ThresholdKind::TotalEdges, count as f64)
    }

    pub fn edge_percent(percent: f64) -> Self {
        Self::new(ThresholdKind::EdgePercent, percent)
    }

    pub fn value_cutoff(value: f64) -> Self {
        Self::new(ThresholdKind::ValueCutoff, value)
    }

    /// Every nonzero candidate (the no-argument threshold).
    pub fn keep_all() -> Self {
        Self::value_cutoff(f64::NEG_INFINITY)
    }

    /// Score by `|w|` instead of `w`.
    pub fn absolute(mut self) -> Self {
        self.use_absolute = true;
        self
    }

    pub fn score(&self, weight: f64) -> f64 {
        if self.use_absolute { weight.abs() } else { weight }
    }

    /// Reject values the policy cannot interpret.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidThresholdValue {
            kind: self.kind,
            value: self.value,
            reason: reason.to_string(),
        };
        if self.value.is_nan() {
            return Err(invalid("value is NaN"));
        }
        match self.kind {
            ThresholdKind::TotalEdges => {
                if !self.value.is_finite() {
                    return Err(invalid("edge count must be finite"));
                }
                if self.value.fract() != 0.0 {
                    return Err(invalid("edge count must be a whole number"));
                }
            }
            ThresholdKind::EdgePercent => {
                if !(0.0..=100.0).contains(&self.value) {
                    return Err(invalid("percentage must lie in [0, 100]"));
                }
            }
            ThresholdKind::ValueCutoff => {}
        }
        Ok(())
    }

    /// The edge count a count/percent policy asks for, before clamping to the
    /// number of available candidates. `None` for `ValueCutoff`.
    pub fn target_edges(&self, possible_edges: usize) -> Result<Option<usize>> {
        self.validate()?;
        Ok(match self.kind {
            // Saturating casts: negative counts clamp to zero.
            ThresholdKind::TotalEdges => Some(self.value.max(0.0) as usize),
            ThresholdKind::EdgePercent => {
                Some((self.value / 100.0 * possible_edges as f64).round() as usize)
            }
            ThresholdKind::ValueCutoff => None,
        })
    }
}

impl Default for ThresholdSpec {
    fn default() -> Self {
        Self::keep_all()
    }
}

impl fmt::Display for ThresholdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.value)?;
        if self.use_absolute {
            write!(f, " abs")?;
        }
        Ok(())
    }
}

// ============================================================================
// Candidates and ranking
// ============================================================================

/// A matrix pair eligible to become an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub key: EdgeKey,
    pub weight: f64,
    pub score: f64,
}

impl Candidate {
    /// Ranking order: higher score first, then row-major key.
    pub fn rank_cmp(&self, other: &Candidate) -> Ordering {
        other.score.total_cmp(&self.score).then_with(|| self.key.cmp(&other.key))
    }
}

/// All candidates of `matrix` in row-major order.
pub fn candidates(matrix: &AdjacencyMatrix, use_absolute: bool) -> Vec<Candidate> {
    matrix
        .upper_triangle()
        .filter(|(_, w)| *w != 0.0 && !w.is_nan())
        .map(|(key, weight)| Candidate {
            key,
            weight,
            score: if use_absolute { weight.abs() } else { weight },
        })
        .collect()
}

/// Sort candidates into ranking order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(Candidate::rank_cmp);
}

// ============================================================================
// Selection
// ============================================================================

/// Outcome of applying a policy to a matrix, before it touches any graph.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub edges: Vec<Candidate>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Apply `spec` to `matrix`.
///
/// Count and percent policies return the chosen edges in ranking order;
/// `ValueCutoff` returns them in row-major order.
pub fn select(matrix: &AdjacencyMatrix, spec: &ThresholdSpec) -> Result<Selection> {
    let target = spec.target_edges(matrix.possible_edges())?;
    let mut pool = candidates(matrix, spec.use_absolute);
    let mut diagnostics = Vec::new();

    let edges = match target {
        Some(target) => {
            if target > pool.len() {
                diagnostics.push(Diagnostic::candidates_exhausted(target, pool.len()));
            }
            rank(&mut pool);
            pool.truncate(target);
            pool
        }
        None => {
            pool.retain(|c| c.score > spec.value);
            pool
        }
    };

    debug!(spec = %spec, selected = edges.len(), "threshold selection");
    Ok(Selection { edges, diagnostics })
}
