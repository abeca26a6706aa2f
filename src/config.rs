//! Per-brain configuration.
//!
//! Every `Brain` owns its own `BrainConfig`; there is no process-wide state,
//! so two brains can follow different property and weighting policies.

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_SYMMETRY_TOLERANCE;

/// How adjacency matrix text files are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixFormat {
    /// Field separator; `None` splits on any whitespace.
    pub delimiter: Option<char>,
    /// Token meaning "no measurement". `nan` is always accepted as well.
    pub na_token: String,
}

impl Default for MatrixFormat {
    fn default() -> Self {
        Self {
            delimiter: None,
            na_token: "NA".to_string(),
        }
    }
}

impl MatrixFormat {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Split one line into its fields.
    ///
    /// A blank line has no fields. With a delimiter, one trailing delimiter
    /// is ignored and empty fields between delimiters are kept, so the
    /// parser can reject them.
    pub fn fields<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self.delimiter {
            None => line.split_whitespace().collect(),
            Some(d) => {
                let line = line.trim();
                if line.is_empty() {
                    return Vec::new();
                }
                let line = line.strip_suffix(d).unwrap_or(line);
                line.split(d).map(str::trim).collect()
            }
        }
    }
}

/// Policies for one `Brain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Reattach imported edge properties after every rebuild.
    pub reapply_properties_on_rebuild: bool,
    /// When false every rebuild is followed by binarisation.
    pub weighted: bool,
    /// Relative tolerance for the matrix symmetry check.
    pub symmetry_tolerance: f64,
    pub matrix: MatrixFormat,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            reapply_properties_on_rebuild: false,
            weighted: true,
            symmetry_tolerance: DEFAULT_SYMMETRY_TOLERANCE,
            matrix: MatrixFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields() {
        let ws = MatrixFormat::default();
        assert_eq!(ws.fields("  0.1\t0.2   0.3 "), vec!["0.1", "0.2", "0.3"]);

        let csv = MatrixFormat::default().with_delimiter(',');
        assert_eq!(csv.fields("0.1, 0.2,0.3,"), vec!["0.1", "0.2", "0.3"]);
        assert_eq!(csv.fields("0.1,,0.3"), vec!["0.1", "", "0.3"]);
        assert!(csv.fields("   ").is_empty());
    }

    #[test]
    fn test_defaults() {
        let cfg = BrainConfig::default();
        assert!(!cfg.reapply_properties_on_rebuild);
        assert!(cfg.weighted);
        assert_eq!(cfg.matrix.na_token, "NA");
    }
}
