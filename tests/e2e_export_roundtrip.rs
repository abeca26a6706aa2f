//! Export round-trip test: threshold a graph → dump the matrix → re-import.
//!
//!   Brain A → export_matrix() → text → read_matrix() → Brain B
//!
//! Brain B's keep-all threshold must reproduce Brain A's edge set.

use connectome_rs::export::export_matrix;
use connectome_rs::import::parse_matrix;
use connectome_rs::store::{AdjacencyMatrix, DEFAULT_SYMMETRY_TOLERANCE};
use connectome_rs::{Brain, EdgeKey, MatrixFormat, ThresholdSpec};
use pretty_assertions::assert_eq;

/// Helper: the reference connectome thresholded to its top three edges.
fn seed_brain() -> Brain {
    let mut brain = Brain::new();
    brain
        .load_matrix(
            AdjacencyMatrix::from_rows(vec![
                vec![0.0, 0.6008, 0.2036, 0.1639],
                vec![0.6008, 0.0, 0.8438, 0.2427],
                vec![0.2036, 0.8438, 0.0, 0.6373],
                vec![0.1639, 0.2427, 0.6373, 0.0],
            ])
            .unwrap(),
        )
        .unwrap();
    brain.apply_threshold(ThresholdSpec::total_edges(3)).unwrap();
    brain
}

fn dump(brain: &Brain, format: &MatrixFormat) -> String {
    let mut out: Vec<u8> = Vec::new();
    export_matrix(brain, format, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn sorted_keys(brain: &Brain) -> Vec<EdgeKey> {
    let mut keys: Vec<EdgeKey> = brain.edges().iter().map(|e| e.key()).collect();
    keys.sort();
    keys
}

#[test]
fn test_export_layout() {
    let text = dump(&seed_brain(), &MatrixFormat::default());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec!["0 0.6008 0 0", "0.6008 0 0.8438 0", "0 0.8438 0 0.6373", "0 0 0.6373 0"]
    );
}

#[test]
fn test_roundtrip_whitespace() {
    let a = seed_brain();
    let text = dump(&a, &MatrixFormat::default());

    let matrix = parse_matrix(&text, &MatrixFormat::default(), DEFAULT_SYMMETRY_TOLERANCE).unwrap();
    let mut b = Brain::new();
    b.load_matrix(matrix).unwrap();
    b.apply_threshold(ThresholdSpec::keep_all()).unwrap();

    assert_eq!(sorted_keys(&b), sorted_keys(&a));
    for edge in a.edges() {
        assert_eq!(b.edges().iter().find(|e| e.key() == edge.key()).unwrap().weight, edge.weight);
    }
}

#[test]
fn test_export_needs_matrix() {
    let mut out: Vec<u8> = Vec::new();
    assert!(matches!(
        export_matrix(&Brain::new(), &MatrixFormat::default(), &mut out),
        Err(connectome_rs::Error::NotInitialized)
    ));
}

#[test]
fn test_roundtrip_csv_binarised() {
    let mut a = seed_brain();
    a.binarise();
    let format = MatrixFormat::default().with_delimiter(',');
    let text = dump(&a, &format);
    assert!(text.starts_with("0,1,0,0\n"));

    let path = std::env::temp_dir().join(format!("connectome_export_{}.csv", std::process::id()));
    std::fs::write(&path, &text).unwrap();

    let config = connectome_rs::BrainConfig { matrix: format, ..Default::default() };
    let mut b = Brain::with_config(config);
    b.read_matrix(&path).unwrap();
    std::fs::remove_file(&path).ok();

    b.apply_threshold(ThresholdSpec::keep_all()).unwrap();
    assert_eq!(sorted_keys(&b), sorted_keys(&a));
    assert!(b.edges().iter().all(|e| e.weight == 1.0));
}
