use crate::engine::EngineKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub input_root: String,
    pub num_images: usize,
    pub started: String,
    pub finished: String,
    pub engines: Vec<EngineRunStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRunStats {
    pub name: String,
    pub kind: EngineKind,
    pub total_ms: f64,
    pub avg_ms: f64,
    pub ok_count: usize,
    pub error_count: usize,
    pub runs: Vec<ItemRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRun {
    pub path: String,
    pub elapsed_ms: f64,
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareReport {
    pub left_source: String,
    pub right_source: String,
    pub total_paths: usize,
    pub exact_equal_count: usize,
    pub avg_similarity: f64,
    pub high_similarity_count: usize,
    /// Paths present only in the left output.
    pub left_only_count: usize,
    /// Paths present only in the right output.
    pub right_only_count: usize,
    pub per_path: Vec<PathComparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathComparison {
    pub path: String,
    pub exact_equal: bool,
    pub similarity: f64,
    pub left_missing: bool,
    pub right_missing: bool,
    pub left_text: Option<String>,
    pub right_text: Option<String>,
}
