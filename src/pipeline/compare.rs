use crate::{
    config::Compare,
    postprocess::normalize_for_compare,
    report::{CompareReport, PathComparison},
};
use serde_json::Value;
use similar::{DiffTag, TextDiff};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a list of documents in {}, got {found}", .path.display())]
    NotAList { path: PathBuf, found: &'static str },
}

/// Similarity ratio in [0, 1]: `2 * matched / total` over a character diff.
/// Two empty strings are identical; empty against non-empty scores zero.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let diff = TextDiff::from_chars(a, b);
    let matched: usize = diff
        .ops()
        .iter()
        .map(|op| op.as_tag_tuple())
        .filter(|(tag, _, _)| *tag == DiffTag::Equal)
        .map(|(_, old, _)| old.len())
        .sum();
    let total = a.chars().count() + b.chars().count();
    2.0 * matched as f64 / total as f64
}

/// Load a digest JSON output and index it by document path. Entries
/// without a path are skipped; a repeated path keeps its last entry.
pub fn load_documents(path: &Path) -> Result<BTreeMap<String, Value>, CompareError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data: Value = serde_json::from_str(&raw).map_err(|source| CompareError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    index_documents(data, path)
}

fn index_documents(data: Value, source: &Path) -> Result<BTreeMap<String, Value>, CompareError> {
    let items = match data {
        Value::Array(items) => items,
        other => {
            return Err(CompareError::NotAList {
                path: source.to_path_buf(),
                found: json_kind(&other),
            });
        }
    };

    let mut by_path = BTreeMap::new();
    for item in items {
        let key = match item.get("path") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => continue,
            Some(Value::String(_)) => continue,
            Some(other) => other.to_string(),
        };
        by_path.insert(key, item);
    }
    Ok(by_path)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn extract_text(doc: Option<&Value>) -> Option<String> {
    let ocr = doc?.get("ocr")?.as_object()?;
    match ocr.get("raw_text")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Compare two indexed document collections over the union of their paths.
pub fn compare_indexed(
    cfg: &Compare,
    left: &BTreeMap<String, Value>,
    right: &BTreeMap<String, Value>,
) -> Vec<PathComparison> {
    let all_paths: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

    all_paths
        .into_iter()
        .map(|p| {
            let ldoc = left.get(p);
            let rdoc = right.get(p);
            let ltext = extract_text(ldoc);
            let rtext = extract_text(rdoc);

            let (exact_equal, sim) = match (&ltext, &rtext) {
                (None, None) => (true, 1.0),
                _ => {
                    let l = ltext.as_deref().map(|t| normalize_for_compare(cfg, t));
                    let r = rtext.as_deref().map(|t| normalize_for_compare(cfg, t));
                    let sim = similarity(l.as_deref().unwrap_or(""), r.as_deref().unwrap_or(""));
                    (l == r, sim)
                }
            };
            debug!("[compare] {p} exact={exact_equal} similarity={sim:.4}");

            PathComparison {
                path: p.clone(),
                exact_equal,
                similarity: sim,
                left_missing: ldoc.is_none(),
                right_missing: rdoc.is_none(),
                left_text: ltext,
                right_text: rtext,
            }
        })
        .collect()
}

pub fn summarize(
    cfg: &Compare,
    left_source: &Path,
    right_source: &Path,
    per_path: Vec<PathComparison>,
) -> CompareReport {
    let total = per_path.len();
    let exact = per_path.iter().filter(|r| r.exact_equal).count();
    let sim_sum: f64 = per_path.iter().map(|r| r.similarity).sum();
    let avg_similarity = if total > 0 { sim_sum / total as f64 } else { 0.0 };
    let high = per_path
        .iter()
        .filter(|r| r.similarity >= cfg.high_similarity_threshold)
        .count();
    let left_only = per_path
        .iter()
        .filter(|r| r.right_missing && !r.left_missing)
        .count();
    let right_only = per_path
        .iter()
        .filter(|r| r.left_missing && !r.right_missing)
        .count();

    CompareReport {
        left_source: left_source.display().to_string(),
        right_source: right_source.display().to_string(),
        total_paths: total,
        exact_equal_count: exact,
        avg_similarity,
        high_similarity_count: high,
        left_only_count: left_only,
        right_only_count: right_only,
        per_path,
    }
}

/// Compare two digest JSON outputs path by path.
pub fn run_compare(cfg: &Compare, left: &Path, right: &Path) -> Result<CompareReport, CompareError> {
    let left_docs = load_documents(left)?;
    let right_docs = load_documents(right)?;
    let per_path = compare_indexed(cfg, &left_docs, &right_docs);
    let report = summarize(cfg, left, right, per_path);
    info!(
        "[compare] paths={} exact={} avg_similarity={:.4}",
        report.total_paths, report.exact_equal_count, report.avg_similarity
    );
    Ok(report)
}
