use paku_digest::{
    models::{Document, ExtractionResult},
    pipeline::{ExportFormat, export_to_file, export_to_string},
};
use tempfile::tempdir;

fn sample() -> Vec<Document> {
    let mut first = ExtractionResult::new("stub", "Hello,\n  world");
    first.language = Some("en".into());
    vec![
        Document::new("imgs/a.png", Some(first)),
        Document::new("imgs/b.png", Some(ExtractionResult::new("paddle", "   "))),
        Document::new("imgs/c.png", None),
    ]
}

#[test]
fn json_is_a_pretty_array() {
    let out = export_to_string(&sample(), ExportFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0]["path"], "imgs/a.png");
    assert_eq!(arr[0]["ocr"]["engine"], "stub");
    assert_eq!(arr[0]["ocr"]["raw_text"], "Hello,\n  world");
    assert!(arr[2]["ocr"].is_null());
    assert!(out.contains('\n'));
}

#[test]
fn jsonl_has_one_object_per_line() {
    let out = export_to_string(&sample(), ExportFormat::Jsonl).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in &lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("path").is_some());
    }
    assert!(out.ends_with('\n'));
}

#[test]
fn txt_collapses_whitespace_and_skips_empty_text() {
    let out = export_to_string(&sample(), ExportFormat::Txt).unwrap();
    assert_eq!(out, "Hello, world\n");
}

#[test]
fn csv_has_header_and_quoted_fields() {
    let out = export_to_string(&sample(), ExportFormat::Csv).unwrap();
    let mut rdr = csv::Reader::from_reader(out.as_bytes());
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["path", "engine", "language", "raw_text"]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "imgs/a.png");
    assert_eq!(&rows[0][2], "en");
    assert_eq!(&rows[0][3], "Hello,\n  world");
    assert_eq!(&rows[2][1], "");
}

#[test]
fn empty_document_list() {
    assert_eq!(export_to_string(&[], ExportFormat::Json).unwrap(), "[]");
    assert_eq!(export_to_string(&[], ExportFormat::Jsonl).unwrap(), "");
    assert_eq!(export_to_string(&[], ExportFormat::Txt).unwrap(), "");
}

#[test]
fn format_names_parse_case_insensitively() {
    assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
    assert_eq!("jsonl".parse::<ExportFormat>().unwrap(), ExportFormat::Jsonl);
    assert_eq!("text".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
    assert_eq!(" csv ".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    assert!("xml".parse::<ExportFormat>().is_err());
    assert_eq!(ExportFormat::Txt.to_string(), "txt");
}

#[test]
fn export_to_file_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("nested/deeper/out.jsonl");
    export_to_file(&sample(), ExportFormat::Jsonl, &out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 3);
}
