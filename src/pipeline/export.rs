use crate::{models::Document, postprocess::collapse_whitespace, util::ensure_dir};
use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Pretty-printed JSON array.
    Json,
    /// One JSON object per line.
    Jsonl,
    /// One whitespace-collapsed line of text per document.
    Txt,
    /// path, engine, language, raw_text.
    Csv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "jsonl" => Ok(ExportFormat::Jsonl),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(anyhow!("unknown export format: {other} (json, jsonl, txt, csv)")),
        }
    }
}

pub fn export_to_string(docs: &[Document], fmt: ExportFormat) -> Result<String> {
    match fmt {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(docs)?),
        ExportFormat::Jsonl => {
            let mut out = String::new();
            for d in docs {
                out.push_str(&serde_json::to_string(d)?);
                out.push('\n');
            }
            Ok(out)
        }
        ExportFormat::Txt => {
            let mut out = String::new();
            for text in docs.iter().filter_map(Document::raw_text) {
                let line = collapse_whitespace(text);
                if !line.is_empty() {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            Ok(out)
        }
        ExportFormat::Csv => {
            let mut w = csv::Writer::from_writer(Vec::new());
            w.write_record(["path", "engine", "language", "raw_text"])?;
            for d in docs {
                let path = d.path.display().to_string();
                let (engine, language, raw_text) = match &d.ocr {
                    Some(o) => (
                        o.engine.as_str(),
                        o.language.as_deref().unwrap_or(""),
                        o.raw_text.as_str(),
                    ),
                    None => ("", "", ""),
                };
                w.write_record([path.as_str(), engine, language, raw_text])?;
            }
            let bytes = w.into_inner().map_err(|e| anyhow!("flushing CSV: {e}"))?;
            String::from_utf8(bytes).with_context(|| "CSV output is not UTF-8")
        }
    }
}

pub fn export_to_file(docs: &[Document], fmt: ExportFormat, out: &Path) -> Result<()> {
    let text = export_to_string(docs, fmt)?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    std::fs::write(out, text).with_context(|| format!("writing {}", out.display()))
}
