//! Local PaddleOCR reached through a Python helper process.
//!
//! Each extraction spawns `python <script>` and exchanges one JSON request
//! and one JSON reply over stdin/stdout, so concurrent calls never share
//! interpreter state.

use super::{EngineKind, OcrEngine};
use crate::{
    config::Config,
    error::EngineError,
    models::{BoundingBox, ExtractionResult, TextBlock},
};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const NAME: &str = "paddle";

const DOCTOR_TIMEOUT: Duration = Duration::from_secs(60);

pub struct PaddleEngine {
    python_exe: PathBuf,
    script: PathBuf,
    lang: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct Diag {
    ok: bool,
    #[serde(default)]
    paddleocr_version: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcrOut {
    ok: bool,
    #[serde(default)]
    lines: Vec<OcrLine>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcrLine {
    #[serde(rename = "box", default)]
    points: Vec<[f64; 2]>,
    text: String,
    confidence: f32,
}

#[derive(Debug, thiserror::Error)]
#[error("python helper exceeded timeout ({0:?})")]
struct TimedOut(Duration);

impl PaddleEngine {
    pub fn new(cfg: &Config) -> Result<Self, EngineError> {
        let pcfg = &cfg.ocr.paddle;
        if !pcfg.enabled {
            return Err(EngineError::construction(NAME, "disabled in config (ocr.paddle.enabled)"));
        }

        let script = PathBuf::from(&pcfg.script);
        if !script.is_file() {
            return Err(EngineError::construction(
                NAME,
                format!("missing helper script: {}", script.display()),
            ));
        }

        let python_exe = resolve_python_exe(&pcfg.python_exe)
            .map_err(|e| EngineError::construction(NAME, format!("{e:#}")))?;

        let engine = Self {
            python_exe,
            script,
            lang: pcfg.lang.clone(),
            timeout: (pcfg.timeout_seconds > 0).then(|| Duration::from_secs(pcfg.timeout_seconds)),
        };

        let diag: Diag = engine
            .run_json(&serde_json::json!({"cmd": "doctor"}), Some(DOCTOR_TIMEOUT))
            .map_err(|e| EngineError::construction(NAME, format!("{e:#}")))?;
        if !diag.ok {
            let reason = diag.error.unwrap_or_else(|| {
                "PaddleOCR is not installed (pip install paddleocr)".to_string()
            });
            return Err(EngineError::construction(NAME, reason));
        }
        info!(
            "paddle helper ready python={} paddleocr={}",
            engine.python_exe.display(),
            diag.paddleocr_version.as_deref().unwrap_or("unknown")
        );

        Ok(engine)
    }

    fn run_json<I: serde::Serialize, O: for<'de> serde::Deserialize<'de>>(
        &self,
        input: &I,
        timeout: Option<Duration>,
    ) -> Result<O> {
        debug!("python run {} timeout={:?}", self.script.display(), timeout);
        let mut child = Command::new(&self.python_exe)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning python: {}", self.script.display()))?;

        if let Err(err) = send_request(&mut child, input) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }

        let output = match timeout {
            Some(t) => wait_with_timeout(&mut child, t)?,
            None => child.wait_with_output().with_context(|| "waiting for python")?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "python helper failed: {}\n{}",
                self.script.display(),
                stderr.trim()
            ));
        }
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("python stderr {}: {}", self.script.display(), stderr.trim());
        }

        let out: O = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("parsing python JSON output: {}", self.script.display()))?;
        Ok(out)
    }
}

impl OcrEngine for PaddleEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Heavy
    }

    fn is_healthy(&self) -> bool {
        self.script.is_file() && self.python_exe.exists()
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, EngineError> {
        info!("[paddle] OCR on {}", path.display());
        let req = ocr_request(path, &self.lang)?;

        let out: OcrOut = self.run_json(&req, self.timeout).map_err(|e| {
            if let Some(TimedOut(t)) = e.downcast_ref::<TimedOut>() {
                EngineError::Timeout {
                    engine: NAME.to_string(),
                    path: path.to_path_buf(),
                    seconds: t.as_secs(),
                }
            } else {
                EngineError::extraction(NAME, path, format!("{e:#}"))
            }
        })?;

        if !out.ok {
            let msg = out.error.unwrap_or_else(|| "paddle helper returned ok=false".into());
            return Err(EngineError::extraction(NAME, path, msg));
        }

        Ok(assemble(path, &self.lang, out.lines))
    }
}

fn ocr_request(path: &Path, lang: &str) -> Result<serde_json::Value, EngineError> {
    let image = path
        .to_str()
        .ok_or_else(|| EngineError::extraction(NAME, path, "image path is not valid UTF-8"))?;
    Ok(serde_json::json!({
        "cmd": "ocr",
        "image": image,
        "lang": lang,
    }))
}

/// Write the request and close stdin so the helper sees EOF.
fn send_request<I: serde::Serialize>(child: &mut Child, input: &I) -> Result<()> {
    let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin"))?;
    let bytes = serde_json::to_vec(input)?;
    stdin
        .write_all(&bytes)
        .with_context(|| "writing request to python helper")?;
    stdin.flush().ok();
    Ok(())
}

fn assemble(path: &Path, lang: &str, lines: Vec<OcrLine>) -> ExtractionResult {
    let mut result = ExtractionResult::new(NAME, "").with_meta("source", path.display().to_string());
    result.language = Some(lang.to_string());

    if lines.is_empty() {
        return result.with_meta("note", "no text detected");
    }

    let mut raw_lines = Vec::with_capacity(lines.len());
    for line in lines {
        let bbox = BoundingBox::from_points(&line.points);
        raw_lines.push(line.text.clone());
        result
            .blocks
            .push(TextBlock::new(line.text, line.confidence).with_bbox(bbox));
    }
    result.raw_text = raw_lines.join("\n");
    result
}

fn resolve_python_exe(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        return which::which("python3")
            .or_else(|_| which::which("python"))
            .with_context(|| "no python3/python interpreter on PATH");
    }
    let p = expand_tilde(raw);
    if p.components().count() > 1 {
        if p.exists() {
            return Ok(p);
        }
        return Err(anyhow!("python interpreter not found: {}", p.display()));
    }
    which::which(&p).with_context(|| format!("python interpreter not on PATH: {raw}"))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Pipes are drained concurrently; a full pipe would stall the child.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });
    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            break status;
        }
        if start.elapsed() > timeout {
            warn!("python helper timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            return Err(anyhow::Error::new(TimedOut(timeout)));
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    let stdout = stdout_thread
        .join()
        .map_err(|_| anyhow!("stdout reader thread panicked"))??;
    let stderr = stderr_thread
        .join()
        .map_err(|_| anyhow!("stderr reader thread panicked"))??;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}
