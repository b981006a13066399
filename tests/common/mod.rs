#![allow(dead_code)]

use paku_digest::{
    config::Config,
    engine::{EngineKind, OcrEngine},
    error::EngineError,
    models::ExtractionResult,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Deterministic engine for tests: text is derived from the file name, and
/// files whose name contains `fail_marker` fail.
pub struct FakeEngine {
    name: String,
    kind: EngineKind,
    healthy: AtomicBool,
    fail_marker: Option<String>,
    delay: Duration,
}

impl FakeEngine {
    pub fn new(name: &str, kind: EngineKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            healthy: AtomicBool::new(true),
            fail_marker: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unhealthy(self) -> Self {
        self.healthy.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn arc(self) -> Arc<dyn OcrEngine> {
        Arc::new(self)
    }
}

impl OcrEngine for FakeEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, EngineError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(marker) = &self.fail_marker {
            if file_name.contains(marker.as_str()) {
                return Err(EngineError::extraction(&self.name, path, "simulated failure"));
            }
        }
        Ok(ExtractionResult::new(&self.name, format!("text of {file_name}")))
    }
}

/// Defaults with every optional built-in engine unable to construct.
pub fn offline_config() -> Config {
    let mut cfg = Config::default();
    cfg.ocr.paddle.enabled = false;
    cfg.ocr.chandra.api_url = None;
    cfg.ocr.chandra.api_key = None;
    cfg
}

pub fn touch(dir: &Path, rel: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, b"x").unwrap();
    path
}
