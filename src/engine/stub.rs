use super::OcrEngine;
use crate::{config::Config, error::EngineError, models::ExtractionResult, util::sha256_file};
use std::path::Path;
use tracing::{debug, info};

pub const NAME: &str = "stub";

/// Zero-dependency engine used for development and as the last-resort fallback.
pub struct StubEngine {
    env: String,
}

impl StubEngine {
    pub fn new(cfg: &Config) -> Self {
        Self {
            env: cfg.global.env.clone(),
        }
    }
}

impl OcrEngine for StubEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, EngineError> {
        info!("[stub] OCR on {}", path.display());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut result = ExtractionResult::new(NAME, format!("[stub text for {file_name}]"))
            .with_meta("note", "stub engine, replace with real OCR")
            .with_meta("path", path.display().to_string())
            .with_meta("env", self.env.clone());

        // Hash is informational; an unreadable file still yields a result.
        match sha256_file(path) {
            Ok((hash, bytes)) => {
                result = result.with_meta("sha256", hash).with_meta("bytes", bytes);
            }
            Err(err) => debug!("[stub] skipping hash for {}: {err:#}", path.display()),
        }

        Ok(result)
    }
}
