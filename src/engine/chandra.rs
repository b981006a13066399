//! Remote OCR through an OpenAI-compatible endpoint (Chandra, vLLM, llamafile, ...).
//!
//! Only the configuration gate exists so far: the engine registers when both
//! `PAKU_CHANDRA_API_URL` and `PAKU_CHANDRA_API_KEY` are set, and every
//! extraction fails with a clear message until the request path is written.

use super::OcrEngine;
use crate::{config::Config, error::EngineError, models::ExtractionResult};
use std::path::Path;

pub const NAME: &str = "chandra-api";

pub struct ChandraApiEngine {
    endpoint: String,
}

impl ChandraApiEngine {
    pub fn new(cfg: &Config) -> Result<Self, EngineError> {
        let url = cfg.ocr.chandra.api_url.as_deref().unwrap_or("").trim();
        let key = cfg.ocr.chandra.api_key.as_deref().unwrap_or("").trim();
        if url.is_empty() || key.is_empty() {
            return Err(EngineError::construction(
                NAME,
                "not configured: set PAKU_CHANDRA_API_URL and PAKU_CHANDRA_API_KEY \
                 (e.g. PAKU_CHANDRA_API_URL=http://localhost:8000/v1/)",
            ));
        }
        Ok(Self {
            endpoint: url.trim_end_matches('/').to_string(),
        })
    }
}

impl OcrEngine for ChandraApiEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, EngineError> {
        Err(EngineError::extraction(
            NAME,
            path,
            format!(
                "request path to {} is not implemented yet; use another engine",
                self.endpoint
            ),
        ))
    }
}
