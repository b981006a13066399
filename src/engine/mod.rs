pub mod chandra;
pub mod paddle;
pub mod registry;
pub mod router;
pub mod stub;

use crate::{config::Config, error::EngineError, models::ExtractionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use registry::{EngineRegistry, RegistryBuilder};
pub use router::{EngineRouter, Strategy};

/// Cost/accuracy class of an engine. Only routing looks at it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Light,
    Heavy,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Light => "light",
            EngineKind::Heavy => "heavy",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract every OCR backend satisfies.
///
/// One instance is shared by all workers of a digest run, so `extract` must
/// tolerate concurrent calls on different paths. Backends wrapping something
/// that is not thread-safe keep their own lock.
pub trait OcrEngine: Send + Sync {
    /// Stable, unique, non-empty identity.
    fn name(&self) -> &str;

    /// Run OCR on one image. Must not modify the input file.
    fn extract(&self, path: &Path) -> Result<ExtractionResult, EngineError>;

    fn kind(&self) -> EngineKind {
        EngineKind::Light
    }

    /// Best-effort availability probe, free of side effects.
    fn is_healthy(&self) -> bool {
        true
    }
}

impl fmt::Debug for dyn OcrEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrEngine")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Built-in backends, in registry construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Stub,
    Paddle,
    ChandraApi,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Stub, Backend::Paddle, Backend::ChandraApi];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Stub => stub::NAME,
            Backend::Paddle => paddle::NAME,
            Backend::ChandraApi => chandra::NAME,
        }
    }

    /// Required backends must build; optional ones may be absent.
    pub fn is_required(self) -> bool {
        matches!(self, Backend::Stub)
    }

    pub fn construct(self, cfg: &Config) -> Result<Arc<dyn OcrEngine>, EngineError> {
        Ok(match self {
            Backend::Stub => Arc::new(stub::StubEngine::new(cfg)),
            Backend::Paddle => Arc::new(paddle::PaddleEngine::new(cfg)?),
            Backend::ChandraApi => Arc::new(chandra::ChandraApiEngine::new(cfg)?),
        })
    }
}
