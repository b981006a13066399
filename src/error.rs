use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an individual OCR engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be built (missing dependency or configuration).
    #[error("engine '{engine}' unavailable: {reason}")]
    Construction { engine: String, reason: String },

    #[error("engine '{engine}' failed on {}: {message}", .path.display())]
    Extraction {
        engine: String,
        path: PathBuf,
        message: String,
    },

    #[error("engine '{engine}' timed out after {seconds}s on {}", .path.display())]
    Timeout {
        engine: String,
        path: PathBuf,
        seconds: u64,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn construction(engine: &str, reason: impl Into<String>) -> Self {
        Self::Construction {
            engine: engine.to_string(),
            reason: reason.into(),
        }
    }

    pub fn extraction(engine: &str, path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Extraction {
            engine: engine.to_string(),
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate engine identity registered: {0}")]
    DuplicateEngine(String),

    #[error("OCR engine not registered: {name} (available: {})", .available.join(", "))]
    NotFound {
        name: String,
        available: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("unknown routing strategy: {0:?} (expected light, heavy or auto)")]
    InvalidStrategy(String),

    #[error("no healthy OCR engine available for strategy '{strategy}'")]
    NoEngineAvailable { strategy: String },

    #[error(
        "unknown OCR engine or strategy: {token:?} (engines: {}; strategies: {})",
        .engines.join(", "),
        .strategies.join(", ")
    )]
    UnknownEngineOrStrategy {
        token: String,
        engines: Vec<String>,
        strategies: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
