use super::{EngineKind, OcrEngine};
use crate::error::RouteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Declarative quality/cost preference, resolved to a concrete engine at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Light,
    Heavy,
    Auto,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Light, Strategy::Heavy, Strategy::Auto];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Light => "light",
            Strategy::Heavy => "heavy",
            Strategy::Auto => "auto",
        }
    }

    /// Kinds to try, most preferred first.
    pub fn preference(self) -> [EngineKind; 2] {
        match self {
            Strategy::Light => [EngineKind::Light, EngineKind::Heavy],
            Strategy::Heavy | Strategy::Auto => [EngineKind::Heavy, EngineKind::Light],
        }
    }

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Strategy::Light),
            "heavy" => Ok(Strategy::Heavy),
            "auto" => Ok(Strategy::Auto),
            _ => Err(RouteError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Picks an engine for a strategy among a set of candidates, in order.
pub struct EngineRouter<'a> {
    engines: &'a [Arc<dyn OcrEngine>],
}

impl<'a> EngineRouter<'a> {
    pub fn new(engines: &'a [Arc<dyn OcrEngine>]) -> Self {
        Self { engines }
    }

    /// First healthy engine of `kind`. Health is probed on every call.
    fn first_healthy(&self, kind: EngineKind) -> Option<&'a Arc<dyn OcrEngine>> {
        self.engines
            .iter()
            .find(|e| e.kind() == kind && e.is_healthy())
    }

    pub fn select(&self, strategy: Strategy) -> Result<Arc<dyn OcrEngine>, RouteError> {
        for kind in strategy.preference() {
            if let Some(engine) = self.first_healthy(kind) {
                debug!("strategy {strategy} -> engine {} ({kind})", engine.name());
                return Ok(Arc::clone(engine));
            }
        }
        Err(RouteError::NoEngineAvailable {
            strategy: strategy.to_string(),
        })
    }

    pub fn select_str(&self, strategy: &str) -> Result<Arc<dyn OcrEngine>, RouteError> {
        self.select(strategy.parse()?)
    }
}
