use crate::{
    config::Config,
    engine::{EngineRegistry, EngineRouter, OcrEngine, Strategy},
    error::{RegistryError, RouteError},
};
use once_cell::sync::OnceCell;
use std::sync::Arc;

static SHARED: OnceCell<AppContext> = OnceCell::new();

/// Configuration plus the engine registry for one process or one test.
pub struct AppContext {
    pub config: Config,
    pub registry: EngineRegistry,
}

impl AppContext {
    pub fn new(config: Config, registry: EngineRegistry) -> Self {
        Self { config, registry }
    }

    /// Build a fresh context, constructing every built-in engine.
    pub fn build(config: Config) -> Result<Self, RegistryError> {
        let registry = EngineRegistry::from_config(&config)?;
        Ok(Self::new(config, registry))
    }

    /// Process-wide context for CLI entry points, built on first use.
    /// Later calls return the first context and ignore `config`.
    pub fn shared(config: &Config) -> Result<&'static AppContext, RegistryError> {
        SHARED.get_or_try_init(|| Self::build(config.clone()))
    }

    pub fn router(&self) -> EngineRouter<'_> {
        EngineRouter::new(self.registry.engines())
    }

    /// Resolve a token naming either an engine or a routing strategy.
    /// Registered identities take precedence over strategy names.
    pub fn resolve_engine(&self, token: &str) -> Result<Arc<dyn OcrEngine>, RouteError> {
        if let Some(engine) = self.registry.find(token) {
            return Ok(engine);
        }
        match token.parse::<Strategy>() {
            Ok(strategy) => self.router().select(strategy),
            Err(_) => Err(RouteError::UnknownEngineOrStrategy {
                token: token.to_string(),
                engines: self.registry.names(),
                strategies: Strategy::names(),
            }),
        }
    }

    /// Resolve `token`, or the configured default when absent.
    pub fn resolve_engine_or_default(
        &self,
        token: Option<&str>,
    ) -> Result<Arc<dyn OcrEngine>, RouteError> {
        self.resolve_engine(token.unwrap_or(&self.config.ocr.default_engine))
    }
}
