use super::{Backend, OcrEngine};
use crate::{
    config::Config,
    error::{EngineError, RegistryError},
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Identity → engine map, immutable once built. Iteration follows
/// registration order, which routing relies on.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl EngineRegistry {
    /// Build every built-in backend in `Backend::ALL` order. Optional
    /// backends that fail to construct are logged and left out.
    pub fn from_config(cfg: &Config) -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        for backend in Backend::ALL {
            let built = backend.construct(cfg);
            if backend.is_required() {
                match built {
                    Ok(engine) => builder.register(engine)?,
                    Err(err) => error!("required engine failed to build: {err}"),
                }
            } else {
                builder.register_optional(backend.name(), built)?;
            }
        }
        let registry = builder.build();
        info!("ocr engines registered: {}", registry.names().join(", "));
        Ok(registry)
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn OcrEngine>, RegistryError> {
        self.find(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    pub(crate) fn find(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.iter().any(|e| e.name() == name)
    }

    /// Snapshot of (identity, engine) pairs in registration order.
    pub fn list(&self) -> Vec<(String, Arc<dyn OcrEngine>)> {
        self.engines
            .iter()
            .map(|e| (e.name().to_string(), Arc::clone(e)))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn engines(&self) -> &[Arc<dyn OcrEngine>] {
        &self.engines
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an engine. A second engine with the same identity is rejected.
    pub fn register(&mut self, engine: Arc<dyn OcrEngine>) -> Result<(), RegistryError> {
        let name = engine.name();
        if self.engines.iter().any(|e| e.name() == name) {
            return Err(RegistryError::DuplicateEngine(name.to_string()));
        }
        debug!("registered engine {name} kind={}", engine.kind());
        self.engines.push(engine);
        Ok(())
    }

    /// Add the outcome of an optional backend's constructor. Construction
    /// failures are expected and only logged.
    pub fn register_optional(
        &mut self,
        name: &str,
        built: Result<Arc<dyn OcrEngine>, EngineError>,
    ) -> Result<(), RegistryError> {
        match built {
            Ok(engine) => self.register(engine),
            Err(err) => {
                info!("{name} OCR engine not available: {err}");
                Ok(())
            }
        }
    }

    pub fn with(mut self, engine: Arc<dyn OcrEngine>) -> Result<Self, RegistryError> {
        self.register(engine)?;
        Ok(self)
    }

    pub fn build(self) -> EngineRegistry {
        EngineRegistry {
            engines: self.engines,
        }
    }
}
