use crate::{
    config::Config,
    context::AppContext,
    discovery::discover,
    engine::OcrEngine,
    error::DigestError,
    executor::WorkerPool,
    models::Document,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct DigestOptions {
    pub workers: usize,
    pub item_timeout: Option<Duration>,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            item_timeout: None,
        }
    }
}

impl DigestOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let secs = cfg.digest.item_timeout_seconds;
        Self {
            workers: cfg.digest.max_workers.max(1),
            item_timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Apply `engine` to every path and keep the successful extractions.
///
/// A failing item is logged with its path and the engine identity, then
/// dropped; the same policy holds for one worker and for many. With more
/// than one worker the documents come back in completion order.
pub fn run(paths: Vec<PathBuf>, engine: &dyn OcrEngine, opts: DigestOptions) -> Vec<Document> {
    if paths.is_empty() {
        warn!("[digest] no input paths; nothing to do");
        return Vec::new();
    }

    let pool = WorkerPool::new(opts.workers).with_item_timeout(opts.item_timeout);
    let name = engine.name().to_string();
    let total = paths.len();
    if pool.workers() > 1 {
        info!("[digest] running with {} workers over {total} files", pool.workers());
    }

    let outcomes = pool.map(paths, |path| {
        info!("[digest] processing {} with engine '{name}'", path.display());
        engine.extract(path)
    });

    let mut docs = Vec::with_capacity(outcomes.len());
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome.result {
            Ok(mut result) => {
                if result.engine != name {
                    warn!(
                        "[digest] engine '{name}' reported itself as '{}'; correcting",
                        result.engine
                    );
                    result.engine = name.clone();
                }
                debug!(
                    "[digest] {} done in {:?}",
                    outcome.item.display(),
                    outcome.elapsed
                );
                docs.push(Document::new(outcome.item, Some(result)));
            }
            Err(err) => {
                failed += 1;
                error!(
                    "[digest] error processing {} with engine '{name}': {err}",
                    outcome.item.display()
                );
            }
        }
    }

    info!("[digest] finished files={total} ok={} failed={failed}", docs.len());
    docs
}

/// Resolve the engine, discover images under `input` and digest them.
///
/// `engine_token` is an engine identity or strategy and defaults to
/// `ocr.default_engine`; `workers` defaults to `digest.max_workers`.
pub fn run_digest(
    ctx: &AppContext,
    input: &Path,
    engine_token: Option<&str>,
    workers: Option<usize>,
) -> Result<Vec<Document>, DigestError> {
    let engine = ctx.resolve_engine_or_default(engine_token)?;
    info!("[digest] engine={} kind={}", engine.name(), engine.kind());

    let paths = discover(input)?;
    if paths.is_empty() {
        warn!("[digest] no images found under {}", input.display());
        return Ok(Vec::new());
    }

    let mut opts = DigestOptions::from_config(&ctx.config);
    if let Some(w) = workers {
        opts = opts.with_workers(w);
    }
    Ok(run(paths, engine.as_ref(), opts))
}

/// Stable output order for callers that need one.
pub fn sort_by_path(docs: &mut [Document]) {
    docs.sort_by(|a, b| a.path.cmp(&b.path));
}
