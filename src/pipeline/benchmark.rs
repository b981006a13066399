use crate::{
    context::AppContext,
    discovery::discover,
    engine::OcrEngine,
    error::DiscoveryError,
    executor::WorkerPool,
    report::{BenchmarkReport, EngineRunStats, ItemRun},
    util::now_rfc3339,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("no OCR engines available for benchmark (requested: {requested:?})")]
    NoEngines { requested: Vec<String> },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Time one engine over every path, one image at a time.
pub fn benchmark_engine(engine: &dyn OcrEngine, paths: &[PathBuf]) -> EngineRunStats {
    let name = engine.name();
    let outcomes = WorkerPool::sequential().map(paths.to_vec(), |p| {
        info!("[benchmark] engine '{name}' on {}", p.display());
        engine.extract(p)
    });

    let mut runs = Vec::with_capacity(outcomes.len());
    let mut total_ms = 0.0;
    let (mut ok_count, mut error_count) = (0usize, 0usize);

    for outcome in outcomes {
        let elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0;
        total_ms += elapsed_ms;
        let error = match &outcome.result {
            Ok(_) => {
                ok_count += 1;
                None
            }
            Err(err) => {
                error_count += 1;
                error!(
                    "[benchmark] error with engine '{name}' on {}: {err}",
                    outcome.item.display()
                );
                Some(err.to_string())
            }
        };
        runs.push(ItemRun {
            path: outcome.item.display().to_string(),
            elapsed_ms,
            ok: error.is_none(),
            error,
        });
    }

    let avg_ms = if paths.is_empty() {
        0.0
    } else {
        total_ms / paths.len() as f64
    };

    EngineRunStats {
        name: name.to_string(),
        kind: engine.kind(),
        total_ms,
        avg_ms,
        ok_count,
        error_count,
        runs,
    }
}

/// Discover images under `input` and time each selected engine over them.
/// An empty `engine_names` selects every registered engine.
pub fn run_benchmark(
    ctx: &AppContext,
    input: &Path,
    engine_names: &[String],
) -> Result<BenchmarkReport, BenchmarkError> {
    let started = now_rfc3339();
    let paths = discover(input)?;
    if paths.is_empty() {
        warn!("[benchmark] no images found under {}", input.display());
        return Ok(BenchmarkReport {
            input_root: input.display().to_string(),
            num_images: 0,
            started,
            finished: now_rfc3339(),
            engines: Vec::new(),
        });
    }

    let mut engines: Vec<(String, Arc<dyn OcrEngine>)> = ctx.registry.list();
    if !engine_names.is_empty() {
        for requested in engine_names {
            if !ctx.registry.contains(requested) {
                warn!("[benchmark] requested engine not registered: {requested}");
            }
        }
        engines.retain(|(name, _)| engine_names.iter().any(|n| n == name));
    }
    if engines.is_empty() {
        return Err(BenchmarkError::NoEngines {
            requested: engine_names.to_vec(),
        });
    }

    let stats = engines
        .iter()
        .map(|(_, engine)| benchmark_engine(engine.as_ref(), &paths))
        .collect();

    Ok(BenchmarkReport {
        input_root: input.display().to_string(),
        num_images: paths.len(),
        started,
        finished: now_rfc3339(),
        engines: stats,
    })
}
