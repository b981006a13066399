mod common;

use common::{FakeEngine, offline_config, touch};
use paku_digest::{
    context::AppContext,
    engine::{EngineKind, EngineRegistry},
    pipeline::{
        benchmark::{BenchmarkError, benchmark_engine},
        run_benchmark,
    },
};
use tempfile::tempdir;

fn ctx() -> AppContext {
    let registry = EngineRegistry::builder()
        .with(FakeEngine::new("fast", EngineKind::Light).arc())
        .unwrap()
        .with(
            FakeEngine::new("picky", EngineKind::Heavy)
                .failing_on("blurry")
                .arc(),
        )
        .unwrap()
        .build();
    AppContext::new(offline_config(), registry)
}

#[test]
fn every_registered_engine_is_timed() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.png");
    touch(dir.path(), "blurry.png");
    touch(dir.path(), "deep/c.tif");

    let report = run_benchmark(&ctx(), dir.path(), &[]).unwrap();
    assert_eq!(report.num_images, 3);
    assert_eq!(report.engines.len(), 2);
    assert!(!report.started.is_empty());
    assert!(!report.finished.is_empty());

    let fast = &report.engines[0];
    assert_eq!(fast.name, "fast");
    assert_eq!(fast.kind, EngineKind::Light);
    assert_eq!((fast.ok_count, fast.error_count), (3, 0));
    assert_eq!(fast.runs.len(), 3);

    let picky = &report.engines[1];
    assert_eq!((picky.ok_count, picky.error_count), (2, 1));
    let failed: Vec<_> = picky.runs.iter().filter(|r| !r.ok).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("blurry.png"));
    assert!(failed[0].error.as_deref().unwrap().contains("simulated failure"));
}

#[test]
fn requested_engines_filter_the_run() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.png");

    let requested = vec!["picky".to_string(), "ghost".to_string()];
    let report = run_benchmark(&ctx(), dir.path(), &requested).unwrap();
    let names: Vec<_> = report.engines.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["picky"]);
}

#[test]
fn no_matching_engine_is_an_error() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.png");

    let err = run_benchmark(&ctx(), dir.path(), &["ghost".to_string()]).unwrap_err();
    assert!(matches!(err, BenchmarkError::NoEngines { ref requested } if requested.len() == 1 && requested[0] == "ghost"));
}

#[test]
fn empty_input_reports_zero_images() {
    let dir = tempdir().unwrap();
    let report = run_benchmark(&ctx(), dir.path(), &[]).unwrap();
    assert_eq!(report.num_images, 0);
    assert!(report.engines.is_empty());
}

#[test]
fn averages_over_all_paths() {
    let dir = tempdir().unwrap();
    let paths = vec![touch(dir.path(), "a.png"), touch(dir.path(), "b.png")];
    let engine = FakeEngine::new("slow", EngineKind::Light)
        .with_delay(std::time::Duration::from_millis(5));

    let stats = benchmark_engine(&engine, &paths);
    assert_eq!(stats.ok_count, 2);
    assert!(stats.total_ms >= 10.0);
    assert!((stats.avg_ms - stats.total_ms / 2.0).abs() < 1e-9);
}
