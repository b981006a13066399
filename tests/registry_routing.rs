mod common;

use common::{FakeEngine, offline_config};
use paku_digest::{
    context::AppContext,
    engine::{EngineKind, EngineRegistry, EngineRouter, OcrEngine, Strategy},
    error::{EngineError, RegistryError, RouteError},
};
use std::sync::Arc;

fn ctx_with(engines: Vec<FakeEngine>) -> AppContext {
    let mut builder = EngineRegistry::builder();
    for e in engines {
        builder.register(e.arc()).unwrap();
    }
    AppContext::new(offline_config(), builder.build())
}

#[test]
fn failing_optional_engines_leave_the_stub() {
    let mut cfg = offline_config();
    cfg.ocr.paddle.enabled = true;
    cfg.ocr.paddle.script = "does/not/exist/paddle_ocr.py".into();

    let registry = EngineRegistry::from_config(&cfg).unwrap();
    assert_eq!(registry.names(), vec!["stub".to_string()]);
    assert_eq!(registry.get("stub").unwrap().kind(), EngineKind::Light);
}

#[test]
fn configured_remote_engine_registers_but_cannot_extract() {
    let mut cfg = offline_config();
    cfg.ocr.chandra.api_url = Some("http://localhost:8000/v1/".into());
    cfg.ocr.chandra.api_key = Some("secret".into());

    let registry = EngineRegistry::from_config(&cfg).unwrap();
    assert_eq!(registry.names(), vec!["stub".to_string(), "chandra-api".to_string()]);

    let chandra = registry.get("chandra-api").unwrap();
    let err = chandra.extract("x.png".as_ref()).unwrap_err();
    assert!(matches!(err, EngineError::Extraction { .. }));
}

#[test]
fn duplicate_identity_fails_the_build() {
    let mut builder = EngineRegistry::builder();
    builder.register(FakeEngine::new("dup", EngineKind::Light).arc()).unwrap();
    let err = builder
        .register(FakeEngine::new("dup", EngineKind::Heavy).arc())
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEngine(ref n) if n == "dup"));
}

#[test]
fn optional_construction_failure_is_skipped() {
    let mut builder = EngineRegistry::builder();
    builder
        .register_optional("broken", Err(EngineError::construction("broken", "missing lib")))
        .unwrap();
    builder
        .register_optional("ok", Ok(FakeEngine::new("ok", EngineKind::Light).arc()))
        .unwrap();
    let registry = builder.build();
    assert_eq!(registry.names(), vec!["ok".to_string()]);
}

#[test]
fn unknown_engine_lists_available() {
    let ctx = ctx_with(vec![
        FakeEngine::new("alpha", EngineKind::Light),
        FakeEngine::new("beta", EngineKind::Heavy),
    ]);
    let err = ctx.registry.get("gamma").unwrap_err();
    match &err {
        RegistryError::NotFound { name, available } => {
            assert_eq!(name, "gamma");
            assert_eq!(available, &vec!["alpha".to_string(), "beta".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("alpha, beta"));
}

#[test]
fn list_is_a_snapshot() {
    let ctx = ctx_with(vec![FakeEngine::new("alpha", EngineKind::Light)]);
    let mut snapshot = ctx.registry.list();
    snapshot.clear();
    assert_eq!(ctx.registry.len(), 1);
}

#[test]
fn auto_prefers_heavy_then_falls_back_to_light() {
    let ctx = ctx_with(vec![
        FakeEngine::new("light-one", EngineKind::Light),
        FakeEngine::new("heavy-one", EngineKind::Heavy),
    ]);
    assert_eq!(ctx.router().select(Strategy::Auto).unwrap().name(), "heavy-one");

    let ctx = ctx_with(vec![
        FakeEngine::new("light-one", EngineKind::Light),
        FakeEngine::new("heavy-one", EngineKind::Heavy).unhealthy(),
    ]);
    assert_eq!(ctx.router().select(Strategy::Auto).unwrap().name(), "light-one");
}

#[test]
fn light_and_heavy_prefer_their_kind_and_fall_back() {
    let ctx = ctx_with(vec![
        FakeEngine::new("h", EngineKind::Heavy),
        FakeEngine::new("l", EngineKind::Light),
    ]);
    assert_eq!(ctx.router().select(Strategy::Light).unwrap().name(), "l");
    assert_eq!(ctx.router().select(Strategy::Heavy).unwrap().name(), "h");

    let only_light = ctx_with(vec![FakeEngine::new("l", EngineKind::Light)]);
    assert_eq!(only_light.router().select(Strategy::Heavy).unwrap().name(), "l");

    let only_heavy = ctx_with(vec![FakeEngine::new("h", EngineKind::Heavy)]);
    assert_eq!(only_heavy.router().select(Strategy::Light).unwrap().name(), "h");
}

#[test]
fn first_registered_wins_among_equals() {
    let ctx = ctx_with(vec![
        FakeEngine::new("first", EngineKind::Light).unhealthy(),
        FakeEngine::new("second", EngineKind::Light),
        FakeEngine::new("third", EngineKind::Light),
    ]);
    assert_eq!(ctx.router().select(Strategy::Light).unwrap().name(), "second");
}

#[test]
fn health_is_probed_on_every_selection() {
    let heavy = Arc::new(FakeEngine::new("h", EngineKind::Heavy));
    let heavy_dyn: Arc<dyn OcrEngine> = heavy.clone();
    let engines = vec![FakeEngine::new("l", EngineKind::Light).arc(), heavy_dyn];
    let router = EngineRouter::new(&engines);

    assert_eq!(router.select(Strategy::Auto).unwrap().name(), "h");
    heavy.set_healthy(false);
    assert_eq!(router.select(Strategy::Auto).unwrap().name(), "l");
}

#[test]
fn no_healthy_engine_is_distinct_from_not_found() {
    let ctx = ctx_with(vec![FakeEngine::new("l", EngineKind::Light).unhealthy()]);
    let err = ctx.router().select(Strategy::Light).unwrap_err();
    assert!(matches!(err, RouteError::NoEngineAvailable { ref strategy } if strategy == "light"));
}

#[test]
fn strategy_parsing() {
    assert_eq!("AUTO".parse::<Strategy>().unwrap(), Strategy::Auto);
    assert_eq!(" heavy ".parse::<Strategy>().unwrap(), Strategy::Heavy);
    let err = "fastest".parse::<Strategy>().unwrap_err();
    assert!(matches!(err, RouteError::InvalidStrategy(ref s) if s == "fastest"));

    let ctx = ctx_with(vec![FakeEngine::new("l", EngineKind::Light)]);
    assert!(matches!(
        ctx.router().select_str("best"),
        Err(RouteError::InvalidStrategy(_))
    ));
}

#[test]
fn identity_takes_precedence_over_strategy_name() {
    let ctx = ctx_with(vec![
        FakeEngine::new("auto", EngineKind::Light),
        FakeEngine::new("big", EngineKind::Heavy),
    ]);
    assert_eq!(ctx.resolve_engine("auto").unwrap().name(), "auto");
    assert_eq!(ctx.resolve_engine("heavy").unwrap().name(), "big");
    assert_eq!(ctx.resolve_engine("big").unwrap().name(), "big");
}

#[test]
fn unknown_token_names_engines_and_strategies() {
    let ctx = ctx_with(vec![FakeEngine::new("stub", EngineKind::Light)]);
    let err = ctx.resolve_engine("tesseract").unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, RouteError::UnknownEngineOrStrategy { .. }));
    assert!(msg.contains("stub"));
    assert!(msg.contains("light, heavy, auto"));
}

#[test]
fn default_token_comes_from_config() {
    let mut ctx = ctx_with(vec![
        FakeEngine::new("l", EngineKind::Light),
        FakeEngine::new("h", EngineKind::Heavy),
    ]);
    ctx.config.ocr.default_engine = "heavy".into();
    assert_eq!(ctx.resolve_engine_or_default(None).unwrap().name(), "h");
    assert_eq!(ctx.resolve_engine_or_default(Some("l")).unwrap().name(), "l");
}
