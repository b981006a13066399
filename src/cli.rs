use crate::{
    config::Config,
    context::AppContext,
    pipeline::{
        ExportFormat, digest::sort_by_path, export_to_string, run_benchmark, run_compare,
        run_digest,
    },
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "paku-digest")]
#[command(about = "OCR and document extraction pipeline")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./paku-digest.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run OCR over an image file or a directory of images.
    Digest {
        input: PathBuf,
        /// Engine name or routing strategy (light, heavy, auto).
        #[arg(long)]
        ocr: Option<String>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
        /// Output file (stdout by default).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Time engines over the same set of images.
    Benchmark {
        input: PathBuf,
        /// Engine to include; repeatable. All registered engines when omitted.
        #[arg(long = "engine")]
        engines: Vec<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare the text of two digest JSON outputs.
    Compare {
        left: PathBuf,
        right: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List registered OCR engines.
    Engines {},
    /// Print the effective configuration.
    Config {},
    /// Validate configuration and environment.
    EnvCheck {},
}

pub fn dispatch(args: Args) -> Result<()> {
    if let Command::EnvCheck {} = args.cmd {
        return env_check(args.config.as_deref());
    }

    let cfg = load_config(args.config.as_deref())?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Digest {
            input,
            ocr,
            workers,
            format,
            out,
        } => digest(&cfg, input, ocr.as_deref(), *workers, *format, out.as_deref()),
        Command::Benchmark {
            input,
            engines,
            out,
        } => benchmark(&cfg, input, engines, out.as_deref()),
        Command::Compare { left, right, out } => compare(&cfg, left, right, out.as_deref()),
        Command::Engines {} => engines(&cfg),
        Command::Config {} => show_config(&cfg),
        Command::EnvCheck {} => unreachable!("handled before logging init"),
    }
}

/// Config file (if any), then `.env` and `PAKU_*` overrides, then validation.
pub fn load_config(user: Option<&Path>) -> Result<Config> {
    dotenvy::dotenv().ok();
    let mut cfg = match resolve_config_path(user) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
    cfg.validate().with_context(|| "invalid configuration")?;
    Ok(cfg)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("paku-digest.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Stdout carries command output; logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("paku-digest.log"))
}

fn digest(
    cfg: &Config,
    input: &Path,
    ocr: Option<&str>,
    workers: Option<usize>,
    format: Option<ExportFormat>,
    out: Option<&Path>,
) -> Result<()> {
    validate_input(input)?;
    let fmt = match format {
        Some(f) => f,
        None => cfg
            .output
            .default_format
            .parse()
            .with_context(|| "output.default_format")?,
    };

    let ctx = AppContext::shared(cfg)?;
    let mut docs = run_digest(ctx, input, ocr, workers)?;
    if cfg.output.sort_by_path {
        sort_by_path(&mut docs);
    }
    info!("digest produced {} documents", docs.len());
    write_output(&export_to_string(&docs, fmt)?, out)
}

fn benchmark(cfg: &Config, input: &Path, engines: &[String], out: Option<&Path>) -> Result<()> {
    validate_input(input)?;
    let ctx = AppContext::shared(cfg)?;
    let report = run_benchmark(ctx, input, engines)?;
    write_output(&serde_json::to_string_pretty(&report)?, out)
}

fn compare(cfg: &Config, left: &Path, right: &Path, out: Option<&Path>) -> Result<()> {
    let report = run_compare(&cfg.compare, left, right)?;
    write_output(&serde_json::to_string_pretty(&report)?, out)
}

fn engines(cfg: &Config) -> Result<()> {
    let ctx = AppContext::shared(cfg)?;
    let data: Vec<_> = ctx
        .registry
        .list()
        .into_iter()
        .map(|(name, engine)| {
            serde_json::json!({
                "name": name,
                "kind": engine.kind(),
                "healthy": engine.is_healthy(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn show_config(cfg: &Config) -> Result<()> {
    let ctx = AppContext::shared(cfg)?;
    let mut data = serde_json::to_value(cfg.redacted())?;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("workdir".into(), serde_json::json!(cfg.workdir()?));
        obj.insert("ocr_engines".into(), serde_json::json!(ctx.registry.names()));
    }
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn env_check(config: Option<&Path>) -> Result<()> {
    match load_config(config) {
        Ok(cfg) => {
            println!("Environment configuration OK:");
            println!("{}", toml::to_string(&cfg.redacted()).unwrap_or_default());
            Ok(())
        }
        Err(err) => {
            println!("Configuration error:");
            println!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }
    Ok(())
}

fn write_output(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.is_empty() && !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
