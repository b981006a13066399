use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::{Backend, Strategy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub digest: Digest,
    #[serde(default)]
    pub compare: Compare,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Overlay `PAKU_*` variables resolved through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PAKU_ENV") {
            self.global.env = v;
        }
        if let Some(v) = lookup("PAKU_WORKDIR") {
            self.global.workdir = v;
        }
        if let Some(v) = lookup("PAKU_LOG_LEVEL") {
            self.logging.level = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("PAKU_DEFAULT_OCR") {
            self.ocr.default_engine = v;
        }
        if let Some(v) = lookup("PAKU_MAX_WORKERS") {
            self.digest.max_workers = v
                .trim()
                .parse()
                .with_context(|| format!("PAKU_MAX_WORKERS is not a number: {v:?}"))?;
        }
        if let Some(v) = lookup("PAKU_PADDLE_LANG") {
            self.ocr.paddle.lang = v;
        }
        if let Some(v) = lookup("PAKU_PADDLE_PYTHON") {
            self.ocr.paddle.python_exe = v;
        }
        if let Some(v) = lookup("PAKU_CHANDRA_API_URL") {
            self.ocr.chandra.api_url = Some(v);
        }
        if let Some(v) = lookup("PAKU_CHANDRA_API_KEY") {
            self.ocr.chandra.api_key = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.global.env.trim().is_empty() {
            bail!("global.env (PAKU_ENV) must not be empty");
        }

        if self.global.workdir.trim().is_empty() {
            bail!("global.workdir (PAKU_WORKDIR) must not be empty");
        }

        let default = self.ocr.default_engine.trim();
        if default.is_empty() {
            bail!("ocr.default_engine (PAKU_DEFAULT_OCR) must not be empty");
        }
        let known = Backend::ALL.iter().any(|b| b.name() == default)
            || default.parse::<Strategy>().is_ok();
        if !known {
            tracing::warn!(
                "ocr.default_engine={default:?} is neither a built-in engine nor a strategy"
            );
        }

        if default == Backend::ChandraApi.name() {
            if self.ocr.chandra.api_url.as_deref().is_none_or(str::is_empty) {
                bail!("PAKU_CHANDRA_API_URL is required when PAKU_DEFAULT_OCR=chandra-api");
            }
            if self.ocr.chandra.api_key.as_deref().is_none_or(str::is_empty) {
                bail!("PAKU_CHANDRA_API_KEY is required when PAKU_DEFAULT_OCR=chandra-api");
            }
        }

        if self.digest.max_workers < 1 {
            bail!("digest.max_workers must be >= 1");
        }

        let t = self.compare.high_similarity_threshold;
        if !(0.0..=1.0).contains(&t) {
            bail!("compare.high_similarity_threshold must be within [0, 1], got {t}");
        }

        Ok(())
    }

    /// `global.workdir` as an absolute path.
    pub fn workdir(&self) -> Result<PathBuf> {
        std::path::absolute(&self.global.workdir)
            .with_context(|| format!("resolving workdir: {}", self.global.workdir))
    }

    /// Copy safe to print: credentials replaced by a marker.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.ocr.chandra.api_key.is_some() {
            cfg.ocr.chandra.api_key = Some("***".into());
        }
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub env: String,
    /// Working directory reported by `config`; relative values resolve
    /// against the current directory.
    pub workdir: String,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            env: "local".into(),
            workdir: ".".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ocr {
    /// Engine identity or routing strategy used when none is given.
    pub default_engine: String,
    #[serde(default)]
    pub paddle: Paddle,
    #[serde(default)]
    pub chandra: Chandra,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            default_engine: "stub".into(),
            paddle: Default::default(),
            chandra: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paddle {
    pub enabled: bool,
    pub python_exe: String,
    pub script: String,
    pub lang: String,
    pub timeout_seconds: u64,
}
impl Default for Paddle {
    fn default() -> Self {
        Self {
            enabled: true,
            python_exe: "auto".into(),
            script: "scripts/paddle_ocr.py".into(),
            lang: "en".into(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chandra {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Digest {
    pub max_workers: usize,
    /// 0 disables the per-item deadline.
    pub item_timeout_seconds: u64,
}
impl Default for Digest {
    fn default() -> Self {
        Self {
            max_workers: 4,
            item_timeout_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Compare {
    pub normalize_unicode: bool,
    pub collapse_whitespace: bool,
    pub high_similarity_threshold: f64,
}
impl Default for Compare {
    fn default() -> Self {
        Self {
            normalize_unicode: false,
            collapse_whitespace: false,
            high_similarity_threshold: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub sort_by_path: bool,
    pub default_format: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            sort_by_path: true,
            default_format: "json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
