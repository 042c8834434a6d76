// src/config/mod.rs
//! Runtime configuration: backend tuning knobs and table locations.
//!
//! Lookup order for the config file:
//! 1) $TRIAGE_CONFIG_PATH
//! 2) config/triage.toml
//! 3) config/triage.json
//! 4) built-in defaults
//!
//! Env overrides (`TRIAGE_MODEL`, `TRIAGE_*_PATH`) are applied on top, then the
//! credential placeholder is resolved.

pub mod backend;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use backend::{BackendConfig, UnknownValuePolicy, ENV_API_KEY};

pub const ENV_CONFIG_PATH: &str = "TRIAGE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub files: FilePaths,
}

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

/// Input and output table locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePaths {
    pub app_store_reviews: PathBuf,
    pub support_emails: PathBuf,
    pub expected_classifications: PathBuf,
    pub generated_tickets: PathBuf,
    pub processing_log: PathBuf,
    pub metrics: PathBuf,
}

impl Default for FilePaths {
    fn default() -> Self {
        Self {
            app_store_reviews: p("app_store_reviews.csv"),
            support_emails: p("support_emails.csv"),
            expected_classifications: p("expected_classifications.csv"),
            generated_tickets: p("generated_tickets.csv"),
            processing_log: p("processing_log.csv"),
            metrics: p("metrics.csv"),
        }
    }
}

impl TriageConfig {
    /// Load from an explicit path (TOML or JSON), then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, &ext)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.finish())
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(path);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        for candidate in ["config/triage.toml", "config/triage.json"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default().finish())
    }

    fn finish(mut self) -> Self {
        self.apply_env_overrides();
        self.backend = self.backend.resolve();
        self
    }

    fn apply_env_overrides(&mut self) {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }
        if let Some(model) = var("TRIAGE_MODEL") {
            self.backend.model = model;
        }
        let f = &mut self.files;
        for (name, slot) in [
            ("TRIAGE_REVIEWS_PATH", &mut f.app_store_reviews),
            ("TRIAGE_EMAILS_PATH", &mut f.support_emails),
            ("TRIAGE_EXPECTED_PATH", &mut f.expected_classifications),
            ("TRIAGE_TICKETS_PATH", &mut f.generated_tickets),
            ("TRIAGE_LOG_PATH", &mut f.processing_log),
            ("TRIAGE_METRICS_PATH", &mut f.metrics),
        ] {
            if let Some(v) = var(name) {
                *slot = PathBuf::from(v);
            }
        }
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<TriageConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            if let Ok(v) = serde_json::from_str(s) {
                return Ok(v);
            }
            toml::from_str(s).map_err(|e| anyhow!("unsupported config format: {e}"))
        }
    }
}
