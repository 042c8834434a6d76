// src/config/backend.rs
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

/// Env var holding the reasoning-backend credential.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_top_p() -> f32 {
    0.95
}
fn default_top_k() -> u32 {
    40
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_api_key() -> String {
    "ENV".to_string()
}

/// What to do with enum strings the backend invents (e.g. severity "Urgent").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownValuePolicy {
    /// Map to the step default (category Other, severity Medium, impact Low).
    #[default]
    Default,
    /// Treat the reply as unusable and run the rule fallback.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Total request timeout; a timeout counts as "unavailable".
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// "ENV" means: read from GEMINI_API_KEY. Resolved by `resolve()`.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default)]
    pub unknown_values: UnknownValuePolicy,
    /// Optional reply cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Optional cap on real backend calls per UTC day (requires `cache_dir`).
    #[serde(default)]
    pub daily_limit: Option<u32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
            api_key: default_api_key(),
            unknown_values: UnknownValuePolicy::default(),
            cache_dir: None,
            daily_limit: None,
        }
    }
}

impl BackendConfig {
    /// Resolve the "ENV" credential placeholder and sanitize tuning knobs.
    /// A missing env var is not an error: it simply means fallback-only mode.
    pub fn resolve(mut self) -> Self {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_API_KEY).unwrap_or_default();
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = self.temperature.clamp(0.0, 2.0);
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            self.top_p = self.top_p.clamp(0.0, 1.0);
        }
        if self.top_k == 0 {
            self.top_k = default_top_k();
        }
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        self
    }

    /// Non-empty, resolved credential; `None` means fallback-only mode.
    pub fn credential(&self) -> Option<&str> {
        let k = self.api_key.trim();
        if k.is_empty() || k.eq_ignore_ascii_case("env") {
            None
        } else {
            Some(k)
        }
    }
}
