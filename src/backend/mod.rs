//! Reasoning backend adapter: provider abstraction, prompt assembly, reply
//! parsing, optional file cache + daily budget.
//!
//! Every failure (no credential, transport, HTTP status, unparsable reply,
//! exhausted budget) comes back as `Err(Unavailable)`; nothing panics or
//! propagates past this boundary. There are no retries: callers pick a fallback.

pub mod cache;
pub mod gemini;
pub mod parse;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::BackendConfig;
pub use cache::CachingProvider;
pub use gemini::GeminiProvider;
pub use parse::parse_structured_reply;

/// A parsed structured reply (always a JSON object).
pub type ReplyObject = serde_json::Map<String, Value>;

/// Why the backend could not produce a structured reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No credential configured; no network attempt was made.
    Disabled,
    Timeout,
    Transport(String),
    Status(u16),
    MalformedReply,
    BudgetExhausted,
}

impl Unavailable {
    /// Stable label for counters and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Unavailable::Disabled => "disabled",
            Unavailable::Timeout => "timeout",
            Unavailable::Transport(_) => "transport",
            Unavailable::Status(_) => "status",
            Unavailable::MalformedReply => "malformed_reply",
            Unavailable::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// What the decision engine talks to.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Send instructions plus a JSON payload; get a JSON object back or `Unavailable`.
    async fn ask_structured(&self, instructions: &str, payload: &Value)
        -> Result<ReplyObject, Unavailable>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynBackend = Arc<dyn ReasoningBackend>;

/// Low-level provider: one raw text completion, no parsing. Separated so the
/// same cache wrapper and reply parser serve production and tests.
#[async_trait]
pub trait TextProvider: Send + Sync + 'static {
    async fn complete(&self, prompt: &str) -> Result<String, Unavailable>;
    fn name(&self) -> &'static str;

    /// Everything besides the prompt that shapes a reply (model, sampling knobs).
    /// Part of the reply-cache key.
    fn cache_scope(&self) -> String {
        self.name().to_string()
    }
}

/// Factory: build the backend from config.
///
/// * No credential → `DisabledBackend` (fallback-only mode, logged as a warning).
/// * Otherwise Gemini, wrapped in `CachingProvider` when `cache_dir` is set.
pub fn build_backend(cfg: &BackendConfig) -> DynBackend {
    let Some(api_key) = cfg.credential() else {
        warn!("GEMINI_API_KEY not set; running with rule-based fallbacks only");
        return Arc::new(DisabledBackend);
    };

    let provider = match GeminiProvider::new(cfg, api_key) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = ?e, "could not build HTTP client; running with rule-based fallbacks only");
            return Arc::new(DisabledBackend);
        }
    };

    match &cfg.cache_dir {
        Some(dir) => Arc::new(StructuredBackend::new(CachingProvider::new(
            provider,
            dir.clone(),
            cfg.daily_limit,
        ))),
        None => Arc::new(StructuredBackend::new(provider)),
    }
}

/// Turns a `TextProvider` into a `ReasoningBackend`: prompt layout + reply parsing.
pub struct StructuredBackend<P: TextProvider> {
    inner: P,
}

impl<P: TextProvider> StructuredBackend<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

/// Prompt layout shared by every step.
pub fn render_prompt(instructions: &str, payload: &Value) -> String {
    format!("{instructions}\n\nUser Input:\n{payload}\n\nReturn a valid JSON only.")
}

#[async_trait]
impl<P: TextProvider> ReasoningBackend for StructuredBackend<P> {
    async fn ask_structured(
        &self,
        instructions: &str,
        payload: &Value,
    ) -> Result<ReplyObject, Unavailable> {
        let text = self.inner.complete(&render_prompt(instructions, payload)).await?;
        parse_structured_reply(&text)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Always unavailable; used when no credential is configured.
pub struct DisabledBackend;

#[async_trait]
impl ReasoningBackend for DisabledBackend {
    async fn ask_structured(&self, _: &str, _: &Value) -> Result<ReplyObject, Unavailable> {
        Err(Unavailable::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Scripted backend for tests and dry runs: replies are keyed by instruction text,
/// every call is recorded.
#[derive(Default)]
pub struct MockBackend {
    replies: HashMap<String, ReplyObject>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for one instruction text. Non-object values are ignored.
    pub fn reply_for(mut self, instructions: &str, reply: Value) -> Self {
        if let Value::Object(obj) = reply {
            self.replies.insert(instructions.to_string(), obj);
        }
        self
    }

    /// `(instructions, payload)` for every call so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ReasoningBackend for MockBackend {
    async fn ask_structured(
        &self,
        instructions: &str,
        payload: &Value,
    ) -> Result<ReplyObject, Unavailable> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((instructions.to_string(), payload.clone()));
        self.replies
            .get(instructions)
            .cloned()
            .ok_or_else(|| Unavailable::Transport("no scripted reply".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Canned(&'static str);

    #[async_trait]
    impl TextProvider for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String, Unavailable> {
            Ok(self.0.to_string())
        }
        fn name(&self) -> &'static str {
            "canned"
        }
    }

    #[tokio::test]
    async fn disabled_backend_is_always_unavailable() {
        let out = DisabledBackend.ask_structured("x", &json!({})).await;
        assert_eq!(out, Err(Unavailable::Disabled));
    }

    #[tokio::test]
    async fn structured_backend_extracts_wrapped_json() {
        let b = StructuredBackend::new(Canned("Here it is: {\"category\": \"Bug\"} hope it helps"));
        let obj = b.ask_structured("classify", &json!({"text": "x"})).await.unwrap();
        assert_eq!(obj["category"], "Bug");
        assert_eq!(b.provider_name(), "canned");
    }

    #[tokio::test]
    async fn structured_backend_reports_malformed_replies() {
        let b = StructuredBackend::new(Canned("I cannot help with that."));
        let out = b.ask_structured("classify", &json!({})).await;
        assert_eq!(out, Err(Unavailable::MalformedReply));
    }

    #[test]
    fn prompt_layout_embeds_payload_json() {
        let p = render_prompt("Do it.", &json!({"text": "hi"}));
        assert_eq!(
            p,
            "Do it.\n\nUser Input:\n{\"text\":\"hi\"}\n\nReturn a valid JSON only."
        );
    }

    #[test]
    fn build_without_credential_is_disabled() {
        let cfg = BackendConfig {
            api_key: String::new(),
            ..BackendConfig::default()
        };
        assert_eq!(build_backend(&cfg).provider_name(), "disabled");
    }
}
