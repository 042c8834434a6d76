//! Gemini provider (Generative Language `generateContent` REST API).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{TextProvider, Unavailable};
use crate::config::BackendConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    generation: GenerationConfig,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

impl GeminiProvider {
    pub fn new(cfg: &BackendConfig, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("feedback-triage/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: cfg.model.clone(),
            generation: GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                top_k: cfg.top_k,
            },
        })
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, Unavailable> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            generation_config: GenerationConfig,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<RespContent>,
        }
        #[derive(Deserialize)]
        struct RespContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            text: Option<String>,
        }

        let req = Req {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: self.generation,
        };

        let resp = self
            .http
            .post(format!("{API_BASE}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(Unavailable::Status(resp.status().as_u16()));
        }
        let body: Resp = resp.json().await.map_err(|_| Unavailable::MalformedReply)?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Unavailable::MalformedReply);
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn cache_scope(&self) -> String {
        let g = &self.generation;
        format!(
            "gemini:{}:t={}:p={}:k={}",
            self.model, g.temperature, g.top_p, g.top_k
        )
    }
}

fn transport(e: reqwest::Error) -> Unavailable {
    if e.is_timeout() {
        Unavailable::Timeout
    } else {
        Unavailable::Transport(e.to_string())
    }
}
