//! # Decision Engine
//! Maps one `FeedbackItem` → one reviewed `Ticket`.
//!
//! Every step (classify, analyze-bug, extract-feature, compose, critique) goes
//! through `attempt`: ask the reasoning backend, accept the reply only if it
//! carries the step's required key(s), otherwise run the deterministic rule.
//! The engine never fails; a dead backend just means rule-based output.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::backend::{DisabledBackend, DynBackend, ReplyObject};
use crate::config::UnknownValuePolicy;
use crate::model::{
    BugAnalysis, Category, ClassificationResult, FeatureAnalysis, FeedbackItem, Impact, Priority,
    Severity, Ticket,
};
use crate::prompts;
use crate::rules::{self, truncate_chars, MAX_TITLE_CHARS};
use crate::ticket::{build_ticket, TicketDraft};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "triage_backend_accepted_total",
            "Backend replies accepted, by step."
        );
        describe_counter!(
            "triage_backend_unavailable_total",
            "Backend calls that produced no usable reply, by reason."
        );
        describe_counter!("triage_fallback_total", "Rule fallbacks taken, by step.");
        describe_counter!(
            "triage_critic_corrections_total",
            "Tickets whose priority the critic changed."
        );
    });
}

/// Decision points, each with its own instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Classify,
    AnalyzeBug,
    ExtractFeature,
    Compose,
    Critique,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Classify => "classify",
            Step::AnalyzeBug => "analyze_bug",
            Step::ExtractFeature => "extract_feature",
            Step::Compose => "compose",
            Step::Critique => "critique",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Step::Classify => prompts::CLASSIFIER,
            Step::AnalyzeBug => prompts::BUG_ANALYZER,
            Step::ExtractFeature => prompts::FEATURE_EXTRACTOR,
            Step::Compose => prompts::TICKET_COMPOSER,
            Step::Critique => prompts::CRITIC,
        }
    }
}

/// Branch outcome shared by all categories.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketPlan {
    pub priority: Priority,
    pub title_hint: String,
    pub details: String,
}

pub struct DecisionEngine {
    backend: DynBackend,
    policy: UnknownValuePolicy,
}

impl DecisionEngine {
    pub fn new(backend: DynBackend, policy: UnknownValuePolicy) -> Self {
        ensure_metrics_described();
        Self { backend, policy }
    }

    /// Rules only; no backend calls are ever made.
    pub fn fallback_only() -> Self {
        Self::new(Arc::new(DisabledBackend), UnknownValuePolicy::Default)
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    /// Full per-item sequence: classify → branch → compose → build → critique.
    pub async fn process_item(&self, item: &FeedbackItem) -> Ticket {
        let class = self.classify(&item.text, item.rating).await;
        let plan = self.plan(item, class.category).await;
        let (title, body) = self.compose_ticket(&plan.title_hint, &plan.details).await;

        let ticket = build_ticket(TicketDraft {
            source_id: item.source_id.clone(),
            source_type: item.source_type,
            category: class.category,
            priority: plan.priority,
            title,
            details: if body.is_empty() { plan.details } else { body },
            confidence: class.confidence,
            link_back: item.url.clone(),
        });
        let ticket = self.critique(ticket).await;

        debug!(
            source_id = %ticket.source_id,
            category = %ticket.category,
            priority = %ticket.priority,
            confidence = ticket.confidence,
            rationale = %class.rationale,
            "item processed"
        );
        ticket
    }

    /// Category branch: runs the bug/feature analysis where needed and returns
    /// the priority, title hint and details for the ticket.
    pub async fn plan(&self, item: &FeedbackItem, category: Category) -> TicketPlan {
        let text = item.text.as_str();
        match category {
            Category::Bug => {
                let a = self
                    .analyze_bug(text, item.platform_or_unknown(), item.version_or_unknown())
                    .await;
                TicketPlan {
                    priority: a.severity.priority(),
                    title_hint: format!("Bug: {}", truncate_chars(text, 72)),
                    details: a.technical_details,
                }
            }
            Category::FeatureRequest => {
                let f = self.extract_feature(text).await;
                let title_hint = match f.suggested_title {
                    Some(t) if !t.trim().is_empty() => t,
                    _ => format!("Feature: {}", truncate_chars(text, 72)),
                };
                TicketPlan {
                    priority: f.impact.priority(),
                    title_hint,
                    details: f.details,
                }
            }
            Category::Complaint => TicketPlan {
                priority: Priority::Medium,
                title_hint: format!("Complaint: {}", truncate_chars(text, 72)),
                details: format!("Complaint: {}", truncate_chars(text, 240)),
            },
            Category::Praise => TicketPlan {
                priority: Priority::Low,
                title_hint: "Praise".to_string(),
                details: "Positive feedback".to_string(),
            },
            Category::Spam => TicketPlan {
                priority: Priority::Low,
                title_hint: "Spam".to_string(),
                details: "Likely spam".to_string(),
            },
            Category::Other => {
                let head = truncate_chars(text, 72);
                TicketPlan {
                    priority: Priority::Low,
                    title_hint: if head.is_empty() {
                        format!("{category} item")
                    } else {
                        head
                    },
                    details: format!("Summary={}", truncate_chars(text, 240)),
                }
            }
        }
    }

    pub async fn classify(&self, text: &str, rating: Option<f64>) -> ClassificationResult {
        let policy = self.policy;
        self.attempt(
            Step::Classify,
            json!({ "text": text, "rating": rating }),
            |r| {
                let category =
                    parse_with_policy(r.get("category")?, Category::parse, Category::Other, policy)?;
                Some(ClassificationResult {
                    category,
                    confidence: number(r.get("confidence")).unwrap_or(0.6).clamp(0.0, 1.0),
                    rationale: string(r, "brief_rationale").unwrap_or_default(),
                })
            },
            || rules::classify(text, rating),
        )
        .await
    }

    pub async fn analyze_bug(&self, text: &str, platform: &str, version: &str) -> BugAnalysis {
        let policy = self.policy;
        self.attempt(
            Step::AnalyzeBug,
            json!({ "text": text, "platform": platform, "version": version }),
            |r| {
                let severity =
                    parse_with_policy(r.get("severity")?, Severity::parse, Severity::Medium, policy)?;
                Some(BugAnalysis {
                    severity,
                    technical_details: string(r, "technical_details").unwrap_or_default(),
                    rationale: string(r, "brief_rationale").unwrap_or_default(),
                })
            },
            || rules::analyze_bug(text, platform, version),
        )
        .await
    }

    pub async fn extract_feature(&self, text: &str) -> FeatureAnalysis {
        let policy = self.policy;
        self.attempt(
            Step::ExtractFeature,
            json!({ "text": text }),
            |r| {
                let impact = parse_with_policy(r.get("impact")?, Impact::parse, Impact::Low, policy)?;
                Some(FeatureAnalysis {
                    impact,
                    details: string(r, "details").unwrap_or_else(|| rules::feature_details(text)),
                    suggested_title: Some(
                        string(r, "suggested_title").unwrap_or_else(|| "Feature".to_string()),
                    ),
                    rationale: String::new(),
                })
            },
            || rules::extract_feature(text),
        )
        .await
    }

    /// Returns `(title, body)`; the title is always ≤ 80 chars.
    pub async fn compose_ticket(&self, title_hint: &str, body_hint: &str) -> (String, String) {
        self.attempt(
            Step::Compose,
            json!({
                "title_hint": truncate_chars(title_hint, 120),
                "body_hint": truncate_chars(body_hint, 500),
            }),
            |r| {
                let title = string(r, "title")?;
                let body = string(r, "body")?;
                Some((truncate_chars(&title, MAX_TITLE_CHARS), body))
            },
            || rules::compose_ticket(title_hint, body_hint),
        )
        .await
    }

    /// Critic step. A backend reply of `ok: true` keeps the ticket; otherwise only
    /// `priority`, `title` and `body`/`technical_details` may be overridden. The
    /// rule review runs last on every path, so Spam/Praise never leave as High.
    pub async fn critique(&self, ticket: Ticket) -> Ticket {
        let before = ticket.priority;
        let payload = serde_json::to_value(&ticket).unwrap_or(Value::Null);
        let policy = self.policy;
        let fallback_copy = ticket.clone();

        let merged = self
            .attempt(
                Step::Critique,
                payload,
                move |r| merge_corrections(ticket, r, policy),
                move || fallback_copy,
            )
            .await;
        let reviewed = rules::review_ticket(merged);

        if reviewed.priority != before {
            counter!("triage_critic_corrections_total").increment(1);
            debug!(
                ticket_id = %reviewed.ticket_id,
                from = %before,
                to = %reviewed.priority,
                "critic changed priority"
            );
        }
        reviewed
    }

    /// Backend first; rule fallback when the backend is unavailable or the reply
    /// is missing what the step needs.
    async fn attempt<T>(
        &self,
        step: Step,
        payload: Value,
        accept: impl FnOnce(&ReplyObject) -> Option<T>,
        fallback: impl FnOnce() -> T,
    ) -> T {
        match self.backend.ask_structured(step.instructions(), &payload).await {
            Ok(reply) => match accept(&reply) {
                Some(v) => {
                    counter!("triage_backend_accepted_total", "step" => step.name()).increment(1);
                    return v;
                }
                None => debug!(step = step.name(), "backend reply unusable; using rules"),
            },
            Err(reason) => {
                counter!("triage_backend_unavailable_total", "reason" => reason.label()).increment(1);
                debug!(step = step.name(), reason = ?reason, "backend unavailable; using rules");
            }
        }
        counter!("triage_fallback_total", "step" => step.name()).increment(1);
        fallback()
    }
}

/// Apply a critic reply to a ticket. `None` means the reply must be discarded.
fn merge_corrections(mut ticket: Ticket, r: &ReplyObject, policy: UnknownValuePolicy) -> Option<Ticket> {
    if r.get("ok").and_then(Value::as_bool) == Some(true) {
        return Some(ticket);
    }
    for (key, value) in r {
        match key.as_str() {
            "ok" => {}
            "priority" => match value.as_str().and_then(Priority::parse) {
                Some(p) => ticket.priority = p,
                None if policy == UnknownValuePolicy::Reject => return None,
                None => debug!(value = %value, "ignoring unknown critic priority"),
            },
            "title" => {
                if let Some(t) = value.as_str() {
                    ticket.title = truncate_chars(t, MAX_TITLE_CHARS);
                }
            }
            "body" | "technical_details" => {
                if let Some(b) = value.as_str() {
                    ticket.technical_details = b.to_string();
                }
            }
            other => debug!(field = other, "ignoring critic field outside the override set"),
        }
    }
    Some(ticket)
}

/// Parse a backend enum string; unknown values follow `policy`.
fn parse_with_policy<T>(
    v: &Value,
    parse: impl Fn(&str) -> Option<T>,
    default: T,
    policy: UnknownValuePolicy,
) -> Option<T> {
    match (v.as_str().and_then(parse), policy) {
        (Some(x), _) => Some(x),
        (None, UnknownValuePolicy::Default) => Some(default),
        (None, UnknownValuePolicy::Reject) => None,
    }
}

fn string(r: &ReplyObject, key: &str) -> Option<String> {
    r.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Numbers may arrive as JSON numbers or numeric strings. NaN and infinities
/// count as non-numeric.
fn number(v: Option<&Value>) -> Option<f64> {
    let x = match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    x.filter(|x| x.is_finite())
}
