//! Deterministic fallback rules: classification, bug severity, feature impact
//! and ticket composition.
//!
//! Matching is a case-insensitive substring test over whitespace-collapsed text:
//! - classification is an ordered waterfall, first matching keyword set wins
//!   (spam → bug → feature → praise → complaint), then the star rating, then Other
//! - bug severity is High on crash/data-loss/login-failure markers, else Medium
//! - feature impact is High/Medium on keyword sets, Low by default
//!
//! Everything here is pure: identical inputs always yield identical outputs.

use crate::model::{
    BugAnalysis, Category, ClassificationResult, FeatureAnalysis, Impact, Priority, Severity, Ticket,
};
use crate::tables::collapse_whitespace;

pub const SPAM_TRIGGERS: &[&str] = &[
    "http", "www", "visit", "free", "money", "channel", "asdf", "subscribe", "coins",
    "discount code",
];
pub const BUG_TRIGGERS: &[&str] = &[
    "crash",
    "error",
    "exception",
    "freeze",
    "not working",
    "can't login",
    "cannot login",
    "login issue",
    "stopped working",
    "data loss",
    "sync issue",
    "sync not",
    "fails to",
    "bug",
];
pub const FEATURE_TRIGGERS: &[&str] = &[
    "please add",
    "would love",
    "feature request",
    "missing",
    "could you",
    "add support",
    "add dark mode",
];
pub const PRAISE_TRIGGERS: &[&str] = &["love", "amazing", "perfect", "best", "smooth", "works great"];
pub const COMPLAINT_TRIGGERS: &[&str] = &[
    "slow",
    "lag",
    "expensive",
    "poor",
    "bad",
    "annoying",
    "ads",
    "too many ads",
    "pricey",
    "support is",
];

/// Markers that lift bug confidence to 0.9.
const BUG_CONFIDENCE_MARKERS: &[&str] = &["crash", "data loss"];
/// Markers that make a fallback bug High severity.
const BUG_SEVERITY_MARKERS: &[&str] = &["crash", "data loss", "can't login", "cannot login"];

const HIGH_IMPACT_FEATURES: &[&str] = &["dark mode", "calendar", "integration"];
const MEDIUM_IMPACT_FEATURES: &[&str] = &["widget", "export", "multiple accounts"];

pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_BODY_CHARS: usize = 400;

/// Classify feedback text, optionally using the star rating when no keyword matches.
pub fn classify(text: &str, rating: Option<f64>) -> ClassificationResult {
    let t = normalize(text);
    let hit = |(category, confidence, rationale): (Category, f64, &str)| ClassificationResult {
        category,
        confidence,
        rationale: rationale.to_string(),
    };

    if contains_any(&t, SPAM_TRIGGERS) {
        return hit((Category::Spam, 0.95, "spam trigger"));
    }
    if contains_any(&t, BUG_TRIGGERS) {
        let conf = if contains_any(&t, BUG_CONFIDENCE_MARKERS) { 0.9 } else { 0.75 };
        return hit((Category::Bug, conf, "bug trigger"));
    }
    if contains_any(&t, FEATURE_TRIGGERS) {
        return hit((Category::FeatureRequest, 0.8, "feature trigger"));
    }
    if contains_any(&t, PRAISE_TRIGGERS) {
        return hit((Category::Praise, 0.7, "praise trigger"));
    }
    if contains_any(&t, COMPLAINT_TRIGGERS) {
        return hit((Category::Complaint, 0.7, "complaint trigger"));
    }
    match rating {
        Some(r) if r <= 2.0 => hit((Category::Complaint, 0.55, "rating fallback")),
        Some(r) if r >= 4.0 => hit((Category::Praise, 0.55, "rating fallback")),
        _ => hit((Category::Other, 0.4, "default fallback")),
    }
}

/// Coarse bug severity: only High or Medium are ever produced here.
pub fn analyze_bug(text: &str, platform: &str, version: &str) -> BugAnalysis {
    let severity = if contains_any(&normalize(text), BUG_SEVERITY_MARKERS) {
        Severity::High
    } else {
        Severity::Medium
    };
    BugAnalysis {
        severity,
        technical_details: format!(
            "Platform={platform}; Version={version}; Summary={}",
            truncate_chars(text, 140)
        ),
        rationale: "rule-based severity".to_string(),
    }
}

/// Feature impact by keyword tier.
pub fn extract_feature(text: &str) -> FeatureAnalysis {
    let t = normalize(text);
    let (impact, tag) = if contains_any(&t, HIGH_IMPACT_FEATURES) {
        (Impact::High, "high-impact trigger")
    } else if contains_any(&t, MEDIUM_IMPACT_FEATURES) {
        (Impact::Medium, "medium-impact trigger")
    } else {
        (Impact::Low, "low-impact default")
    };
    FeatureAnalysis {
        impact,
        details: feature_details(text),
        suggested_title: None,
        rationale: tag.to_string(),
    }
}

pub(crate) fn feature_details(text: &str) -> String {
    format!("Feature: {}", truncate_chars(text, 140))
}

/// Pure truncation, no synthesis. Returns `(title, body)`.
pub fn compose_ticket(title_hint: &str, body_hint: &str) -> (String, String) {
    (
        truncate_chars(title_hint, MAX_TITLE_CHARS),
        truncate_chars(body_hint, MAX_BODY_CHARS),
    )
}

/// Critic rules, applied to every ticket:
/// 1) Spam/Praise may never be High or Critical: forced down to Low
/// 2) a ticket missing its id, source id or title is marked Needs Review
///
/// Idempotent: a compliant ticket comes back unchanged.
pub fn review_ticket(mut ticket: Ticket) -> Ticket {
    if matches!(ticket.category, Category::Spam | Category::Praise) && ticket.priority.is_elevated() {
        ticket.priority = Priority::Low;
    }
    let incomplete = [&ticket.ticket_id, &ticket.source_id, &ticket.title]
        .iter()
        .any(|f| f.trim().is_empty());
    if incomplete {
        ticket.priority = Priority::NeedsReview;
    }
    ticket
}

/// First `max` Unicode scalar values of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

// --- internals ---

fn contains_any(normalized: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| normalized.contains(n))
}

fn normalize(input: &str) -> String {
    collapse_whitespace(&input.to_lowercase())
}
