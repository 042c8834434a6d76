//! Core records flowing through the triage pipeline.
//!
//! Enums carry their table/backend spelling through `as_str()` and parse back
//! leniently via `parse()`: case-insensitive, ignoring spaces, `_` and `-`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a feedback row came from. Reviews are always processed before emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "App Store Review")]
    AppStoreReview,
    #[serde(rename = "Support Email")]
    SupportEmail,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::AppStoreReview => "App Store Review",
            SourceType::SupportEmail => "Support Email",
        }
    }
}

/// Top-level feedback classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Bug,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    Complaint,
    Praise,
    Spam,
    Other,
}

impl Category {
    /// Fixed column order used by the metrics table.
    pub const ALL: [Category; 6] = [
        Category::Bug,
        Category::FeatureRequest,
        Category::Praise,
        Category::Complaint,
        Category::Spam,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Bug => "Bug",
            Category::FeatureRequest => "Feature Request",
            Category::Complaint => "Complaint",
            Category::Praise => "Praise",
            Category::Spam => "Spam",
            Category::Other => "Other",
        }
    }

    /// snake_case column name in the metrics table (`feature_request`, ...).
    pub fn column(self) -> &'static str {
        match self {
            Category::Bug => "bug",
            Category::FeatureRequest => "feature_request",
            Category::Complaint => "complaint",
            Category::Praise => "praise",
            Category::Spam => "spam",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match squash(s).as_str() {
            "bug" => Some(Category::Bug),
            "featurerequest" | "feature" => Some(Category::FeatureRequest),
            "complaint" => Some(Category::Complaint),
            "praise" => Some(Category::Praise),
            "spam" => Some(Category::Spam),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

/// Ticket urgency. `NeedsReview` marks tickets the critic found incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    #[serde(rename = "Needs Review")]
    NeedsReview,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::NeedsReview => "Needs Review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match squash(s).as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            "needsreview" => Some(Priority::NeedsReview),
            _ => None,
        }
    }

    /// High or Critical.
    pub fn is_elevated(self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match squash(s).as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Severity::Critical => Priority::Critical,
            Severity::High => Priority::High,
            Severity::Medium => Priority::Medium,
            Severity::Low => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn as_str(self) -> &'static str {
        match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match squash(s).as_str() {
            "high" => Some(Impact::High),
            "medium" => Some(Impact::Medium),
            "low" => Some(Impact::Low),
            _ => None,
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Impact::High => Priority::High,
            Impact::Medium => Priority::Medium,
            Impact::Low => Priority::Low,
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(SourceType, Category, Priority, Severity, Impact);

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// One input row. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub source_id: String,
    pub source_type: SourceType,
    pub text: String,
    pub rating: Option<f64>,
    pub platform: Option<String>,
    pub app_version: Option<String>,
    pub url: Option<String>,
}

impl FeedbackItem {
    /// Minimal item with only id and text; handy for tests and ad-hoc runs.
    pub fn new(source_id: impl Into<String>, source_type: SourceType, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            source_type,
            text: text.into(),
            rating: None,
            platform: None,
            app_version: None,
            url: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn platform_or_unknown(&self) -> &str {
        self.platform.as_deref().unwrap_or("Unknown")
    }

    pub fn version_or_unknown(&self) -> &str {
        self.app_version.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BugAnalysis {
    pub severity: Severity,
    pub technical_details: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAnalysis {
    pub impact: Impact,
    pub details: String,
    /// Only the backend suggests titles; the rule path leaves this `None`.
    pub suggested_title: Option<String>,
    pub rationale: String,
}

/// Canonical ticket record; field order matches the tickets table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub technical_details: String,
    pub created_at: String,
    pub confidence: f64,
    pub link_back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub source_id: String,
    pub source_type: SourceType,
    pub category: Category,
    pub priority: Priority,
    pub confidence: f64,
}

impl From<&Ticket> for ProcessingLogEntry {
    fn from(t: &Ticket) -> Self {
        Self {
            source_id: t.source_id.clone(),
            source_type: t.source_type,
            category: t.category,
            priority: t.priority,
            confidence: t.confidence,
        }
    }
}

/// Row of the optional expected-classification reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedLabel {
    pub source_id: String,
    pub category: String,
}
