//! Batch summary over the processing log: totals, per-category counts, mean
//! confidence and (optionally) category accuracy against a labeled reference.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Category, ExpectedLabel, ProcessingLogEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total_items: usize,
    /// Counts in `Category::ALL` order, zero-filled.
    pub category_counts: [(Category, usize); 6],
    pub avg_confidence: f64,
    /// Only present when a reference joined at least one row.
    pub category_accuracy: Option<f64>,
}

/// A single cell of the metrics table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(usize),
    Ratio(f64),
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{n}"),
            MetricValue::Ratio(x) => write!(f, "{x}"),
        }
    }
}

impl MetricsSummary {
    pub fn count(&self, category: Category) -> usize {
        self.category_counts
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }

    /// Ordered `(column, value)` pairs; `category_accuracy` appears only when computed.
    pub fn columns(&self) -> Vec<(&'static str, MetricValue)> {
        let mut out = vec![("total_items", MetricValue::Count(self.total_items))];
        out.extend(
            self.category_counts
                .iter()
                .map(|(c, n)| (c.column(), MetricValue::Count(*n))),
        );
        out.push(("avg_confidence", MetricValue::Ratio(self.avg_confidence)));
        if let Some(acc) = self.category_accuracy {
            out.push(("category_accuracy", MetricValue::Ratio(acc)));
        }
        out
    }
}

/// Compute the summary. `expected` is `None` when no usable reference exists
/// (file absent or lacking a category column).
pub fn compute_summary(
    log: &[ProcessingLogEntry],
    expected: Option<&[ExpectedLabel]>,
) -> MetricsSummary {
    let category_counts = Category::ALL.map(|c| (c, log.iter().filter(|e| e.category == c).count()));

    let avg_confidence = if log.is_empty() {
        0.0
    } else {
        log.iter().map(|e| e.confidence).sum::<f64>() / log.len() as f64
    };

    MetricsSummary {
        total_items: log.len(),
        category_counts,
        avg_confidence,
        category_accuracy: expected.and_then(|labels| category_accuracy(log, labels)),
    }
}

/// Inner join on source id; fraction of joined rows whose categories agree.
fn category_accuracy(log: &[ProcessingLogEntry], expected: &[ExpectedLabel]) -> Option<f64> {
    let mut by_id: HashMap<&str, Vec<Option<Category>>> = HashMap::new();
    for label in expected {
        by_id
            .entry(label.source_id.as_str())
            .or_default()
            .push(Category::parse(&label.category));
    }

    let (mut joined, mut matched) = (0usize, 0usize);
    for entry in log {
        for want in by_id.get(entry.source_id.as_str()).into_iter().flatten() {
            joined += 1;
            if *want == Some(entry.category) {
                matched += 1;
            }
        }
    }
    (joined > 0).then(|| matched as f64 / joined as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, SourceType};

    fn entry(id: &str, category: Category, confidence: f64) -> ProcessingLogEntry {
        ProcessingLogEntry {
            source_id: id.into(),
            source_type: SourceType::AppStoreReview,
            category,
            priority: Priority::Low,
            confidence,
        }
    }

    fn label(id: &str, category: &str) -> ExpectedLabel {
        ExpectedLabel {
            source_id: id.into(),
            category: category.into(),
        }
    }

    #[test]
    fn empty_log_is_all_zero() {
        let s = compute_summary(&[], None);
        assert_eq!(s.total_items, 0);
        assert_eq!(s.avg_confidence, 0.0);
        assert!(s.category_counts.iter().all(|(_, n)| *n == 0));
        assert_eq!(s.category_accuracy, None);
    }

    #[test]
    fn counts_are_zero_filled_and_mean_is_exact() {
        let log = vec![
            entry("1", Category::Bug, 0.9),
            entry("2", Category::Bug, 0.75),
            entry("3", Category::Spam, 0.95),
            entry("4", Category::Other, 0.4),
        ];
        let s = compute_summary(&log, None);
        assert_eq!(s.count(Category::Bug), 2);
        assert_eq!(s.count(Category::Praise), 0);
        assert!((s.avg_confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn accuracy_over_joined_rows_only() {
        let log = vec![
            entry("1", Category::Bug, 0.9),
            entry("2", Category::FeatureRequest, 0.8),
            entry("3", Category::Praise, 0.7),
        ];
        let labels = vec![
            label("1", "Bug"),
            label("2", "Complaint"),
            label("99", "Spam"),
        ];
        let s = compute_summary(&log, Some(labels.as_slice()));
        assert_eq!(s.category_accuracy, Some(0.5));

        let none_joined = vec![label("x", "Bug")];
        assert_eq!(compute_summary(&log, Some(none_joined.as_slice())).category_accuracy, None);
    }

    #[test]
    fn columns_follow_fixed_order() {
        let labels = [label("1", "praise")];
        let s = compute_summary(&[entry("1", Category::Praise, 0.5)], Some(&labels[..]));
        let names: Vec<_> = s.columns().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            [
                "total_items",
                "bug",
                "feature_request",
                "praise",
                "complaint",
                "spam",
                "other",
                "avg_confidence",
                "category_accuracy"
            ]
        );
        assert_eq!(s.category_accuracy, Some(1.0));
    }
}
