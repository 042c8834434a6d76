//! Batch driver: tables in → engine per row (reviews, then emails) → summary →
//! tables out.

use anyhow::Result;
use tracing::info;

use crate::backend::build_backend;
use crate::config::TriageConfig;
use crate::engine::DecisionEngine;
use crate::model::{FeedbackItem, ProcessingLogEntry, SourceType, Ticket};
use crate::summary::{compute_summary, MetricsSummary};
use crate::tables;

/// Everything accumulated for one batch, in processing order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub tickets: Vec<Ticket>,
    pub log: Vec<ProcessingLogEntry>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub provider: &'static str,
    pub tickets: usize,
    pub summary: MetricsSummary,
}

/// Process all reviews, then all emails, strictly one at a time.
pub async fn run_batch(
    engine: &DecisionEngine,
    reviews: &[FeedbackItem],
    emails: &[FeedbackItem],
) -> BatchOutput {
    let mut out = BatchOutput::default();
    for (source, items) in [
        (SourceType::AppStoreReview, reviews),
        (SourceType::SupportEmail, emails),
    ] {
        for item in items {
            let ticket = engine.process_item(item).await;
            out.log.push(ProcessingLogEntry::from(&ticket));
            out.tickets.push(ticket);
        }
        info!(source = %source, items = items.len(), "source group processed");
    }
    out
}

/// Full run from config: read inputs, process, summarize, write outputs.
pub async fn run(cfg: &TriageConfig) -> Result<RunReport> {
    let files = &cfg.files;
    let reviews = tables::read_feedback(&files.app_store_reviews, SourceType::AppStoreReview)?;
    let emails = tables::read_feedback(&files.support_emails, SourceType::SupportEmail)?;
    let expected = tables::read_expected(&files.expected_classifications)?;

    let engine = DecisionEngine::new(build_backend(&cfg.backend), cfg.backend.unknown_values);
    info!(
        provider = engine.provider_name(),
        model = %cfg.backend.model,
        reviews = reviews.len(),
        emails = emails.len(),
        "triage run starting"
    );

    let batch = run_batch(&engine, &reviews, &emails).await;
    let summary = compute_summary(&batch.log, expected.as_deref());

    tables::write_tickets(&files.generated_tickets, &batch.tickets)?;
    tables::write_log(&files.processing_log, &batch.log)?;
    tables::write_summary(&files.metrics, &summary)?;

    info!(
        tickets = batch.tickets.len(),
        avg_confidence = summary.avg_confidence,
        accuracy = ?summary.category_accuracy,
        "triage run finished"
    );
    Ok(RunReport {
        provider: engine.provider_name(),
        tickets: batch.tickets.len(),
        summary,
    })
}
