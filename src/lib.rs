// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod backend;
pub mod config;
pub mod engine;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod rules;
pub mod summary;
pub mod tables;
pub mod ticket;

// ---- Re-exports for stable public API ----
pub use crate::backend::{DynBackend, MockBackend, ReasoningBackend};
pub use crate::config::TriageConfig;
pub use crate::engine::DecisionEngine;
pub use crate::model::{Category, FeedbackItem, Priority, SourceType, Ticket};
pub use crate::pipeline::{run, run_batch, BatchOutput, RunReport};
pub use crate::summary::{compute_summary, MetricsSummary};
