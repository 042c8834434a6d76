//! Feedback triage: batch entrypoint.
//! Reads the configured review/email tables, writes tickets, the processing log
//! and the metrics row. See `config/triage.example.toml` for the knobs.

use feedback_triage::{run, TriageConfig};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feedback_triage=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; a missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let outcome = async {
        let cfg = TriageConfig::load_default()?;
        run(&cfg).await
    }
    .await;

    match outcome {
        Ok(report) => {
            println!("=== Done ===");
            println!("Backend: {}", report.provider);
            println!("Generated tickets: {}", report.tickets);
            for (name, value) in report.summary.columns() {
                println!("  {name:<18} {value}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "triage run failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
