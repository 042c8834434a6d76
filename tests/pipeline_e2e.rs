// tests/pipeline_e2e.rs
//
// Full batch run over temp CSV tables with the backend disabled.

use std::fs;
use std::path::Path;

use feedback_triage::config::{BackendConfig, FilePaths, TriageConfig};
use feedback_triage::tables::{LOG_COLUMNS, TICKET_COLUMNS};
use feedback_triage::{run, Category};

fn config_in(dir: &Path) -> TriageConfig {
    TriageConfig {
        backend: BackendConfig {
            api_key: String::new(),
            ..BackendConfig::default()
        },
        files: FilePaths {
            app_store_reviews: dir.join("app_store_reviews.csv"),
            support_emails: dir.join("support_emails.csv"),
            expected_classifications: dir.join("expected_classifications.csv"),
            generated_tickets: dir.join("out/generated_tickets.csv"),
            processing_log: dir.join("out/processing_log.csv"),
            metrics: dir.join("out/metrics.csv"),
        },
    }
}

fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

fn seed_inputs(dir: &Path) {
    fs::write(
        dir.join("app_store_reviews.csv"),
        "review_id,review_text,rating,platform,app_version\n\
         R1,\"App crashes on login, lost all my data\",1,iOS,2.0\n\
         R2,Please add dark mode support,4,,\n\
         R3,Great,5,,\n",
    )
    .unwrap();
    fs::write(
        dir.join("support_emails.csv"),
        "email_id,body\n\
         E1,<p>Check this out http://freecoins.biz</p>\n",
    )
    .unwrap();
}

#[tokio::test]
async fn batch_writes_all_three_tables() {
    let dir = tempfile::tempdir().unwrap();
    seed_inputs(dir.path());
    fs::write(
        dir.path().join("expected_classifications.csv"),
        "source_id,category\nR1,Bug\nR2,Feature Request\nE1,Complaint\nZZ,Spam\n",
    )
    .unwrap();
    let cfg = config_in(dir.path());

    let report = run(&cfg).await.unwrap();
    assert_eq!(report.provider, "disabled");
    assert_eq!(report.tickets, 4);
    assert_eq!(report.summary.count(Category::Bug), 1);
    assert_eq!(report.summary.count(Category::FeatureRequest), 1);
    assert_eq!(report.summary.count(Category::Praise), 1);
    assert_eq!(report.summary.count(Category::Spam), 1);

    let (headers, tickets) = read_table(&cfg.files.generated_tickets);
    assert_eq!(headers, TICKET_COLUMNS);
    let ids: Vec<&str> = tickets.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, ["TR1", "TR2", "TR3", "TE1"]);

    let r1 = &tickets[0];
    assert_eq!(r1[2], "App Store Review");
    assert_eq!(r1[3], "Bug");
    assert_eq!(r1[4], "High");
    assert!(r1[6].starts_with("Platform=iOS; Version=2.0; Summary="));

    let e1 = &tickets[3];
    assert_eq!(e1[2], "Support Email");
    assert_eq!(e1[3], "Spam");
    assert_eq!(e1[4], "Low");
    assert_eq!(e1[5], "Spam");

    let (headers, log) = read_table(&cfg.files.processing_log);
    assert_eq!(headers, LOG_COLUMNS);
    assert_eq!(log.len(), 4);
    assert_eq!(log[1][2], "Feature Request");

    let (headers, metrics) = read_table(&cfg.files.metrics);
    assert_eq!(headers.first().map(String::as_str), Some("total_items"));
    assert_eq!(headers.last().map(String::as_str), Some("category_accuracy"));
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0][0], "4");
    let accuracy: f64 = metrics[0].last().unwrap().parse().unwrap();
    assert!((accuracy - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn no_reference_means_no_accuracy_column() {
    let dir = tempfile::tempdir().unwrap();
    seed_inputs(dir.path());
    let cfg = config_in(dir.path());

    let report = run(&cfg).await.unwrap();
    assert_eq!(report.summary.category_accuracy, None);

    let (headers, _) = read_table(&cfg.files.metrics);
    assert_eq!(headers.len(), 8);
    assert!(!headers.iter().any(|h| h == "category_accuracy"));
}

#[tokio::test]
async fn missing_inputs_still_produce_headed_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path());

    let report = run(&cfg).await.unwrap();
    assert_eq!(report.tickets, 0);
    assert_eq!(report.summary.avg_confidence, 0.0);

    let (headers, rows) = read_table(&cfg.files.generated_tickets);
    assert_eq!(headers, TICKET_COLUMNS);
    assert!(rows.is_empty());
    let (_, metrics) = read_table(&cfg.files.metrics);
    assert_eq!(metrics[0][0], "0");
}
