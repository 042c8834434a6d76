// tests/fallback_scenarios.rs
//
// End-to-end behavior with no reasoning backend: every decision comes from the rules.

use feedback_triage::model::{Category, FeedbackItem, Priority, SourceType};
use feedback_triage::rules;
use feedback_triage::DecisionEngine;

fn review(id: &str, text: &str) -> FeedbackItem {
    FeedbackItem::new(id, SourceType::AppStoreReview, text)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn crash_with_data_loss_is_a_high_priority_bug() {
    let engine = DecisionEngine::fallback_only();
    let t = engine
        .process_item(&review("R1", "App crashes on login, lost all my data"))
        .await;
    assert_eq!(t.category, Category::Bug);
    assert!(approx(t.confidence, 0.9));
    assert_eq!(t.priority, Priority::High);
    assert_eq!(t.title, "Bug: App crashes on login, lost all my data");
    assert!(t.technical_details.starts_with("Platform=Unknown; Version=Unknown; Summary=App crashes"));
}

#[tokio::test]
async fn dark_mode_request_is_high_impact_feature() {
    let engine = DecisionEngine::fallback_only();
    let t = engine.process_item(&review("R2", "Please add dark mode support")).await;
    assert_eq!(t.category, Category::FeatureRequest);
    assert!(approx(t.confidence, 0.8));
    assert_eq!(t.priority, Priority::High);
    assert_eq!(t.title, "Feature: Please add dark mode support");
    assert_eq!(t.technical_details, "Feature: Please add dark mode support");
}

#[tokio::test]
async fn link_spam_with_five_stars_stays_low() {
    let engine = DecisionEngine::fallback_only();
    let item = review("R3", "Check this out http://freecoins.biz").with_rating(5.0);
    let t = engine.process_item(&item).await;
    assert_eq!(t.category, Category::Spam);
    assert!(approx(t.confidence, 0.95));
    assert_eq!(t.priority, Priority::Low);
    assert_eq!(t.title, "Spam");
    assert_eq!(t.technical_details, "Likely spam");
}

#[tokio::test]
async fn empty_one_star_review_is_a_complaint() {
    let engine = DecisionEngine::fallback_only();
    let t = engine.process_item(&review("R4", "").with_rating(1.0)).await;
    assert_eq!(t.category, Category::Complaint);
    assert!(approx(t.confidence, 0.55));
    assert_eq!(t.priority, Priority::Medium);
    assert_eq!(t.title, "Complaint: ");
}

#[tokio::test]
async fn other_items_use_text_head_as_title() {
    let engine = DecisionEngine::fallback_only();
    let text = "x".repeat(300);
    let t = engine.process_item(&review("R5", &text)).await;
    assert_eq!(t.category, Category::Other);
    assert_eq!(t.priority, Priority::Low);
    assert_eq!(t.title.chars().count(), 72);
    // "Summary=" + 240 chars, then cut to the 400-char body limit (no cut needed here).
    assert_eq!(t.technical_details.chars().count(), 8 + 240);
}

#[test]
fn spam_triggers_preempt_every_other_trigger() {
    for text in [
        "crash bug error www.example.com",
        "please add dark mode, subscribe to my channel",
        "love it! discount code INSIDE",
        "slow and bad, visit us",
    ] {
        assert_eq!(rules::classify(text, Some(3.0)).category, Category::Spam, "{text}");
    }
}

#[test]
fn classification_is_pure() {
    let inputs = [
        ("App crashes on login", None),
        ("meh", Some(2.0)),
        ("Would love a widget", Some(5.0)),
        ("", None),
    ];
    for (text, rating) in inputs {
        assert_eq!(rules::classify(text, rating), rules::classify(text, rating));
    }
}

#[tokio::test]
async fn ticket_ids_are_t_plus_source_id() {
    let engine = DecisionEngine::fallback_only();
    let items = [
        review("101", "Amazing app"),
        FeedbackItem::new("E-7", SourceType::SupportEmail, "Export is missing"),
        review("abc", "too many ads"),
    ];
    for item in &items {
        let t = engine.process_item(item).await;
        assert_eq!(t.ticket_id, format!("T{}", t.source_id));
        assert_eq!(t.source_id, item.source_id);
    }
}

#[tokio::test]
async fn missing_source_id_needs_review() {
    let engine = DecisionEngine::fallback_only();
    let t = engine.process_item(&review("", "The app has a bug")).await;
    assert_eq!(t.ticket_id, "T");
    assert_eq!(t.priority, Priority::NeedsReview);
}
