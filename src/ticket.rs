//! Ticket construction. Pure apart from the clock reading; validation is the
//! critic's job.

use chrono::{DateTime, Local};

use crate::model::{Category, Priority, SourceType, Ticket};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the engine decided about one item, ready to become a `Ticket`.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDraft {
    pub source_id: String,
    pub source_type: SourceType,
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub details: String,
    pub confidence: f64,
    pub link_back: Option<String>,
}

pub fn ticket_id_for(source_id: &str) -> String {
    format!("T{source_id}")
}

/// Build a ticket stamped with the current local time.
pub fn build_ticket(draft: TicketDraft) -> Ticket {
    build_ticket_at(draft, Local::now())
}

pub fn build_ticket_at(draft: TicketDraft, now: DateTime<Local>) -> Ticket {
    Ticket {
        ticket_id: ticket_id_for(&draft.source_id),
        source_id: draft.source_id,
        source_type: draft.source_type,
        category: draft.category,
        priority: draft.priority,
        title: draft.title,
        technical_details: draft.details,
        created_at: now.format(TIMESTAMP_FORMAT).to_string(),
        confidence: draft.confidence,
        link_back: draft.link_back.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> TicketDraft {
        TicketDraft {
            source_id: "R042".into(),
            source_type: SourceType::AppStoreReview,
            category: Category::Bug,
            priority: Priority::High,
            title: "Bug: crash".into(),
            details: "Platform=iOS".into(),
            confidence: 0.9,
            link_back: None,
        }
    }

    #[test]
    fn id_and_timestamp_are_derived() {
        let now = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let t = build_ticket_at(draft(), now);
        assert_eq!(t.ticket_id, "TR042");
        assert_eq!(t.created_at, "2025-03-04 05:06:07");
        assert_eq!(t.link_back, "");
        assert_eq!(t.technical_details, "Platform=iOS");
    }
}
