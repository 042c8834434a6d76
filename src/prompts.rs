//! Instruction texts sent to the reasoning backend, one per decision step.
//! Field names in each prompt are the keys the engine reads back.

pub const CLASSIFIER: &str = "You classify user feedback for a mobile app support team.
Pick exactly one category: Bug, Feature Request, Praise, Complaint, Spam, Other.
Reply with compact JSON: {\"category\": ..., \"confidence\": 0..1, \"brief_rationale\": ...}.";

pub const BUG_ANALYZER: &str = "You triage bug reports.
Estimate severity as one of Critical, High, Medium, Low. Crashes, login failures and data loss are Critical or High; be conservative otherwise.
Summarize platform, version and the failure in technical_details.
Reply with JSON: {\"severity\": ..., \"technical_details\": ..., \"brief_rationale\": ...}.";

pub const FEATURE_EXTRACTOR: &str = "You assess feature requests.
Estimate user impact as High, Medium or Low, summarize the request and suggest a ticket title.
Reply with JSON: {\"impact\": ..., \"details\": ..., \"suggested_title\": ...}.";

pub const TICKET_COMPOSER: &str = "You write support tickets.
Produce a concise title of at most 80 characters and a short body from the hints.
Reply with JSON: {\"title\": ..., \"body\": ...}.";

pub const CRITIC: &str = "You review support tickets for completeness, consistency and priority sanity.
Spam and Praise tickets must never be High or Critical priority.
If the ticket is fine reply {\"ok\": true}. Otherwise reply with corrected values for any of: priority, title, body.";
