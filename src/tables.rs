// src/tables.rs
//! CSV exchange with the outside world: feedback/reference readers and the
//! three output writers (tickets, processing log, metrics).
//!
//! A missing input file is not an error: that table just contributes nothing.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::model::{ExpectedLabel, FeedbackItem, ProcessingLogEntry, SourceType, Ticket};
use crate::summary::MetricsSummary;

pub const TICKET_COLUMNS: [&str; 10] = [
    "ticket_id",
    "source_id",
    "source_type",
    "category",
    "priority",
    "title",
    "technical_details",
    "created_at",
    "confidence",
    "link_back",
];

pub const LOG_COLUMNS: [&str; 5] = ["source_id", "source_type", "category", "priority", "confidence"];

/// Normalize free text: decode HTML entities, strip tags, ASCII quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").expect("static regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    collapse_whitespace(&out)
}

/// Collapse whitespace runs to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Read a feedback table (reviews or support emails). Column aliases:
/// text = review_text | body | text, id = review_id | email_id | id,
/// platform = platform | device, version = app_version | appVersion.
pub fn read_feedback(path: &Path, source_type: SourceType) -> Result<Vec<FeedbackItem>> {
    if !path.exists() {
        info!(path = %path.display(), source = %source_type, "input table absent; treating as empty");
        return Ok(Vec::new());
    }
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();

    let cols = |names: &[&str]| -> Vec<usize> {
        names
            .iter()
            .filter_map(|n| headers.iter().position(|h| h == *n))
            .collect()
    };
    let id_cols = cols(&["review_id", "email_id", "id"]);
    let text_cols = cols(&["review_text", "body", "text"]);
    let rating_cols = cols(&["rating"]);
    let platform_cols = cols(&["platform", "device"]);
    let version_cols = cols(&["app_version", "appVersion"]);
    let url_cols = cols(&["url"]);

    let mut items = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("row {} of {}", row + 1, path.display()))?;
        items.push(FeedbackItem {
            source_id: first_non_empty(&rec, &id_cols).unwrap_or_default(),
            source_type,
            text: first_non_empty(&rec, &text_cols)
                .map(|t| normalize_text(&t))
                .unwrap_or_default(),
            rating: first_non_empty(&rec, &rating_cols)
                .and_then(|r| r.parse::<f64>().ok())
                .filter(|r| r.is_finite()),
            platform: first_non_empty(&rec, &platform_cols),
            app_version: first_non_empty(&rec, &version_cols),
            url: first_non_empty(&rec, &url_cols),
        });
    }
    info!(path = %path.display(), source = %source_type, rows = items.len(), "input table loaded");
    Ok(items)
}

/// Read the expected-classification reference. `None` when the file is absent
/// or lacks a `source_id`/`category` column.
pub fn read_expected(path: &Path) -> Result<Option<Vec<ExpectedLabel>>> {
    if !path.exists() {
        info!(path = %path.display(), "expected classifications absent; accuracy will be omitted");
        return Ok(None);
    }
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let (Some(id_col), Some(cat_col)) = (
        headers.iter().position(|h| h == "source_id"),
        headers.iter().position(|h| h == "category"),
    ) else {
        warn!(path = %path.display(), "reference lacks source_id/category columns; accuracy will be omitted");
        return Ok(None);
    };

    let mut labels = Vec::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        labels.push(ExpectedLabel {
            source_id: rec.get(id_col).unwrap_or_default().to_string(),
            category: rec.get(cat_col).unwrap_or_default().to_string(),
        });
    }
    Ok(Some(labels))
}

pub fn write_tickets(path: &Path, tickets: &[Ticket]) -> Result<()> {
    write_rows(path, &TICKET_COLUMNS, tickets)
}

pub fn write_log(path: &Path, log: &[ProcessingLogEntry]) -> Result<()> {
    write_rows(path, &LOG_COLUMNS, log)
}

/// Single-row table with a dynamic header (see `MetricsSummary::columns`).
pub fn write_summary(path: &Path, summary: &MetricsSummary) -> Result<()> {
    ensure_parent(path)?;
    let columns = summary.columns();
    let mut w = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(columns.iter().map(|(name, _)| *name))?;
    w.write_record(columns.iter().map(|(_, v)| v.to_string()))?;
    w.flush()?;
    Ok(())
}

// --- internals ---

fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut w = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(header)?;
    for row in rows {
        w.serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    w.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn first_non_empty(rec: &StringRecord, cols: &[usize]) -> Option<String> {
    cols.iter()
        .filter_map(|&i| rec.get(i))
        .map(str::trim)
        .find(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  <p>App&nbsp;&amp; sync</p>\n\n  \u{201C}broken\u{201D} ";
        assert_eq!(normalize_text(s), "App & sync \"broken\"");
    }

    #[test]
    fn comparison_operators_survive_tag_stripping() {
        assert_eq!(normalize_text("rating < 3 and > 1"), "rating < 3 and > 1");
    }

    #[test]
    fn aliases_and_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("emails.csv");
        fs::write(
            &p,
            "email_id,body,device,appVersion,rating,url\n\
             E1,Cannot login,Pixel 8,3.2,,https://x/1\n\
             E2,,,,nan,\n",
        )
        .unwrap();
        let items = read_feedback(&p, SourceType::SupportEmail).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_id, "E1");
        assert_eq!(items[0].text, "Cannot login");
        assert_eq!(items[0].platform.as_deref(), Some("Pixel 8"));
        assert_eq!(items[0].app_version.as_deref(), Some("3.2"));
        assert_eq!(items[0].rating, None);
        assert_eq!(items[0].url.as_deref(), Some("https://x/1"));
        assert_eq!(items[1].text, "");
        assert_eq!(items[1].platform_or_unknown(), "Unknown");
    }

    #[test]
    fn missing_inputs_are_empty_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let items = read_feedback(&dir.path().join("nope.csv"), SourceType::AppStoreReview).unwrap();
        assert!(items.is_empty());
        assert!(read_expected(&dir.path().join("nope.csv")).unwrap().is_none());
    }

    #[test]
    fn reference_without_category_column_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("expected.csv");
        fs::write(&p, "source_id,label\nR1,Bug\n").unwrap();
        assert!(read_expected(&p).unwrap().is_none());
    }

    #[test]
    fn empty_outputs_still_have_headers() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out/nested/tickets.csv");
        write_tickets(&p, &[]).unwrap();
        let s = fs::read_to_string(&p).unwrap();
        assert_eq!(s.trim_end(), TICKET_COLUMNS.join(","));
    }
}
