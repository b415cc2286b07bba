//! End-to-end report assembly and export through the public API.

use chrono::NaiveDate;

use eightd_assist::export::{render_document, render_html, render_markdown};
use eightd_assist::report::{ActionRecord, ActionStatus, ReportState, SectionKey};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn sample_report() -> ReportState {
    let mut state = ReportState::new();
    state.set(SectionKey::D0, "title", "Leaking seal on pump P-7").unwrap();
    state.set(SectionKey::D0, "customer", "Borealis GmbH").unwrap();
    state.set(SectionKey::D1, "leader", "M. Okafor").unwrap();
    state.set(SectionKey::D1, "members", "Quality, Process, Supplier QA").unwrap();
    state.set(SectionKey::D2, "what", "Seal extrusion at 6 bar").unwrap();
    state.set(SectionKey::D2, "howMuch", "31 of 500 units").unwrap();
    state.set(SectionKey::D4, "why1", "Seal extrudes under pressure").unwrap();
    state.set(SectionKey::D4, "occurrenceCause", "Gland depth out of tolerance").unwrap();
    state.set(SectionKey::D7, "fmea", "true").unwrap();
    state.set(SectionKey::D8, "conclusion", "Closed after 90-day monitoring").unwrap();

    state.d3.push(ActionRecord {
        action: "100% pressure test of finished stock".into(),
        owner: "QA".into(),
        due_date: Some(date("2025-05-20")),
        status: ActionStatus::Done,
    });
    state.d5.push(ActionRecord {
        action: "Re-machine gland to drawing rev C".into(),
        owner: "Process".into(),
        due_date: Some(date("2025-05-01")),
        status: ActionStatus::InProgress,
    });
    state
}

#[test]
fn test_html_export_renders_full_report() {
    let state = sample_report();
    let html = render_html(&state, date("2025-06-01"));

    assert!(html.contains("Leaking seal on pump P-7"));
    assert!(html.contains("Borealis GmbH"));
    // Every discipline heading is present even where the section is empty.
    for key in SectionKey::ALL {
        assert!(html.contains(key.title()), "missing heading for {key}");
    }
    // The D5 action is past due at the evaluation date.
    assert!(html.contains("status-overdue"));
    assert!(html.contains("status-done"));
}

#[test]
fn test_html_export_does_not_mutate_state() {
    let state = sample_report();
    let before = state.clone();
    let _ = render_html(&state, date("2025-06-01"));
    let _ = render_html(&state, date("2030-01-01"));
    assert_eq!(state, before);
    assert_eq!(state.d5.0[0].status, ActionStatus::InProgress);
}

#[test]
fn test_docx_export_produces_a_zip_package() {
    let state = sample_report();
    let bytes = render_document(&state, date("2025-06-01")).unwrap();
    assert!(bytes.len() > 1000);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_markdown_digest_reflects_derived_status() {
    let state = sample_report();
    let md = render_markdown(&state, date("2025-06-01"));
    assert!(md.contains("Re-machine gland to drawing rev C"));
    assert!(md.contains("Status: Overdue"));
    assert!(md.contains("FMEA: yes"));
}

#[test]
fn test_exports_handle_an_untouched_report() {
    let state = ReportState::new();
    let today = date("2025-06-01");
    let html = render_html(&state, today);
    assert!(html.contains("D4: Root Cause Analysis"));
    let bytes = render_document(&state, today).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}
