//! Export renderers
//!
//! Pure functions of the report state (plus the evaluation date used by
//! status derivation). No network or AI calls happen here.

mod docx;
mod html;

use chrono::NaiveDate;

use crate::report::ReportState;

pub use docx::render_document;
pub use html::render_html;

/// Markdown digest of the report core, fed to translation so the model works
/// on clean text instead of markup.
pub fn render_markdown(state: &ReportState, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str(&format!("# 8D Report: {}\n\n", state.d0.title));
    out.push_str(&format!("Customer: {} | Date: {}\n\n", state.d0.customer, today));

    out.push_str("## D1 & D2: Team and Problem Description\n");
    out.push_str(&format!("- Leader: {}\n", state.d1.leader));
    out.push_str(&format!("- Problem (What): {}\n", state.d2.what));
    out.push_str(&format!("- Detailed Description: {}\n\n", state.d2.detail));

    out.push_str("## D3: Interim Containment Actions (ICA)\n");
    if state.d3.is_empty() {
        out.push_str("N/A\n");
    }
    for record in &state.d3 {
        out.push_str(&format!("- {}\n", record.action));
    }
    out.push('\n');

    out.push_str("## D4: Root Cause Analysis\n");
    out.push_str(&format!(
        "- Occurrence Cause: {}\n- Escape Cause: {}\n\n",
        state.d4.occurrence_cause, state.d4.escape_cause
    ));

    out.push_str("## D5/D6: Permanent Corrective Actions & Verification\n");
    if state.d5.is_empty() {
        out.push_str("N/A\n");
    }
    for record in &state.d5 {
        let due = record
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!(
            "- {} (Due: {}, Status: {})\n",
            record.action,
            due,
            record.display_status(today).label()
        ));
    }
    out.push('\n');

    out.push_str("## D7 & D8: Prevention and Conclusion\n");
    out.push_str(&format!(
        "- Standardization: FMEA: {} | Control Plan: {} | SOP: {}\n",
        yes_no(state.d7.fmea),
        yes_no(state.d7.control_plan),
        yes_no(state.d7.sop)
    ));
    out.push_str(&format!("- Conclusion: {}\n", state.d8.conclusion));
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ActionRecord;

    #[test]
    fn test_markdown_digest_covers_all_disciplines() {
        let mut state = ReportState::new();
        state.d0.title = "Paint defects".into();
        state.d5.push(ActionRecord::new("Add inline camera check"));
        let today = NaiveDate::parse_from_str("2025-06-01", "%Y-%m-%d").unwrap();
        let md = render_markdown(&state, today);
        assert!(md.contains("# 8D Report: Paint defects"));
        assert!(md.contains("## D3"));
        assert!(md.contains("Add inline camera check"));
        assert!(md.contains("## D7 & D8"));
    }
}
