//! HTML export
//!
//! Self-contained document with inline styles and A4 print directives, so a
//! browser's print-to-PDF produces the final artifact. Pure function of the
//! report state and the evaluation date: all nine sections and every action
//! record render even when empty, in fixed D0→D8 order, and user text is
//! escaped exactly (no lossy formatting of plain content).

use chrono::NaiveDate;

use crate::report::{ActionList, ReportState, SectionKey, FIVE_WHYS_DEPTH};

const STYLE: &str = r#"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 20px; font-size: 11pt; }
.container { max-width: 900px; margin: auto; border: 1px solid #ccc; padding: 15px; box-shadow: 2px 2px 8px #eee; }
h1 { color: #0056b3; }
h2 { border-bottom: 2px solid #0056b3; padding-bottom: 5px; color: #0056b3; margin-top: 20px; }
table { width: 100%; border-collapse: collapse; margin-bottom: 15px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }
.section-table td:nth-child(1) { width: 30%; background-color: #f9f9f9; font-weight: bold; }
.status-done { background-color: #d4edda; color: #155724; }
.status-overdue { background-color: #f8d7da; color: #721c24; font-weight: bold; }
.status-in-progress { background-color: #fff3cd; color: #856404; }
.status-open { background-color: #f0f0f0; }

@media print {
    .container { max-width: 100%; border: none; padding: 0; box-shadow: none; margin: 0; }
    @page { size: A4; margin: 20mm; }
    h2 { page-break-before: auto; page-break-after: avoid; }
    table { page-break-inside: avoid; }
    body { font-size: 11pt; }
}
"#;

/// Renders the full report as a standalone HTML document.
pub fn render_html(state: &ReportState, today: NaiveDate) -> String {
    let mut out = String::with_capacity(8 * 1024);

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str(&format!("    <title>8D Report - {}</title>\n", esc(&state.d0.title)));
    out.push_str("    <meta charset=\"utf-8\">\n");
    out.push_str(&format!("    <style>{STYLE}</style>\n"));
    out.push_str("</head>\n<body>\n<div class=\"container\">\n");

    out.push_str("<h1 style=\"text-align: center;\">8D Problem Solving Report</h1>\n");
    out.push_str(&format!(
        "<p style=\"text-align: center; border-bottom: 1px dashed #ccc; padding-bottom: 10px;\">\
         <b>Project</b>: {} | <b>Customer</b>: {} | <b>Date</b>: {}</p>\n",
        esc(&state.d0.title),
        esc(&state.d0.customer),
        today.format("%Y-%m-%d"),
    ));

    // D0
    section_heading(&mut out, SectionKey::D0);
    kv_table(
        &mut out,
        &[
            ("Title", &state.d0.title),
            ("Customer", &state.d0.customer),
            ("Scope", &state.d0.scope),
        ],
    );

    // D1
    section_heading(&mut out, SectionKey::D1);
    kv_table(
        &mut out,
        &[("Leader", &state.d1.leader), ("Members", &state.d1.members)],
    );

    // D2
    section_heading(&mut out, SectionKey::D2);
    kv_table(
        &mut out,
        &[
            ("What", &state.d2.what),
            ("When", &state.d2.when),
            ("Where", &state.d2.r#where),
            ("Who", &state.d2.who),
            ("Why", &state.d2.why),
            ("How", &state.d2.how),
            ("How Much", &state.d2.how_much),
            ("Detail", &state.d2.detail),
        ],
    );

    // D3
    section_heading(&mut out, SectionKey::D3);
    action_table(&mut out, &state.d3, today);

    // D4
    section_heading(&mut out, SectionKey::D4);
    out.push_str("<table class=\"section-table\">\n");
    for i in 0..FIVE_WHYS_DEPTH {
        let why = state.d4.five_whys.get(i).map(String::as_str).unwrap_or("");
        out.push_str(&format!(
            "<tr><td>Why {}</td><td>{}</td></tr>\n",
            i + 1,
            esc(why)
        ));
    }
    out.push_str(&format!(
        "<tr><td>Occurrence Root Cause</td><td>{}</td></tr>\n",
        esc(&state.d4.occurrence_cause)
    ));
    out.push_str(&format!(
        "<tr><td>Escape Root Cause</td><td>{}</td></tr>\n",
        esc(&state.d4.escape_cause)
    ));
    out.push_str("</table>\n");

    // D5
    section_heading(&mut out, SectionKey::D5);
    action_table(&mut out, &state.d5, today);

    // D6
    section_heading(&mut out, SectionKey::D6);
    kv_table(&mut out, &[("Verification", &state.d6.verification)]);

    // D7
    section_heading(&mut out, SectionKey::D7);
    let checklist = format!(
        "FMEA: {} | Control Plan: {} | SOP: {}",
        check(state.d7.fmea),
        check(state.d7.control_plan),
        check(state.d7.sop)
    );
    out.push_str("<table class=\"section-table\">\n");
    out.push_str(&format!(
        "<tr><td>Standardization</td><td>{checklist}</td></tr>\n"
    ));
    out.push_str(&format!(
        "<tr><td>Notes</td><td>{}</td></tr>\n",
        esc(&state.d7.notes)
    ));
    out.push_str("</table>\n");

    // D8
    section_heading(&mut out, SectionKey::D8);
    kv_table(&mut out, &[("Conclusion", &state.d8.conclusion)]);

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn section_heading(out: &mut String, section: SectionKey) {
    out.push_str(&format!("<h2>{}</h2>\n", esc(section.title())));
}

fn kv_table(out: &mut String, rows: &[(&str, &str)]) {
    out.push_str("<table class=\"section-table\">\n");
    for (label, value) in rows {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            esc(label),
            esc(value)
        ));
    }
    out.push_str("</table>\n");
}

fn action_table(out: &mut String, actions: &ActionList, today: NaiveDate) {
    out.push_str("<table>\n<tr><th>#</th><th>Action</th><th>Owner</th><th>Due</th><th>Status</th></tr>\n");
    if actions.is_empty() {
        // Empty cells, not an omitted table.
        out.push_str("<tr class=\"status-open\"><td></td><td></td><td></td><td></td><td></td></tr>\n");
    }
    for (i, record) in actions.iter().enumerate() {
        let status = record.display_status(today);
        let due = record
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            status.css_class(),
            i + 1,
            esc(&record.action),
            esc(&record.owner),
            due,
            status.label()
        ));
    }
    out.push_str("</table>\n");
}

fn check(flag: bool) -> &'static str {
    if flag {
        "\u{2705}"
    } else {
        "\u{274c}"
    }
}

fn esc(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActionRecord, ActionStatus};

    fn today() -> NaiveDate {
        NaiveDate::parse_from_str("2025-06-01", "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_all_sections_render_when_empty() {
        let html = render_html(&ReportState::new(), today());
        for key in SectionKey::ALL {
            assert!(html.contains(key.title()), "missing heading for {key}");
        }
        // Empty action lists still produce table rows.
        assert_eq!(html.matches("<th>#</th>").count(), 2);
    }

    #[test]
    fn test_field_values_survive_exactly() {
        let mut state = ReportState::new();
        state.d0.title = "Bracket <rust> & corrosion".into();
        state.d2.how_much = "300 units @ 2%".into();
        let html = render_html(&state, today());
        assert!(html.contains("Bracket &lt;rust&gt; &amp; corrosion"));
        assert!(html.contains("300 units @ 2%"));
        // Never the raw unescaped markup.
        assert!(!html.contains("Bracket <rust>"));
    }

    #[test]
    fn test_action_rows_carry_derived_status_class() {
        let mut state = ReportState::new();
        state.d5.push(ActionRecord {
            action: "Replace fixture".into(),
            owner: "Eng".into(),
            due_date: NaiveDate::parse_from_str("2025-01-01", "%Y-%m-%d").ok(),
            status: ActionStatus::Open,
        });
        let html = render_html(&state, today());
        assert!(html.contains("status-overdue"));
        // Stored state unchanged by rendering.
        assert_eq!(state.d5.0[0].status, ActionStatus::Open);
    }
}
