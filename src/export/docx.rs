//! Word (.docx) export
//!
//! Sectioned, tabular document mirroring the HTML layout. Deterministic
//! function of the report state and the evaluation date.

use chrono::NaiveDate;
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::io::Cursor;

use crate::error::ReportError;
use crate::report::{ActionList, ReportState, SectionKey, FIVE_WHYS_DEPTH};

/// Renders the full report as DOCX bytes.
pub fn render_document(state: &ReportState, today: NaiveDate) -> Result<Vec<u8>, ReportError> {
    let mut docx = Docx::new()
        .add_paragraph(heading("8D Problem Solving Report", 36))
        .add_paragraph(text_paragraph(&format!(
            "Project: {} | Customer: {} | Date: {}",
            state.d0.title,
            state.d0.customer,
            today.format("%Y-%m-%d")
        )));

    // D0
    docx = docx.add_paragraph(heading(SectionKey::D0.title(), 28)).add_table(kv_table(&[
        ("Title", &state.d0.title),
        ("Customer", &state.d0.customer),
        ("Scope", &state.d0.scope),
    ]));

    // D1
    docx = docx.add_paragraph(heading(SectionKey::D1.title(), 28)).add_table(kv_table(&[
        ("Leader", &state.d1.leader),
        ("Members", &state.d1.members),
    ]));

    // D2
    docx = docx.add_paragraph(heading(SectionKey::D2.title(), 28)).add_table(kv_table(&[
        ("What", &state.d2.what),
        ("When", &state.d2.when),
        ("Where", &state.d2.r#where),
        ("Who", &state.d2.who),
        ("Why", &state.d2.why),
        ("How", &state.d2.how),
        ("How Much", &state.d2.how_much),
        ("Detail", &state.d2.detail),
    ]));

    // D3
    docx = docx
        .add_paragraph(heading(SectionKey::D3.title(), 28))
        .add_table(action_table(&state.d3, today));

    // D4
    let mut d4_rows: Vec<(String, String)> = (0..FIVE_WHYS_DEPTH)
        .map(|i| {
            (
                format!("Why {}", i + 1),
                state.d4.five_whys.get(i).cloned().unwrap_or_default(),
            )
        })
        .collect();
    d4_rows.push((
        "Occurrence Root Cause".to_string(),
        state.d4.occurrence_cause.clone(),
    ));
    d4_rows.push(("Escape Root Cause".to_string(), state.d4.escape_cause.clone()));
    let d4_refs: Vec<(&str, &str)> = d4_rows
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    docx = docx
        .add_paragraph(heading(SectionKey::D4.title(), 28))
        .add_table(kv_table(&d4_refs));

    // D5
    docx = docx
        .add_paragraph(heading(SectionKey::D5.title(), 28))
        .add_table(action_table(&state.d5, today));

    // D6
    docx = docx
        .add_paragraph(heading(SectionKey::D6.title(), 28))
        .add_table(kv_table(&[("Verification", &state.d6.verification)]));

    // D7
    let checklist = format!(
        "FMEA: {} | Control Plan: {} | SOP: {}",
        mark(state.d7.fmea),
        mark(state.d7.control_plan),
        mark(state.d7.sop)
    );
    docx = docx.add_paragraph(heading(SectionKey::D7.title(), 28)).add_table(kv_table(&[
        ("Standardization", checklist.as_str()),
        ("Notes", &state.d7.notes),
    ]));

    // D8
    docx = docx
        .add_paragraph(heading(SectionKey::D8.title(), 28))
        .add_table(kv_table(&[("Conclusion", &state.d8.conclusion)]));

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ReportError::Export(format!("could not pack docx: {e}")))?;
    Ok(buffer.into_inner())
}

fn heading(text: &str, half_points: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold().size(half_points))
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(text_paragraph(text))
}

fn kv_table(rows: &[(&str, &str)]) -> Table {
    Table::new(
        rows.iter()
            .map(|(label, value)| TableRow::new(vec![cell(label), cell(value)]))
            .collect(),
    )
}

fn action_table(actions: &ActionList, today: NaiveDate) -> Table {
    let mut rows = vec![TableRow::new(vec![
        cell("#"),
        cell("Action"),
        cell("Owner"),
        cell("Due"),
        cell("Status"),
    ])];

    if actions.is_empty() {
        rows.push(TableRow::new(vec![
            cell(""),
            cell(""),
            cell(""),
            cell(""),
            cell(""),
        ]));
    }
    for (i, record) in actions.iter().enumerate() {
        let due = record
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        rows.push(TableRow::new(vec![
            cell(&(i + 1).to_string()),
            cell(&record.action),
            cell(&record.owner),
            cell(&due),
            cell(record.display_status(today).label()),
        ]));
    }
    Table::new(rows)
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
