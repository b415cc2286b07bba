//! Corrective and containment action records (D3 ICA, D5 PCA)
//!
//! Status is stored as the user (or extractor) set it; the displayed status is
//! derived on demand so that merely viewing a report on a later date never
//! rewrites persisted data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ReportError;
use crate::utils::json_kind;

/// Lifecycle status of a single action item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Done,
    Overdue,
}

impl ActionStatus {
    /// Accepts the spellings extraction tends to produce ("Completed",
    /// "In Progress", ...). Returns `None` for anything unrecognized.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "open" | "n/a" => Some(ActionStatus::Open),
            "in-progress" | "in progress" | "in_progress" | "inprogress" | "ongoing" => {
                Some(ActionStatus::InProgress)
            }
            "done" | "completed" | "complete" | "closed" => Some(ActionStatus::Done),
            "overdue" => Some(ActionStatus::Overdue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Open => "open",
            ActionStatus::InProgress => "in-progress",
            ActionStatus::Done => "done",
            ActionStatus::Overdue => "overdue",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::InProgress => "In Progress",
            ActionStatus::Done => "Done",
            ActionStatus::Overdue => "Overdue",
        }
    }

    /// CSS class used by the HTML export for conditional row formatting.
    pub fn css_class(&self) -> &'static str {
        match self {
            ActionStatus::Open => "status-open",
            ActionStatus::InProgress => "status-in-progress",
            ActionStatus::Done => "status-done",
            ActionStatus::Overdue => "status-overdue",
        }
    }
}

/// Pure status derivation. `Done` is terminal and never regresses; a due date
/// in the past promotes anything else to `Overdue`; otherwise the explicit
/// status stands. Dates are ISO calendar dates compared as civil dates, with
/// `today` supplied by the caller.
pub fn derive_status(
    due_date: Option<NaiveDate>,
    explicit: ActionStatus,
    today: NaiveDate,
) -> ActionStatus {
    if explicit == ActionStatus::Done {
        return ActionStatus::Done;
    }
    match due_date {
        Some(due) if due < today => ActionStatus::Overdue,
        _ => explicit,
    }
}

/// One containment or corrective action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionRecord {
    pub action: String,
    pub owner: String,
    pub due_date: Option<NaiveDate>,
    pub status: ActionStatus,
}

impl ActionRecord {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// Display status for the given evaluation date. Does not mutate `self`.
    pub fn display_status(&self, today: NaiveDate) -> ActionStatus {
        derive_status(self.due_date, self.status, today)
    }

    pub fn is_empty(&self) -> bool {
        self.action.trim().is_empty()
    }
}

/// Ordered list of action records for D3 or D5.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionList(pub Vec<ActionRecord>);

impl ActionList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, record: ActionRecord) {
        self.0.push(record);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionRecord> {
        self.0.iter()
    }

    /// Marks the action at `index` as done (terminal).
    pub fn mark_done(&mut self, index: usize) -> Result<(), ReportError> {
        let record = self.0.get_mut(index).ok_or_else(|| {
            ReportError::InputValidation(format!("no action at index {index}"))
        })?;
        record.status = ActionStatus::Done;
        Ok(())
    }

    /// Reopens a previously completed action (explicit user correction; the
    /// derivation itself never regresses `Done`).
    pub fn reopen(&mut self, index: usize) -> Result<(), ReportError> {
        let record = self.0.get_mut(index).ok_or_else(|| {
            ReportError::InputValidation(format!("no action at index {index}"))
        })?;
        record.status = ActionStatus::Open;
        Ok(())
    }

    /// Lenient construction from extracted JSON. Items without action text and
    /// fields that do not match the expected shape are dropped with a note in
    /// `dropped`; nothing is coerced.
    pub(crate) fn from_value_lenient(
        value: &Value,
        path: &str,
        dropped: &mut Vec<String>,
    ) -> Option<ActionList> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return None,
            other => {
                dropped.push(format!("{path}: expected an array, got {}", json_kind(other)));
                return None;
            }
        };

        let mut list = ActionList::default();
        for (i, item) in items.iter().enumerate() {
            let Some(map) = item.as_object() else {
                dropped.push(format!("{path}[{i}]: expected an object"));
                continue;
            };

            let action = map.get("action").and_then(Value::as_str).unwrap_or("");
            if action.trim().is_empty() || action.trim().eq_ignore_ascii_case("n/a") {
                debug!("skipping {path}[{i}]: no action text");
                continue;
            }

            let mut record = ActionRecord::new(action.trim());

            if let Some(owner) = map.get("owner").and_then(Value::as_str) {
                if !owner.trim().is_empty() && !owner.trim().eq_ignore_ascii_case("n/a") {
                    record.owner = owner.trim().to_string();
                }
            }

            if let Some(due) = map.get("dueDate").and_then(Value::as_str) {
                let due = due.trim();
                if !due.is_empty() && !due.eq_ignore_ascii_case("n/a") {
                    match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
                        Ok(date) => record.due_date = Some(date),
                        Err(_) => dropped.push(format!(
                            "{path}[{i}].dueDate: '{due}' is not a YYYY-MM-DD date"
                        )),
                    }
                }
            }

            if let Some(status) = map.get("status").and_then(Value::as_str) {
                match ActionStatus::parse_lenient(status) {
                    Some(parsed) => record.status = parsed,
                    None => dropped.push(format!(
                        "{path}[{i}].status: unrecognized status '{status}'"
                    )),
                }
            }

            for field in map.keys() {
                if !matches!(field.as_str(), "action" | "owner" | "dueDate" | "status") {
                    dropped.push(format!("{path}[{i}].{field}: unknown field"));
                }
            }

            list.push(record);
        }
        Some(list)
    }
}

impl<'a> IntoIterator for &'a ActionList {
    type Item = &'a ActionRecord;
    type IntoIter = std::slice::Iter<'a, ActionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_done_is_terminal() {
        let today = d("2025-06-01");
        assert_eq!(
            derive_status(Some(d("2024-01-01")), ActionStatus::Done, today),
            ActionStatus::Done
        );
    }

    #[test]
    fn test_past_due_becomes_overdue() {
        let today = d("2025-06-01");
        assert_eq!(
            derive_status(Some(d("2025-05-31")), ActionStatus::Open, today),
            ActionStatus::Overdue
        );
        assert_eq!(
            derive_status(Some(d("2025-05-31")), ActionStatus::InProgress, today),
            ActionStatus::Overdue
        );
    }

    #[test]
    fn test_future_or_missing_due_keeps_explicit() {
        let today = d("2025-06-01");
        assert_eq!(
            derive_status(Some(d("2025-06-02")), ActionStatus::Open, today),
            ActionStatus::Open
        );
        // Due today is not yet overdue.
        assert_eq!(
            derive_status(Some(today), ActionStatus::InProgress, today),
            ActionStatus::InProgress
        );
        assert_eq!(derive_status(None, ActionStatus::Open, today), ActionStatus::Open);
    }

    #[test]
    fn test_derivation_is_pure_and_idempotent() {
        let today = d("2025-06-01");
        let record = ActionRecord {
            action: "Quarantine lot 42".into(),
            owner: "QA".into(),
            due_date: Some(d("2025-01-01")),
            status: ActionStatus::Open,
        };
        let before = record.clone();
        let first = record.display_status(today);
        let second = record.display_status(today);
        assert_eq!(first, ActionStatus::Overdue);
        assert_eq!(first, second);
        // Display never writes back.
        assert_eq!(record, before);
        assert_eq!(record.status, ActionStatus::Open);
    }

    #[test]
    fn test_lenient_status_parse() {
        assert_eq!(ActionStatus::parse_lenient("Completed"), Some(ActionStatus::Done));
        assert_eq!(
            ActionStatus::parse_lenient("In Progress"),
            Some(ActionStatus::InProgress)
        );
        assert_eq!(ActionStatus::parse_lenient(""), Some(ActionStatus::Open));
        assert_eq!(ActionStatus::parse_lenient("banana"), None);
    }

    #[test]
    fn test_from_value_lenient_drops_bad_fields() {
        let mut dropped = Vec::new();
        let value = json!([
            {"action": "Sort stock", "owner": "Li", "dueDate": "2025-07-01", "status": "open"},
            {"action": "Retrain line", "dueDate": "someday", "status": "mystery", "priority": 1},
            {"action": "N/A"},
            "not an object"
        ]);
        let list = ActionList::from_value_lenient(&value, "d3", &mut dropped).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.0[0].due_date, Some(d("2025-07-01")));
        assert_eq!(list.0[1].due_date, None);
        assert_eq!(list.0[1].status, ActionStatus::Open);
        assert!(dropped.iter().any(|w| w.contains("dueDate")));
        assert!(dropped.iter().any(|w| w.contains("status")));
        assert!(dropped.iter().any(|w| w.contains("priority")));
        assert!(dropped.iter().any(|w| w.contains("object")));
    }

    #[test]
    fn test_status_round_trips_kebab_case() {
        let json = serde_json::to_string(&ActionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
