//! Canonical report state for one 8D report
//!
//! All nine sections (d0..d8) exist from the moment the report is created;
//! consumers test for emptiness, never for key presence. The schema is fixed:
//! `set` and `merge_value` reject unknown sections outright, and field-level
//! mismatches inside a known section degrade to dropped-field warnings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::actions::ActionList;
use crate::utils::json_kind;
use crate::error::ReportError;

/// The fixed eight-discipline section keys (plus D0 preparation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
}

impl SectionKey {
    pub const ALL: [SectionKey; 9] = [
        SectionKey::D0,
        SectionKey::D1,
        SectionKey::D2,
        SectionKey::D3,
        SectionKey::D4,
        SectionKey::D5,
        SectionKey::D6,
        SectionKey::D7,
        SectionKey::D8,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::D0 => "d0",
            SectionKey::D1 => "d1",
            SectionKey::D2 => "d2",
            SectionKey::D3 => "d3",
            SectionKey::D4 => "d4",
            SectionKey::D5 => "d5",
            SectionKey::D6 => "d6",
            SectionKey::D7 => "d7",
            SectionKey::D8 => "d8",
        }
    }

    /// Human-readable section heading, used by exports and the CLI.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKey::D0 => "D0: Preparation",
            SectionKey::D1 => "D1: Team",
            SectionKey::D2 => "D2: Problem Description (5W2H)",
            SectionKey::D3 => "D3: Interim Containment Actions (ICA)",
            SectionKey::D4 => "D4: Root Cause Analysis",
            SectionKey::D5 => "D5: Permanent Corrective Actions (PCA)",
            SectionKey::D6 => "D6: Implementation & Verification",
            SectionKey::D7 => "D7: Prevention",
            SectionKey::D8 => "D8: Closure",
        }
    }
}

impl FromStr for SectionKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d0" => Ok(SectionKey::D0),
            "d1" => Ok(SectionKey::D1),
            "d2" => Ok(SectionKey::D2),
            "d3" => Ok(SectionKey::D3),
            "d4" => Ok(SectionKey::D4),
            "d5" => Ok(SectionKey::D5),
            "d6" => Ok(SectionKey::D6),
            "d7" => Ok(SectionKey::D7),
            "d8" => Ok(SectionKey::D8),
            _ => Err(ReportError::UnknownSection(s.to_string())),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// D0: report metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct D0Preparation {
    pub title: String,
    pub customer: String,
    pub scope: String,
}

/// D1: team formation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct D1Team {
    pub leader: String,
    pub members: String,
}

/// D2: quantified problem description (5W2H) plus a free-form narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct D2Problem {
    pub what: String,
    pub when: String,
    pub r#where: String,
    pub who: String,
    pub why: String,
    pub how: String,
    pub how_much: String,
    pub detail: String,
}

pub const FIVE_WHYS_DEPTH: usize = 5;

/// D4: root cause. Occurrence and escape causes are independent conclusions;
/// the five-whys worksheet is the path that led there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct D4RootCause {
    /// Always exactly [`FIVE_WHYS_DEPTH`] entries; deserialization pads or
    /// truncates so indexed access stays valid for loaded reports.
    #[serde(deserialize_with = "padded_five_whys")]
    pub five_whys: Vec<String>,
    pub occurrence_cause: String,
    pub escape_cause: String,
}

fn padded_five_whys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut whys = Vec::<String>::deserialize(deserializer)?;
    whys.resize(FIVE_WHYS_DEPTH, String::new());
    Ok(whys)
}

impl Default for D4RootCause {
    fn default() -> Self {
        Self {
            five_whys: vec![String::new(); FIVE_WHYS_DEPTH],
            occurrence_cause: String::new(),
            escape_cause: String::new(),
        }
    }
}

/// D6: implementation and verification of the corrective actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct D6Verification {
    pub verification: String,
}

/// D7: standardization work that prevents recurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct D7Prevention {
    pub fmea: bool,
    pub control_plan: bool,
    pub sop: bool,
    pub notes: String,
}

/// D8: closure and team recognition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct D8Closure {
    pub conclusion: String,
}

/// Outcome of a merge: which incoming fields were dropped (unknown name or
/// wrong type) instead of being applied. Dropping is a warning, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub dropped: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// The canonical nested state for one report in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportState {
    pub d0: D0Preparation,
    pub d1: D1Team,
    pub d2: D2Problem,
    pub d3: ActionList,
    pub d4: D4RootCause,
    pub d5: ActionList,
    pub d6: D6Verification,
    pub d7: D7Prevention,
    pub d8: D8Closure,
}

impl ReportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized view of one section.
    pub fn get(&self, section: SectionKey) -> Value {
        let value = match section {
            SectionKey::D0 => serde_json::to_value(&self.d0),
            SectionKey::D1 => serde_json::to_value(&self.d1),
            SectionKey::D2 => serde_json::to_value(&self.d2),
            SectionKey::D3 => serde_json::to_value(&self.d3),
            SectionKey::D4 => serde_json::to_value(&self.d4),
            SectionKey::D5 => serde_json::to_value(&self.d5),
            SectionKey::D6 => serde_json::to_value(&self.d6),
            SectionKey::D7 => serde_json::to_value(&self.d7),
            SectionKey::D8 => serde_json::to_value(&self.d8),
        };
        value.unwrap_or(Value::Null)
    }

    /// Sets a single scalar field. Unknown sections and unknown fields are
    /// rejected; the fixed schema is never extended implicitly.
    pub fn set(&mut self, section: SectionKey, field: &str, value: &str) -> Result<(), ReportError> {
        let unknown = |field: &str| {
            Err(ReportError::InputValidation(format!(
                "unknown field '{field}' in section {section}"
            )))
        };

        match section {
            SectionKey::D0 => match field {
                "title" => self.d0.title = value.to_string(),
                "customer" => self.d0.customer = value.to_string(),
                "scope" => self.d0.scope = value.to_string(),
                _ => return unknown(field),
            },
            SectionKey::D1 => match field {
                "leader" => self.d1.leader = value.to_string(),
                "members" => self.d1.members = value.to_string(),
                _ => return unknown(field),
            },
            SectionKey::D2 => match field {
                "what" => self.d2.what = value.to_string(),
                "when" => self.d2.when = value.to_string(),
                "where" => self.d2.r#where = value.to_string(),
                "who" => self.d2.who = value.to_string(),
                "why" => self.d2.why = value.to_string(),
                "how" => self.d2.how = value.to_string(),
                "howMuch" => self.d2.how_much = value.to_string(),
                "detail" => self.d2.detail = value.to_string(),
                _ => return unknown(field),
            },
            SectionKey::D3 | SectionKey::D5 => {
                return Err(ReportError::InputValidation(format!(
                    "section {section} holds action records; edit it through the action list"
                )))
            }
            SectionKey::D4 => match field {
                "occurrenceCause" => self.d4.occurrence_cause = value.to_string(),
                "escapeCause" => self.d4.escape_cause = value.to_string(),
                "why1" | "why2" | "why3" | "why4" | "why5" => {
                    // why1..why5 address the worksheet rows individually.
                    let index = field.as_bytes()[3] as usize - b'1' as usize;
                    self.d4.five_whys[index] = value.to_string();
                }
                _ => return unknown(field),
            },
            SectionKey::D6 => match field {
                "verification" => self.d6.verification = value.to_string(),
                _ => return unknown(field),
            },
            SectionKey::D7 => match field {
                "fmea" => self.d7.fmea = parse_flag(value)?,
                "controlPlan" => self.d7.control_plan = parse_flag(value)?,
                "sop" => self.d7.sop = parse_flag(value)?,
                "notes" => self.d7.notes = value.to_string(),
                _ => return unknown(field),
            },
            SectionKey::D8 => match field {
                "conclusion" => self.d8.conclusion = value.to_string(),
                _ => return unknown(field),
            },
        }
        Ok(())
    }

    /// Deep-merges an externally produced partial (typically an AI extraction)
    /// into this report.
    ///
    /// Last-known-good wins for empty incoming values: an empty or null field
    /// in the partial never erases non-empty existing text. Unknown top-level
    /// section keys reject the whole merge before anything is applied; unknown
    /// or wrongly-typed fields inside a known section are dropped and listed
    /// in the returned [`MergeReport`].
    pub fn merge_value(&mut self, partial: &Value) -> Result<MergeReport, ReportError> {
        let map = partial.as_object().ok_or_else(|| {
            ReportError::SchemaMismatch("partial report must be a JSON object".to_string())
        })?;

        // Validate every section key up front so a bad partial leaves the
        // report untouched.
        let mut sections = Vec::with_capacity(map.len());
        for (key, value) in map {
            sections.push((SectionKey::from_str(key)?, value));
        }

        let mut report = MergeReport::default();
        for (section, value) in sections {
            self.merge_section(section, value, &mut report.dropped);
        }
        if !report.is_clean() {
            warn!(dropped = report.dropped.len(), "merge dropped unmatched fields");
        }
        Ok(report)
    }

    fn merge_section(&mut self, section: SectionKey, value: &Value, dropped: &mut Vec<String>) {
        match section {
            SectionKey::D3 | SectionKey::D5 => {
                let path = section.as_str();
                if let Some(list) = ActionList::from_value_lenient(value, path, dropped) {
                    // An empty incoming list never clears existing actions.
                    if !list.is_empty() {
                        match section {
                            SectionKey::D3 => self.d3 = list,
                            _ => self.d5 = list,
                        }
                    }
                }
            }
            _ => {
                let Some(map) = value.as_object() else {
                    if !value.is_null() {
                        dropped.push(format!(
                            "{section}: expected object, got {}",
                            json_kind(value)
                        ));
                    }
                    return;
                };
                for (field, incoming) in map {
                    self.merge_field(section, field, incoming, dropped);
                }
            }
        }
    }

    fn merge_field(
        &mut self,
        section: SectionKey,
        field: &str,
        incoming: &Value,
        dropped: &mut Vec<String>,
    ) {
        let target: Option<&mut String> = match (section, field) {
            (SectionKey::D0, "title") => Some(&mut self.d0.title),
            (SectionKey::D0, "customer") => Some(&mut self.d0.customer),
            (SectionKey::D0, "scope") => Some(&mut self.d0.scope),
            (SectionKey::D1, "leader") => Some(&mut self.d1.leader),
            (SectionKey::D1, "members") => Some(&mut self.d1.members),
            (SectionKey::D2, "what") => Some(&mut self.d2.what),
            (SectionKey::D2, "when") => Some(&mut self.d2.when),
            (SectionKey::D2, "where") => Some(&mut self.d2.r#where),
            (SectionKey::D2, "who") => Some(&mut self.d2.who),
            (SectionKey::D2, "why") => Some(&mut self.d2.why),
            (SectionKey::D2, "how") => Some(&mut self.d2.how),
            (SectionKey::D2, "howMuch") => Some(&mut self.d2.how_much),
            (SectionKey::D2, "detail") => Some(&mut self.d2.detail),
            (SectionKey::D4, "occurrenceCause") => Some(&mut self.d4.occurrence_cause),
            (SectionKey::D4, "escapeCause") => Some(&mut self.d4.escape_cause),
            (SectionKey::D6, "verification") => Some(&mut self.d6.verification),
            (SectionKey::D7, "notes") => Some(&mut self.d7.notes),
            (SectionKey::D8, "conclusion") => Some(&mut self.d8.conclusion),
            _ => None,
        };

        if let Some(target) = target {
            merge_string(target, incoming, &format!("{section}.{field}"), dropped);
            return;
        }

        // Non-string fields.
        match (section, field) {
            (SectionKey::D4, "fiveWhys") => {
                self.merge_five_whys(incoming, dropped);
            }
            (SectionKey::D7, "fmea") => merge_flag(&mut self.d7.fmea, incoming, "d7.fmea", dropped),
            (SectionKey::D7, "controlPlan") => {
                merge_flag(&mut self.d7.control_plan, incoming, "d7.controlPlan", dropped)
            }
            (SectionKey::D7, "sop") => merge_flag(&mut self.d7.sop, incoming, "d7.sop", dropped),
            _ => dropped.push(format!("{section}.{field}: unknown field")),
        }
    }

    fn merge_five_whys(&mut self, incoming: &Value, dropped: &mut Vec<String>) {
        let Some(items) = incoming.as_array() else {
            if !incoming.is_null() {
                dropped.push(format!(
                    "d4.fiveWhys: expected array, got {}",
                    json_kind(incoming)
                ));
            }
            return;
        };
        for (i, item) in items.iter().take(FIVE_WHYS_DEPTH).enumerate() {
            match item {
                Value::String(s) if !s.trim().is_empty() => {
                    self.d4.five_whys[i] = s.trim().to_string();
                }
                Value::String(_) | Value::Null => {}
                other => dropped.push(format!(
                    "d4.fiveWhys[{i}]: expected string, got {}",
                    json_kind(other)
                )),
            }
        }
        if items.len() > FIVE_WHYS_DEPTH {
            dropped.push(format!(
                "d4.fiveWhys: {} extra entries ignored",
                items.len() - FIVE_WHYS_DEPTH
            ));
        }
    }
}

fn merge_string(target: &mut String, incoming: &Value, path: &str, dropped: &mut Vec<String>) {
    match incoming {
        Value::Null => {}
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                *target = trimmed.to_string();
            }
        }
        other => dropped.push(format!("{path}: expected string, got {}", json_kind(other))),
    }
}

fn merge_flag(target: &mut bool, incoming: &Value, path: &str, dropped: &mut Vec<String>) {
    match incoming {
        Value::Null => {}
        Value::Bool(b) => *target = *b,
        other => dropped.push(format!("{path}: expected bool, got {}", json_kind(other))),
    }
}

fn parse_flag(value: &str) -> Result<bool, ReportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "x" | "done" => Ok(true),
        "false" | "no" | "0" | "" => Ok(false),
        other => Err(ReportError::InputValidation(format!(
            "'{other}' is not a yes/no value"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_sections_present_when_empty() {
        let state = ReportState::new();
        let value = serde_json::to_value(&state).unwrap();
        for key in SectionKey::ALL {
            assert!(value.get(key.as_str()).is_some(), "missing {key}");
        }
        assert_eq!(state.d4.five_whys.len(), FIVE_WHYS_DEPTH);
    }

    #[test]
    fn test_merge_never_erases_with_empty() {
        let mut state = ReportState::new();
        state
            .merge_value(&json!({"d1": {"leader": "X"}}))
            .unwrap();
        assert_eq!(state.d1.leader, "X");

        let report = state
            .merge_value(&json!({"d1": {"leader": ""}}))
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(state.d1.leader, "X");

        state.merge_value(&json!({"d1": {"leader": null}})).unwrap();
        assert_eq!(state.d1.leader, "X");

        // Non-empty incoming text does overwrite.
        state
            .merge_value(&json!({"d1": {"leader": "Y"}}))
            .unwrap();
        assert_eq!(state.d1.leader, "Y");
    }

    #[test]
    fn test_merge_rejects_unknown_section_untouched() {
        let mut state = ReportState::new();
        state.set(SectionKey::D0, "title", "Leaky seal").unwrap();
        let before = state.clone();

        let err = state
            .merge_value(&json!({"d9": {"x": "y"}, "d0": {"title": "changed"}}))
            .unwrap_err();
        assert!(matches!(err, ReportError::UnknownSection(s) if s == "d9"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_merge_drops_unknown_fields_with_warning() {
        let mut state = ReportState::new();
        let report = state
            .merge_value(&json!({"d2": {"what": "crack", "severity": "high", "when": 3}}))
            .unwrap();
        assert_eq!(state.d2.what, "crack");
        assert_eq!(state.d2.when, "");
        assert!(report.dropped.iter().any(|w| w.contains("d2.severity")));
        assert!(report.dropped.iter().any(|w| w.contains("d2.when")));
    }

    #[test]
    fn test_merge_action_lists() {
        let mut state = ReportState::new();
        state
            .merge_value(&json!({"d3": [{"action": "Hold shipment", "status": "open"}]}))
            .unwrap();
        assert_eq!(state.d3.len(), 1);

        // Empty incoming list keeps the existing actions.
        state.merge_value(&json!({"d3": []})).unwrap();
        assert_eq!(state.d3.len(), 1);

        // A non-empty list replaces wholesale.
        state
            .merge_value(&json!({"d5": [
                {"action": "New fixture", "owner": "Eng", "dueDate": "2025-09-01"},
                {"action": "Update torque spec", "status": "Completed"}
            ]}))
            .unwrap();
        assert_eq!(state.d5.len(), 2);
        assert_eq!(state.d5.0[1].status, crate::report::ActionStatus::Done);
    }

    #[test]
    fn test_merge_five_whys_positional() {
        let mut state = ReportState::new();
        state.d4.five_whys[1] = "operator skipped check".into();
        state
            .merge_value(&json!({"d4": {"fiveWhys": ["seal worn", "", "no PM schedule"]}}))
            .unwrap();
        assert_eq!(state.d4.five_whys[0], "seal worn");
        // Empty incoming entry left the existing answer alone.
        assert_eq!(state.d4.five_whys[1], "operator skipped check");
        assert_eq!(state.d4.five_whys[2], "no PM schedule");
    }

    #[test]
    fn test_set_rejects_unknown_section_and_field() {
        let mut state = ReportState::new();
        assert!(matches!(
            "d9".parse::<SectionKey>(),
            Err(ReportError::UnknownSection(_))
        ));
        let err = state.set(SectionKey::D0, "priority", "high").unwrap_err();
        assert!(matches!(err, ReportError::InputValidation(_)));
        assert_eq!(state, ReportState::new());
    }

    #[test]
    fn test_loaded_five_whys_normalized_to_depth() {
        // Stored reports may carry a short or long worksheet; both must load
        // to exactly FIVE_WHYS_DEPTH entries so field edits stay in bounds.
        let json = r#"{"d4": {"fiveWhys": ["seal worn", "no PM"], "occurrenceCause": "", "escapeCause": ""}}"#;
        let mut state: ReportState = serde_json::from_str(json).unwrap();
        assert_eq!(state.d4.five_whys.len(), FIVE_WHYS_DEPTH);
        assert_eq!(state.d4.five_whys[0], "seal worn");

        state.set(SectionKey::D4, "why5", "no audit step").unwrap();
        assert_eq!(state.d4.five_whys[4], "no audit step");
        state
            .merge_value(&json!({"d4": {"fiveWhys": ["a", "b", "c", "d", "e"]}}))
            .unwrap();
        assert_eq!(state.d4.five_whys[4], "e");

        let long = r#"{"d4": {"fiveWhys": ["1", "2", "3", "4", "5", "6", "7"]}}"#;
        let state: ReportState = serde_json::from_str(long).unwrap();
        assert_eq!(state.d4.five_whys.len(), FIVE_WHYS_DEPTH);
    }

    #[test]
    fn test_set_and_get_round_trip() {
        let mut state = ReportState::new();
        state.set(SectionKey::D2, "howMuch", "300 units").unwrap();
        state.set(SectionKey::D7, "fmea", "yes").unwrap();
        state.set(SectionKey::D4, "why2", "no incoming inspection").unwrap();
        let d2 = state.get(SectionKey::D2);
        assert_eq!(d2["howMuch"], "300 units");
        assert!(state.d7.fmea);
        assert_eq!(state.d4.five_whys[1], "no incoming inspection");
    }
}
