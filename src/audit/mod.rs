//! Audit pipeline
//!
//! Two-phase analysis of an externally supplied report: extraction of the
//! structured d0..d8 shape, then evaluation of that shape against quality
//! criteria. The pipeline is an explicit state machine
//! (`Idle → Extracting → Evaluating → Done`, with `Failed` absorbing either
//! phase), so callers render strictly from the current phase instead of
//! juggling booleans. There is no auto-retry: recovering from `Failed` or
//! re-running after `Done` is an explicit [`AuditPipeline::reset`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::gateway::{AiGateway, AI_EVAL_SEP};
use crate::report::{ReportState, SectionKey};

/// Where the pipeline currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditPhase {
    #[default]
    Idle,
    Extracting,
    Evaluating,
    Done,
    Failed,
}

/// Score and commentary for one D-section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionScore {
    pub score: u8,
    pub comment: String,
    pub suggestion: String,
}

/// Per-section evaluation produced by the audit's second phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub sections: BTreeMap<String, SectionScore>,
    /// Sections the model failed to score (present with default values).
    pub unscored: Vec<String>,
}

impl Evaluation {
    /// Lenient construction from the structured half of a dual-part response.
    /// Accepts either `{"sections": {...}}` or the section map at top level;
    /// every d0..d8 entry is guaranteed present afterwards.
    pub fn from_value(value: &Value) -> Self {
        let map = value
            .get("sections")
            .and_then(Value::as_object)
            .or_else(|| value.as_object());

        let mut evaluation = Evaluation::default();
        for key in SectionKey::ALL {
            let entry = map
                .and_then(|m| m.get(key.as_str()))
                .cloned()
                .and_then(|v| serde_json::from_value::<SectionScore>(v).ok());
            match entry {
                Some(score) => {
                    evaluation.sections.insert(key.as_str().to_string(), score);
                }
                None => {
                    warn!(section = %key, "evaluation did not score this section");
                    evaluation.unscored.push(key.as_str().to_string());
                    evaluation
                        .sections
                        .insert(key.as_str().to_string(), SectionScore::default());
                }
            }
        }
        evaluation
    }

    pub fn score_for(&self, section: SectionKey) -> Option<&SectionScore> {
        self.sections.get(section.as_str())
    }
}

/// Immutable outcome of a completed audit. The audited report is never the
/// user's own in-progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub extracted: ReportState,
    /// Extraction fields that were dropped for not matching the schema.
    pub dropped_fields: Vec<String>,
    pub evaluation: Evaluation,
    /// Free-text audit narrative (the remainder after the dual-part marker);
    /// also the piece that gets translated.
    pub narrative: String,
}

impl AuditResult {
    /// Markdown digest of the extracted core, used as the structured half of
    /// a translation request.
    pub fn summary_markdown(&self) -> String {
        let d = &self.extracted;
        let mut out = String::new();
        out.push_str("# Structured 8D Report: Core Content\n");
        out.push_str(&format!(
            "## D1/D2: {} | {}\n",
            placeholder(&d.d1.leader),
            placeholder(&d.d2.what)
        ));
        out.push_str(&format!(
            "## D4 Root Cause: occurrence: {} | escape: {}\n",
            placeholder(&d.d4.occurrence_cause),
            placeholder(&d.d4.escape_cause)
        ));
        out.push_str(&format!("## D8 Conclusion: {}\n", placeholder(&d.d8.conclusion)));
        out
    }

    /// Translates the audit into `target_lang`, re-splitting on the marker.
    /// When the model drops the marker the two halves come back merged; that
    /// degradation is reported, not hidden.
    pub async fn translate(
        &self,
        gateway: &AiGateway,
        target_lang: &str,
    ) -> Result<TranslatedAudit, ReportError> {
        let combined = format!(
            "{}\n\n{}\n\n{}",
            self.summary_markdown(),
            AI_EVAL_SEP,
            self.narrative
        );
        let translated = gateway.translate(&combined, target_lang).await?;

        match translated.split_once(AI_EVAL_SEP) {
            Some((data, eval)) => Ok(TranslatedAudit {
                structured: Some(data.trim().to_string()),
                narrative: eval.trim().to_string(),
            }),
            None => {
                warn!("translation did not preserve the separator; parts are merged");
                Ok(TranslatedAudit {
                    structured: None,
                    narrative: translated,
                })
            }
        }
    }
}

/// Translated audit text. `structured` is `None` when the translation model
/// dropped the separator and the halves could not be re-split.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedAudit {
    pub structured: Option<String>,
    pub narrative: String,
}

fn placeholder(s: &str) -> &str {
    if s.trim().is_empty() {
        "N/A"
    } else {
        s
    }
}

/// The audit state machine. One instance per audited document.
#[derive(Debug, Default)]
pub struct AuditPipeline {
    phase: AuditPhase,
    result: Option<AuditResult>,
    error: Option<String>,
}

impl AuditPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> AuditPhase {
        self.phase
    }

    /// The completed audit, if the pipeline reached `Done`.
    pub fn result(&self) -> Option<&AuditResult> {
        self.result.as_ref()
    }

    /// The failure message carried by the `Failed` state.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Explicit re-entry to `Idle`, discarding any previous outcome.
    pub fn reset(&mut self) {
        self.phase = AuditPhase::Idle;
        self.result = None;
        self.error = None;
    }

    /// Runs both phases against the supplied raw report text.
    ///
    /// Only valid from `Idle`; empty input is rejected before any phase
    /// transition. A gateway or parse failure in either phase moves the
    /// pipeline to `Failed` with the error retained for display.
    pub async fn run(&mut self, gateway: &AiGateway, raw_text: &str) -> Result<(), ReportError> {
        if self.phase != AuditPhase::Idle {
            return Err(ReportError::InputValidation(format!(
                "audit pipeline is {:?}; call reset() before running again",
                self.phase
            )));
        }
        if raw_text.trim().is_empty() {
            return Err(ReportError::InputValidation(
                "no report text to audit".to_string(),
            ));
        }

        self.phase = AuditPhase::Extracting;
        let (extracted, merge) = match gateway.extract_report(raw_text).await {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail(err)),
        };
        info!(dropped = merge.dropped.len(), "extraction complete");

        self.phase = AuditPhase::Evaluating;
        let (eval_value, narrative) = match gateway.evaluate_report(&extracted).await {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail(err)),
        };

        self.result = Some(AuditResult {
            extracted,
            dropped_fields: merge.dropped,
            evaluation: Evaluation::from_value(&eval_value),
            narrative,
        });
        self.phase = AuditPhase::Done;
        info!("audit complete");
        Ok(())
    }

    fn fail(&mut self, err: ReportError) -> ReportError {
        warn!(phase = ?self.phase, error = %err, "audit failed");
        self.phase = AuditPhase::Failed;
        self.error = Some(err.to_string());
        self.result = None;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluation_from_nested_sections() {
        let value = json!({"sections": {
            "d2": {"score": 4, "comment": "quantified", "suggestion": "add photos"},
            "d5": {"score": 2, "comment": "actions vague", "suggestion": "tie to D4"}
        }});
        let evaluation = Evaluation::from_value(&value);
        assert_eq!(evaluation.sections.len(), SectionKey::ALL.len());
        assert_eq!(evaluation.score_for(SectionKey::D2).map(|s| s.score), Some(4));
        // Unscored sections are present with defaults and flagged.
        assert_eq!(evaluation.score_for(SectionKey::D0).map(|s| s.score), Some(0));
        assert!(evaluation.unscored.contains(&"d0".to_string()));
        assert!(!evaluation.unscored.contains(&"d2".to_string()));
    }

    #[test]
    fn test_evaluation_from_flat_map() {
        let value = json!({"d1": {"score": 5, "comment": "ok", "suggestion": ""}});
        let evaluation = Evaluation::from_value(&value);
        assert_eq!(evaluation.score_for(SectionKey::D1).map(|s| s.score), Some(5));
    }

    #[test]
    fn test_summary_markdown_uses_placeholders() {
        let result = AuditResult {
            extracted: ReportState::new(),
            dropped_fields: Vec::new(),
            evaluation: Evaluation::default(),
            narrative: String::new(),
        };
        let summary = result.summary_markdown();
        assert!(summary.contains("N/A"));
        assert!(summary.contains("D4 Root Cause"));
    }
}
