//! Parsing of completion responses
//!
//! Two response modes: single-object (one JSON object) and dual-part (a JSON
//! segment and a free-text narrative separated by the literal
//! `***AI_EVAL_SEP***` marker). The marker is contract-critical: it must be
//! split on its first occurrence, and its absence in dual-part mode is an
//! explicit parse failure with the raw text retained for manual recovery.

use serde_json::Value;

use crate::error::ReportError;

/// Fixed delimiter between the structured and narrative halves of a dual-part
/// response. Must appear verbatim; translation prompts instruct the model to
/// carry it through untouched.
pub const AI_EVAL_SEP: &str = "***AI_EVAL_SEP***";

/// A completion response after structural validation.
#[derive(Debug, Clone, PartialEq)]
pub enum AiResponse {
    /// One JSON object matching a target schema (extraction, drafting).
    Structured(Value),
    /// Evaluation object plus opaque narrative text (evaluation mode).
    DualPart { structured: Value, narrative: String },
    /// Anything that failed structural parsing. The raw text is unmodified.
    Malformed { raw: String, reason: String },
}

/// Parses a single-object response. Tolerates a markdown code fence around
/// the JSON, nothing more.
pub fn parse_single(raw: &str) -> AiResponse {
    let body = strip_code_fences(raw);
    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => AiResponse::Structured(value),
        Ok(other) => AiResponse::Malformed {
            raw: raw.to_string(),
            reason: format!(
                "expected a JSON object, got {}",
                crate::utils::json_kind(&other)
            ),
        },
        Err(err) => AiResponse::Malformed {
            raw: raw.to_string(),
            reason: format!("not valid JSON: {err}"),
        },
    }
}

/// Parses a dual-part response: JSON before the first `***AI_EVAL_SEP***`,
/// opaque narrative after it (preserved verbatim).
pub fn parse_dual(raw: &str) -> AiResponse {
    let Some((head, tail)) = raw.split_once(AI_EVAL_SEP) else {
        return AiResponse::Malformed {
            raw: raw.to_string(),
            reason: format!("dual-part response is missing the '{AI_EVAL_SEP}' marker"),
        };
    };

    match serde_json::from_str::<Value>(strip_code_fences(head)) {
        Ok(structured @ Value::Object(_)) => AiResponse::DualPart {
            structured,
            // The narrative is opaque text; it passes through untouched.
            narrative: tail.to_string(),
        },
        Ok(_) => AiResponse::Malformed {
            raw: raw.to_string(),
            reason: "structured part before the marker is not a JSON object".to_string(),
        },
        Err(err) => AiResponse::Malformed {
            raw: raw.to_string(),
            reason: format!("structured part is not valid JSON: {err}"),
        },
    }
}

/// Converts a structural parse into the single-object result.
pub fn expect_structured(response: AiResponse) -> Result<Value, ReportError> {
    match response {
        AiResponse::Structured(value) => Ok(value),
        AiResponse::DualPart { structured, .. } => Ok(structured),
        AiResponse::Malformed { raw, reason } => Err(ReportError::Parse { reason, raw }),
    }
}

/// Converts a structural parse into the dual-part result.
pub fn expect_dual(response: AiResponse) -> Result<(Value, String), ReportError> {
    match response {
        AiResponse::DualPart {
            structured,
            narrative,
        } => Ok((structured, narrative)),
        AiResponse::Structured(_) => Err(ReportError::Parse {
            reason: "expected a dual-part response but got a bare JSON object".to_string(),
            raw: String::new(),
        }),
        AiResponse::Malformed { raw, reason } => Err(ReportError::Parse { reason, raw }),
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence line (which may carry a language tag) and the closing fence.
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.trim().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dual_part_splits_on_first_marker() {
        let raw = "{\"score\":5}***AI_EVAL_SEP***Great job";
        match parse_dual(raw) {
            AiResponse::DualPart {
                structured,
                narrative,
            } => {
                assert_eq!(structured, json!({"score": 5}));
                assert_eq!(narrative, "Great job");
            }
            other => panic!("expected dual part, got {other:?}"),
        }

        // A marker inside the narrative belongs to the narrative.
        let raw = "{\"a\":1}***AI_EVAL_SEP***before ***AI_EVAL_SEP*** after";
        match parse_dual(raw) {
            AiResponse::DualPart { narrative, .. } => {
                assert_eq!(narrative, "before ***AI_EVAL_SEP*** after");
            }
            other => panic!("expected dual part, got {other:?}"),
        }
    }

    #[test]
    fn test_narrative_survives_verbatim() {
        let raw = "{\"a\":1}***AI_EVAL_SEP***\n  ## Indented heading\ntrailing line\n";
        match parse_dual(raw) {
            AiResponse::DualPart { narrative, .. } => {
                assert_eq!(narrative, "\n  ## Indented heading\ntrailing line\n");
            }
            other => panic!("expected dual part, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_marker_fails_with_raw_retained() {
        let raw = "{\"score\":5} and some commentary";
        match parse_dual(raw) {
            AiResponse::Malformed { raw: kept, reason } => {
                assert_eq!(kept, raw);
                assert!(reason.contains(AI_EVAL_SEP));
            }
            other => panic!("expected malformed, got {other:?}"),
        }
        let err = expect_dual(parse_dual(raw)).unwrap_err();
        match err {
            ReportError::Parse { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_object_with_code_fence() {
        let raw = "```json\n{\"fiveWhys\": []}\n```";
        match parse_single(raw) {
            AiResponse::Structured(value) => assert!(value.get("fiveWhys").is_some()),
            other => panic!("expected structured, got {other:?}"),
        }
    }

    #[test]
    fn test_single_rejects_non_object() {
        match parse_single("[1, 2, 3]") {
            AiResponse::Malformed { reason, .. } => assert!(reason.contains("array")),
            other => panic!("expected malformed, got {other:?}"),
        }
        match parse_single("sorry, I can't") {
            AiResponse::Malformed { raw, .. } => assert_eq!(raw, "sorry, I can't"),
            other => panic!("expected malformed, got {other:?}"),
        }
    }
}
