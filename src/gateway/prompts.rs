//! Prompt construction
//!
//! Every prompt embeds the target field names and an example JSON shape so the
//! model adheres to the fixed d0..d8 schema instead of inventing keys.

use crate::report::D2Problem;

use super::response::AI_EVAL_SEP;

/// Example JSON shape shared by extraction and the schema reminders.
pub(crate) const REPORT_SCHEMA_EXAMPLE: &str = r#"{
  "d0": {"title": "", "customer": "", "scope": ""},
  "d1": {"leader": "", "members": ""},
  "d2": {"what": "", "when": "", "where": "", "who": "", "why": "", "how": "", "howMuch": "", "detail": ""},
  "d3": [{"action": "", "owner": "", "dueDate": "YYYY-MM-DD", "status": "open"}],
  "d4": {"fiveWhys": ["", "", "", "", ""], "occurrenceCause": "", "escapeCause": ""},
  "d5": [{"action": "", "owner": "", "dueDate": "YYYY-MM-DD", "status": "open"}],
  "d6": {"verification": ""},
  "d7": {"fmea": false, "controlPlan": false, "sop": false, "notes": ""},
  "d8": {"conclusion": ""}
}"#;

/// Extraction prompt: unstructured report text to the structured d0..d8 shape.
pub fn extraction_prompt(report_text: &str) -> String {
    format!(
        "You are a precise 8D report information extractor. Read the report \
         text below and extract the key data for disciplines D0 through D8.\n\
         \n\
         Rules:\n\
         1. Decompose the D2 problem description into the 5W2H structure \
            (what / when / where / who / why / how / howMuch), putting any \
            remaining narrative into \"detail\".\n\
         2. For every D3 and D5 action item, extract \"action\", \"owner\", \
            \"dueDate\" (format YYYY-MM-DD) and \"status\" (one of: open, \
            in-progress, done, overdue). Use an empty string or null when the \
            report does not say.\n\
         3. For D4, extract both the occurrence root cause (why it happened) \
            and the escape root cause (why it was not caught), plus up to \
            five \"why\" steps if the report lists them.\n\
         4. Output ONLY a valid JSON object with exactly this shape and no \
            other keys:\n\
         {schema}\n\
         5. Use an empty string for anything the report does not state. Never \
            invent facts.\n\
         \n\
         Report text:\n{report_text}",
        schema = REPORT_SCHEMA_EXAMPLE,
        report_text = report_text,
    )
}

/// Evaluation prompt: dual-part audit of an already-extracted report.
/// Structured per-section scores first, then the marker, then the narrative.
pub fn evaluation_prompt(extracted_json: &str) -> String {
    format!(
        "You are a professional 8D process auditor. Evaluate the completeness \
         and logical soundness of the extracted 8D report below, section by \
         section.\n\
         \n\
         Pay particular attention to:\n\
         - D2: are all 5W2H elements present and quantified?\n\
         - D3: would the containment actions actually isolate all suspect \
           material?\n\
         - D4: does the root cause separate occurrence from escape, and does \
           it reach a systemic level?\n\
         - D5/D6: this is the most important check. Does every permanent \
           action directly and completely address a root cause from D4, and \
           do action items carry owners, due dates and verification data?\n\
         - D7: are FMEA / control plan / SOP updates explicitly mentioned?\n\
         - D8: was the report closed properly, with team recognition?\n\
         \n\
         Respond in EXACTLY two parts separated by the literal marker line \
         {sep} (verbatim, exactly once):\n\
         \n\
         Part 1 (before the marker): a JSON object of this shape, scoring \
         every section from 1 (missing) to 5 (exemplary):\n\
         {{\"sections\": {{\"d0\": {{\"score\": 3, \"comment\": \"\", \
         \"suggestion\": \"\"}}, \"d1\": ..., \"d8\": ...}}}}\n\
         \n\
         Part 2 (after the marker): a concise Markdown narrative of the audit \
         with concrete improvement advice per stage.\n\
         \n\
         Extracted report data:\n{extracted}",
        sep = AI_EVAL_SEP,
        extracted = extracted_json,
    )
}

/// Root-cause drafting prompt seeded from the D2 problem description.
pub fn root_cause_prompt(d2: &D2Problem) -> String {
    format!(
        "You are a quality management expert. Analyse this problem:\n\
         \"Problem: {what}. Details: {detail}\"\n\
         \n\
         Output ONLY a JSON object with three fields:\n\
         1. \"fiveWhys\": a list of exactly 5 strings walking the five-whys \
            path from symptom to systemic cause.\n\
         2. \"occurrenceCause\": one sentence naming why the problem occurred.\n\
         3. \"escapeCause\": one sentence naming why it escaped detection.\n\
         Do not output any markdown markup around the JSON.",
        what = d2.what,
        detail = d2.detail,
    )
}

/// Translation prompt. The marker must survive translation untouched so the
/// caller can re-split the result.
pub fn translation_prompt(content: &str, target_lang: &str) -> String {
    format!(
        "You are a professional quality-management translator. Translate the \
         core content of the following 8D report accurately into {lang}.\n\
         Preserve the existing Markdown, list and paragraph formatting.\n\
         \n\
         You MUST keep the separator `{sep}` in the text verbatim. Do not \
         translate, move or remove it.\n\
         \n\
         Return only the translated text, with no explanations or extra \
         markup.\n\
         \n\
         Content:\n{content}",
        lang = target_lang,
        sep = AI_EVAL_SEP,
        content = content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_schema_and_text() {
        let prompt = extraction_prompt("Customer found rust on bracket.");
        for key in ["\"d0\"", "\"d4\"", "\"howMuch\"", "\"occurrenceCause\"", "\"dueDate\""] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.contains("Customer found rust on bracket."));
    }

    #[test]
    fn test_evaluation_prompt_demands_the_marker() {
        let prompt = evaluation_prompt("{}");
        assert!(prompt.contains(AI_EVAL_SEP));
        assert!(prompt.contains("\"score\""));
    }

    #[test]
    fn test_translation_prompt_preserves_marker_instruction() {
        let prompt = translation_prompt("body", "Japanese");
        assert!(prompt.contains(AI_EVAL_SEP));
        assert!(prompt.contains("Japanese"));
    }
}
