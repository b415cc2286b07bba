//! AI gateway
//!
//! Builds prompts, submits them to the completion backend at low temperature,
//! and validates the structured responses. Calls are serialized per gateway:
//! a second call while one is outstanding fails fast with
//! [`GatewayError::AlreadyInFlight`] instead of racing the first.

pub mod prompts;
pub mod provider;
pub mod response;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, ReportError};
use crate::report::{D2Problem, MergeReport, ReportState, SectionKey};
use crate::utils::ellipsize;

pub use provider::{CompletionBackend, CompletionRequest, DeepSeekBackend, GatewayConfig};
pub use response::{AiResponse, AI_EVAL_SEP};

/// AI-drafted root cause analysis for D4.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RootCauseDraft {
    pub five_whys: Vec<String>,
    pub occurrence_cause: String,
    pub escape_cause: String,
}

impl RootCauseDraft {
    /// Shapes the draft as a `d4` partial suitable for [`ReportState::merge_value`],
    /// so adopting a draft follows the same last-known-good merge rules as any
    /// other external input.
    pub fn into_patch(self) -> Value {
        json!({
            "d4": {
                "fiveWhys": self.five_whys,
                "occurrenceCause": self.occurrence_cause,
                "escapeCause": self.escape_cause,
            }
        })
    }
}

/// Gateway to the external completion service.
pub struct AiGateway {
    backend: Arc<dyn CompletionBackend>,
    in_flight: Mutex<()>,
}

impl AiGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(()),
        }
    }

    /// DeepSeek-backed gateway configured from the environment.
    pub fn from_env() -> Result<Self, GatewayError> {
        let config = GatewayConfig::from_env()?;
        Ok(Self::new(Arc::new(DeepSeekBackend::new(config)?)))
    }

    async fn complete_guarded(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| GatewayError::AlreadyInFlight)?;
        let raw = self.backend.complete(request).await?;
        debug!(preview = %ellipsize(&raw, 200), "raw completion");
        Ok(raw)
    }

    /// Extraction (single-object mode): unstructured report text to a
    /// `ReportState` plus the list of fields the extraction got wrong.
    pub async fn extract_report(
        &self,
        raw_text: &str,
    ) -> Result<(ReportState, MergeReport), ReportError> {
        if raw_text.trim().is_empty() {
            return Err(ReportError::InputValidation(
                "report text is empty; paste or upload the report first".to_string(),
            ));
        }

        info!(bytes = raw_text.len(), "extracting structured report");
        let request = CompletionRequest::new(prompts::extraction_prompt(raw_text))
            .with_temperature(0.1)
            .expect_json();
        let raw = self.complete_guarded(&request).await?;
        let value = response::expect_structured(response::parse_single(&raw))?;

        // AI output degrades on unknown sections instead of rejecting: stray
        // top-level keys are dropped here so the strict merge cannot fail.
        let mut dropped = Vec::new();
        let value = retain_known_sections(value, &mut dropped);

        let mut extracted = ReportState::new();
        let mut merge = extracted.merge_value(&value)?;
        merge.dropped.extend(dropped);
        if !merge.is_clean() {
            warn!(dropped = ?merge.dropped, "extraction produced unmatched fields");
        }
        Ok((extracted, merge))
    }

    /// Evaluation (dual-part mode): per-section score object plus the audit
    /// narrative, split on the first `***AI_EVAL_SEP***`.
    pub async fn evaluate_report(
        &self,
        extracted: &ReportState,
    ) -> Result<(Value, String), ReportError> {
        let extracted_json = serde_json::to_string_pretty(extracted)
            .map_err(|e| ReportError::SchemaMismatch(e.to_string()))?;

        info!("evaluating extracted report");
        let request =
            CompletionRequest::new(prompts::evaluation_prompt(&extracted_json)).with_temperature(0.3);
        let raw = self.complete_guarded(&request).await?;
        response::expect_dual(response::parse_dual(&raw))
    }

    /// Drafts a D4 root-cause analysis from the D2 problem description.
    pub async fn draft_root_cause(&self, d2: &D2Problem) -> Result<RootCauseDraft, ReportError> {
        if d2.what.trim().is_empty() {
            return Err(ReportError::InputValidation(
                "fill in the D2 problem description (what) before asking for analysis".to_string(),
            ));
        }

        info!("drafting root cause analysis");
        let request = CompletionRequest::new(prompts::root_cause_prompt(d2))
            .with_temperature(0.2)
            .expect_json();
        let raw = self.complete_guarded(&request).await?;
        let value = response::expect_structured(response::parse_single(&raw))?;
        serde_json::from_value(value).map_err(|e| ReportError::Parse {
            reason: format!("root cause draft did not match the expected shape: {e}"),
            raw,
        })
    }

    /// Translates report content. The `***AI_EVAL_SEP***` marker, when
    /// present, is instructed to survive verbatim so callers can re-split.
    pub async fn translate(&self, content: &str, target_lang: &str) -> Result<String, ReportError> {
        if content.trim().is_empty() {
            return Err(ReportError::InputValidation(
                "nothing to translate".to_string(),
            ));
        }

        info!(lang = target_lang, "translating report content");
        let request = CompletionRequest::new(prompts::translation_prompt(content, target_lang))
            .with_temperature(0.2);
        Ok(self.complete_guarded(&request).await?)
    }
}

/// Keeps only d0..d8 keys of an extracted object, noting everything else.
fn retain_known_sections(value: Value, dropped: &mut Vec<String>) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let mut kept = Map::new();
    for (key, section) in map {
        if key.parse::<SectionKey>().is_ok() {
            kept.insert(key.to_ascii_lowercase(), section);
        } else {
            dropped.push(format!("{key}: unknown section"));
        }
    }
    Value::Object(kept)
}
