//! AI-assisted 8D problem-solving report core
//!
//! Implements the data and control layer of an 8D quality-management
//! assistant:
//! - Canonical nested report state (D0–D8) with guarded merges
//! - Action lists with pure due-date status derivation
//! - DeepSeek-backed drafting, extraction and evaluation
//! - Two-phase audit pipeline as an explicit state machine
//! - HTML and Word export, file-backed report persistence

pub mod audit;
pub mod error;
pub mod export;
pub mod gateway;
pub mod report;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use audit::{AuditPhase, AuditPipeline, AuditResult, Evaluation};
pub use error::{GatewayError, ReportError};
pub use gateway::{AiGateway, CompletionBackend, CompletionRequest, RootCauseDraft, AI_EVAL_SEP};
pub use report::{ActionRecord, ActionStatus, ReportState, SectionKey};
pub use session::ReportStore;
