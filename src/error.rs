//! Error taxonomy for report operations
//!
//! Every failure here is scoped to the operation that triggered it: nothing is
//! fatal to the process, and the in-memory report survives all of them.

use thiserror::Error;

/// Errors raised by the completion backend (network boundary).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, TLS or timeout failure. Recoverable: the user may retry.
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("completion API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response that carried no usable message content.
    #[error("completion API returned no message content")]
    EmptyCompletion,

    /// Another AI call is still outstanding for this gateway. Calls are
    /// serialized per session; the caller must wait for the first to finish.
    #[error("an AI call is already in flight for this session")]
    AlreadyInFlight,

    #[error("no API key configured (set DEEPSEEK_API_KEY)")]
    MissingApiKey,
}

/// Top-level error type for the 8D report core.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required field is missing or an argument is unusable. Blocks the
    /// operation before any network call is made.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// A section key outside the fixed d0..d8 schema.
    #[error("unknown report section '{0}' (expected d0..d8)")]
    UnknownSection(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The AI response was not parseable. The raw text is preserved so the
    /// user can recover it manually.
    #[error("could not parse AI response: {reason}")]
    Parse { reason: String, raw: String },

    /// Parsed JSON whose overall shape cannot be reconciled with the report
    /// schema. Field-level mismatches degrade to warnings instead.
    #[error("response shape did not match the report schema: {0}")]
    SchemaMismatch(String),

    /// Save/load failure against the external store. Never affects the
    /// in-memory report; retried only on explicit user request.
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("export failure: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
