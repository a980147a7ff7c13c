//! Error types shared across Agentic Patient crates

use crate::{CaseId, SessionId};
use thiserror::Error;

/// Domain-level errors raised below the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatientError {
    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session {0} is completed and read-only")]
    SessionCompleted(SessionId),

    #[error("Max visits reached for level {level}: {max_visits}")]
    MaxVisitsReached { level: i32, max_visits: i32 },

    #[error("No messages in this visit to summarize yet")]
    EmptyVisit,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Provider (LLM/upstream) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("LLM quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}
