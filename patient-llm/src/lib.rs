//! Agentic Patient LLM - provider abstraction
//!
//! Traits the turn pipeline talks to. The scripted provider drives the
//! disclosure engine directly and is the deterministic default; the HTTP
//! provider speaks the external chat backend's JSON contract.

pub mod providers;
pub mod scripted;

pub use providers::HttpPatientProvider;
pub use scripted::ScriptedProvider;

use async_trait::async_trait;
use patient_core::{Case, Message, ProviderError, ResponseSource, SessionId};
use serde::{Deserialize, Serialize};

/// One doctor turn handed to a provider.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRequest {
    pub case: Case,
    pub visit_number: i32,
    pub doctor_message: String,
    pub disclosed_fact_ids: Vec<String>,
}

/// A provider's proposed patient response, before guardrails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientResponse {
    pub patient_utterance: String,
    #[serde(default)]
    pub new_disclosed_fact_ids: Vec<String>,
    #[serde(default)]
    pub safety_flags: Vec<String>,
    #[serde(default)]
    pub visit_end_recommendation: bool,
    #[serde(default)]
    pub requested_clarifications: Option<Vec<String>>,
    #[serde(default)]
    pub performed_exams: Vec<String>,
    #[serde(default)]
    pub performed_tests: Vec<String>,
    #[serde(skip, default = "default_source")]
    pub source: ResponseSource,
}

fn default_source() -> ResponseSource {
    ResponseSource::Llm
}

/// Produces patient utterances for doctor turns.
#[async_trait]
pub trait PatientResponder: Send + Sync {
    async fn respond(&self, req: &TurnRequest) -> Result<PatientResponse, ProviderError>;

    /// Whether a rejected response is worth regenerating. Deterministic
    /// providers return the same output, so the retry is skipped.
    fn supports_regeneration(&self) -> bool {
        false
    }
}

/// Produces visit summaries.
#[async_trait]
pub trait VisitSummarizer: Send + Sync {
    async fn summarize_visit(
        &self,
        session_id: SessionId,
        visit_number: i32,
        messages: &[Message],
    ) -> Result<String, ProviderError>;
}
