//! HTTP provider for the external chat backend
//!
//! The service that actually runs an LLM for free-form patient prose is a
//! separate deployment; this client speaks its JSON contract. Guardrails are
//! still applied downstream, so a misbehaving backend cannot over-disclose.

use crate::{PatientResponder, PatientResponse, TurnRequest, VisitSummarizer};
use async_trait::async_trait;
use patient_core::{Message, ProviderError, SessionId};
use patient_dialogue::build_visit_summary_prompt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER_NAME: &str = "chat-backend";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for the external patient-response backend.
#[derive(Clone)]
pub struct HttpPatientProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RespondRequest<'a> {
    case_id: &'a str,
    visit_no: i32,
    doctor_message: &'a str,
    disclosed_fact_ids: &'a [String],
    allowed_facts: Vec<AllowedFact<'a>>,
}

#[derive(Debug, Serialize)]
struct AllowedFact<'a> {
    id: &'a str,
    text: &'a str,
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary_text: String,
}

impl HttpPatientProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post_json<Req: Serialize, Res: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Res, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| ProviderError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            status: 0,
            message: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::QuotaExhausted(if body.is_empty() {
                "upstream LLM quota exhausted".to_string()
            } else {
                body
            }));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16() as i32,
                message,
            });
        }

        response.json().await.map_err(|e| ProviderError::InvalidResponse {
            provider: PROVIDER_NAME.to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpPatientProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPatientProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl PatientResponder for HttpPatientProvider {
    async fn respond(&self, req: &TurnRequest) -> Result<PatientResponse, ProviderError> {
        let ctx = patient_dialogue::DisclosureContext::for_visit(req.visit_number);
        let eligible = patient_dialogue::disclosure::eligible_chunks(&req.case, &ctx);
        let allowed_facts = eligible
            .iter()
            .map(|ch| AllowedFact {
                id: &ch.chunk_id,
                text: &ch.content,
                kind: match ch.kind {
                    patient_core::ChunkKind::Exam => "exam",
                    patient_core::ChunkKind::Tests => "tests",
                    _ => "narrative",
                },
            })
            .collect();

        let body = RespondRequest {
            case_id: &req.case.case_id,
            visit_no: req.visit_number,
            doctor_message: &req.doctor_message,
            disclosed_fact_ids: &req.disclosed_fact_ids,
            allowed_facts,
        };
        tracing::debug!(case_id = %req.case.case_id, visit = req.visit_number, "calling patient backend");
        self.post_json("/patient/respond", &body).await
    }

    fn supports_regeneration(&self) -> bool {
        true
    }
}

#[async_trait]
impl VisitSummarizer for HttpPatientProvider {
    async fn summarize_visit(
        &self,
        session_id: SessionId,
        visit_number: i32,
        messages: &[Message],
    ) -> Result<String, ProviderError> {
        let prompt = build_visit_summary_prompt(session_id, visit_number, messages);
        let body = serde_json::json!({ "prompt": prompt });
        let response: SummaryResponse = self.post_json("/patient/summarize", &body).await?;
        Ok(patient_dialogue::ensure_medication_in_summary(
            &response.summary_text,
            messages,
        ))
    }
}
