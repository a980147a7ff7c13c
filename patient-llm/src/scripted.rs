//! Scripted provider
//!
//! Deterministic implementation backed by the disclosure engine. No network,
//! no quota, same output for the same input. This is the default provider and
//! the one every test runs against.

use crate::{PatientResponder, PatientResponse, TurnRequest, VisitSummarizer};
use async_trait::async_trait;
use patient_core::{Message, MessageRole, ProviderError, SessionId};
use patient_dialogue::disclosure::{self, DisclosureContext};

/// How many exchanges a scripted summary quotes at most.
const SUMMARY_MAX_BULLETS: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedProvider;

#[async_trait]
impl PatientResponder for ScriptedProvider {
    async fn respond(&self, req: &TurnRequest) -> Result<PatientResponse, ProviderError> {
        let ctx = DisclosureContext::for_visit(req.visit_number);
        let reply = disclosure::respond(
            &req.doctor_message,
            &req.case,
            &ctx,
            &req.disclosed_fact_ids,
        );
        Ok(PatientResponse {
            patient_utterance: reply.utterance,
            new_disclosed_fact_ids: reply.new_fact_ids,
            safety_flags: Vec::new(),
            visit_end_recommendation: false,
            requested_clarifications: None,
            performed_exams: reply.performed_exams,
            performed_tests: reply.performed_tests,
            source: reply.source,
        })
    }
}

#[async_trait]
impl VisitSummarizer for ScriptedProvider {
    /// Extractive summary: one bullet per doctor/patient exchange, capped.
    async fn summarize_visit(
        &self,
        _session_id: SessionId,
        visit_number: i32,
        messages: &[Message],
    ) -> Result<String, ProviderError> {
        let mut bullets: Vec<String> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System && !m.content.trim().is_empty())
            .map(|m| {
                let speaker = match m.role {
                    MessageRole::Doctor => "Doctor",
                    _ => "Patient",
                };
                format!("- {}: {}", speaker, m.content.trim())
            })
            .collect();
        if bullets.len() > SUMMARY_MAX_BULLETS {
            bullets = bullets.split_off(bullets.len() - SUMMARY_MAX_BULLETS);
        }
        let body = bullets.join("\n");
        let summary = format!("Visit {visit_number} recap:\n{body}");
        Ok(patient_dialogue::ensure_medication_in_summary(&summary, messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use patient_core::{new_session_id, Case, CaseChunk, ChunkKind};

    fn case() -> Case {
        Case {
            case_id: "case-1".into(),
            title: "Cough".into(),
            difficulty: None,
            tags: vec![],
            short_prompt: None,
            is_published: true,
            version: 1,
            dx: None,
            case_type: None,
            chunks: vec![CaseChunk {
                chunk_id: "f1".into(),
                visit_no: 1,
                stage: 0,
                kind: ChunkKind::Symptoms,
                detail_depth: 1,
                content: "Dry cough for three weeks.".into(),
                tags: vec!["cough".into()],
            }],
        }
    }

    #[tokio::test]
    async fn scripted_responses_are_deterministic() {
        let provider = ScriptedProvider;
        let req = TurnRequest {
            case: case(),
            visit_number: 1,
            doctor_message: "Tell me about the cough".into(),
            disclosed_fact_ids: vec![],
        };
        let a = provider.respond(&req).await.unwrap();
        let b = provider.respond(&req).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.new_disclosed_fact_ids, vec!["f1".to_string()]);
    }

    #[tokio::test]
    async fn scripted_summary_includes_medication_backstop() {
        let provider = ScriptedProvider;
        let session_id = new_session_id();
        let messages = vec![Message {
            session_id,
            visit_number: 1,
            turn_index: 1,
            role: MessageRole::Doctor,
            content: "Take paracetamol 500mg at night.".into(),
            source: None,
            created_at: Utc::now(),
        }];
        let summary = provider.summarize_visit(session_id, 1, &messages).await.unwrap();
        assert!(summary.contains("Visit 1 recap:"));
        assert!(summary.contains("paracetamol 500mg"));
    }
}
