//! Doctor turn pipeline
//!
//! One doctor message in, one guarded patient reply out. Doctor messages land
//! at odd turn indices, patient replies at the following even index; both
//! writes are idempotent so a retried request replays onto the same slots.

use crate::db::DbClient;
use crate::error::ApiResult;
use crate::types::SendMessageResponse;
use chrono::Utc;
use patient_core::{Case, Message, MessageRole, PatientError, Session, SessionState, User};
use patient_dialogue::disclosure::{eligible_chunks, DisclosureContext};
use patient_dialogue::{apply_guardrails, GuardrailDecision, GuardrailMode};
use patient_llm::{PatientResponder, TurnRequest};
use std::collections::HashSet;

/// Run one doctor turn through the provider and guardrails, persisting the
/// transcript and the updated ledger.
pub async fn run_doctor_turn(
    db: &DbClient,
    responder: &dyn PatientResponder,
    session: &mut Session,
    case: &Case,
    user: &User,
    doctor_message: &str,
) -> ApiResult<SendMessageResponse> {
    if session.status.is_terminal() {
        return Err(PatientError::SessionCompleted(session.session_id).into());
    }

    let doctor_idx = session.ledger.turn_no + 1;
    let patient_idx = session.ledger.turn_no + 2;

    db.message_append(&Message {
        session_id: session.session_id,
        visit_number: session.visit_number,
        turn_index: doctor_idx,
        role: MessageRole::Doctor,
        content: doctor_message.trim().to_string(),
        source: None,
        created_at: Utc::now(),
    })
    .await?;

    let request = TurnRequest {
        case: case.clone(),
        visit_number: session.visit_number,
        doctor_message: doctor_message.trim().to_string(),
        disclosed_fact_ids: session.ledger.disclosed_fact_ids.clone(),
    };

    let ctx = DisclosureContext::for_visit(session.visit_number);
    let allowed_ids: HashSet<&str> = eligible_chunks(case, &ctx)
        .iter()
        .map(|c| c.chunk_id.as_str())
        .collect();

    let response = responder.respond(&request).await?;

    // First pass rejects on a disallowed id so regenerating providers get one
    // retry; deterministic providers would only repeat themselves.
    let mode = if responder.supports_regeneration() {
        GuardrailMode::RejectOnceElseStrip
    } else {
        GuardrailMode::StripOnly
    };

    let mut decision = apply_guardrails(
        &response.patient_utterance,
        &response.new_disclosed_fact_ids,
        &response.safety_flags,
        &allowed_ids,
        &session.ledger.disclosed_fact_ids,
        mode,
    );

    let mut reply_source = response.source;
    let mut performed_exams = response.performed_exams;
    let mut performed_tests = response.performed_tests;

    if decision.rejected {
        tracing::warn!(
            session_id = %session.session_id,
            "patient response rejected by guardrails, regenerating"
        );
        let retry = responder.respond(&request).await?;
        let reject_flags = decision.safety_flags.clone();
        decision = merge_flags(
            apply_guardrails(
                &retry.patient_utterance,
                &retry.new_disclosed_fact_ids,
                &retry.safety_flags,
                &allowed_ids,
                &session.ledger.disclosed_fact_ids,
                GuardrailMode::StripOnly,
            ),
            reject_flags,
        );
        reply_source = retry.source;
        performed_exams = retry.performed_exams;
        performed_tests = retry.performed_tests;
    }

    db.message_append(&Message {
        session_id: session.session_id,
        visit_number: session.visit_number,
        turn_index: patient_idx,
        role: MessageRole::Patient,
        content: decision.patient_utterance.clone(),
        source: Some(reply_source),
        created_at: Utc::now(),
    })
    .await?;

    // Merge the turn into the ledger and persist it.
    session
        .ledger
        .disclosed_fact_ids
        .extend(decision.new_disclosed_fact_ids.iter().cloned());
    for exam in performed_exams {
        if !session.ledger.performed_exams.contains(&exam) {
            session.ledger.performed_exams.push(exam);
        }
    }
    for test in performed_tests {
        if !session.ledger.performed_tests.contains(&test) {
            session.ledger.performed_tests.push(test);
        }
    }
    session.ledger.turn_no = patient_idx;
    session.turn_in_visit = patient_idx / 2;

    db.session_update_ledger(session.session_id, session.turn_in_visit, &session.ledger)
        .await?;

    Ok(SendMessageResponse {
        patient_utterance: decision.patient_utterance,
        new_disclosed_fact_ids: decision.new_disclosed_fact_ids,
        safety_flags: decision.safety_flags,
        state: SessionState::from_session(session, user.level),
    })
}

/// Keep the first pass's rejection flags visible on the retried response.
/// First occurrence wins; duplicates are dropped wherever they appear.
fn merge_flags(mut decision: GuardrailDecision, earlier: Vec<String>) -> GuardrailDecision {
    let later = std::mem::take(&mut decision.safety_flags);
    let mut seen = HashSet::new();
    decision.safety_flags = earlier
        .into_iter()
        .chain(later)
        .filter(|flag| seen.insert(flag.clone()))
        .collect();
    decision
}
