//! Visit lifecycle: summarize, end visit, complete session

use crate::db::DbClient;
use crate::error::ApiResult;
use crate::types::{CompleteResponse, EndVisitResponse, SummaryResponse};
use chrono::Utc;
use patient_core::policy::max_visits;
use patient_core::{Message, MessageRole, PatientError, ResponseSource, Session, SessionState, User};
use patient_dialogue::compose_visit_intro;
use patient_llm::VisitSummarizer;

/// Summarize the session's current visit and persist the summary.
///
/// 400 when the visit has no messages yet.
pub async fn summarize_current_visit(
    db: &DbClient,
    summarizer: &dyn VisitSummarizer,
    session: &Session,
) -> ApiResult<SummaryResponse> {
    let messages = db
        .message_list_for_visit(session.session_id, session.visit_number)
        .await?;

    if messages.is_empty() {
        return Err(PatientError::EmptyVisit.into());
    }

    let summary = summarizer
        .summarize_visit(session.session_id, session.visit_number, &messages)
        .await?;

    db.summary_upsert(session.session_id, session.visit_number, &summary)
        .await?;

    Ok(SummaryResponse {
        visit_number: session.visit_number,
        summary,
    })
}

/// Close the current visit and open the next one.
///
/// The closing visit is summarized when it has messages; the new visit opens
/// with a returning-patient intro persisted at turn_index 0.
pub async fn end_visit(
    db: &DbClient,
    summarizer: &dyn VisitSummarizer,
    session: &Session,
    user: &User,
) -> ApiResult<EndVisitResponse> {
    if session.status.is_terminal() {
        return Err(PatientError::SessionCompleted(session.session_id).into());
    }

    let cap = max_visits(user.level);
    if session.visit_number >= cap {
        return Err(PatientError::MaxVisitsReached {
            level: user.level,
            max_visits: cap,
        }
        .into());
    }

    let messages = db
        .message_list_for_visit(session.session_id, session.visit_number)
        .await?;

    let summary = if messages.is_empty() {
        None
    } else {
        let text = summarizer
            .summarize_visit(session.session_id, session.visit_number, &messages)
            .await?;
        db.summary_upsert(session.session_id, session.visit_number, &text)
            .await?;
        Some(text)
    };

    let advanced = db.session_advance_visit(session.session_id).await?;

    let intro = compose_visit_intro(advanced.visit_number, summary.as_deref());
    db.message_append(&Message {
        session_id: advanced.session_id,
        visit_number: advanced.visit_number,
        turn_index: 0,
        role: MessageRole::Patient,
        content: intro,
        source: Some(ResponseSource::SystemIntro),
        created_at: Utc::now(),
    })
    .await?;

    tracing::info!(
        session_id = %advanced.session_id,
        visit_number = advanced.visit_number,
        "visit advanced"
    );

    Ok(EndVisitResponse {
        visit_number: advanced.visit_number,
        summary,
        state: SessionState::from_session(&advanced, user.level),
    })
}

/// Complete the session: terminal status, evaluation artifact, SOLVED
/// progress. Safe to repeat; every write in the chain is idempotent.
pub async fn complete_session(
    db: &DbClient,
    session: &Session,
    user: &User,
) -> ApiResult<CompleteResponse> {
    let completed = db.session_complete(session.session_id).await?;

    let artifact = db.artifact_create_pending(completed.session_id).await?;

    let progress = db
        .progress_mark_solved(user.user_id, &completed.case_id, completed.session_id)
        .await?;

    tracing::info!(
        session_id = %completed.session_id,
        case_id = %completed.case_id,
        "session completed"
    );

    Ok(CompleteResponse {
        session_id: completed.session_id,
        status: completed.status,
        artifact,
        progress,
    })
}
