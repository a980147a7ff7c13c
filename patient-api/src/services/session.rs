//! Session creation and resumption
//!
//! One active attempt per (user, case): creating a session while progress is
//! IN_PROGRESS resumes the last session, and a SOLVED case hands back the
//! solved session read-only so the caller can route to the submission view.

use crate::db::DbClient;
use crate::error::ApiResult;
use crate::types::SessionEnvelope;
use chrono::Utc;
use patient_core::{
    new_session_id, Message, MessageRole, PatientError, ProgressStatus, ResponseSource, Session,
    SessionState, User,
};
use patient_dialogue::compose_visit_intro;

/// Build the envelope returned by create/get: state + trailing transcript.
pub async fn build_envelope(
    db: &DbClient,
    session: &Session,
    user: &User,
    last_k: usize,
    resumed: bool,
) -> ApiResult<SessionEnvelope> {
    let messages = db
        .message_list_last(session.session_id, last_k as i64)
        .await?;

    Ok(SessionEnvelope {
        session_id: session.session_id,
        state: SessionState::from_session(session, user.level),
        messages,
        resumed,
    })
}

/// Create a session for a case, or hand back the existing attempt.
pub async fn create_or_resume(
    db: &DbClient,
    user: &User,
    case_id: &str,
    last_k: usize,
) -> ApiResult<SessionEnvelope> {
    let case = db
        .case_get(case_id)
        .await?
        .ok_or_else(|| PatientError::CaseNotFound(case_id.to_string()))?;

    if let Some(progress) = db.progress_get(user.user_id, case_id).await? {
        match progress.status {
            ProgressStatus::Solved => {
                // Read-only: the solved session routes the caller to the
                // submission view, no new attempt is started.
                if let Some(solved_id) = progress.solved_session_id {
                    if let Some(session) =
                        db.session_get_for_user(solved_id, user.user_id).await?
                    {
                        return build_envelope(db, &session, user, last_k, false).await;
                    }
                }
            }
            ProgressStatus::InProgress => {
                if let Some(last_id) = progress.last_session_id {
                    if let Some(session) = db.session_get_for_user(last_id, user.user_id).await? {
                        if !session.status.is_terminal() {
                            return build_envelope(db, &session, user, last_k, true).await;
                        }
                    }
                }
            }
            ProgressStatus::NotStarted => {}
        }
    }

    let session = db
        .session_create(new_session_id(), user.user_id, case_id)
        .await?;

    // Patient opens the visit. turn_index 0 is unique per visit, so a
    // replayed create can never double-post the intro.
    let intro = compose_visit_intro(1, None);
    db.message_append(&Message {
        session_id: session.session_id,
        visit_number: 1,
        turn_index: 0,
        role: MessageRole::Patient,
        content: intro,
        source: Some(ResponseSource::SystemIntro),
        created_at: Utc::now(),
    })
    .await?;

    db.progress_touch_in_progress(user.user_id, case_id, session.session_id)
        .await?;

    tracing::info!(
        session_id = %session.session_id,
        case_id = %case.case_id,
        "session created"
    );

    build_envelope(db, &session, user, last_k, false).await
}
