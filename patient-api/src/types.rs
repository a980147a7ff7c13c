//! Request/response DTOs for the Agentic Patient API

use chrono::{DateTime, NaiveDate, Utc};
use patient_core::{
    EvaluationArtifact, Message, SessionState, SessionStatus, UserCaseProgress,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SESSION REQUESTS
// ============================================================================

/// Request body for POST /api/sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateSessionRequest {
    pub case_id: String,
}

/// Request body for POST /api/sessions/:id/send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendMessageRequest {
    pub message: String,
}

/// Request body for POST /api/sessions/:id/visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetVisibilityRequest {
    pub is_public: bool,
}

/// Query parameters for GET /api/sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct SessionListQuery {
    /// Filter by session status ("active" | "completed")
    pub status: Option<String>,
    /// Maximum number of sessions to return (>= 1)
    pub limit: Option<i64>,
}

/// Query parameters for GET /api/sessions/:id/history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct HistoryQuery {
    /// Number of trailing messages to return (>= 1, default 20)
    pub n: Option<i64>,
}

// ============================================================================
// SESSION RESPONSES
// ============================================================================

/// Session envelope returned by create/get: state plus trailing transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionEnvelope {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: Uuid,
    pub state: SessionState,
    pub messages: Vec<Message>,
    /// True when an existing in-progress session was resumed instead of a new
    /// one created.
    pub resumed: bool,
}

/// One row in the caller's session listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionListItem {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: Uuid,
    pub case_id: String,
    pub status: SessionStatus,
    pub is_public: bool,
    pub visit_number: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionListResponse {
    pub sessions: Vec<SessionListItem>,
}

/// Response for POST /api/sessions/:id/send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendMessageResponse {
    pub patient_utterance: String,
    pub new_disclosed_fact_ids: Vec<String>,
    pub safety_flags: Vec<String>,
    pub state: SessionState,
}

/// Response for POST /api/sessions/:id/summarize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SummaryResponse {
    pub visit_number: i32,
    pub summary: String,
}

/// Response for POST /api/sessions/:id/endvisit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EndVisitResponse {
    /// The visit now in progress after the increment.
    pub visit_number: i32,
    /// Summary written for the closed visit, when it had messages.
    pub summary: Option<String>,
    pub state: SessionState,
}

/// Response for POST /api/sessions/:id/complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompleteResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub artifact: EvaluationArtifact,
    pub progress: UserCaseProgress,
}

/// Response for GET /api/sessions/:id/history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

// ============================================================================
// CASES / PROBLEMSET
// ============================================================================

/// Query parameters for GET /api/cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ProblemsetQuery {
    pub search: Option<String>,
    pub difficulty: Option<String>,
    pub tag: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

/// One problemset row. The case seed (chunks, dx) is never exposed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseSummary {
    pub case_id: String,
    pub title: String,
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    pub short_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProblemsetResponse {
    pub cases: Vec<CaseSummary>,
    pub total: i64,
    pub page: i32,
    pub limit: i32,
}

/// Case detail for the interview view. Excludes the seed: chunks and the
/// hidden diagnosis must never reach the doctor's client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseDetail {
    pub case_id: String,
    pub title: String,
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    pub short_prompt: Option<String>,
    pub version: i32,
}

/// One completed submission row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubmissionView {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: Uuid,
    pub case_id: String,
    /// Visits spent before completion.
    pub visit_number: i32,
    pub is_public: bool,
    /// Present on community listings; absent on the caller's own rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubmissionListResponse {
    pub submissions: Vec<SubmissionView>,
}

// ============================================================================
// USERS / PROFILES
// ============================================================================

/// Response for GET /api/me.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MeResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: Uuid,
    pub username: String,
    pub level: i32,
    pub guest: bool,
}

/// One bucket of the completion heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DayCount {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub day: NaiveDate,
    pub count: i64,
}

/// Response for GET /api/users/:username/profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfileResponse {
    pub username: String,
    pub level: i32,
    pub solved_count: i64,
    pub attempted_count: i64,
    /// Day-bucketed completions, oldest first.
    pub completions_by_day: Vec<DayCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProgressListResponse {
    pub progress: Vec<UserCaseProgress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_submission_omits_username() {
        let view = SubmissionView {
            session_id: Uuid::new_v4(),
            case_id: "case-1".into(),
            visit_number: 2,
            is_public: false,
            username: None,
            created_at: Utc::now(),
            ended_at: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("username").is_none());
    }

    #[test]
    fn problemset_query_defaults_to_none() {
        let q: ProblemsetQuery = serde_json::from_str("{}").unwrap();
        assert!(q.search.is_none());
        assert!(q.page.is_none());
    }
}
