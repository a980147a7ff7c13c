//! OpenAPI Specification for the Agentic Patient API
//!
//! Generated with utoipa from Rust types and route annotations.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{case, health, session, user};
use crate::types::{
    CaseDetail, CaseSummary, CompleteResponse, CreateSessionRequest, DayCount, EndVisitResponse,
    HistoryResponse, MeResponse, ProblemsetResponse, ProfileResponse, ProgressListResponse,
    SendMessageRequest, SendMessageResponse, SessionEnvelope, SessionListItem,
    SessionListResponse, SetVisibilityRequest, SubmissionListResponse, SubmissionView,
    SummaryResponse,
};

use patient_core::{
    ArtifactStatus, Case, CaseChunk, ChunkKind, EvaluationArtifact, Message, MessageRole,
    ProgressStatus, Session, SessionLedger, SessionState, SessionStatus, User, UserCaseProgress,
    VisitSummary,
};

/// OpenAPI document for the Agentic Patient API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agentic Patient API",
        version = "0.3.0",
        description = "Simulated clinical-interview practice: cases, sessions, progressive disclosure turns, and submissions",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Sessions", description = "Interview session lifecycle and turns"),
        (name = "Cases", description = "Problemset listing and case detail"),
        (name = "Users", description = "Identity, profiles, and progress"),
        (name = "Health", description = "Liveness and readiness checks")
    ),
    paths(
        // === Session Routes ===
        session::create_session,
        session::list_sessions,
        session::get_session,
        session::send_message,
        session::summarize_visit,
        session::end_visit,
        session::complete_session,
        session::set_visibility,
        session::get_visit_summary,
        session::get_history,

        // === Case Routes ===
        case::list_cases,
        case::get_case,
        case::get_case_progress,
        case::get_case_submissions,
        case::get_community_submissions,

        // === User Routes ===
        user::get_me,
        user::get_profile,
        user::get_user_submissions,
        user::list_progress,

        // === Health Routes ===
        health::ping,
        health::live,
        health::ready,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Request/Response Types ===
            CreateSessionRequest, SendMessageRequest, SetVisibilityRequest,
            SessionEnvelope, SessionListItem, SessionListResponse,
            SendMessageResponse, SummaryResponse, EndVisitResponse,
            CompleteResponse, HistoryResponse,
            CaseSummary, CaseDetail, ProblemsetResponse,
            SubmissionView, SubmissionListResponse,
            MeResponse, DayCount, ProfileResponse, ProgressListResponse,
            health::HealthResponse, health::HealthStatus, health::HealthDetails,

            // === Core Domain Types ===
            User, Case, CaseChunk, ChunkKind, Session, SessionLedger,
            SessionState, SessionStatus, Message, MessageRole, VisitSummary,
            UserCaseProgress, ProgressStatus, EvaluationArtifact, ArtifactStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token (or X-Guest-Id header)"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}
