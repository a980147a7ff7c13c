//! Session REST API Routes
//!
//! Create/resume, listing, the doctor turn, and the visit lifecycle. Every
//! handler resolves the caller's user row first; sessions are only ever
//! addressed through their owner.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::ApiConfig,
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services::{session as session_service, turn, visit},
    state::AppState,
    types::{
        CompleteResponse, CreateSessionRequest, EndVisitResponse, HistoryQuery, HistoryResponse,
        SendMessageRequest, SendMessageResponse, SessionEnvelope, SessionListItem,
        SessionListQuery, SessionListResponse, SetVisibilityRequest, SummaryResponse,
    },
    validation::{ValidateNonEmpty, ValidateRange},
};
use patient_core::{PatientError, Session, SessionState, SessionStatus, User, VisitSummary};
use patient_llm::{PatientResponder, VisitSummarizer};

/// Resolve the caller's user row, creating it on first touch.
async fn resolve_user(db: &DbClient, auth: &crate::auth::AuthContext) -> ApiResult<User> {
    db.user_get_or_create(auth.user_id, &auth.subject, auth.guest)
        .await
}

/// Load a session owned by the caller, 404 otherwise.
async fn owned_session(db: &DbClient, session_id: Uuid, user: &User) -> ApiResult<Session> {
    let session = db
        .session_get_for_user(session_id, user.user_id)
        .await?
        .ok_or(PatientError::SessionNotFound(session_id))?;
    Ok(session)
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/sessions - Create or resume a session for a case
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "Sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created or resumed", body = SessionEnvelope),
        (status = 404, description = "Case not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_session(
    State(db): State<DbClient>,
    State(config): State<Arc<ApiConfig>>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    req.case_id.validate_non_empty("case_id")?;

    let user = resolve_user(&db, &auth).await?;
    let envelope =
        session_service::create_or_resume(&db, &user, &req.case_id, config.context_last_k).await?;

    Ok((StatusCode::CREATED, Json(envelope)))
}

/// GET /api/sessions - List the caller's sessions
#[utoipa::path(
    get,
    path = "/api/sessions",
    tag = "Sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Sessions, newest first", body = SessionListResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_sessions(
    State(db): State<DbClient>,
    State(config): State<Arc<ApiConfig>>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<SessionListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => Some(SessionStatus::parse(s).ok_or_else(|| PatientError::InvalidValue {
            field: "status".to_string(),
            reason: format!("unknown status: {}", s),
        })?),
    };

    let limit = params.limit.unwrap_or(config.session_list_limit);
    limit.validate_positive("limit")?;

    let user = resolve_user(&db, &auth).await?;
    let sessions = db.session_list(user.user_id, status, limit).await?;

    Ok(Json(SessionListResponse {
        sessions: sessions
            .into_iter()
            .map(|s| SessionListItem {
                session_id: s.session_id,
                case_id: s.case_id,
                status: s.status,
                is_public: s.is_public,
                visit_number: s.visit_number,
                created_at: s.created_at,
                ended_at: s.ended_at,
            })
            .collect(),
    }))
}

/// GET /api/sessions/{id} - Session state plus trailing transcript
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session details", body = SessionEnvelope),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_session(
    State(db): State<DbClient>,
    State(config): State<Arc<ApiConfig>>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;
    let envelope =
        session_service::build_envelope(&db, &session, &user, config.context_last_k, false)
            .await?;
    Ok(Json(envelope))
}

/// POST /api/sessions/{id}/send - One doctor turn
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/send",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Patient reply", body = SendMessageResponse),
        (status = 400, description = "Empty message", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session completed", body = ApiError),
        (status = 429, description = "Provider quota exhausted", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn send_message(
    State(db): State<DbClient>,
    State(responder): State<Arc<dyn PatientResponder>>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    req.message.validate_non_empty("message")?;

    let user = resolve_user(&db, &auth).await?;
    let mut session = owned_session(&db, id, &user).await?;

    if session.status.is_terminal() {
        return Err(ApiError::session_completed(id));
    }

    let case = db
        .case_get(&session.case_id)
        .await?
        .ok_or_else(|| ApiError::case_not_found(&session.case_id))?;

    let response =
        turn::run_doctor_turn(&db, responder.as_ref(), &mut session, &case, &user, &req.message)
            .await?;

    Ok(Json(response))
}

/// POST /api/sessions/{id}/summarize - Summarize the current visit
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/summarize",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Summary written", body = SummaryResponse),
        (status = 400, description = "Visit has no messages", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn summarize_visit(
    State(db): State<DbClient>,
    State(summarizer): State<Arc<dyn VisitSummarizer>>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;

    let summary = visit::summarize_current_visit(&db, summarizer.as_ref(), &session).await?;
    Ok(Json(summary))
}

/// POST /api/sessions/{id}/endvisit - Close the visit and open the next
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/endvisit",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Next visit opened", body = EndVisitResponse),
        (status = 400, description = "Visit cap reached", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session completed", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn end_visit(
    State(db): State<DbClient>,
    State(summarizer): State<Arc<dyn VisitSummarizer>>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;

    let response = visit::end_visit(&db, summarizer.as_ref(), &session, &user).await?;
    Ok(Json(response))
}

/// POST /api/sessions/{id}/complete - Complete the session
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/complete",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session completed", body = CompleteResponse),
        (status = 404, description = "Session not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn complete_session(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;

    let response = visit::complete_session(&db, &session, &user).await?;
    Ok(Json(response))
}

/// POST /api/sessions/{id}/visibility - Toggle transcript sharing
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/visibility",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SetVisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = SessionEnvelope),
        (status = 404, description = "Session not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn set_visibility(
    State(db): State<DbClient>,
    State(config): State<Arc<ApiConfig>>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<SetVisibilityRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;

    let updated = db
        .session_set_visibility(session.session_id, req.is_public)
        .await?;
    let envelope =
        session_service::build_envelope(&db, &updated, &user, config.context_last_k, false)
            .await?;
    Ok(Json(envelope))
}

/// GET /api/sessions/{id}/summaries/{visit} - The recorded summary of one visit
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/summaries/{visit}",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("visit" = i32, Path, description = "Visit number"),
    ),
    responses(
        (status = 200, description = "Stored visit summary", body = VisitSummary),
        (status = 404, description = "Session or summary not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_visit_summary(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path((id, visit)): Path<(Uuid, i32)>,
) -> ApiResult<impl IntoResponse> {
    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;

    let summary = db
        .summary_get(session.session_id, visit)
        .await?
        .ok_or_else(|| ApiError::summary_not_found(session.session_id, visit))?;

    Ok(Json(summary))
}

/// GET /api/sessions/{id}/history - Trailing transcript
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/history",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "Last n messages", body = HistoryResponse),
        (status = 404, description = "Session not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_history(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<Uuid>,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let n = params.n.unwrap_or(20);
    n.validate_positive("n")?;

    let user = resolve_user(&db, &auth).await?;
    let session = owned_session(&db, id, &user).await?;

    let messages = db.message_list_last(session.session_id, n).await?;
    Ok(Json(HistoryResponse { messages }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_session))
        .route("/", axum::routing::get(list_sessions))
        .route("/:id", axum::routing::get(get_session))
        .route("/:id/send", axum::routing::post(send_message))
        .route("/:id/summarize", axum::routing::post(summarize_visit))
        .route("/:id/endvisit", axum::routing::post(end_visit))
        .route("/:id/complete", axum::routing::post(complete_session))
        .route("/:id/visibility", axum::routing::post(set_visibility))
        .route("/:id/summaries/:visit", axum::routing::get(get_visit_summary))
        .route("/:id/history", axum::routing::get(get_history))
}
