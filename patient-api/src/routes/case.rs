//! Case / problemset REST API Routes
//!
//! Listing is backed by the `problemset_search_cases` SQL function. The case
//! seed (chunks, hidden diagnosis) never leaves the server through these
//! endpoints.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::{
        CaseDetail, ProblemsetQuery, ProblemsetResponse, SubmissionListResponse,
    },
    validation::clamp_pagination,
};
use patient_core::UserCaseProgress;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/cases - Paginated, filterable problemset listing
#[utoipa::path(
    get,
    path = "/api/cases",
    tag = "Cases",
    params(ProblemsetQuery),
    responses(
        (status = 200, description = "Matching cases with total count", body = ProblemsetResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_cases(
    State(db): State<DbClient>,
    AuthExtractor(_auth): AuthExtractor,
    Query(params): Query<ProblemsetQuery>,
) -> ApiResult<impl IntoResponse> {
    let (page, limit, _offset) = clamp_pagination(params.page, params.limit);

    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let difficulty = params.difficulty.as_deref().filter(|s| !s.is_empty());
    let tag = params.tag.as_deref().filter(|s| !s.is_empty());

    let (cases, total) = db
        .problemset_search(search, difficulty, tag, page, limit)
        .await?;

    Ok(Json(ProblemsetResponse {
        cases,
        total,
        page,
        limit,
    }))
}

/// GET /api/cases/{id} - Case detail (published only)
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    tag = "Cases",
    params(("id" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case detail", body = CaseDetail),
        (status = 404, description = "Case not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_case(
    State(db): State<DbClient>,
    AuthExtractor(_auth): AuthExtractor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let case = db
        .case_get(&id)
        .await?
        .ok_or_else(|| ApiError::case_not_found(&id))?;

    Ok(Json(CaseDetail {
        case_id: case.case_id,
        title: case.title,
        difficulty: case.difficulty,
        tags: case.tags,
        short_prompt: case.short_prompt,
        version: case.version,
    }))
}

/// GET /api/cases/{id}/progress - The caller's progress on the case
#[utoipa::path(
    get,
    path = "/api/cases/{id}/progress",
    tag = "Cases",
    params(("id" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Progress row (NOT_STARTED when absent)", body = UserCaseProgress),
        (status = 404, description = "Case not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_case_progress(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    db.case_get(&id)
        .await?
        .ok_or_else(|| ApiError::case_not_found(&id))?;

    let user = db
        .user_get_or_create(auth.user_id, &auth.subject, auth.guest)
        .await?;

    let progress = db
        .progress_get(user.user_id, &id)
        .await?
        .unwrap_or_else(|| UserCaseProgress::not_started(user.user_id, id));

    Ok(Json(progress))
}

/// GET /api/cases/{id}/submissions - The caller's completed sessions
#[utoipa::path(
    get,
    path = "/api/cases/{id}/submissions",
    tag = "Cases",
    params(("id" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Completed sessions", body = SubmissionListResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_case_submissions(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = db
        .user_get_or_create(auth.user_id, &auth.subject, auth.guest)
        .await?;

    let submissions = db.submissions_for_case(user.user_id, &id).await?;
    Ok(Json(SubmissionListResponse { submissions }))
}

/// GET /api/cases/{id}/community_submissions - Public completed sessions
#[utoipa::path(
    get,
    path = "/api/cases/{id}/community_submissions",
    tag = "Cases",
    params(("id" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Public submissions with usernames", body = SubmissionListResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_community_submissions(
    State(db): State<DbClient>,
    AuthExtractor(_auth): AuthExtractor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let submissions = db.community_submissions(&id).await?;
    Ok(Json(SubmissionListResponse { submissions }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::get(list_cases))
        .route("/:id", axum::routing::get(get_case))
        .route("/:id/progress", axum::routing::get(get_case_progress))
        .route("/:id/submissions", axum::routing::get(get_case_submissions))
        .route(
            "/:id/community_submissions",
            axum::routing::get(get_community_submissions),
        )
}
