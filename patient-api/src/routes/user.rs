//! User and profile REST API Routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::{MeResponse, ProfileResponse, ProgressListResponse, SubmissionListResponse},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/me - Resolve the caller's user row
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Users",
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_me(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let user = db
        .user_get_or_create(auth.user_id, &auth.subject, auth.guest)
        .await?;

    Ok(Json(MeResponse {
        user_id: user.user_id,
        username: user.username,
        level: user.level,
        guest: auth.guest,
    }))
}

/// GET /api/users/{username}/profile - Public profile with completion heatmap
#[utoipa::path(
    get,
    path = "/api/users/{username}/profile",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Public profile", body = ProfileResponse),
        (status = 404, description = "User not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_profile(
    State(db): State<DbClient>,
    AuthExtractor(_auth): AuthExtractor,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = db
        .user_get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;

    let (solved_count, attempted_count) = db.profile_counts(user.user_id).await?;
    let completions_by_day = db.completions_by_day(user.user_id).await?;

    Ok(Json(ProfileResponse {
        username: user.username,
        level: user.level,
        solved_count,
        attempted_count,
        completions_by_day,
    }))
}

/// GET /api/users/{username}/submissions - That user's public submissions
#[utoipa::path(
    get,
    path = "/api/users/{username}/submissions",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Public completed sessions", body = SubmissionListResponse),
        (status = 404, description = "User not found", body = ApiError),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_user_submissions(
    State(db): State<DbClient>,
    AuthExtractor(_auth): AuthExtractor,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = db
        .user_get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;

    let submissions = db.public_submissions_for_user(user.user_id).await?;
    Ok(Json(SubmissionListResponse { submissions }))
}

/// GET /api/user_case_progress - All progress rows for the caller
#[utoipa::path(
    get,
    path = "/api/user_case_progress",
    tag = "Users",
    responses(
        (status = 200, description = "Progress rows", body = ProgressListResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_progress(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let user = db
        .user_get_or_create(auth.user_id, &auth.subject, auth.guest)
        .await?;

    let progress = db.progress_list(user.user_id).await?;
    Ok(Json(ProgressListResponse { progress }))
}

// ============================================================================
// ROUTERS
// ============================================================================

/// Routes nested under /api/users.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/:username/profile", axum::routing::get(get_profile))
        .route(
            "/:username/submissions",
            axum::routing::get(get_user_submissions),
        )
}
