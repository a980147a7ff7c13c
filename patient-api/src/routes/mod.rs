//! Route modules and router assembly
//!
//! All /api/* routes sit behind the auth middleware; health checks and the
//! OpenAPI spec are public. Layer order (outer to inner at runtime):
//! CORS -> trace -> auth -> handler.

pub mod case;
pub mod health;
pub mod session;
pub mod user;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub use case::create_router as case_router;
pub use health::create_router as health_router;
pub use session::create_router as session_router;
pub use user::create_router as user_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}

// ============================================================================
// APP ROUTER
// ============================================================================

/// Build the full application router.
pub fn create_api_router(
    state: AppState,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    auth_config.validate_for_production()?;
    let auth_state = AuthMiddlewareState::new(auth_config);

    // Protected API routes (auth required)
    let api_routes = Router::new()
        .nest("/sessions", session::create_router())
        .nest("/cases", case::create_router())
        .nest("/users", user::create_router())
        .route("/me", get(user::get_me))
        .route("/user_case_progress", get(user::list_progress))
        .layer(from_fn_with_state(auth_state, auth_middleware))
        .with_state(state.clone());

    let router = Router::new()
        .nest("/api", api_routes)
        // Health checks (no auth required)
        .nest("/health", health::create_router(state.db.clone()))
        // OpenAPI spec
        .route("/openapi.json", get(openapi_json));

    // Add Swagger UI if swagger-ui feature is enabled
    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
    };

    let cors = build_cors_layer(api_config);

    Ok(router.layer(TraceLayer::new_for_http()).layer(cors))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-guest-id"),
        ])
        .max_age(Duration::from_secs(3600));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
