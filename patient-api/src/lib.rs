//! Agentic Patient API - REST layer
//!
//! Axum HTTP service for the simulated clinical-interview trainer: auth
//! (bearer JWT or guest header), the Postgres-backed data layer, the doctor
//! turn pipeline, and the problemset/profile read surface.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod middleware;
pub mod migrate;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::{
    authenticate, generate_jwt_token, validate_jwt_token, AuthConfig, AuthContext, Claims,
    JwtSecret,
};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
pub use migrate::run_migrations;
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
