//! Agentic Patient API Server Entry Point
//!
//! Bootstraps configuration, runs schema migrations, and starts the Axum
//! HTTP server.

use std::net::SocketAddr;

use axum::Router;
use patient_api::{
    create_api_router, run_migrations, ApiConfig, ApiError, ApiResult, AppState, AuthConfig,
    DbClient, DbConfig,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing();

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    run_migrations(db.pool()).await?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();

    let state = AppState::new(db, api_config.clone())?;
    let app: Router = create_api_router(state, &api_config, auth_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Agentic Patient API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,patient_api=debug,tower_http=debug"));
    fmt().with_env_filter(filter).init();
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("PATIENT_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("PATIENT_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
