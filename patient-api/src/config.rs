//! API configuration
//!
//! Settings are loaded from environment variables with development-friendly
//! defaults, matching the deployment model: one env var block per service.

/// API configuration for CORS and interview tuning knobs.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// How many trailing messages accompany session create/get responses.
    pub context_last_k: usize,

    /// Default page size for session listings.
    pub session_list_limit: i64,

    /// Base URL of the external patient-response backend. When unset the
    /// deterministic scripted provider is used.
    pub chat_backend_url: Option<String>,

    /// Bearer token for the chat backend.
    pub chat_backend_api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            context_last_k: 12,
            session_list_limit: 50,
            chat_backend_url: None,
            chat_backend_api_key: None,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PATIENT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `CONTEXT_LAST_K_MSGS`: Trailing message window (default: 12)
    /// - `SESSIONS_LIST_LIMIT`: Default session list page size (default: 50)
    /// - `PATIENT_CHAT_BACKEND_URL`: External LLM backend base URL (optional)
    /// - `PATIENT_CHAT_BACKEND_API_KEY`: Bearer token for that backend (optional)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("PATIENT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let context_last_k = std::env::var("CONTEXT_LAST_K_MSGS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(12);

        let session_list_limit = std::env::var("SESSIONS_LIST_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50);

        Self {
            cors_origins,
            context_last_k,
            session_list_limit,
            chat_backend_url: std::env::var("PATIENT_CHAT_BACKEND_URL").ok().filter(|s| !s.is_empty()),
            chat_backend_api_key: std::env::var("PATIENT_CHAT_BACKEND_API_KEY").ok(),
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}
