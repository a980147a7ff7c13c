//! Shared application state for Axum routers.

use std::sync::Arc;

use patient_llm::{HttpPatientProvider, PatientResponder, ScriptedProvider, VisitSummarizer};

use crate::config::ApiConfig;
use crate::db::DbClient;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Database client backed by the deadpool Postgres pool.
    pub db: DbClient,
    /// API tuning knobs (context window, list limits, backend selection).
    pub config: Arc<ApiConfig>,
    /// Produces patient utterances for doctor turns.
    ///
    /// The scripted provider is the deterministic default; when
    /// `PATIENT_CHAT_BACKEND_URL` is set the HTTP provider is used and
    /// rejected responses get one regeneration attempt.
    pub responder: Arc<dyn PatientResponder>,
    /// Produces visit summaries.
    pub summarizer: Arc<dyn VisitSummarizer>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build state with providers selected from configuration.
    pub fn new(db: DbClient, config: ApiConfig) -> crate::error::ApiResult<Self> {
        let (responder, summarizer): (Arc<dyn PatientResponder>, Arc<dyn VisitSummarizer>) =
            match &config.chat_backend_url {
                Some(url) => {
                    tracing::info!(backend = %url, "using HTTP patient provider");
                    let provider = Arc::new(
                        HttpPatientProvider::new(url.clone(), config.chat_backend_api_key.clone())
                            .map_err(crate::error::ApiError::from)?,
                    );
                    (provider.clone() as _, provider as _)
                }
                None => {
                    tracing::info!("using scripted patient provider");
                    let provider = Arc::new(ScriptedProvider);
                    (provider.clone() as _, provider as _)
                }
            };

        Ok(Self {
            db,
            config: Arc::new(config),
            responder,
            summarizer,
            start_time: std::time::Instant::now(),
        })
    }

    /// Build state with explicit providers (used by tests).
    pub fn with_providers(
        db: DbClient,
        config: ApiConfig,
        responder: Arc<dyn PatientResponder>,
        summarizer: Arc<dyn VisitSummarizer>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            responder,
            summarizer,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(DbClient, db);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(Arc<dyn PatientResponder>, responder);
crate::impl_from_ref!(Arc<dyn VisitSummarizer>, summarizer);
crate::impl_from_ref!(std::time::Instant, start_time);
