//! Typed HTTP client for the Agentic Patient API.
//!
//! Wraps every route the server exposes in a typed method. Credentials are
//! fixed at construction: either a bearer JWT or a guest id, sent on every
//! request. Non-2xx responses are decoded into the server's JSON error body;
//! 502/503/504 surface as [`ClientError::ServiceWakingUp`] so callers can
//! show a "warming up" state instead of a hard failure.

use std::time::Duration;

use patient_api::error::ApiError as ServerError;
use patient_api::routes::health::HealthResponse;
use patient_api::types::{
    CaseDetail, CompleteResponse, CreateSessionRequest, EndVisitResponse, HistoryQuery,
    HistoryResponse, MeResponse, ProblemsetQuery, ProblemsetResponse, ProfileResponse,
    ProgressListResponse, SendMessageRequest, SendMessageResponse, SessionEnvelope,
    SessionListQuery, SessionListResponse, SetVisibilityRequest, SubmissionListResponse,
    SummaryResponse,
};
use patient_core::{UserCaseProgress, VisitSummary};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use uuid::Uuid;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with its structured JSON error body.
    #[error("API error {status}: {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    /// 404 for a named resource.
    #[error("not found: {0}")]
    NotFound(String),
    /// 502/503/504 from the edge; the backend is still coming up.
    #[error("service is waking up, retry shortly")]
    ServiceWakingUp,
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    fn from_error_body(status: StatusCode, text: &str) -> Self {
        if let Ok(body) = serde_json::from_str::<ServerError>(text) {
            if status == StatusCode::NOT_FOUND {
                return ClientError::NotFound(body.message);
            }
            return ClientError::Api {
                status: status.as_u16(),
                code: body.code.as_str().to_string(),
                message: body.message,
            };
        }
        if status == StatusCode::NOT_FOUND {
            return ClientError::NotFound(text.to_string());
        }
        ClientError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), text))
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Credential sent on every request.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `X-Guest-Id: <opaque id>`
    Guest(String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
    /// Per-request timeout in milliseconds (default 30s).
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            request_timeout_ms: 30_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }
}

fn build_auth_headers(credentials: &Credentials) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    match credentials {
        Credentials::Bearer(token) => {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::Config(format!("invalid bearer token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Credentials::Guest(id) => {
            let value = HeaderValue::from_str(id)
                .map_err(|e| ClientError::Config(format!("invalid guest id: {}", e)))?;
            headers.insert("x-guest-id", value);
        }
    }
    Ok(headers)
}

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Clone)]
pub struct PatientClient {
    client: reqwest::Client,
    base_url: String,
    auth_headers: HeaderMap,
}

impl PatientClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let auth_headers = build_auth_headers(&config.credentials)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_headers,
        })
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    /// Start a session for a case, or resume/return the existing attempt.
    pub async fn create_session(&self, case_id: &str) -> Result<SessionEnvelope, ClientError> {
        let body = CreateSessionRequest {
            case_id: case_id.to_string(),
        };
        self.post_json("/api/sessions", &body).await
    }

    pub async fn list_sessions(
        &self,
        query: &SessionListQuery,
    ) -> Result<SessionListResponse, ClientError> {
        self.get_json("/api/sessions", Some(query)).await
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<SessionEnvelope, ClientError> {
        let path = format!("/api/sessions/{}", session_id);
        self.get_json::<SessionEnvelope, ()>(&path, None).await
    }

    /// Send one doctor message and receive the guarded patient reply.
    pub async fn send_message(
        &self,
        session_id: Uuid,
        message: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        let path = format!("/api/sessions/{}/send", session_id);
        let body = SendMessageRequest {
            message: message.to_string(),
        };
        self.post_json(&path, &body).await
    }

    pub async fn summarize_visit(&self, session_id: Uuid) -> Result<SummaryResponse, ClientError> {
        let path = format!("/api/sessions/{}/summarize", session_id);
        self.post_json(&path, &serde_json::json!({})).await
    }

    pub async fn visit_summary(
        &self,
        session_id: Uuid,
        visit_number: i32,
    ) -> Result<VisitSummary, ClientError> {
        let path = format!("/api/sessions/{}/summaries/{}", session_id, visit_number);
        self.get_json::<VisitSummary, ()>(&path, None).await
    }

    pub async fn end_visit(&self, session_id: Uuid) -> Result<EndVisitResponse, ClientError> {
        let path = format!("/api/sessions/{}/endvisit", session_id);
        self.post_json(&path, &serde_json::json!({})).await
    }

    pub async fn complete_session(
        &self,
        session_id: Uuid,
    ) -> Result<CompleteResponse, ClientError> {
        let path = format!("/api/sessions/{}/complete", session_id);
        self.post_json(&path, &serde_json::json!({})).await
    }

    pub async fn set_visibility(
        &self,
        session_id: Uuid,
        is_public: bool,
    ) -> Result<SessionEnvelope, ClientError> {
        let path = format!("/api/sessions/{}/visibility", session_id);
        self.post_json(&path, &SetVisibilityRequest { is_public })
            .await
    }

    pub async fn get_history(
        &self,
        session_id: Uuid,
        last_n: Option<i64>,
    ) -> Result<HistoryResponse, ClientError> {
        let path = format!("/api/sessions/{}/history", session_id);
        self.get_json(&path, Some(&HistoryQuery { n: last_n }))
            .await
    }

    // ========================================================================
    // CASES / PROBLEMSET
    // ========================================================================

    pub async fn list_cases(
        &self,
        query: &ProblemsetQuery,
    ) -> Result<ProblemsetResponse, ClientError> {
        self.get_json("/api/cases", Some(query)).await
    }

    pub async fn get_case(&self, case_id: &str) -> Result<CaseDetail, ClientError> {
        let path = format!("/api/cases/{}", case_id);
        self.get_json::<CaseDetail, ()>(&path, None).await
    }

    pub async fn get_case_progress(
        &self,
        case_id: &str,
    ) -> Result<UserCaseProgress, ClientError> {
        let path = format!("/api/cases/{}/progress", case_id);
        self.get_json::<UserCaseProgress, ()>(&path, None).await
    }

    pub async fn get_case_submissions(
        &self,
        case_id: &str,
    ) -> Result<SubmissionListResponse, ClientError> {
        let path = format!("/api/cases/{}/submissions", case_id);
        self.get_json::<SubmissionListResponse, ()>(&path, None)
            .await
    }

    pub async fn get_community_submissions(
        &self,
        case_id: &str,
    ) -> Result<SubmissionListResponse, ClientError> {
        let path = format!("/api/cases/{}/community_submissions", case_id);
        self.get_json::<SubmissionListResponse, ()>(&path, None)
            .await
    }

    // ========================================================================
    // USERS / PROFILES
    // ========================================================================

    pub async fn me(&self) -> Result<MeResponse, ClientError> {
        self.get_json::<MeResponse, ()>("/api/me", None).await
    }

    pub async fn get_profile(&self, username: &str) -> Result<ProfileResponse, ClientError> {
        let path = format!("/api/users/{}/profile", username);
        self.get_json::<ProfileResponse, ()>(&path, None).await
    }

    pub async fn get_user_submissions(
        &self,
        username: &str,
    ) -> Result<SubmissionListResponse, ClientError> {
        let path = format!("/api/users/{}/submissions", username);
        self.get_json::<SubmissionListResponse, ()>(&path, None)
            .await
    }

    pub async fn list_progress(&self) -> Result<ProgressListResponse, ClientError> {
        self.get_json::<ProgressListResponse, ()>("/api/user_case_progress", None)
            .await
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    pub async fn ping(&self) -> Result<String, ClientError> {
        let url = format!("{}/health/ping", self.base_url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(Self::map_error(status, &text))
        }
    }

    pub async fn ready(&self) -> Result<HealthResponse, ClientError> {
        self.get_json::<HealthResponse, ()>("/health/ready", None)
            .await
    }

    // ========================================================================
    // REQUEST PLUMBING
    // ========================================================================

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(url).headers(self.auth_headers.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .headers(self.auth_headers.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Self::map_error(status, &text))
        }
    }

    fn map_error(status: StatusCode, text: &str) -> ClientError {
        match status {
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                tracing::debug!(status = status.as_u16(), "backend not ready");
                ClientError::ServiceWakingUp
            }
            _ => ClientError::from_error_body(status, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(credentials: Credentials) -> PatientClient {
        let config = ClientConfig::new("http://localhost:3000/", credentials);
        PatientClient::new(&config).expect("client builds")
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = client(Credentials::Guest("guest-1".into()));
        assert_eq!(c.base_url, "http://localhost:3000");
    }

    #[test]
    fn bearer_credentials_set_authorization_header() {
        let c = client(Credentials::Bearer("abc.def.ghi".into()));
        assert_eq!(
            c.auth_headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer abc.def.ghi")
        );
        assert!(c.auth_headers.get("x-guest-id").is_none());
    }

    #[test]
    fn guest_credentials_set_guest_header() {
        let c = client(Credentials::Guest("visitor-42".into()));
        assert_eq!(
            c.auth_headers.get("x-guest-id").and_then(|v| v.to_str().ok()),
            Some("visitor-42")
        );
        assert!(c.auth_headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn newline_in_guest_id_is_a_config_error() {
        let config = ClientConfig::new(
            "http://localhost:3000",
            Credentials::Guest("bad\nvalue".into()),
        );
        assert!(matches!(
            PatientClient::new(&config),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn gateway_statuses_map_to_waking_up() {
        for status in [
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::GATEWAY_TIMEOUT,
        ] {
            assert!(matches!(
                PatientClient::map_error(status, ""),
                ClientError::ServiceWakingUp
            ));
        }
    }

    #[test]
    fn structured_error_body_is_decoded() {
        let body = r#"{"code":"CASE_NOT_FOUND","message":"Case not found: c9"}"#;
        match PatientClient::map_error(StatusCode::NOT_FOUND, body) {
            ClientError::NotFound(message) => assert_eq!(message, "Case not found: c9"),
            other => panic!("expected NotFound, got {:?}", other),
        }

        let body = r#"{"code":"INVALID_INPUT","message":"message must not be empty"}"#;
        match PatientClient::map_error(StatusCode::BAD_REQUEST, body) {
            ClientError::Api { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code, "INVALID_INPUT");
                assert_eq!(message, "message must not be empty");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn unstructured_error_body_is_preserved() {
        match PatientClient::map_error(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            ClientError::InvalidResponse(message) => assert!(message.contains("boom")),
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }
}
