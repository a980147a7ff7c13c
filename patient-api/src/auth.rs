//! Authentication Module
//!
//! This module provides authentication for the Agentic Patient API.
//! It supports two identity sources:
//! 1. JWT token authentication (via Authorization: Bearer header)
//! 2. Anonymous guest identity (via X-Guest-Id header)
//!
//! Whichever source wins, the raw subject string is normalized to a stable
//! UUID with [`patient_core::normalize_user_id`], so the same caller always
//! maps to the same `users` row.

use crate::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use patient_core::normalize_user_id;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS + CI ROBUSTNESS)
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// This allows us to inject time in tests and handle broken CI environments
/// where `SystemTime::now()` might return pre-epoch times (causing panics).
///
/// By owning time validation ourselves (instead of letting `jsonwebtoken` do it),
/// we avoid the `SystemTime::now().duration_since(UNIX_EPOCH).expect()` panic
/// path and make tests fully deterministic.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Test clock helpers for common scenarios.
#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC - always valid for tests
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC - far future for expiry tests
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
///
/// This wraps the secret in a `secrecy::SecretString` to ensure it's never
/// accidentally logged or displayed.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret with validation.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::missing_field("jwt_secret"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (use sparingly, only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION"
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token expiration in seconds (default: 24 hours)
    pub jwt_expiration_secs: i64,

    /// JWT clock skew tolerance in seconds (default: 60)
    ///
    /// Allows tokens to be slightly in the future/past to handle clock drift
    /// in distributed systems.
    pub jwt_clock_skew_secs: i64,

    /// Expected `aud` claim. When `None`, tokens are accepted regardless of
    /// any audience they carry (default: None)
    pub jwt_audience: Option<String>,

    /// Whether the X-Guest-Id fallback is accepted (default: true)
    pub allow_guests: bool,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("jwt_audience", &self.jwt_audience)
            .field("allow_guests", &self.allow_guests)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret_str = std::env::var("PATIENT_JWT_SECRET")
            .unwrap_or_else(|_| "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION".to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 86400, // 24 hours
            jwt_clock_skew_secs: 60,
            jwt_audience: None,
            allow_guests: true,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `PATIENT_JWT_SECRET`: JWT signing secret
    /// - `PATIENT_JWT_EXPIRATION_SECS`: JWT token expiration (default: 86400)
    /// - `PATIENT_JWT_CLOCK_SKEW_SECS`: JWT clock skew tolerance (default: 60)
    /// - `PATIENT_JWT_AUDIENCE`: Expected `aud` claim; unset means audience
    ///   is not enforced
    /// - `PATIENT_ALLOW_GUESTS`: Whether X-Guest-Id is accepted (default: true)
    pub fn from_env() -> Self {
        let secret_str = std::env::var("PATIENT_JWT_SECRET")
            .unwrap_or_else(|_| "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION".to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("PATIENT_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86400),
            jwt_clock_skew_secs: std::env::var("PATIENT_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            jwt_audience: std::env::var("PATIENT_JWT_AUDIENCE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            allow_guests: std::env::var("PATIENT_ALLOW_GUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate the authentication configuration for production use.
    ///
    /// Called at server startup so insecure defaults never make it into a
    /// production environment. In development mode, warnings are logged but
    /// the server continues.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("PATIENT_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set PATIENT_JWT_SECRET to a secure value. \
                     PATIENT_ENVIRONMENT={}",
                    environment
                )));
            } else {
                tracing::warn!(
                    "⚠️  SECURITY WARNING: Using insecure default JWT secret. \
                     This is acceptable for local development but MUST be changed \
                     before deploying. Set PATIENT_JWT_SECRET environment variable \
                     to a secure random value (minimum 32 characters)."
                );
            }
        }

        if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            } else if !self.jwt_secret.is_insecure_default() {
                tracing::warn!(
                    "⚠️  SECURITY WARNING: JWT secret is short ({} chars). \
                     For production, use at least 32 characters. \
                     Set PATIENT_JWT_SECRET to a longer secure value.",
                    self.jwt_secret.len()
                );
            }
        }

        Ok(())
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION".to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(
            "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION"
                .to_string()
                .into(),
        )),
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims structure.
///
/// Only the standard claims are used; the `sub` claim carries the caller's
/// identity string (username or external account id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller identity)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Audience, when the issuer sets one. Only checked against
    /// `AuthConfig::jwt_audience` when that is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// Create new claims for a subject using a clock.
    pub fn new(subject: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();

        Self {
            sub: subject,
            iat: now,
            exp: now + expiration_secs,
            aud: None,
        }
    }

    /// Check if the token has expired according to a clock.
    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authentication context extracted from request.
///
/// This is injected into Axum request extensions after successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Normalized user id (stable UUID for this subject)
    pub user_id: Uuid,

    /// Raw subject string the id was derived from
    pub subject: String,

    /// Whether this caller arrived via the guest fallback
    pub guest: bool,
}

impl AuthContext {
    pub fn authenticated(subject: String) -> Self {
        Self {
            user_id: normalize_user_id(&subject),
            subject,
            guest: false,
        }
    }

    pub fn guest(guest_id: String) -> Self {
        Self {
            user_id: normalize_user_id(&guest_id),
            subject: guest_id,
            guest: true,
        }
    }
}

// ============================================================================
// AUTHENTICATION FUNCTIONS
// ============================================================================

/// Validate JWT claim times using our own clock logic.
///
/// This is separated from signature validation so we can:
/// 1. Handle broken CI environments (pre-epoch clocks) gracefully
/// 2. Make tests fully deterministic with injected clocks
/// 3. Apply custom clock skew policies
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    // Check expiration (exp): allow slightly-in-the-past within leeway
    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }

    Ok(())
}

/// Validate a JWT token and extract claims.
///
/// This performs signature validation ONLY (no time validation) to avoid
/// the `SystemTime::now().duration_since(UNIX_EPOCH).expect()` panic path
/// in `jsonwebtoken`. We do our own time validation with injected clocks.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    // Decode with signature validation ONLY (skip exp/nbf validation)
    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false; // We'll do this ourselves with our clock
    validation.validate_nbf = false;
    // jsonwebtoken rejects any `aud`-bearing token unless an expected audience
    // is registered. Audience is our policy check below, not the library's:
    // tokens from issuers that stamp an audience must still verify when
    // PATIENT_JWT_AUDIENCE is unset.
    validation.validate_aud = false;
    // Keep required_spec_claims with "exp" to ensure it's present
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;

    let now = config.clock.now_epoch_secs();

    // Fail loud if production clock returns pre-epoch time
    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error(
            "Server time configuration error - please contact support",
        ));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    if claims.sub.trim().is_empty() {
        return Err(ApiError::invalid_token("Token has an empty subject"));
    }

    if let Some(expected) = &config.jwt_audience {
        match claims.aud.as_deref() {
            Some(aud) if aud == expected => {}
            Some(_) => {
                return Err(ApiError::invalid_token(
                    "Token audience does not match this service",
                ));
            }
            None => {
                return Err(ApiError::invalid_token("Token is missing an audience claim"));
            }
        }
    }

    Ok(claims)
}

/// Generate a JWT token for a subject.
///
/// Returns the encoded token string.
pub fn generate_jwt_token(config: &AuthConfig, subject: String) -> ApiResult<String> {
    let mut claims = Claims::new(subject, config.jwt_expiration_secs, &*config.clock);
    claims.aud = config.jwt_audience.clone();

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Authenticate a request using either a Bearer JWT or the guest header.
///
/// This is the main authentication function. It checks, in order:
/// 1. Authorization: Bearer header for JWT authentication
/// 2. X-Guest-Id header for anonymous guest identity (when allowed)
///
/// Returns the authentication context if successful.
pub fn authenticate(
    config: &AuthConfig,
    auth_header: Option<&str>,
    guest_id_header: Option<&str>,
) -> ApiResult<AuthContext> {
    if let Some(auth_value) = auth_header {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            let claims = validate_jwt_token(config, token)?;
            return Ok(AuthContext::authenticated(claims.sub));
        } else {
            return Err(ApiError::invalid_token(
                "Authorization header must use Bearer scheme",
            ));
        }
    }

    if config.allow_guests {
        if let Some(guest_id) = guest_id_header {
            let trimmed = guest_id.trim();
            if !trimmed.is_empty() {
                return Ok(AuthContext::guest(trimmed.to_string()));
            }
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required: provide Authorization or X-Guest-Id header",
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    fn test_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.jwt_secret =
            JwtSecret::new("test_secret".to_string()).expect("Test secret should be valid");
        config.clock = Arc::new(test_clocks::valid()); // Use deterministic clock
        config
    }

    #[test]
    fn test_jwt_generation_and_validation() -> ApiResult<()> {
        let config = test_config();

        let token = generate_jwt_token(&config, "alice".to_string())?;
        let claims = validate_jwt_token(&config, &token)?;

        assert_eq!(claims.sub, "alice");
        assert!(!claims.is_expired(&test_clocks::valid()));
        Ok(())
    }

    #[test]
    fn test_expired_token() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_expiration_secs = -1; // Already expired

        let token = generate_jwt_token(&config, "alice".to_string())?;

        config.clock = Arc::new(test_clocks::future());

        let result = validate_jwt_token(&config, &token);
        assert!(result.is_err());

        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::TokenExpired);
        }
        Ok(())
    }

    /// Encode claims directly, bypassing `generate_jwt_token`, so tests can
    /// shape the `aud` claim the way external issuers (e.g. Supabase) do.
    fn encode_claims(config: &AuthConfig, claims: &Claims) -> String {
        let key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
        encode(&Header::new(config.jwt_algorithm), claims, &key)
            .expect("Test claims should encode")
    }

    #[test]
    fn test_foreign_audience_accepted_when_not_enforced() -> ApiResult<()> {
        let config = test_config();
        assert!(config.jwt_audience.is_none());

        let mut claims = Claims::new("alice".to_string(), 3600, &*config.clock);
        claims.aud = Some("some-other-service".to_string());
        let token = encode_claims(&config, &claims);

        let validated = validate_jwt_token(&config, &token)?;
        assert_eq!(validated.sub, "alice");
        Ok(())
    }

    #[test]
    fn test_audience_match_required_when_configured() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_audience = Some("authenticated".to_string());

        // Tokens we mint carry the configured audience and validate.
        let token = generate_jwt_token(&config, "alice".to_string())?;
        assert_eq!(validate_jwt_token(&config, &token)?.sub, "alice");

        // A different audience is rejected.
        let mut claims = Claims::new("alice".to_string(), 3600, &*config.clock);
        claims.aud = Some("some-other-service".to_string());
        let result = validate_jwt_token(&config, &encode_claims(&config, &claims));
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::InvalidToken);
        }

        // So is a token with no audience at all.
        claims.aud = None;
        let result = validate_jwt_token(&config, &encode_claims(&config, &claims));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_authenticate_with_jwt() -> ApiResult<()> {
        let config = test_config();

        let token = generate_jwt_token(&config, "alice".to_string())?;
        let auth_header = format!("Bearer {}", token);

        let ctx = authenticate(&config, Some(&auth_header), None)?;

        assert_eq!(ctx.subject, "alice");
        assert!(!ctx.guest);
        assert_eq!(ctx.user_id, normalize_user_id("alice"));
        Ok(())
    }

    #[test]
    fn test_authenticate_guest_fallback() -> ApiResult<()> {
        let config = test_config();

        let ctx = authenticate(&config, None, Some("guest-42"))?;

        assert!(ctx.guest);
        assert_eq!(ctx.subject, "guest-42");
        assert_eq!(ctx.user_id, normalize_user_id("guest-42"));
        Ok(())
    }

    #[test]
    fn test_jwt_wins_over_guest_header() -> ApiResult<()> {
        let config = test_config();

        let token = generate_jwt_token(&config, "alice".to_string())?;
        let auth_header = format!("Bearer {}", token);

        let ctx = authenticate(&config, Some(&auth_header), Some("guest-42"))?;

        assert!(!ctx.guest);
        assert_eq!(ctx.subject, "alice");
        Ok(())
    }

    #[test]
    fn test_guest_disabled() {
        let mut config = test_config();
        config.allow_guests = false;

        let result = authenticate(&config, None, Some("guest-42"));
        assert!(result.is_err());

        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::Unauthorized);
        }
    }

    #[test]
    fn test_blank_guest_id_rejected() {
        let config = test_config();

        let result = authenticate(&config, None, Some("   "));
        assert!(result.is_err());
    }

    #[test]
    fn test_authenticate_no_credentials() {
        let config = test_config();

        let result = authenticate(&config, None, None);
        assert!(result.is_err());

        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::Unauthorized);
        }
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let config = test_config();

        let result = authenticate(&config, Some("Basic dXNlcjpwYXNz"), None);
        assert!(result.is_err());

        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::InvalidToken);
        }
    }

    #[test]
    fn test_uuid_subject_passes_through() {
        let raw = Uuid::new_v4();
        let ctx = AuthContext::authenticated(raw.to_string());
        assert_eq!(ctx.user_id, raw);
    }

    #[test]
    fn test_clock_skew_tolerance() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_clock_skew_secs = 60;
        config.jwt_expiration_secs = 10; // Short-lived token

        let token = generate_jwt_token(&config, "alice".to_string())?;

        // 30s past expiry is still inside the leeway window
        let future_clock = FixedClock(config.clock.now_epoch_secs() + 40);
        config.clock = Arc::new(future_clock);

        assert!(validate_jwt_token(&config, &token).is_ok());
        Ok(())
    }

    #[test]
    fn test_clock_skew_beyond_tolerance() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_clock_skew_secs = 60;
        config.jwt_expiration_secs = 100;

        let token = generate_jwt_token(&config, "alice".to_string())?;

        let far_future_clock = FixedClock(config.clock.now_epoch_secs() + 200);
        config.clock = Arc::new(far_future_clock);

        let result = validate_jwt_token(&config, &token);
        assert!(result.is_err());

        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::TokenExpired);
        }

        Ok(())
    }

    #[test]
    fn test_pre_epoch_clock_fails_loud() -> ApiResult<()> {
        let mut config = test_config();

        let token = generate_jwt_token(&config, "alice".to_string())?;

        config.clock = Arc::new(FixedClock(-1000));

        let result = validate_jwt_token(&config, &token);
        assert!(result.is_err());

        if let Err(e) = result {
            assert_eq!(e.code, crate::error::ErrorCode::InternalError);
        }

        Ok(())
    }

    #[test]
    fn test_production_validation_rejects_insecure_default() {
        let _env_lock = ENV_MUTEX.lock().expect("env mutex should not be poisoned");
        let _env_guard = EnvVarGuard::set("PATIENT_ENVIRONMENT", Some("production"));
        let _secret_guard = EnvVarGuard::set("PATIENT_JWT_SECRET", None);
        let config = AuthConfig::default(); // Uses insecure default

        assert!(config.validate_for_production().is_err());
    }

    #[test]
    fn test_production_validation_allows_development() {
        let _env_lock = ENV_MUTEX.lock().expect("env mutex should not be poisoned");
        let _env_guard = EnvVarGuard::set("PATIENT_ENVIRONMENT", Some("development"));
        let config = AuthConfig::default();

        assert!(config.validate_for_production().is_ok());
    }
}
