//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling via deadpool-postgres plus the full data
//! access layer. Plain parameterized SQL against the schema in `migrations/`;
//! the only server-side function is `problemset_search_cases`.

use crate::error::{ApiError, ApiResult};
use crate::types::{CaseSummary, DayCount, SubmissionView};
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use patient_core::{
    ArtifactStatus, Case, EvaluationArtifact, Message, MessageRole, ProgressStatus, ResponseSource,
    Session, SessionLedger, SessionStatus, UserCaseProgress, VisitSummary,
};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "patient".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PATIENT_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PATIENT_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PATIENT_DB_NAME").unwrap_or_else(|_| "patient".to_string()),
            user: std::env::var("PATIENT_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PATIENT_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PATIENT_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PATIENT_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool and provides all persistence
/// operations for the API.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Access the underlying pool (used by the migration runner).
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    pub async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Resolve a user row, creating it on first touch.
    ///
    /// Guest identities get a synthetic `guest-<uuid prefix>` username;
    /// authenticated subjects keep their subject string.
    pub async fn user_get_or_create(
        &self,
        user_id: Uuid,
        subject: &str,
        guest: bool,
    ) -> ApiResult<patient_core::User> {
        let conn = self.get_conn().await?;

        let username = if guest {
            format!("guest-{}", &user_id.simple().to_string()[..8])
        } else {
            subject.to_string()
        };

        let row = conn
            .query_one(
                "INSERT INTO users (user_id, username)
                 VALUES ($1, $2)
                 ON CONFLICT (user_id)
                 DO UPDATE SET updated_at = now()
                 RETURNING user_id, username, level, created_at, updated_at",
                &[&user_id, &username],
            )
            .await?;

        Ok(row_to_user(&row))
    }

    /// Look up a user by id.
    pub async fn user_get(&self, user_id: Uuid) -> ApiResult<Option<patient_core::User>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT user_id, username, level, created_at, updated_at
                 FROM users WHERE user_id = $1",
                &[&user_id],
            )
            .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    /// Look up a user by username (case-sensitive).
    pub async fn user_get_by_username(
        &self,
        username: &str,
    ) -> ApiResult<Option<patient_core::User>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT user_id, username, level, created_at, updated_at
                 FROM users WHERE username = $1",
                &[&username],
            )
            .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    // ========================================================================
    // CASE OPERATIONS
    // ========================================================================

    /// Get a published case with its full seed (chunks, dx).
    pub async fn case_get(&self, case_id: &str) -> ApiResult<Option<Case>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT case_id, title, difficulty, tags, short_prompt,
                        is_published, version, seed
                 FROM cases WHERE case_id = $1 AND is_published",
                &[&case_id],
            )
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_case(&row)?)),
            None => Ok(None),
        }
    }

    /// Search published cases through the `problemset_search_cases` function.
    ///
    /// Pagination is pre-clamped by the caller; the function clamps again
    /// server-side, so out-of-range values can never produce a bad offset.
    pub async fn problemset_search(
        &self,
        search: Option<&str>,
        difficulty: Option<&str>,
        tag: Option<&str>,
        page: i32,
        limit: i32,
    ) -> ApiResult<(Vec<CaseSummary>, i64)> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT case_id, title, difficulty, tags, short_prompt, total_count
                 FROM problemset_search_cases($1, $2, $3, $4, $5)",
                &[&search, &difficulty, &tag, &page, &limit],
            )
            .await?;

        let total = rows
            .first()
            .map(|r| r.get::<_, i64>("total_count"))
            .unwrap_or(0);

        let cases = rows
            .iter()
            .map(|row| CaseSummary {
                case_id: row.get("case_id"),
                title: row.get("title"),
                difficulty: row.get("difficulty"),
                tags: row.get("tags"),
                short_prompt: row.get("short_prompt"),
            })
            .collect();

        Ok((cases, total))
    }

    // ========================================================================
    // SESSION OPERATIONS
    // ========================================================================

    /// Insert a new active session.
    pub async fn session_create(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        case_id: &str,
    ) -> ApiResult<Session> {
        let conn = self.get_conn().await?;

        let ledger = serde_json::to_value(SessionLedger::default())?;

        let row = conn
            .query_one(
                "INSERT INTO sessions (session_id, user_id, case_id, graph_state)
                 VALUES ($1, $2, $3, $4)
                 RETURNING session_id, user_id, case_id, status, is_public,
                           visit_number, turn_in_visit, graph_state, ended_at,
                           created_at, updated_at",
                &[&session_id, &user_id, &case_id, &ledger],
            )
            .await?;

        row_to_session(&row)
    }

    /// Get a session owned by the given user.
    ///
    /// Ownership is enforced in the query: foreign sessions are
    /// indistinguishable from missing ones.
    pub async fn session_get_for_user(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> ApiResult<Option<Session>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT session_id, user_id, case_id, status, is_public,
                        visit_number, turn_in_visit, graph_state, ended_at,
                        created_at, updated_at
                 FROM sessions WHERE session_id = $1 AND user_id = $2",
                &[&session_id, &user_id],
            )
            .await?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    /// List the caller's sessions, newest first.
    pub async fn session_list(
        &self,
        user_id: Uuid,
        status: Option<SessionStatus>,
        limit: i64,
    ) -> ApiResult<Vec<Session>> {
        let conn = self.get_conn().await?;

        let status_str = status.map(|s| s.as_str());
        let rows = conn
            .query(
                "SELECT session_id, user_id, case_id, status, is_public,
                        visit_number, turn_in_visit, graph_state, ended_at,
                        created_at, updated_at
                 FROM sessions
                 WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
                 ORDER BY created_at DESC
                 LIMIT $3",
                &[&user_id, &status_str, &limit],
            )
            .await?;

        rows.iter().map(row_to_session).collect()
    }

    /// Persist the turn counter and disclosure ledger after a turn.
    pub async fn session_update_ledger(
        &self,
        session_id: Uuid,
        turn_in_visit: i32,
        ledger: &SessionLedger,
    ) -> ApiResult<()> {
        let conn = self.get_conn().await?;

        let ledger_json = serde_json::to_value(ledger)?;
        conn.execute(
            "UPDATE sessions
             SET turn_in_visit = $2, graph_state = $3, updated_at = now()
             WHERE session_id = $1",
            &[&session_id, &turn_in_visit, &ledger_json],
        )
        .await?;

        Ok(())
    }

    /// Advance the session to the next visit, resetting the per-visit turn
    /// counter and the ledger's raw turn number.
    pub async fn session_advance_visit(&self, session_id: Uuid) -> ApiResult<Session> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_one(
                "UPDATE sessions
                 SET visit_number = visit_number + 1,
                     turn_in_visit = 0,
                     graph_state = jsonb_set(graph_state, '{turn_no}', '0'),
                     updated_at = now()
                 WHERE session_id = $1
                 RETURNING session_id, user_id, case_id, status, is_public,
                           visit_number, turn_in_visit, graph_state, ended_at,
                           created_at, updated_at",
                &[&session_id],
            )
            .await?;

        row_to_session(&row)
    }

    /// Mark the session completed. `ended_at` is set once: the first
    /// completion's timestamp wins, repeat calls leave it untouched.
    pub async fn session_complete(&self, session_id: Uuid) -> ApiResult<Session> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_one(
                "UPDATE sessions
                 SET status = 'completed',
                     ended_at = COALESCE(ended_at, now()),
                     updated_at = now()
                 WHERE session_id = $1
                 RETURNING session_id, user_id, case_id, status, is_public,
                           visit_number, turn_in_visit, graph_state, ended_at,
                           created_at, updated_at",
                &[&session_id],
            )
            .await?;

        row_to_session(&row)
    }

    /// Toggle transcript sharing.
    pub async fn session_set_visibility(
        &self,
        session_id: Uuid,
        is_public: bool,
    ) -> ApiResult<Session> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_one(
                "UPDATE sessions
                 SET is_public = $2, updated_at = now()
                 WHERE session_id = $1
                 RETURNING session_id, user_id, case_id, status, is_public,
                           visit_number, turn_in_visit, graph_state, ended_at,
                           created_at, updated_at",
                &[&session_id, &is_public],
            )
            .await?;

        row_to_session(&row)
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Append a message at its (visit, turn) slot.
    ///
    /// Idempotent: an existing row at the slot short-circuits and the method
    /// returns false, so retried turns never duplicate transcript entries.
    pub async fn message_append(&self, message: &Message) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let inserted = conn
            .execute(
                "INSERT INTO messages (session_id, visit_number, turn_index, role, content, source)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (session_id, visit_number, turn_index) DO NOTHING",
                &[
                    &message.session_id,
                    &message.visit_number,
                    &message.turn_index,
                    &message.role.as_str(),
                    &message.content,
                    &message.source.map(|s| s.as_str()),
                ],
            )
            .await?;

        Ok(inserted == 1)
    }

    /// Last `n` messages of the session, in chronological order.
    pub async fn message_list_last(&self, session_id: Uuid, n: i64) -> ApiResult<Vec<Message>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT session_id, visit_number, turn_index, role, content, source, created_at
                 FROM (SELECT * FROM messages
                       WHERE session_id = $1
                       ORDER BY visit_number DESC, turn_index DESC
                       LIMIT $2) t
                 ORDER BY visit_number, turn_index",
                &[&session_id, &n],
            )
            .await?;

        rows.iter().map(row_to_message).collect()
    }

    /// All messages of one visit, in turn order.
    pub async fn message_list_for_visit(
        &self,
        session_id: Uuid,
        visit_number: i32,
    ) -> ApiResult<Vec<Message>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT session_id, visit_number, turn_index, role, content, source, created_at
                 FROM messages
                 WHERE session_id = $1 AND visit_number = $2
                 ORDER BY turn_index",
                &[&session_id, &visit_number],
            )
            .await?;

        rows.iter().map(row_to_message).collect()
    }

    // ========================================================================
    // VISIT SUMMARY OPERATIONS
    // ========================================================================

    /// Upsert the summary for one visit.
    pub async fn summary_upsert(
        &self,
        session_id: Uuid,
        visit_number: i32,
        summary: &str,
    ) -> ApiResult<()> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO visit_summaries (session_id, visit_number, summary)
             VALUES ($1, $2, $3)
             ON CONFLICT (session_id, visit_number)
             DO UPDATE SET summary = EXCLUDED.summary",
            &[&session_id, &visit_number, &summary],
        )
        .await?;

        Ok(())
    }

    /// The recorded summary for one visit, if written.
    pub async fn summary_get(
        &self,
        session_id: Uuid,
        visit_number: i32,
    ) -> ApiResult<Option<VisitSummary>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT session_id, visit_number, summary, created_at
                 FROM visit_summaries
                 WHERE session_id = $1 AND visit_number = $2",
                &[&session_id, &visit_number],
            )
            .await?;

        Ok(row.map(|r| VisitSummary {
            session_id: r.get("session_id"),
            visit_number: r.get("visit_number"),
            summary: r.get("summary"),
            created_at: r.get("created_at"),
        }))
    }

    // ========================================================================
    // PROGRESS OPERATIONS
    // ========================================================================

    /// The caller's progress row for a case, if any.
    pub async fn progress_get(
        &self,
        user_id: Uuid,
        case_id: &str,
    ) -> ApiResult<Option<UserCaseProgress>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT user_id, case_id, status, last_session_id,
                        solved_session_id, solved_at
                 FROM user_case_progress
                 WHERE user_id = $1 AND case_id = $2",
                &[&user_id, &case_id],
            )
            .await?;

        row.map(|r| row_to_progress(&r)).transpose()
    }

    /// Upsert progress to IN_PROGRESS with the latest session.
    ///
    /// A SOLVED row is left as-is apart from `last_session_id`: starting a
    /// fresh attempt never downgrades a solve.
    pub async fn progress_touch_in_progress(
        &self,
        user_id: Uuid,
        case_id: &str,
        session_id: Uuid,
    ) -> ApiResult<UserCaseProgress> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_one(
                "INSERT INTO user_case_progress (user_id, case_id, status, last_session_id)
                 VALUES ($1, $2, 'IN_PROGRESS', $3)
                 ON CONFLICT (user_id, case_id)
                 DO UPDATE SET
                     last_session_id = EXCLUDED.last_session_id,
                     status = CASE WHEN user_case_progress.status = 'SOLVED'
                                   THEN 'SOLVED' ELSE 'IN_PROGRESS' END,
                     updated_at = now()
                 RETURNING user_id, case_id, status, last_session_id,
                           solved_session_id, solved_at",
                &[&user_id, &case_id, &session_id],
            )
            .await?;

        row_to_progress(&row)
    }

    /// Upsert progress to SOLVED.
    ///
    /// Idempotent: `solved_session_id` and `solved_at` are written only by the
    /// first completion; repeats keep the original values.
    pub async fn progress_mark_solved(
        &self,
        user_id: Uuid,
        case_id: &str,
        session_id: Uuid,
    ) -> ApiResult<UserCaseProgress> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_one(
                "INSERT INTO user_case_progress
                     (user_id, case_id, status, last_session_id, solved_session_id, solved_at)
                 VALUES ($1, $2, 'SOLVED', $3, $3, now())
                 ON CONFLICT (user_id, case_id)
                 DO UPDATE SET
                     status = 'SOLVED',
                     last_session_id = EXCLUDED.last_session_id,
                     solved_session_id = COALESCE(user_case_progress.solved_session_id,
                                                  EXCLUDED.solved_session_id),
                     solved_at = COALESCE(user_case_progress.solved_at, EXCLUDED.solved_at),
                     updated_at = now()
                 RETURNING user_id, case_id, status, last_session_id,
                           solved_session_id, solved_at",
                &[&user_id, &case_id, &session_id],
            )
            .await?;

        row_to_progress(&row)
    }

    /// All progress rows for the caller.
    pub async fn progress_list(&self, user_id: Uuid) -> ApiResult<Vec<UserCaseProgress>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT user_id, case_id, status, last_session_id,
                        solved_session_id, solved_at
                 FROM user_case_progress
                 WHERE user_id = $1
                 ORDER BY case_id",
                &[&user_id],
            )
            .await?;

        rows.iter().map(row_to_progress).collect()
    }

    // ========================================================================
    // EVALUATION ARTIFACTS
    // ========================================================================

    /// Create the PENDING evaluation artifact for a completed session.
    ///
    /// At most one artifact per session: a second call is a no-op that
    /// returns the existing row.
    pub async fn artifact_create_pending(
        &self,
        session_id: Uuid,
    ) -> ApiResult<EvaluationArtifact> {
        let conn = self.get_conn().await?;

        let artifact_id = patient_core::new_artifact_id();
        conn.execute(
            "INSERT INTO evaluation_artifacts (artifact_id, session_id)
             VALUES ($1, $2)
             ON CONFLICT (session_id) DO NOTHING",
            &[&artifact_id, &session_id],
        )
        .await?;

        let row = conn
            .query_one(
                "SELECT artifact_id, session_id, status, payload, created_at
                 FROM evaluation_artifacts WHERE session_id = $1",
                &[&session_id],
            )
            .await?;

        row_to_artifact(&row)
    }

    // ========================================================================
    // SUBMISSIONS
    // ========================================================================

    /// The caller's completed sessions for a case.
    pub async fn submissions_for_case(
        &self,
        user_id: Uuid,
        case_id: &str,
    ) -> ApiResult<Vec<SubmissionView>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT session_id, case_id, visit_number, is_public, created_at, ended_at
                 FROM sessions
                 WHERE user_id = $1 AND case_id = $2 AND status = 'completed'
                 ORDER BY ended_at DESC NULLS LAST",
                &[&user_id, &case_id],
            )
            .await?;

        Ok(rows.iter().map(|r| row_to_submission(r, None)).collect())
    }

    /// Completed public sessions for a case, by any user, with usernames.
    pub async fn community_submissions(&self, case_id: &str) -> ApiResult<Vec<SubmissionView>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT s.session_id, s.case_id, s.visit_number, s.is_public,
                        s.created_at, s.ended_at, u.username
                 FROM sessions s
                 JOIN users u ON u.user_id = s.user_id
                 WHERE s.case_id = $1 AND s.status = 'completed' AND s.is_public
                 ORDER BY s.ended_at DESC NULLS LAST",
                &[&case_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let username: String = r.get("username");
                row_to_submission(r, Some(username))
            })
            .collect())
    }

    /// A user's public completed sessions across all cases.
    pub async fn public_submissions_for_user(
        &self,
        user_id: Uuid,
    ) -> ApiResult<Vec<SubmissionView>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT session_id, case_id, visit_number, is_public, created_at, ended_at
                 FROM sessions
                 WHERE user_id = $1 AND status = 'completed' AND is_public
                 ORDER BY ended_at DESC NULLS LAST",
                &[&user_id],
            )
            .await?;

        Ok(rows.iter().map(|r| row_to_submission(r, None)).collect())
    }

    // ========================================================================
    // PROFILE STATS
    // ========================================================================

    /// Solved and attempted case counts for a user.
    pub async fn profile_counts(&self, user_id: Uuid) -> ApiResult<(i64, i64)> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_one(
                "SELECT
                     count(*) FILTER (WHERE status = 'SOLVED') AS solved,
                     count(*) FILTER (WHERE status <> 'NOT_STARTED') AS attempted
                 FROM user_case_progress
                 WHERE user_id = $1",
                &[&user_id],
            )
            .await?;

        Ok((row.get("solved"), row.get("attempted")))
    }

    /// Day-bucketed completion counts, oldest first. Feeds the contribution
    /// heatmap.
    pub async fn completions_by_day(&self, user_id: Uuid) -> ApiResult<Vec<DayCount>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT (ended_at AT TIME ZONE 'UTC')::date AS day, count(*) AS count
                 FROM sessions
                 WHERE user_id = $1 AND status = 'completed' AND ended_at IS NOT NULL
                 GROUP BY day
                 ORDER BY day",
                &[&user_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| DayCount {
                day: r.get("day"),
                count: r.get("count"),
            })
            .collect())
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn row_to_user(row: &Row) -> patient_core::User {
    patient_core::User {
        user_id: row.get("user_id"),
        username: row.get("username"),
        level: row.get("level"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_case(row: &Row) -> ApiResult<Case> {
    let seed: JsonValue = row.get("seed");

    #[derive(serde::Deserialize, Default)]
    struct Seed {
        #[serde(default)]
        chunks: Vec<patient_core::CaseChunk>,
        #[serde(default)]
        dx: Option<String>,
        #[serde(default)]
        case_type: Option<String>,
    }

    let seed: Seed = serde_json::from_value(seed).unwrap_or_default();

    Ok(Case {
        case_id: row.get("case_id"),
        title: row.get("title"),
        difficulty: row.get("difficulty"),
        tags: row.get("tags"),
        short_prompt: row.get("short_prompt"),
        is_published: row.get("is_published"),
        version: row.get("version"),
        dx: seed.dx,
        case_type: seed.case_type,
        chunks: seed.chunks,
    })
}

fn row_to_session(row: &Row) -> ApiResult<Session> {
    let status_str: String = row.get("status");
    let status = SessionStatus::parse(&status_str)
        .ok_or_else(|| ApiError::database_error(format!("Unknown session status: {}", status_str)))?;

    let graph_state: JsonValue = row.get("graph_state");
    let ledger: SessionLedger = serde_json::from_value(graph_state).unwrap_or_default();

    Ok(Session {
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        case_id: row.get("case_id"),
        status,
        is_public: row.get("is_public"),
        visit_number: row.get("visit_number"),
        turn_in_visit: row.get("turn_in_visit"),
        ledger,
        ended_at: row.get("ended_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_message(row: &Row) -> ApiResult<Message> {
    let role_str: String = row.get("role");
    let role = MessageRole::parse(&role_str)
        .ok_or_else(|| ApiError::database_error(format!("Unknown message role: {}", role_str)))?;

    let source = match row.get::<_, Option<String>>("source") {
        None => None,
        Some(s) => Some(ResponseSource::parse(&s).ok_or_else(|| {
            ApiError::database_error(format!("Unknown response source: {}", s))
        })?),
    };

    Ok(Message {
        session_id: row.get("session_id"),
        visit_number: row.get("visit_number"),
        turn_index: row.get("turn_index"),
        role,
        content: row.get("content"),
        source,
        created_at: row.get("created_at"),
    })
}

fn row_to_progress(row: &Row) -> ApiResult<UserCaseProgress> {
    let status_str: String = row.get("status");
    let status = ProgressStatus::parse(&status_str).ok_or_else(|| {
        ApiError::database_error(format!("Unknown progress status: {}", status_str))
    })?;

    Ok(UserCaseProgress {
        user_id: row.get("user_id"),
        case_id: row.get("case_id"),
        status,
        last_session_id: row.get("last_session_id"),
        solved_session_id: row.get("solved_session_id"),
        solved_at: row.get("solved_at"),
    })
}

fn row_to_artifact(row: &Row) -> ApiResult<EvaluationArtifact> {
    let status_str: String = row.get("status");
    let status = ArtifactStatus::parse(&status_str).ok_or_else(|| {
        ApiError::database_error(format!("Unknown artifact status: {}", status_str))
    })?;

    Ok(EvaluationArtifact {
        artifact_id: row.get("artifact_id"),
        session_id: row.get("session_id"),
        status,
        payload: row.get("payload"),
        created_at: row.get("created_at"),
    })
}

fn row_to_submission(row: &Row, username: Option<String>) -> SubmissionView {
    let created_at: DateTime<Utc> = row.get("created_at");
    SubmissionView {
        session_id: row.get("session_id"),
        case_id: row.get("case_id"),
        visit_number: row.get("visit_number"),
        is_public: row.get("is_public"),
        username,
        created_at,
        ended_at: row.get("ended_at"),
    }
}
