//! Core entity structures
//!
//! These mirror the persisted relational schema row-for-row. Database access
//! lives in `patient-api`; this crate only defines the shapes.

use crate::{
    ArtifactId, ArtifactStatus, CaseId, ChunkKind, MessageRole, ProgressStatus, ResponseSource,
    SessionId, SessionStatus, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

/// A user (doctor) practicing against cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub username: String,
    /// Doctor level; gates how many visits a session may span.
    pub level: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// One progressive-disclosure unit inside a case seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseChunk {
    pub chunk_id: String,
    /// Visit in which this chunk becomes reachable.
    pub visit_no: i32,
    /// Finer ordering within a visit.
    #[serde(default)]
    pub stage: i32,
    #[serde(default = "default_chunk_kind")]
    pub kind: ChunkKind,
    /// 1 = coarse, 2 = moderate, 3 = full detail.
    #[serde(default = "default_detail_depth")]
    pub detail_depth: i32,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_chunk_kind() -> ChunkKind {
    ChunkKind::Symptoms
}

fn default_detail_depth() -> i32 {
    1
}

/// A clinical scenario template a user can practice against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Case {
    pub case_id: CaseId,
    pub title: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub short_prompt: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub version: i32,
    /// Hidden diagnosis. Stored but never surfaced to the patient channel.
    #[serde(default)]
    pub dx: Option<String>,
    #[serde(default)]
    pub case_type: Option<String>,
    #[serde(default)]
    pub chunks: Vec<CaseChunk>,
}

impl Case {
    /// Chief complaint used for visit intros: content of the first baseline
    /// chunk, falling back to the case title.
    pub fn chief_complaint(&self) -> &str {
        self.chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Baseline)
            .map(|c| c.content.as_str())
            .unwrap_or(&self.title)
    }
}

/// One user's attempt at a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Session {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: SessionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub case_id: CaseId,
    pub status: SessionStatus,
    pub is_public: bool,
    pub visit_number: i32,
    /// Completed doctor/patient exchanges in the current visit.
    pub turn_in_visit: i32,
    /// Disclosure ledger carried between turns.
    pub ledger: SessionLedger,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub ended_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Authoritative per-session disclosure ledger, persisted as `graph_state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionLedger {
    #[serde(default)]
    pub disclosed_fact_ids: Vec<String>,
    #[serde(default)]
    pub performed_exams: Vec<String>,
    #[serde(default)]
    pub performed_tests: Vec<String>,
    /// Raw message-granular turn counter (doctor = odd, patient = even).
    #[serde(default)]
    pub turn_no: i32,
}

/// A single transcript message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: SessionId,
    pub visit_number: i32,
    pub turn_index: i32,
    pub role: MessageRole,
    pub content: String,
    /// Provenance of a patient-side message. Doctor messages carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Summary of one visit, used for returning-patient intros and review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VisitSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: SessionId,
    pub visit_number: i32,
    pub summary: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Per-user-per-case progress row. At most one per (user, case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserCaseProgress {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub case_id: CaseId,
    pub status: ProgressStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub last_session_id: Option<SessionId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub solved_session_id: Option<SessionId>,
    /// Set exactly once, on the first completion.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub solved_at: Option<Timestamp>,
}

impl UserCaseProgress {
    /// Synthesized row for a user who has never touched the case.
    pub fn not_started(user_id: UserId, case_id: CaseId) -> Self {
        Self {
            user_id,
            case_id,
            status: ProgressStatus::NotStarted,
            last_session_id: None,
            solved_session_id: None,
            solved_at: None,
        }
    }
}

/// Deferred evaluation payload attached to a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvaluationArtifact {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub artifact_id: ArtifactId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: SessionId,
    pub status: ArtifactStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub payload: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}
