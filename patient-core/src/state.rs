//! Session state snapshot
//!
//! The API-facing view of a session's runtime state. The persisted columns
//! plus the doctor level and the derived visit gates, in one shape.

use crate::policy::{allowed_tools, max_detail_depth, max_visits};
use crate::{CaseId, Session, SessionId, SessionLedger, SessionStatus, UserId};
use serde::{Deserialize, Serialize};

/// Snapshot of a session handed to clients on create/get/send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionState {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: SessionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub case_id: CaseId,
    pub status: SessionStatus,
    pub visit_number: i32,
    pub turn_in_visit: i32,
    pub is_new_visit: bool,
    pub doctor_level: i32,
    pub max_visits: i32,
    pub max_detail_depth: i32,
    pub tests_unlocked: bool,
    pub disclosed_fact_ids: Vec<String>,
    pub performed_exams: Vec<String>,
    pub performed_tests: Vec<String>,
}

impl SessionState {
    /// Build the snapshot from a persisted session and the doctor level.
    pub fn from_session(session: &Session, doctor_level: i32) -> Self {
        let SessionLedger {
            disclosed_fact_ids,
            performed_exams,
            performed_tests,
            turn_no,
        } = session.ledger.clone();

        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            case_id: session.case_id.clone(),
            status: session.status,
            visit_number: session.visit_number,
            turn_in_visit: (turn_no / 2).max(session.turn_in_visit).max(0),
            is_new_visit: turn_no == 0,
            doctor_level,
            max_visits: max_visits(doctor_level),
            max_detail_depth: max_detail_depth(session.visit_number),
            tests_unlocked: allowed_tools(session.visit_number).tests,
            disclosed_fact_ids,
            performed_exams,
            performed_tests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_session_id;
    use chrono::Utc;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            session_id: new_session_id(),
            user_id: Uuid::new_v4(),
            case_id: "case-1".into(),
            status: SessionStatus::Active,
            is_public: false,
            visit_number: 2,
            turn_in_visit: 0,
            ledger: SessionLedger {
                disclosed_fact_ids: vec!["f1".into()],
                performed_exams: vec![],
                performed_tests: vec![],
                turn_no: 4,
            },
            ended_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_derives_visit_gates() {
        let state = SessionState::from_session(&session(), 2);
        assert_eq!(state.turn_in_visit, 2);
        assert!(!state.is_new_visit);
        assert_eq!(state.max_visits, 3);
        assert_eq!(state.max_detail_depth, 2);
        assert!(state.tests_unlocked);
        assert_eq!(state.disclosed_fact_ids, vec!["f1".to_string()]);
    }

    #[test]
    fn fresh_visit_is_new() {
        let mut s = session();
        s.ledger.turn_no = 0;
        s.visit_number = 1;
        let state = SessionState::from_session(&s, 0);
        assert!(state.is_new_visit);
        assert_eq!(state.turn_in_visit, 0);
        assert!(!state.tests_unlocked);
    }
}
