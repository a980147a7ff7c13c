//! Agentic Patient test utilities
//!
//! Centralized fixtures and proptest strategies shared across the workspace's
//! test suites.

use chrono::Utc;
use patient_core::{
    Case, CaseChunk, ChunkKind, Message, MessageRole, Session, SessionLedger, SessionStatus,
};
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// FIXTURES
// ============================================================================

/// A small published case with chunks spanning two visits.
pub fn sample_case(case_id: &str) -> Case {
    Case {
        case_id: case_id.to_string(),
        title: "Recurring abdominal pain".to_string(),
        difficulty: Some("medium".to_string()),
        tags: vec!["gastro".to_string(), "acute".to_string()],
        short_prompt: Some("A 30-year-old with two days of abdominal pain.".to_string()),
        is_published: true,
        version: 1,
        dx: Some("appendicitis".to_string()),
        case_type: Some("surgical".to_string()),
        chunks: vec![
            chunk("b0", 1, 0, ChunkKind::Baseline, 1, "My stomach has hurt for two days.", &[]),
            chunk("s1", 1, 1, ChunkKind::Symptoms, 1, "The pain moved to my lower right side.", &["pain"]),
            chunk("s2", 1, 2, ChunkKind::Symptoms, 1, "I felt feverish last night.", &["fever"]),
            chunk("e1", 1, 3, ChunkKind::Exam, 1, "Right lower quadrant is tender to touch.", &["abdomen"]),
            chunk("t1", 2, 0, ChunkKind::Tests, 2, "Blood work shows elevated white cells.", &["blood"]),
        ],
    }
}

pub fn chunk(
    id: &str,
    visit_no: i32,
    stage: i32,
    kind: ChunkKind,
    detail_depth: i32,
    content: &str,
    tags: &[&str],
) -> CaseChunk {
    CaseChunk {
        chunk_id: id.to_string(),
        visit_no,
        stage,
        kind,
        detail_depth,
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// A fresh active session for the given user and case.
pub fn sample_session(user_id: Uuid, case_id: &str) -> Session {
    let now = Utc::now();
    Session {
        session_id: Uuid::new_v4(),
        user_id,
        case_id: case_id.to_string(),
        status: SessionStatus::Active,
        is_public: false,
        visit_number: 1,
        turn_in_visit: 0,
        ledger: SessionLedger::default(),
        ended_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_message(session_id: Uuid, role: MessageRole, turn_index: i32, content: &str) -> Message {
    Message {
        session_id,
        visit_number: 1,
        turn_index,
        role,
        content: content.to_string(),
        source: None,
        created_at: Utc::now(),
    }
}

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

pub fn chunk_kind_strategy() -> impl Strategy<Value = ChunkKind> {
    prop_oneof![
        Just(ChunkKind::Baseline),
        Just(ChunkKind::Symptoms),
        Just(ChunkKind::History),
        Just(ChunkKind::Exam),
        Just(ChunkKind::Tests),
        Just(ChunkKind::Assessment),
        Just(ChunkKind::Plan),
    ]
}

pub fn chunk_strategy() -> impl Strategy<Value = CaseChunk> {
    (
        "[a-z][a-z0-9-]{2,12}",
        1..=3i32,
        0..5i32,
        chunk_kind_strategy(),
        1..=3i32,
        "[A-Z][a-z ]{5,60}\\.",
        proptest::collection::vec("[a-z]{3,10}", 0..4),
    )
        .prop_map(|(chunk_id, visit_no, stage, kind, detail_depth, content, tags)| CaseChunk {
            chunk_id,
            visit_no,
            stage,
            kind,
            detail_depth,
            content,
            tags,
        })
}

pub fn case_strategy() -> impl Strategy<Value = Case> {
    (
        "case-[a-z0-9]{4,10}",
        "[A-Z][a-z ]{4,40}",
        proptest::collection::vec(chunk_strategy(), 1..12),
    )
        .prop_map(|(case_id, title, chunks)| Case {
            case_id,
            title,
            difficulty: None,
            tags: vec![],
            short_prompt: None,
            is_published: true,
            version: 1,
            dx: None,
            case_type: None,
            chunks,
        })
}

pub fn username_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{2,20}".prop_map(|s| s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_case_is_published_with_chunks() {
        let case = sample_case("case-x");
        assert!(case.is_published);
        assert!(!case.chunks.is_empty());
    }
}
