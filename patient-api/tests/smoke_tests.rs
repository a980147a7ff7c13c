//! End-to-end smoke tests for the Agentic Patient API
//!
//! These run against a real Postgres instance (connection from the usual
//! PATIENT_DB_* environment variables) and are gated behind the `db-tests`
//! feature:
//!
//! ```sh
//! cargo test -p patient-api --features db-tests
//! ```
#![cfg(feature = "db-tests")]

use patient_api::services::{session as session_svc, turn, visit};
use patient_api::{run_migrations, ApiResult, DbClient, DbConfig};
use patient_core::{
    normalize_user_id, ArtifactStatus, ProgressStatus, ResponseSource, SessionStatus,
};
use patient_llm::ScriptedProvider;
use serde_json::json;
use uuid::Uuid;

async fn test_db() -> ApiResult<DbClient> {
    let config = DbConfig::from_env();
    let db = DbClient::from_config(&config)?;
    run_migrations(db.pool()).await?;
    Ok(db)
}

/// Insert a published two-visit case and return its id.
async fn seed_case(db: &DbClient) -> ApiResult<String> {
    let case_id = format!("smoke-case-{}", Uuid::new_v4().simple());
    let seed = json!({
        "chunks": [
            {
                "chunk_id": "f1",
                "visit_no": 1,
                "stage": 0,
                "kind": "symptoms",
                "detail_depth": 1,
                "content": "Dry cough for the past three weeks, worse at night.",
                "tags": ["cough", "night"]
            },
            {
                "chunk_id": "f2",
                "visit_no": 1,
                "stage": 1,
                "kind": "history",
                "detail_depth": 2,
                "content": "Started a new blood pressure medication a month ago.",
                "tags": ["medication", "history"]
            },
            {
                "chunk_id": "f3",
                "visit_no": 2,
                "stage": 0,
                "kind": "symptoms",
                "detail_depth": 1,
                "content": "The cough eased within a week of stopping the medication.",
                "tags": ["cough", "improvement"]
            }
        ],
        "dx": "ACE inhibitor induced cough",
        "case_type": "outpatient"
    });

    let conn = db.get_conn().await?;
    conn.execute(
        "INSERT INTO cases (case_id, title, difficulty, tags, short_prompt, is_published, seed)
         VALUES ($1, $2, $3, $4, $5, true, $6)",
        &[
            &case_id,
            &"Persistent dry cough",
            &Some("easy".to_string()),
            &vec!["cough".to_string(), "medication".to_string()],
            &Some("A 54-year-old with a nagging dry cough.".to_string()),
            &seed,
        ],
    )
    .await?;

    Ok(case_id)
}

#[tokio::test]
async fn smoke_test_full_session_lifecycle() -> ApiResult<()> {
    let db = test_db().await?;
    let case_id = seed_case(&db).await?;

    let subject = format!("smoke-user-{}", Uuid::new_v4().simple());
    let user_id = normalize_user_id(&subject);
    let user = db.user_get_or_create(user_id, &subject, true).await?;

    // Create: the patient opens the first visit.
    let envelope = session_svc::create_or_resume(&db, &user, &case_id, 12).await?;
    assert!(!envelope.resumed);
    assert_eq!(envelope.state.visit_number, 1);
    assert_eq!(envelope.state.turn_in_visit, 0);
    assert_eq!(envelope.messages.len(), 1, "intro message persisted");
    assert_eq!(
        envelope.messages[0].source,
        Some(ResponseSource::SystemIntro),
        "intro carries its provenance"
    );

    // Creating again resumes the same attempt.
    let resumed = session_svc::create_or_resume(&db, &user, &case_id, 12).await?;
    assert!(resumed.resumed);
    assert_eq!(resumed.session_id, envelope.session_id);

    // One doctor turn through the scripted provider.
    let mut session = db
        .session_get_for_user(envelope.session_id, user.user_id)
        .await?
        .expect("session exists");
    let case = db.case_get(&case_id).await?.expect("case exists");

    let provider = ScriptedProvider;
    let response = turn::run_doctor_turn(
        &db,
        &provider,
        &mut session,
        &case,
        &user,
        "Tell me about the cough. When did it start?",
    )
    .await?;

    assert!(!response.patient_utterance.is_empty());
    assert!(
        response.new_disclosed_fact_ids.contains(&"f1".to_string()),
        "matching visit-1 chunk disclosed, got {:?}",
        response.new_disclosed_fact_ids
    );
    assert_eq!(response.state.turn_in_visit, 1);

    // Visit 2 chunks stay locked until the visit advances.
    assert!(!response.new_disclosed_fact_ids.contains(&"f3".to_string()));

    // End the visit: summary persisted, next visit opens with an intro.
    let ended = visit::end_visit(&db, &provider, &session, &user).await?;
    assert_eq!(ended.visit_number, 2);
    let summary = ended.summary.expect("non-empty visit summarized");
    assert!(summary.contains("recap"));

    let session = db
        .session_get_for_user(envelope.session_id, user.user_id)
        .await?
        .expect("session exists");
    assert_eq!(session.visit_number, 2);
    assert_eq!(session.turn_in_visit, 0);

    let visit2_messages = db.message_list_for_visit(session.session_id, 2).await?;
    assert_eq!(visit2_messages.len(), 1, "returning-patient intro at turn 0");
    assert_eq!(visit2_messages[0].source, Some(ResponseSource::SystemIntro));

    // The closed visit's summary can be read back.
    let stored = db
        .summary_get(session.session_id, 1)
        .await?
        .expect("visit 1 summary stored");
    assert_eq!(stored.visit_number, 1);
    assert_eq!(stored.summary, summary);
    assert!(db.summary_get(session.session_id, 9).await?.is_none());

    // Patient replies record which path produced them.
    let visit1_messages = db.message_list_for_visit(session.session_id, 1).await?;
    let reply = visit1_messages
        .iter()
        .find(|m| m.turn_index == 2)
        .expect("patient reply at turn 2");
    assert_eq!(reply.source, Some(ResponseSource::Scripted));
    let doctor = visit1_messages
        .iter()
        .find(|m| m.turn_index == 1)
        .expect("doctor message at turn 1");
    assert_eq!(doctor.source, None);

    // Complete: terminal status, pending artifact, SOLVED progress.
    let completed = visit::complete_session(&db, &session, &user).await?;
    assert_eq!(completed.status, SessionStatus::Completed);
    assert_eq!(completed.artifact.status, ArtifactStatus::Pending);
    assert_eq!(completed.progress.status, ProgressStatus::Solved);
    assert_eq!(
        completed.progress.solved_session_id,
        Some(session.session_id)
    );

    // Completing again is a no-op, not an error.
    let session = db
        .session_get_for_user(envelope.session_id, user.user_id)
        .await?
        .expect("session exists");
    let again = visit::complete_session(&db, &session, &user).await?;
    assert_eq!(again.artifact.artifact_id, completed.artifact.artifact_id);
    assert_eq!(
        again.progress.solved_at, completed.progress.solved_at,
        "solved_at is set once"
    );

    // Create after solve hands back the solved session read-only.
    let after = session_svc::create_or_resume(&db, &user, &case_id, 12).await?;
    assert!(!after.resumed);
    assert_eq!(after.session_id, session.session_id);
    assert_eq!(after.state.status, SessionStatus::Completed);

    Ok(())
}

#[tokio::test]
async fn smoke_test_turn_replay_is_idempotent() -> ApiResult<()> {
    let db = test_db().await?;
    let case_id = seed_case(&db).await?;

    let subject = format!("smoke-replay-{}", Uuid::new_v4().simple());
    let user = db
        .user_get_or_create(normalize_user_id(&subject), &subject, true)
        .await?;

    let envelope = session_svc::create_or_resume(&db, &user, &case_id, 12).await?;
    let case = db.case_get(&case_id).await?.expect("case exists");
    let provider = ScriptedProvider;

    let mut session = db
        .session_get_for_user(envelope.session_id, user.user_id)
        .await?
        .expect("session exists");
    turn::run_doctor_turn(&db, &provider, &mut session, &case, &user, "Any fevers?").await?;

    // Replay with the stale session: same turn slots, writes are no-ops.
    let mut stale = db
        .session_get_for_user(envelope.session_id, user.user_id)
        .await?
        .expect("session exists");
    stale.ledger.turn_no = 0;
    stale.turn_in_visit = 0;
    turn::run_doctor_turn(&db, &provider, &mut stale, &case, &user, "Any fevers?").await?;

    let messages = db.message_list_for_visit(envelope.session_id, 1).await?;
    // Intro + one doctor + one patient message, despite the replay.
    assert_eq!(messages.len(), 3);

    Ok(())
}

#[tokio::test]
async fn smoke_test_problemset_search_finds_seeded_case() -> ApiResult<()> {
    let db = test_db().await?;
    let case_id = seed_case(&db).await?;

    let (cases, total) = db
        .problemset_search(None, Some("easy"), Some("cough"), 1, 100)
        .await?;

    assert!(total >= 1);
    assert!(
        cases.iter().any(|c| c.case_id == case_id),
        "seeded case appears in filtered listing"
    );

    let (none, _) = db
        .problemset_search(Some("zzz-no-such-case-term"), None, None, 1, 10)
        .await?;
    assert!(none.iter().all(|c| c.case_id != case_id));

    Ok(())
}
