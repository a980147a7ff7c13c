//! Identity types for Agentic Patient entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier for a user (doctor). Bearer subjects and guest ids are both
/// normalized into this space.
pub type UserId = Uuid;

/// Identifier for a session (one attempt at a case).
pub type SessionId = Uuid;

/// Identifier for an evaluation artifact.
pub type ArtifactId = Uuid;

/// Identifier for a case. Cases use human-readable string ids
/// (e.g. "case-appendicitis-01"), immutable once assigned.
pub type CaseId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Namespace UUID for mapping non-UUID user subjects (guest ids, external
/// OAuth subjects) onto stable UUIDs via UUIDv5.
pub const USER_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x11, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30,
    0xc8,
]);

/// Generate a new random session id.
pub fn new_session_id() -> SessionId {
    Uuid::new_v4()
}

/// Generate a new random artifact id.
pub fn new_artifact_id() -> ArtifactId {
    Uuid::new_v4()
}

/// Normalize a raw subject string into a UserId.
///
/// Subjects that already parse as UUIDs are used verbatim; anything else
/// (guest ids, provider-specific subjects) is hashed into the user namespace
/// so the same subject always maps to the same row.
pub fn normalize_user_id(raw: &str) -> UserId {
    match Uuid::parse_str(raw) {
        Ok(id) => id,
        Err(_) => Uuid::new_v5(&USER_ID_NAMESPACE, raw.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_subjects_pass_through() {
        let id = Uuid::new_v4();
        assert_eq!(normalize_user_id(&id.to_string()), id);
    }

    #[test]
    fn guest_subjects_are_stable() {
        let a = normalize_user_id("guest-abc123");
        let b = normalize_user_id("guest-abc123");
        let c = normalize_user_id("guest-other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
