//! Enumerations shared across the workspace

use serde::{Deserialize, Serialize};

/// Status of a session. Transitions are one-way: `Active` -> `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// Per-user-per-case progress status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Solved,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "NOT_STARTED",
            ProgressStatus::InProgress => "IN_PROGRESS",
            ProgressStatus::Solved => "SOLVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(ProgressStatus::NotStarted),
            "IN_PROGRESS" => Some(ProgressStatus::InProgress),
            "SOLVED" => Some(ProgressStatus::Solved),
            _ => None,
        }
    }
}

/// Role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Doctor,
    Patient,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::Doctor => "doctor",
            MessageRole::Patient => "patient",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "doctor" => Some(MessageRole::Doctor),
            "patient" => Some(MessageRole::Patient),
            "system" => Some(MessageRole::System),
            _ => None,
        }
    }
}

/// Status of a deferred evaluation artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactStatus {
    Pending,
    Evaluated,
    Failed,
}

impl ArtifactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::Pending => "PENDING",
            ArtifactStatus::Evaluated => "EVALUATED",
            ArtifactStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ArtifactStatus::Pending),
            "EVALUATED" => Some(ArtifactStatus::Evaluated),
            "FAILED" => Some(ArtifactStatus::Failed),
            _ => None,
        }
    }
}

/// Kind of a progressive-disclosure chunk within a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Baseline,
    Symptoms,
    History,
    Exam,
    Tests,
    Assessment,
    Plan,
}

impl ChunkKind {
    pub fn is_narrative(&self) -> bool {
        !matches!(self, ChunkKind::Exam | ChunkKind::Tests)
    }
}

/// Where a patient utterance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Llm,
    Scripted,
    SystemIntro,
    ToolGate,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Llm => "llm",
            ResponseSource::Scripted => "scripted",
            ResponseSource::SystemIntro => "system_intro",
            ResponseSource::ToolGate => "tool_gate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "llm" => Some(ResponseSource::Llm),
            "scripted" => Some(ResponseSource::Scripted),
            "system_intro" => Some(ResponseSource::SystemIntro),
            "tool_gate" => Some(ResponseSource::ToolGate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [SessionStatus::Active, SessionStatus::Completed] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            ProgressStatus::NotStarted,
            ProgressStatus::InProgress,
            ProgressStatus::Solved,
        ] {
            assert_eq!(ProgressStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("paused"), None);
    }

    #[test]
    fn response_source_round_trips() {
        for source in [
            ResponseSource::Llm,
            ResponseSource::Scripted,
            ResponseSource::SystemIntro,
            ResponseSource::ToolGate,
        ] {
            assert_eq!(ResponseSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(ResponseSource::parse("oracle"), None);
    }

    #[test]
    fn completed_is_terminal() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
    }
}
