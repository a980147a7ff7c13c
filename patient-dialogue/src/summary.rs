//! Visit summary prompt
//!
//! Builds the single summarization call for a visit and backstops the result:
//! if the doctor prescribed something and the summarizer dropped it, the exact
//! wording is appended so follow-up visits can reference it.

use once_cell::sync::Lazy;
use patient_core::{Message, MessageRole, SessionId};
use regex::Regex;
use serde_json::json;

/// Only the trailing slice of a long visit goes into the prompt.
const PROMPT_MESSAGE_WINDOW: usize = 30;

static MED_ADMIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(take|start|prescrib|rx|medication|tablet|pill|capsule|dose|dolo|ibuprofen|acetaminophen|paracetamol)\b",
    )
    .expect("medication pattern is valid")
});

/// Build the summarization prompt for one visit's messages.
pub fn build_visit_summary_prompt(
    session_id: SessionId,
    visit_number: i32,
    messages: &[Message],
) -> String {
    let start = messages.len().saturating_sub(PROMPT_MESSAGE_WINDOW);
    let brief: Vec<_> = messages[start..]
        .iter()
        .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
        .collect();

    let payload = json!({
        "session_id": session_id,
        "visit_no": visit_number,
        "messages": brief,
        "instructions": "Write a concise clinical-visit summary for retrieval (5-8 bullets max). \
            Include: presenting issue, key history, key tests/exam, treatments or medications \
            prescribed (copy exact wording from the messages; do not substitute generic names), \
            follow-up instructions, assessment direction, and open questions. \
            Do NOT invent facts not present in the messages.",
        "output_schema": {"summary_text": "string"},
    });

    format!(
        "You are summarizing a patient-doctor visit for a training system.\n\
         Rules:\n\
         - Use only the provided messages.\n\
         - Be concise and retrieval-friendly.\n\
         - Output valid JSON with exactly one key: summary_text.\n\
         \n{payload}\n\nReturn JSON now.\n"
    )
}

/// Last doctor message that looks like a medication instruction, if any.
pub fn extract_medication_instruction(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::Doctor)
        .map(|m| m.content.trim())
        .filter(|text| !text.is_empty() && MED_ADMIN_PATTERN.is_match(text))
        .next_back()
}

/// Append the prescription wording when the summary omitted it.
pub fn ensure_medication_in_summary(summary: &str, messages: &[Message]) -> String {
    let Some(med_text) = extract_medication_instruction(messages) else {
        return summary.to_string();
    };
    if summary.to_lowercase().contains(&med_text.to_lowercase()) {
        return summary.to_string();
    }
    let trimmed = summary.trim_end();
    if trimmed.is_empty() {
        format!("- Treatments/Medications: {med_text}")
    } else {
        format!("{trimmed}\n- Treatments/Medications: {med_text}")
    }
}
