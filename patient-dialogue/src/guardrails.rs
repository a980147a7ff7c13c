//! Guardrails on proposed patient responses
//!
//! Fact-id enforcement is the real policy boundary: the patient may only
//! disclose ids the disclosure engine allowed for this turn, never repeats.
//! Text hygiene on top catches obvious diagnosis reveals.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Fallback utterance when redaction empties the response.
const SAFE_FALLBACK: &str = "I can share what I'm experiencing, but I'm not sure about specifics \
                             beyond what we've discussed.";

static DIAGNOSIS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(diagnosis|i have|it is|it's)\b.*\b(cancer|tumor|appendicitis|ulcer)\b")
        .expect("diagnosis pattern is valid")
});

/// What to do when the response proposes disallowed fact ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardrailMode {
    /// First violation marks the response rejected so the caller can
    /// regenerate once; ids are filtered either way.
    RejectOnceElseStrip,
    /// Filter silently.
    StripOnly,
}

/// Outcome of guardrail evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailDecision {
    pub patient_utterance: String,
    pub new_disclosed_fact_ids: Vec<String>,
    pub safety_flags: Vec<String>,
    pub rejected: bool,
}

/// Split proposed ids into (safe, flags). Safe ids are allowed and not yet
/// disclosed.
pub fn validate_fact_ids(
    proposed: &[String],
    allowed: &HashSet<&str>,
    already_disclosed: &HashSet<&str>,
) -> (Vec<String>, Vec<String>) {
    let mut safe = Vec::new();
    let mut flags = Vec::new();
    for id in proposed {
        if !allowed.contains(id.as_str()) {
            flags.push("fact_id_not_allowed".to_string());
        } else if already_disclosed.contains(id.as_str()) {
            flags.push("fact_id_repeated".to_string());
        } else {
            safe.push(id.clone());
        }
    }
    (safe, flags)
}

/// Redact explicit diagnosis declarations; replace an emptied utterance with
/// the safe fallback.
pub fn strip_unsafe_mentions(text: &str) -> (String, Vec<String>) {
    let mut flags = Vec::new();
    let trimmed = text.trim();
    let mut out = if DIAGNOSIS_PATTERN.is_match(trimmed) {
        flags.push("utterance_redacted_possible_dx".to_string());
        DIAGNOSIS_PATTERN.replace_all(trimmed, "[redacted]").into_owned()
    } else {
        trimmed.to_string()
    };

    if out.is_empty() || out == "[redacted]" {
        out = SAFE_FALLBACK.to_string();
        flags.push("utterance_replaced_safe_fallback".to_string());
    }
    (out, flags)
}

/// Apply id filtering and text hygiene to a proposed response.
pub fn apply_guardrails(
    utterance: &str,
    proposed_fact_ids: &[String],
    upstream_flags: &[String],
    allowed_fact_ids: &HashSet<&str>,
    already_disclosed_fact_ids: &[String],
    mode: GuardrailMode,
) -> GuardrailDecision {
    let already: HashSet<&str> = already_disclosed_fact_ids.iter().map(String::as_str).collect();

    let (safe_ids, id_flags) = validate_fact_ids(proposed_fact_ids, allowed_fact_ids, &already);
    let tried_disallowed = id_flags.iter().any(|f| f == "fact_id_not_allowed");

    let mut safety_flags: Vec<String> = upstream_flags.to_vec();
    safety_flags.extend(id_flags);

    let (clean_utterance, text_flags) = strip_unsafe_mentions(utterance);
    safety_flags.extend(text_flags);

    if tried_disallowed && mode == GuardrailMode::RejectOnceElseStrip {
        safety_flags.push("guardrail_reject_regenerate".to_string());
        return GuardrailDecision {
            patient_utterance: clean_utterance,
            new_disclosed_fact_ids: safe_ids,
            safety_flags,
            rejected: true,
        };
    }

    GuardrailDecision {
        patient_utterance: clean_utterance,
        new_disclosed_fact_ids: safe_ids,
        safety_flags,
        rejected: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed<'a>(ids: &'a [&'a str]) -> HashSet<&'a str> {
        ids.iter().copied().collect()
    }

    #[test]
    fn disallowed_ids_are_dropped_and_flagged() {
        let decision = apply_guardrails(
            "The pain moved to my right side.",
            &["f1".to_string(), "f9".to_string()],
            &[],
            &allowed(&["f1", "f2"]),
            &[],
            GuardrailMode::RejectOnceElseStrip,
        );
        assert_eq!(decision.new_disclosed_fact_ids, vec!["f1".to_string()]);
        assert!(decision.rejected);
        assert!(decision.safety_flags.iter().any(|f| f == "fact_id_not_allowed"));
        assert!(decision.safety_flags.iter().any(|f| f == "guardrail_reject_regenerate"));
    }

    #[test]
    fn strip_only_never_rejects() {
        let decision = apply_guardrails(
            "ok",
            &["f9".to_string()],
            &[],
            &allowed(&["f1"]),
            &[],
            GuardrailMode::StripOnly,
        );
        assert!(!decision.rejected);
        assert!(decision.new_disclosed_fact_ids.is_empty());
    }

    #[test]
    fn repeated_ids_are_dropped_without_rejection() {
        let decision = apply_guardrails(
            "As I said, it started two days ago.",
            &["f1".to_string()],
            &[],
            &allowed(&["f1"]),
            &["f1".to_string()],
            GuardrailMode::RejectOnceElseStrip,
        );
        assert!(!decision.rejected);
        assert!(decision.new_disclosed_fact_ids.is_empty());
        assert_eq!(decision.safety_flags, vec!["fact_id_repeated".to_string()]);
    }

    #[test]
    fn diagnosis_reveal_is_redacted() {
        let (text, flags) = strip_unsafe_mentions("I think it's appendicitis honestly");
        assert!(text.contains("[redacted]"));
        assert!(flags.iter().any(|f| f == "utterance_redacted_possible_dx"));
    }

    #[test]
    fn emptied_utterance_gets_safe_fallback() {
        let (text, flags) = strip_unsafe_mentions("   ");
        assert_eq!(text, SAFE_FALLBACK);
        assert!(flags.iter().any(|f| f == "utterance_replaced_safe_fallback"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever the model proposes, disclosed ids stay inside the
            /// allowed set and never repeat prior disclosures.
            #[test]
            fn safe_ids_are_subset_of_allowed_minus_disclosed(
                proposed in proptest::collection::vec("[a-f][0-9]{1,2}", 0..8),
                allowed_pool in proptest::collection::hash_set("[a-f][0-9]{1,2}", 0..8),
                disclosed in proptest::collection::vec("[a-f][0-9]{1,2}", 0..8),
            ) {
                let allowed_refs: HashSet<&str> =
                    allowed_pool.iter().map(String::as_str).collect();
                let decision = apply_guardrails(
                    "something",
                    &proposed,
                    &[],
                    &allowed_refs,
                    &disclosed,
                    GuardrailMode::StripOnly,
                );
                for id in &decision.new_disclosed_fact_ids {
                    prop_assert!(allowed_refs.contains(id.as_str()));
                    prop_assert!(!disclosed.contains(id));
                }
            }
        }
    }

    #[test]
    fn upstream_flags_are_preserved() {
        let decision = apply_guardrails(
            "fine",
            &[],
            &["model_uncertain".to_string()],
            &allowed(&[]),
            &[],
            GuardrailMode::StripOnly,
        );
        assert_eq!(decision.safety_flags, vec!["model_uncertain".to_string()]);
    }
}
