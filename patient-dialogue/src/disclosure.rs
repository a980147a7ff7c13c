//! Progressive disclosure engine
//!
//! Selects which case chunks the patient may reveal on a given turn. The
//! selection is deterministic: chunks are gated by visit number, detail depth,
//! and tool availability, then matched against the doctor's wording by tag and
//! token overlap.

use patient_core::policy::AllowedTools;
use patient_core::{Case, CaseChunk, ChunkKind, ResponseSource};
use std::collections::HashSet;

/// How many narrative facts a single free-text turn may disclose.
const NARRATIVE_FACTS_PER_TURN: usize = 2;

/// Gates applied when selecting eligible chunks for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisclosureContext {
    pub visit_no: i32,
    pub max_depth: i32,
    pub tools: AllowedTools,
}

impl DisclosureContext {
    /// Derive the context for a visit from the static policy table.
    pub fn for_visit(visit_no: i32) -> Self {
        Self {
            visit_no,
            max_depth: patient_core::policy::max_detail_depth(visit_no),
            tools: patient_core::policy::allowed_tools(visit_no),
        }
    }
}

/// The patient's reply to one doctor turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientReply {
    pub utterance: String,
    pub new_fact_ids: Vec<String>,
    pub performed_exams: Vec<String>,
    pub performed_tests: Vec<String>,
    pub source: ResponseSource,
}

impl PatientReply {
    fn scripted(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            new_fact_ids: Vec::new(),
            performed_exams: Vec::new(),
            performed_tests: Vec::new(),
            source: ResponseSource::Scripted,
        }
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Lowercased alphanumeric tokens of length >= 3.
fn tokenize(s: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut current = String::new();
    for ch in s.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            current.push(lower);
        } else if !current.is_empty() {
            if current.len() >= 3 {
                out.insert(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= 3 {
        out.insert(current);
    }
    out
}

/// Chunks reachable in the current visit under the given gates, ordered by
/// (stage, chunk_id).
pub fn eligible_chunks<'a>(case: &'a Case, ctx: &DisclosureContext) -> Vec<&'a CaseChunk> {
    let mut out: Vec<&CaseChunk> = case
        .chunks
        .iter()
        .filter(|ch| ch.visit_no == ctx.visit_no)
        .filter(|ch| ch.detail_depth <= ctx.max_depth)
        .filter(|ch| match ch.kind {
            ChunkKind::Tests => ctx.tools.tests,
            ChunkKind::Exam => ctx.tools.exam,
            _ => true,
        })
        .collect();
    out.sort_by(|a, b| (a.stage, &a.chunk_id).cmp(&(b.stage, &b.chunk_id)));
    out
}

fn overlap_score(query: &HashSet<String>, chunk: &CaseChunk) -> usize {
    let tags: HashSet<String> = chunk.tags.iter().map(|t| t.to_lowercase()).collect();
    let content = tokenize(&chunk.content);
    query.intersection(&tags).count() * 5 + query.intersection(&content).count()
}

/// Pick up to `k` undisclosed chunks best matching the doctor's wording.
/// Falls back to eligibility order when nothing scores.
fn pick_new_facts<'a>(
    doctor_text: &str,
    eligible: &[&'a CaseChunk],
    disclosed: &HashSet<&str>,
    k: usize,
) -> Vec<&'a CaseChunk> {
    let query = tokenize(doctor_text);
    let mut scored: Vec<(usize, i32, &str, &CaseChunk)> = eligible
        .iter()
        .filter(|ch| !disclosed.contains(ch.chunk_id.as_str()))
        .map(|ch| (overlap_score(&query, ch), ch.stage, ch.chunk_id.as_str(), *ch))
        .collect();
    // Zero-score chunks still rank, by stage order; an unmatched question
    // simply advances the disclosure sequence.
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(b.2)));
    scored.iter().take(k).map(|(.., ch)| *ch).collect()
}

/// Best single exam/test chunk for an explicit request, or a scripted refusal.
fn handle_exam_or_test<'a>(
    kind: ChunkKind,
    request: &str,
    eligible: &[&'a CaseChunk],
    disclosed: &HashSet<&str>,
) -> (String, Option<&'a CaseChunk>) {
    let noun = if kind == ChunkKind::Tests { "test" } else { "exam" };
    let query = tokenize(request);
    let candidates: Vec<&CaseChunk> = eligible.iter().filter(|ch| ch.kind == kind).copied().collect();

    let best = candidates
        .iter()
        .filter(|ch| !disclosed.contains(ch.chunk_id.as_str()))
        .map(|ch| (overlap_score(&query, ch), *ch))
        .max_by_key(|(score, _)| *score)
        .map(|(_, ch)| ch);

    match best {
        Some(ch) => (ch.content.clone(), Some(ch)),
        None if candidates.is_empty() => {
            (format!("I can't provide {noun} findings right now."), None)
        }
        None => (
            format!("No additional {noun} findings beyond what I've already shared."),
            None,
        ),
    }
}

/// Produce the patient's scripted reply to a doctor turn.
///
/// `exam:` and `test:` prefixes address the respective tools; anything else
/// is treated as history taking and discloses the best-matching narrative
/// chunks.
pub fn respond(
    doctor_text: &str,
    case: &Case,
    ctx: &DisclosureContext,
    disclosed_fact_ids: &[String],
) -> PatientReply {
    let disclosed: HashSet<&str> = disclosed_fact_ids.iter().map(String::as_str).collect();
    let eligible = eligible_chunks(case, ctx);
    let raw = doctor_text.trim();
    let lower = raw.to_lowercase();

    if let Some(rest) = lower.strip_prefix("exam:") {
        if !ctx.tools.exam {
            let mut reply =
                PatientReply::scripted("I'd prefer not to do an examination right now.");
            reply.source = ResponseSource::ToolGate;
            return reply;
        }
        let request = normalize(rest);
        let (findings, chunk) = handle_exam_or_test(ChunkKind::Exam, &request, &eligible, &disclosed);
        let mut reply = PatientReply::scripted(findings);
        reply
            .performed_exams
            .push(if request.is_empty() { "exam".to_string() } else { request });
        if let Some(ch) = chunk {
            reply.new_fact_ids.push(ch.chunk_id.clone());
        }
        return reply;
    }

    if let Some(rest) = lower.strip_prefix("test:") {
        if !ctx.tools.tests {
            let mut reply =
                PatientReply::scripted("I don't think tests are available at this stage.");
            reply.source = ResponseSource::ToolGate;
            return reply;
        }
        let request = normalize(rest);
        let (findings, chunk) =
            handle_exam_or_test(ChunkKind::Tests, &request, &eligible, &disclosed);
        let mut reply = PatientReply::scripted(findings);
        reply
            .performed_tests
            .push(if request.is_empty() { "test".to_string() } else { request });
        if let Some(ch) = chunk {
            reply.new_fact_ids.push(ch.chunk_id.clone());
        }
        return reply;
    }

    let narrative: Vec<&CaseChunk> = eligible
        .iter()
        .filter(|ch| ch.kind.is_narrative())
        .copied()
        .collect();
    let picked = pick_new_facts(raw, &narrative, &disclosed, NARRATIVE_FACTS_PER_TURN);

    if picked.is_empty() {
        return PatientReply::scripted("I'm not sure what else to add right now.");
    }

    let mut parts = Vec::new();
    let mut reply = PatientReply::scripted(String::new());
    for ch in picked {
        if !ch.content.is_empty() {
            parts.push(ch.content.as_str());
        }
        reply.new_fact_ids.push(ch.chunk_id.clone());
    }
    reply.utterance = parts.join(" ");
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use patient_core::{Case, CaseChunk, ChunkKind};

    fn chunk(id: &str, visit: i32, stage: i32, kind: ChunkKind, depth: i32, content: &str, tags: &[&str]) -> CaseChunk {
        CaseChunk {
            chunk_id: id.into(),
            visit_no: visit,
            stage,
            kind,
            detail_depth: depth,
            content: content.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample_case() -> Case {
        Case {
            case_id: "case-1".into(),
            title: "Abdominal pain".into(),
            difficulty: None,
            tags: vec![],
            short_prompt: None,
            is_published: true,
            version: 1,
            dx: Some("appendicitis".into()),
            case_type: None,
            chunks: vec![
                chunk("c-base", 1, 0, ChunkKind::Baseline, 1, "My stomach hurts.", &[]),
                chunk("c-pain", 1, 1, ChunkKind::Symptoms, 1, "The pain started near my navel and moved right.", &["pain", "location"]),
                chunk("c-fever", 1, 2, ChunkKind::Symptoms, 1, "I have had a low fever since yesterday.", &["fever"]),
                chunk("c-deep", 1, 3, ChunkKind::History, 3, "My appetite vanished completely.", &["appetite"]),
                chunk("c-exam", 1, 4, ChunkKind::Exam, 1, "Tenderness in the right lower quadrant.", &["abdomen"]),
                chunk("c-lab", 2, 0, ChunkKind::Tests, 2, "White cell count is elevated.", &["blood", "labs"]),
            ],
        }
    }

    #[test]
    fn visit_one_hides_deep_and_test_chunks() {
        let ctx = DisclosureContext::for_visit(1);
        let case = sample_case();
        let ids: Vec<&str> = eligible_chunks(&case, &ctx)
            .iter()
            .map(|c| c.chunk_id.as_str())
            .collect();
        assert_eq!(ids, vec!["c-base", "c-pain", "c-fever", "c-exam"]);
    }

    #[test]
    fn tag_match_beats_stage_order() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(1);
        let reply = respond("Any fever or chills?", &case, &ctx, &[]);
        assert_eq!(reply.new_fact_ids[0], "c-fever");
        assert!(reply.utterance.contains("low fever"));
    }

    #[test]
    fn unmatched_question_falls_back_to_stage_order() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(1);
        let reply = respond("zzz qqq xyzzy", &case, &ctx, &[]);
        assert_eq!(reply.new_fact_ids, vec!["c-base".to_string(), "c-pain".to_string()]);
    }

    #[test]
    fn disclosed_facts_never_repeat() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(1);
        let disclosed: Vec<String> =
            vec!["c-base".into(), "c-pain".into(), "c-fever".into(), "c-deep".into()];
        let reply = respond("tell me more", &case, &ctx, &disclosed);
        assert!(reply.new_fact_ids.is_empty());
        assert_eq!(reply.utterance, "I'm not sure what else to add right now.");
    }

    #[test]
    fn test_tool_locked_on_first_visit() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(1);
        let reply = respond("test: blood panel", &case, &ctx, &[]);
        assert_eq!(reply.source, ResponseSource::ToolGate);
        assert!(reply.new_fact_ids.is_empty());
        assert!(reply.performed_tests.is_empty());
    }

    #[test]
    fn test_tool_unlocks_on_second_visit() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(2);
        let reply = respond("test: blood labs", &case, &ctx, &[]);
        assert_eq!(reply.new_fact_ids, vec!["c-lab".to_string()]);
        assert_eq!(reply.performed_tests, vec!["blood labs".to_string()]);
        assert!(reply.utterance.contains("White cell count"));
    }

    #[test]
    fn exam_request_records_ledger_entry() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(1);
        let reply = respond("exam: abdomen", &case, &ctx, &[]);
        assert_eq!(reply.performed_exams, vec!["abdomen".to_string()]);
        assert_eq!(reply.new_fact_ids, vec!["c-exam".to_string()]);
    }

    #[test]
    fn exhausted_exam_findings_get_fixed_reply() {
        let case = sample_case();
        let ctx = DisclosureContext::for_visit(1);
        let reply = respond("exam: abdomen", &case, &ctx, &["c-exam".to_string()]);
        assert!(reply.utterance.starts_with("No additional exam findings"));
        assert!(reply.new_fact_ids.is_empty());
    }

    #[test]
    fn tokenizer_drops_short_tokens() {
        let toks = tokenize("Is it a flu? Or an ACHE!");
        assert!(toks.contains("flu"));
        assert!(toks.contains("ache"));
        assert!(!toks.contains("is"));
        assert!(!toks.contains("an"));
    }
}
