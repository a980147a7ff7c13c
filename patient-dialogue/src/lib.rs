//! Patient dialogue engine
//!
//! Everything between "the doctor said something" and "the patient replied"
//! that does not require I/O: progressive disclosure over case chunks,
//! guardrails on proposed disclosures, visit intro composition, and the
//! visit-summary prompt.

pub mod disclosure;
pub mod guardrails;
pub mod intro;
pub mod summary;

pub use disclosure::{respond, DisclosureContext, PatientReply};
pub use guardrails::{apply_guardrails, GuardrailDecision, GuardrailMode};
pub use intro::compose_visit_intro;
pub use summary::{build_visit_summary_prompt, ensure_medication_in_summary};
