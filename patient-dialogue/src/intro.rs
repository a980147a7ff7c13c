//! Visit intro composition
//!
//! The patient opens every visit. The first visit gets a greeting; follow-up
//! visits recap the previous visit's summary when one exists. The intro is
//! persisted at turn_index 0 by the caller.

/// Compose the patient's opening line for a visit.
pub fn compose_visit_intro(visit_number: i32, last_visit_summary: Option<&str>) -> String {
    if visit_number <= 1 {
        return "Hi, thanks for seeing me today. I'm the patient for this case, and my main \
                concern is that I've been feeling unwell lately. Please ask me any questions \
                you need so I can give you the full picture."
            .to_string();
    }

    match last_visit_summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) => {
            let mut recap = summary.to_string();
            if !recap.ends_with(['.', '!', '?']) {
                recap.push('.');
            }
            format!(
                "Welcome back. Here's a brief recap from last time: {recap} Today I'd like to \
                 discuss what we should focus on next."
            )
        }
        None => "Welcome back. I don't have a summary from our last visit, but this is a \
                 follow-up. Today I'd like to discuss what we should focus on next."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visit_greets() {
        let intro = compose_visit_intro(1, None);
        assert!(intro.starts_with("Hi, thanks for seeing me today."));
    }

    #[test]
    fn followup_recaps_summary_with_terminal_punctuation() {
        let intro = compose_visit_intro(2, Some("Fever improving, labs pending"));
        assert!(intro.contains("Fever improving, labs pending."));
        assert!(intro.starts_with("Welcome back."));
    }

    #[test]
    fn followup_without_summary_still_opens() {
        let intro = compose_visit_intro(3, Some("   "));
        assert!(intro.contains("I don't have a summary"));
    }
}
