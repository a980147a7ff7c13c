//! Visit/level policy
//!
//! The disclosure depth and tool whitelist are gated by visit number; the
//! visit cap is gated by doctor level. Pure lookups, no configuration.

/// How granular patient disclosure may get in the given visit.
/// Visit 1 stays coarse, visit 2 moderate, visit 3+ full detail.
pub fn max_detail_depth(visit_no: i32) -> i32 {
    match visit_no.max(1) {
        1 => 1,
        2 => 2,
        _ => 3,
    }
}

/// Cap on the number of visits permitted for a doctor level.
pub fn max_visits(level: i32) -> i32 {
    match level.max(0) {
        0 | 1 => 2,
        2 => 3,
        3 => 4,
        _ => 5,
    }
}

/// Doctor actions unlocked by visit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedTools {
    pub history: bool,
    pub exam: bool,
    pub tests: bool,
}

/// History taking and examination are always available; tests unlock from
/// visit 2.
pub fn allowed_tools(visit_no: i32) -> AllowedTools {
    AllowedTools {
        history: true,
        exam: true,
        tests: visit_no.max(1) >= 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_grows_with_visits() {
        assert_eq!(max_detail_depth(0), 1);
        assert_eq!(max_detail_depth(1), 1);
        assert_eq!(max_detail_depth(2), 2);
        assert_eq!(max_detail_depth(3), 3);
        assert_eq!(max_detail_depth(10), 3);
    }

    #[test]
    fn visit_cap_by_level() {
        assert_eq!(max_visits(-3), 2);
        assert_eq!(max_visits(0), 2);
        assert_eq!(max_visits(1), 2);
        assert_eq!(max_visits(2), 3);
        assert_eq!(max_visits(3), 4);
        assert_eq!(max_visits(4), 5);
        assert_eq!(max_visits(99), 5);
    }

    #[test]
    fn tests_unlock_from_second_visit() {
        assert!(!allowed_tools(1).tests);
        assert!(allowed_tools(2).tests);
        assert!(allowed_tools(1).exam);
        assert!(allowed_tools(1).history);
    }
}
