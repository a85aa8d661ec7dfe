//! Property-based tests for gating decisions and glob matching
//!
//! Tests for:
//! - Glob: literal self-match, `**` absorbs any suffix, `*` is exactly one segment
//! - Policy: control actions never rejected, nothing rejected while resumed,
//!   internal events never rejected

use super::policy::{SuspendPolicy, CONTROL_ACTIONS};
use crate::broker::traits::NodeId;
use crate::pattern::{AllowList, GlobPattern};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,8}"
}

fn dotted_name() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("."))
}

// ============================================================================
// GLOB PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: a name without wildcards matches itself
    #[test]
    fn literal_pattern_matches_itself(name in dotted_name()) {
        prop_assert!(GlobPattern::new(name.clone()).matches(&name));
    }

    /// Property: `prefix.**` matches the prefix and anything below it
    #[test]
    fn double_star_matches_any_suffix(prefix in dotted_name(), suffix in prop::collection::vec(segment(), 0..4)) {
        let pattern = GlobPattern::new(format!("{}.**", prefix));
        let mut name = prefix.clone();
        for part in &suffix {
            name.push('.');
            name.push_str(part);
        }
        prop_assert!(pattern.matches(&name));
    }

    /// Property: a single `*` segment never spans two segments
    #[test]
    fn single_star_is_one_segment(head in segment(), a in segment(), b in segment(), tail in segment()) {
        let pattern = GlobPattern::new(format!("{}.*.{}", head, tail));
        let one = format!("{}.{}.{}", head, a, tail);
        let two = format!("{}.{}.{}.{}", head, a, b, tail);
        prop_assert!(pattern.matches(&one));
        prop_assert!(!pattern.matches(&two));
    }

    /// Property: matching never panics on arbitrary input
    #[test]
    fn matching_never_panics(pattern in ".{0,24}", name in ".{0,24}") {
        let _ = GlobPattern::new(pattern).matches(&name);
    }
}

// ============================================================================
// POLICY PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: control actions pass regardless of flag and allow-list
    #[test]
    fn control_actions_never_rejected(suspended in any::<bool>(), index in 0usize..3) {
        let policy = SuspendPolicy::default();
        let node = NodeId::from("n");
        prop_assert!(policy.check_action(CONTROL_ACTIONS[index], suspended, &node).is_ok());
    }

    /// Property: nothing is rejected while the service is not suspended
    #[test]
    fn nothing_rejected_while_resumed(name in dotted_name()) {
        let policy = SuspendPolicy::default();
        let node = NodeId::from("n");
        prop_assert!(policy.check_action(&name, false, &node).is_ok());
        prop_assert!(policy.check_event(&name, false, &node).is_ok());
    }

    /// Property: unlisted actions are rejected while suspended, with the name in the data
    #[test]
    fn unlisted_actions_rejected_while_suspended(name in "[a-z]{1,12}") {
        prop_assume!(!CONTROL_ACTIONS.contains(&name.as_str()));
        let policy = SuspendPolicy::default();
        let node = NodeId::from("n");
        let err = policy.check_action(&name, true, &node).unwrap_err();
        let json = err.to_json();
        prop_assert_eq!(json["data"]["action"].as_str(), Some(name.as_str()));
    }

    /// Property: `$`-prefixed events pass even with an empty allow-list
    #[test]
    fn internal_events_never_rejected(name in dotted_name()) {
        let policy = SuspendPolicy::new(AllowList::default(), AllowList::default());
        let node = NodeId::from("n");
        let event = format!("${}", name);
        prop_assert!(policy.check_event(&event, true, &node).is_ok());
    }
}
