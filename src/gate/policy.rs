//! Gating decisions.
//!
//! Pure functions of (name, suspended flag, allow-lists). The gate feeds its
//! own flag in; the CLI feeds a flag from the command line.

use super::handler::Transition;
use crate::broker::traits::NodeId;
use crate::error::ServiceSuspended;
use crate::pattern::{AllowList, GlobPattern};
use crate::settings::SuspendSettings;
use std::sync::OnceLock;

/// Control action: suspend the service.
pub const SUSPEND_ACTION: &str = "suspendService";
/// Control action: resume the service.
pub const RESUME_ACTION: &str = "resumeService";
/// Control action: report suspension status.
pub const STATUS_ACTION: &str = "isSuspended";

/// Actions that stay reachable no matter what.
pub const CONTROL_ACTIONS: [&str; 3] = [SUSPEND_ACTION, RESUME_ACTION, STATUS_ACTION];

/// Events starting with this are framework-internal and always delivered.
pub const INTERNAL_EVENT_PREFIX: &str = "$";

/// Remote request to suspend `service.<name>`.
pub const REMOTE_SUSPEND_PATTERN: &str = "service.*.suspend";
/// Remote request to resume `service.<name>`.
pub const REMOTE_RESUME_PATTERN: &str = "service.*.resume";

const OWN_EVENT_PATTERNS: [&str; 6] = [
    "service.*.suspended",
    "service.*.resumed",
    "service.suspended",
    "service.resumed",
    REMOTE_SUSPEND_PATTERN,
    REMOTE_RESUME_PATTERN,
];

fn own_events() -> &'static [GlobPattern] {
    static OWN: OnceLock<Vec<GlobPattern>> = OnceLock::new();
    OWN.get_or_init(|| OWN_EVENT_PATTERNS.iter().copied().map(GlobPattern::new).collect())
}

/// `true` for `suspendService`, `resumeService` and `isSuspended`.
pub fn is_control_action(action: &str) -> bool {
    CONTROL_ACTIONS.contains(&action)
}

/// `true` for suspend/resume notifications and remote control requests.
pub fn is_own_event(event: &str) -> bool {
    own_events().iter().any(|p| p.matches(event))
}

/// `true` for framework-internal events (`$node.connected`, ...).
pub fn is_internal_event(event: &str) -> bool {
    event.starts_with(INTERNAL_EVENT_PREFIX)
}

/// Transition requested by a remote `service.<target>.suspend|resume`
/// event, if `<target>` matches `service_name` as a glob.
pub fn control_request(service_name: &str, event: &str) -> Option<Transition> {
    let rest = event.strip_prefix("service.")?;
    let (target, verb) = rest.rsplit_once('.')?;
    let transition = match verb {
        "suspend" => Transition::Suspend,
        "resume" => Transition::Resume,
        _ => return None,
    };
    GlobPattern::new(target)
        .matches(service_name)
        .then_some(transition)
}

/// `true` for `service_name`'s own suspended/resumed notifications and for
/// control requests addressed to it. Holds for dotted names too, which the
/// one-segment own-event patterns miss.
pub fn is_addressed_to(service_name: &str, event: &str) -> bool {
    let notification = event
        .strip_prefix("service.")
        .and_then(|rest| rest.strip_prefix(service_name))
        .and_then(|rest| rest.strip_prefix('.'));
    matches!(notification, Some("suspended" | "resumed"))
        || control_request(service_name, event).is_some()
}

/// Allow-lists of one gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspendPolicy {
    pub allowed_actions: AllowList,
    pub allowed_events: AllowList,
}

impl SuspendPolicy {
    pub fn new(allowed_actions: AllowList, allowed_events: AllowList) -> Self {
        Self {
            allowed_actions,
            allowed_events,
        }
    }

    /// Decide an inbound action call.
    ///
    /// Actions are only gated while suspended. Order: control actions,
    /// not suspended, allow-list, reject.
    pub fn check_action(
        &self,
        action: &str,
        suspended: bool,
        node_id: &NodeId,
    ) -> Result<(), ServiceSuspended> {
        if is_control_action(action) || !suspended || self.allowed_actions.matches(action) {
            return Ok(());
        }
        Err(ServiceSuspended::action(action, node_id.clone()))
    }

    /// Decide an inbound event delivery.
    ///
    /// Order: not suspended, internal events, own events, allow-list, reject.
    pub fn check_event(
        &self,
        event: &str,
        suspended: bool,
        node_id: &NodeId,
    ) -> Result<(), ServiceSuspended> {
        if !suspended
            || is_internal_event(event)
            || is_own_event(event)
            || self.allowed_events.matches(event)
        {
            return Ok(());
        }
        Err(ServiceSuspended::event(event, node_id.clone()))
    }
}

impl From<&SuspendSettings> for SuspendPolicy {
    fn from(settings: &SuspendSettings) -> Self {
        Self::new(
            settings.allowed_actions.clone(),
            settings.allowed_events.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SuspendedData;

    fn node() -> NodeId {
        NodeId::from("caller-node")
    }

    #[test]
    fn test_addressed_to_dotted_names() {
        assert!(is_addressed_to("v2.users", "service.v2.users.suspended"));
        assert!(is_addressed_to("v2.users", "service.v2.users.resumed"));
        assert!(is_addressed_to("v2.users", "service.v2.users.suspend"));
        assert!(is_addressed_to("v2.users", "service.v2.users.resume"));
        assert!(is_addressed_to("foo", "service.foo.suspended"));

        assert!(!is_addressed_to("v2.users", "service.v2.suspended"));
        assert!(!is_addressed_to("v2.users", "service.v2.usersx.suspended"));
        assert!(!is_addressed_to("v2.users", "service.v2.users.created"));
        assert!(!is_addressed_to("foo", "service.bar.suspended"));
    }

    #[test]
    fn test_control_request_targets() {
        assert_eq!(
            control_request("v2.users", "service.v2.users.suspend"),
            Some(Transition::Suspend)
        );
        assert_eq!(
            control_request("v2.users", "service.v2.*.resume"),
            Some(Transition::Resume)
        );
        assert_eq!(control_request("foo", "service.*.suspend"), Some(Transition::Suspend));
        assert_eq!(control_request("foo", "service.bar.suspend"), None);
        assert_eq!(control_request("foo", "service.foo.suspended"), None);
        assert_eq!(control_request("foo", "user.foo.suspend"), None);
    }

    #[test]
    fn test_control_actions_always_pass() {
        let policy = SuspendPolicy::default();
        for action in CONTROL_ACTIONS {
            assert!(policy.check_action(action, true, &node()).is_ok());
            assert!(policy.check_action(action, false, &node()).is_ok());
        }
    }

    #[test]
    fn test_actions_pass_while_not_suspended() {
        let policy = SuspendPolicy::default();
        assert!(policy.check_action("baz", false, &node()).is_ok());
    }

    #[test]
    fn test_unlisted_action_rejected_while_suspended() {
        let policy = SuspendPolicy::default();
        let err = policy.check_action("baz", true, &node()).unwrap_err();
        assert_eq!(
            err.data,
            SuspendedData::Action {
                action: "baz".to_string(),
                node_id: node(),
            }
        );
    }

    #[test]
    fn test_allowed_action_passes_while_suspended() {
        let policy = SuspendPolicy::new(AllowList::patterns(["health", "get*"]), AllowList::default());
        assert!(policy.check_action("health", true, &node()).is_ok());
        assert!(policy.check_action("getUser", true, &node()).is_ok());
        assert!(policy.check_action("deleteUser", true, &node()).is_err());
    }

    #[test]
    fn test_wildcard_all_actions() {
        let policy = SuspendPolicy::new(AllowList::All, AllowList::default());
        assert!(policy.check_action("anything", true, &node()).is_ok());
    }

    #[test]
    fn test_events_pass_while_not_suspended() {
        let policy = SuspendPolicy::default();
        assert!(policy.check_event("user.created", false, &node()).is_ok());
    }

    #[test]
    fn test_internal_events_always_pass() {
        let policy = SuspendPolicy::default();
        assert!(policy.check_event("$node.connected", true, &node()).is_ok());
        assert!(policy.check_event("$services.changed", true, &node()).is_ok());
    }

    #[test]
    fn test_own_events_always_pass() {
        let policy = SuspendPolicy::default();
        for event in [
            "service.foo.suspended",
            "service.foo.resumed",
            "service.suspended",
            "service.resumed",
            "service.foo.suspend",
            "service.foo.resume",
        ] {
            assert!(
                policy.check_event(event, true, &node()).is_ok(),
                "{} should pass",
                event
            );
        }
    }

    #[test]
    fn test_unlisted_event_rejected_while_suspended() {
        let policy = SuspendPolicy::default();
        let err = policy.check_event("user.created", true, &node()).unwrap_err();
        assert_eq!(
            err.data,
            SuspendedData::Event {
                event: "user.created".to_string(),
                node_id: node(),
            }
        );
    }

    #[test]
    fn test_allowed_events() {
        let policy = SuspendPolicy::new(AllowList::default(), AllowList::patterns(["user.*"]));
        assert!(policy.check_event("user.created", true, &node()).is_ok());
        assert!(policy.check_event("order.created", true, &node()).is_err());

        let policy = SuspendPolicy::new(AllowList::default(), AllowList::All);
        assert!(policy.check_event("order.created", true, &node()).is_ok());
    }

    #[test]
    fn test_from_settings() {
        let settings = SuspendSettings::new().allowed_actions(AllowList::All);
        let policy = SuspendPolicy::from(&settings);
        assert!(policy.allowed_actions.is_all());
        assert!(!policy.allowed_events.is_all());
    }
}
