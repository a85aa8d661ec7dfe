use service_suspend::gate::{CONTROL_ACTIONS, RESUMED_EVENT, SUSPENDED_EVENT};

/// Version line followed by the names every gate answers to
pub fn banner() -> String {
    format!(
        "service-suspend {}\n\
         Operator CLI for service suspend gates\n\
         \n\
         Control actions: {}\n\
         Notifications: service.<name>.suspended, service.<name>.resumed, {}, {}\n\
         Remote control: service.<name>.suspend, service.<name>.resume",
        env!("CARGO_PKG_VERSION"),
        CONTROL_ACTIONS.join(", "),
        SUSPENDED_EVENT,
        RESUMED_EVENT,
    )
}

pub fn execute() {
    println!("{}", banner());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_lists_wire_names() {
        let banner = banner();
        assert!(banner.starts_with(&format!("service-suspend {}", env!("CARGO_PKG_VERSION"))));
        assert!(banner.contains("suspendService, resumeService, isSuspended"));
        assert!(banner.contains("service.suspended, service.resumed"));
        assert!(banner.contains("service.<name>.resume"));
    }
}
