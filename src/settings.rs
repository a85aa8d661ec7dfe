//! Suspend settings.
//!
//! Static configuration set once when a service is constructed. Field names
//! also accept the camelCase spelling used by framework settings bags.

use crate::pattern::AllowList;
use serde::{Deserialize, Serialize};

/// Allow-lists and hooks for one service's suspend gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendSettings {
    /// Actions reachable while suspended (control actions always are).
    #[serde(default, alias = "allowedActions")]
    pub allowed_actions: AllowList,

    /// Events delivered while suspended (internal and own events always are).
    #[serde(default, alias = "allowedEvents", alias = "allowedEvent")]
    pub allowed_events: AllowList,

    /// Name of a service method to run on every transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,

    /// Services the host depends on. Passed through, never used for gating.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl SuspendSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowed_actions(mut self, list: AllowList) -> Self {
        self.allowed_actions = list;
        self
    }

    pub fn allowed_events(mut self, list: AllowList) -> Self {
        self.allowed_events = list;
        self
    }

    pub fn handler(mut self, method: impl Into<String>) -> Self {
        self.handler = Some(method.into());
        self
    }

    pub fn dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }
}
