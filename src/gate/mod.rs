//! Suspend gate
//!
//! Puts a service into a suspended state where inbound actions and events
//! are rejected with [`ServiceSuspended`], except for:
//! - the gate's own control actions (`suspendService`, `resumeService`, `isSuspended`)
//! - configured allow-lists
//! - internal (`$`-prefixed) and suspend/resume notification events
//!
//! Each gate owns its flag. Nothing is shared between service instances, so
//! nodes in a cluster may briefly disagree after a remote suspend request.

pub mod handler;
pub mod policy;

#[cfg(test)]
mod proptests;

pub use handler::{handler_fn, HandlerError, MethodTable, Transition, TransitionHandler};
pub use policy::{
    control_request, is_addressed_to, is_control_action, is_internal_event, is_own_event,
    SuspendPolicy, CONTROL_ACTIONS, INTERNAL_EVENT_PREFIX, RESUME_ACTION, STATUS_ACTION,
    SUSPEND_ACTION,
};

use crate::broker::traits::{Broadcaster, CallContext, NodeId};
use crate::error::{GateResult, ServiceSuspended, SettingsError, SettingsResult};
use crate::settings::SuspendSettings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Generic notification sent after a suspend, payload `{name}`.
pub const SUSPENDED_EVENT: &str = "service.suspended";
/// Generic notification sent after a resume, payload `{name}`.
pub const RESUMED_EVENT: &str = "service.resumed";

/// Reply of the control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendStatus {
    pub suspended: bool,
}

/// Suspend/resume gate for one service instance.
pub struct SuspendGate {
    service_name: String,
    node_id: NodeId,
    suspended: AtomicBool,
    policy: SuspendPolicy,
    handler: Option<Arc<dyn TransitionHandler>>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl SuspendGate {
    /// Start building a gate for `service_name` running on `node_id`.
    ///
    /// `broadcaster` is the host's default; a call context carrying its own
    /// broadcaster takes precedence per call.
    pub fn builder(
        service_name: impl Into<String>,
        node_id: impl Into<NodeId>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> SuspendGateBuilder {
        SuspendGateBuilder {
            service_name: service_name.into(),
            node_id: node_id.into(),
            broadcaster,
            settings: SuspendSettings::default(),
            methods: MethodTable::default(),
            handler: None,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn policy(&self) -> &SuspendPolicy {
        &self.policy
    }

    /// Current flag. No side effects.
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub fn status(&self) -> SuspendStatus {
        SuspendStatus {
            suspended: self.is_suspended(),
        }
    }

    /// Before-action hook. `action` is the action's name within the service
    /// (`baz`, not `foo.baz`); `caller` is the calling node.
    pub fn before_action(&self, action: &str, caller: &NodeId) -> Result<(), ServiceSuspended> {
        let result = self
            .policy
            .check_action(action, self.is_suspended(), caller);
        if let Err(err) = &result {
            debug!(service = %self.service_name, %caller, action, "rejected: {}", err.data);
        }
        result
    }

    /// Event listener hook, run for every inbound broadcast.
    pub fn on_event(&self, event: &str, sender: &NodeId) -> Result<(), ServiceSuspended> {
        let result = if is_addressed_to(&self.service_name, event) {
            Ok(())
        } else {
            self.policy.check_event(event, self.is_suspended(), sender)
        };
        if let Err(err) = &result {
            debug!(service = %self.service_name, %sender, event, "rejected: {}", err.data);
        }
        result
    }

    /// Suspend the service.
    ///
    /// A no-op returning `{suspended: true}` if already suspended. Otherwise
    /// flips the flag, runs the transition handler, then broadcasts
    /// `service.<name>.suspended` and `service.suspended`.
    pub async fn suspend(&self, ctx: Option<&CallContext>) -> GateResult<SuspendStatus> {
        self.transition(Transition::Suspend, ctx).await
    }

    /// Resume the service. Mirror image of [`SuspendGate::suspend`].
    pub async fn resume(&self, ctx: Option<&CallContext>) -> GateResult<SuspendStatus> {
        self.transition(Transition::Resume, ctx).await
    }

    async fn transition(
        &self,
        transition: Transition,
        ctx: Option<&CallContext>,
    ) -> GateResult<SuspendStatus> {
        let target = transition == Transition::Suspend;

        // Only the caller that actually flips the flag runs the side effects.
        if self
            .suspended
            .compare_exchange(!target, target, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SuspendStatus { suspended: target });
        }

        warn!(
            service = %self.service_name,
            node = %self.node_id,
            "Service '{}' {}",
            self.service_name,
            transition.past_tense()
        );

        if let Some(handler) = &self.handler {
            handler.on_transition(transition, ctx).await?;
        }

        let broadcaster = CallContext::broadcaster_or(ctx, &self.broadcaster);
        let generic = match transition {
            Transition::Suspend => SUSPENDED_EVENT,
            Transition::Resume => RESUMED_EVENT,
        };
        broadcaster
            .broadcast(&self.scoped_event(transition), None)
            .await?;
        broadcaster
            .broadcast(generic, Some(json!({ "name": self.service_name })))
            .await?;

        Ok(self.status())
    }

    /// `service.<name>.suspended` / `service.<name>.resumed`.
    pub fn scoped_event(&self, transition: Transition) -> String {
        format!("service.{}.{}", self.service_name, transition.past_tense())
    }

    /// Apply a remote `service.<target>.suspend` / `.resume` request.
    ///
    /// `<target>` is matched as a glob against this service's name. Returns
    /// `Ok(None)` for any event that is not a control request for this service.
    pub async fn handle_control_event(&self, event: &str) -> GateResult<Option<SuspendStatus>> {
        match control_request(&self.service_name, event) {
            Some(Transition::Suspend) => self.suspend(None).await.map(Some),
            Some(Transition::Resume) => self.resume(None).await.map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for SuspendGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspendGate")
            .field("service_name", &self.service_name)
            .field("node_id", &self.node_id)
            .field("suspended", &self.is_suspended())
            .field("policy", &self.policy)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Builder for [`SuspendGate`].
pub struct SuspendGateBuilder {
    service_name: String,
    node_id: NodeId,
    broadcaster: Arc<dyn Broadcaster>,
    settings: SuspendSettings,
    methods: MethodTable,
    handler: Option<Arc<dyn TransitionHandler>>,
}

impl SuspendGateBuilder {
    pub fn settings(mut self, settings: SuspendSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Methods that `settings.handler` may name.
    pub fn methods(mut self, methods: MethodTable) -> Self {
        self.methods = methods;
        self
    }

    /// Use `handler` directly. Takes precedence over `settings.handler`.
    pub fn handler(mut self, handler: Arc<dyn TransitionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Build the gate, resolving a named handler against the method table.
    pub fn build(self) -> SettingsResult<SuspendGate> {
        if self.service_name.is_empty() {
            return Err(SettingsError::EmptyServiceName);
        }

        let handler = match (self.handler, &self.settings.handler) {
            (Some(handler), _) => Some(handler),
            (None, Some(name)) => Some(self.methods.resolve(name)?),
            (None, None) => None,
        };

        Ok(SuspendGate {
            service_name: self.service_name,
            node_id: self.node_id,
            suspended: AtomicBool::new(false),
            policy: SuspendPolicy::from(&self.settings),
            handler,
            broadcaster: self.broadcaster,
        })
    }
}
