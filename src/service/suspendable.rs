//! A hosted service with a suspend gate in front of it.
//!
//! The gate sits between the broker and the service's own handlers:
//!
//! ```text
//! call(action)  -> before_action -> control op | registered action
//! deliver(event) -> remote control -> on_event -> matching subscriptions
//! ```

use super::action::{ActionHandler, EventHandler};
use crate::broker::traits::{BroadcastEvent, Broadcaster, CallContext, NodeId};
use crate::error::{ServiceError, ServiceResult, SettingsError, SettingsResult};
use crate::gate::{
    is_control_action, MethodTable, SuspendGate, TransitionHandler, RESUME_ACTION,
    STATUS_ACTION, SUSPEND_ACTION,
};
use crate::pattern::GlobPattern;
use crate::settings::SuspendSettings;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A service whose actions and events go through a [`SuspendGate`].
pub struct SuspendableService {
    name: String,
    gate: SuspendGate,
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    events: Vec<(GlobPattern, Arc<dyn EventHandler>)>,
    dependencies: Vec<String>,
}

impl SuspendableService {
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder {
            name: name.into(),
            settings: SuspendSettings::default(),
            actions: HashMap::new(),
            events: Vec::new(),
            methods: MethodTable::new(),
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gate(&self) -> &SuspendGate {
        &self.gate
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Registered action names plus the control actions, sorted.
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.extend([SUSPEND_ACTION, RESUME_ACTION, STATUS_ACTION].map(String::from));
        names.sort();
        names
    }

    /// Invoke `action` (the name within this service).
    pub async fn call(&self, action: &str, ctx: &CallContext) -> ServiceResult<Value> {
        self.gate.before_action(action, &ctx.node_id)?;

        match action {
            SUSPEND_ACTION => {
                let status = self.gate.suspend(Some(ctx)).await?;
                Ok(json!(status))
            }
            RESUME_ACTION => {
                let status = self.gate.resume(Some(ctx)).await?;
                Ok(json!(status))
            }
            STATUS_ACTION => Ok(Value::Bool(self.gate.is_suspended())),
            _ => {
                let handler = self
                    .actions
                    .get(action)
                    .ok_or_else(|| ServiceError::ActionNotFound(format!("{}.{}", self.name, action)))?;
                handler.call(ctx).await
            }
        }
    }

    /// Deliver a broadcast event. Returns how many subscriptions ran.
    ///
    /// Remote suspend/resume requests are applied first so they work while
    /// suspended. Other events then go through the gate.
    pub async fn deliver(&self, event: &BroadcastEvent) -> ServiceResult<usize> {
        self.gate.handle_control_event(&event.name).await?;
        self.gate.on_event(&event.name, &event.sender)?;

        let mut handled = 0;
        for (pattern, handler) in &self.events {
            if pattern.matches(&event.name) {
                handler.handle(event).await?;
                handled += 1;
            }
        }
        Ok(handled)
    }
}

/// Builder for [`SuspendableService`].
pub struct ServiceBuilder {
    name: String,
    settings: SuspendSettings,
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    events: Vec<(GlobPattern, Arc<dyn EventHandler>)>,
    methods: MethodTable,
    handler: Option<Arc<dyn TransitionHandler>>,
}

impl ServiceBuilder {
    pub fn settings(mut self, settings: SuspendSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn action(mut self, name: impl Into<String>, handler: impl ActionHandler + 'static) -> Self {
        let handler: Arc<dyn ActionHandler> = Arc::new(handler);
        self.actions.insert(name.into(), handler);
        self
    }

    /// Subscribe to events matching `pattern`.
    pub fn event(mut self, pattern: &str, handler: impl EventHandler + 'static) -> Self {
        let handler: Arc<dyn EventHandler> = Arc::new(handler);
        self.events.push((GlobPattern::new(pattern), handler));
        self
    }

    /// Register a method that `settings.handler` can name.
    pub fn method(
        mut self,
        name: impl Into<String>,
        handler: impl TransitionHandler + 'static,
    ) -> Self {
        self.methods.insert(name, Arc::new(handler));
        self
    }

    /// Transition handler supplied directly.
    pub fn transition_handler(mut self, handler: impl TransitionHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build on `node_id`, with `broadcaster` as the gate's default.
    pub fn build(
        self,
        node_id: NodeId,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> SettingsResult<SuspendableService> {
        if let Some(reserved) = self.actions.keys().find(|name| is_control_action(name)) {
            return Err(SettingsError::ReservedAction(reserved.clone()));
        }

        let dependencies = self.settings.dependencies.clone();
        let mut gate = SuspendGate::builder(self.name.clone(), node_id, broadcaster)
            .settings(self.settings)
            .methods(self.methods);
        if let Some(handler) = self.handler {
            gate = gate.handler(handler);
        }

        Ok(SuspendableService {
            name: self.name,
            gate: gate.build()?,
            actions: self.actions,
            events: self.events,
            dependencies,
        })
    }
}
