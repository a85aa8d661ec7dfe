//! Transition handlers.
//!
//! A service can hook every suspend/resume transition, e.g. to drain open
//! connections. Handlers are either supplied directly or named in settings
//! and looked up in the service's [`MethodTable`] once, when the gate is built.

use crate::broker::traits::CallContext;
use crate::error::{SettingsError, SettingsResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which way the gate just flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Suspend,
    Resume,
}

impl Transition {
    /// Past-tense name used in notifications (`suspended` / `resumed`).
    pub fn past_tense(&self) -> &'static str {
        match self {
            Transition::Suspend => "suspended",
            Transition::Resume => "resumed",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Suspend => f.write_str("suspend"),
            Transition::Resume => f.write_str("resume"),
        }
    }
}

/// Failure reported by a transition handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transition handler failed: {0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Hook run on every suspend/resume transition.
#[async_trait]
pub trait TransitionHandler: Send + Sync {
    /// Called after the flag flips and before notifications go out.
    /// `ctx` is absent when the transition was triggered locally or by a
    /// remote control event.
    async fn on_transition(
        &self,
        transition: Transition,
        ctx: Option<&CallContext>,
    ) -> Result<(), HandlerError>;
}

/// Adapter for plain closures.
pub struct FnHandler<F>(F);

/// Wrap a synchronous closure as a [`TransitionHandler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Transition, Option<&CallContext>) -> Result<(), HandlerError> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> TransitionHandler for FnHandler<F>
where
    F: Fn(Transition, Option<&CallContext>) -> Result<(), HandlerError> + Send + Sync,
{
    async fn on_transition(
        &self,
        transition: Transition,
        ctx: Option<&CallContext>,
    ) -> Result<(), HandlerError> {
        (self.0)(transition, ctx)
    }
}

/// Named methods a service exposes for use as transition handlers.
#[derive(Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Arc<dyn TransitionHandler>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn TransitionHandler>) {
        self.methods.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TransitionHandler>> {
        self.methods.get(name).cloned()
    }

    /// Look up `name`, failing if the service has no such method.
    pub fn resolve(&self, name: &str) -> SettingsResult<Arc<dyn TransitionHandler>> {
        self.get(name)
            .ok_or_else(|| SettingsError::UnknownHandler(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("MethodTable").field("methods", &names).finish()
    }
}
