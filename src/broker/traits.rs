//! Host framework contract.
//!
//! The gate only needs two things from its host: a way to broadcast
//! notifications and a call context describing who is calling.
//! Both are traits/values here so tests can swap in [`super::MockBroadcaster`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Identifier of a running node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

/// Result type for broadcast operations.
pub type BroadcastResult<T> = Result<T, BroadcastError>;

/// Broadcast failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Broker is no longer running")]
    Closed,
}

/// One-to-many event publication.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publish `event` to every subscriber in the mesh.
    async fn broadcast(&self, event: &str, payload: Option<Value>) -> BroadcastResult<()>;
}

/// An event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    /// Event name, e.g. `service.foo.suspended`.
    pub name: String,
    pub payload: Option<Value>,
    /// Node that broadcast the event.
    pub sender: NodeId,
}

impl BroadcastEvent {
    pub fn new(name: impl Into<String>, payload: Option<Value>, sender: NodeId) -> Self {
        Self {
            name: name.into(),
            payload,
            sender,
        }
    }
}

/// Per-call context handed to actions and control operations.
#[derive(Clone)]
pub struct CallContext {
    /// Node the call originated from.
    pub node_id: NodeId,
    /// Call parameters.
    pub params: Value,
    broadcaster: Option<Arc<dyn Broadcaster>>,
}

impl CallContext {
    /// Context without parameters or a broadcaster of its own.
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            params: Value::Null,
            broadcaster: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Attach a broadcaster that notifications for this call should go through.
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// The context's own broadcaster, if any.
    pub fn broadcaster(&self) -> Option<&Arc<dyn Broadcaster>> {
        self.broadcaster.as_ref()
    }

    /// Broadcaster to use for this call: the context's own, else `default`.
    pub fn broadcaster_or<'a>(
        ctx: Option<&'a CallContext>,
        default: &'a Arc<dyn Broadcaster>,
    ) -> &'a Arc<dyn Broadcaster> {
        ctx.and_then(CallContext::broadcaster).unwrap_or(default)
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("node_id", &self.node_id)
            .field("params", &self.params)
            .field("has_broadcaster", &self.broadcaster.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MockBroadcaster;

    #[test]
    fn test_node_id_display() {
        let node = NodeId::from("node-1");
        assert_eq!(format!("{}", node), "node-1");
        assert_eq!(node.as_str(), "node-1");
    }

    #[test]
    fn test_node_id_serializes_as_string() {
        let node = NodeId::from("node-1");
        assert_eq!(serde_json::to_string(&node).unwrap(), r#""node-1""#);
    }

    #[test]
    fn test_broadcast_error_display() {
        assert_eq!(
            BroadcastError::Transport("timeout".to_string()).to_string(),
            "Transport error: timeout"
        );
        assert_eq!(
            BroadcastError::Closed.to_string(),
            "Broker is no longer running"
        );
    }

    #[tokio::test]
    async fn test_broadcaster_or_prefers_context() {
        let default = MockBroadcaster::new();
        let from_ctx = MockBroadcaster::new();
        let default_dyn: Arc<dyn Broadcaster> = Arc::new(default.clone());

        let ctx = CallContext::new("caller").with_broadcaster(Arc::new(from_ctx.clone()));
        CallContext::broadcaster_or(Some(&ctx), &default_dyn)
            .broadcast("picked", None)
            .await
            .unwrap();

        assert_eq!(from_ctx.event_names(), vec!["picked"]);
        assert!(default.event_names().is_empty());
    }

    #[tokio::test]
    async fn test_broadcaster_or_falls_back_to_default() {
        let default = MockBroadcaster::new();
        let default_dyn: Arc<dyn Broadcaster> = Arc::new(default.clone());

        let ctx = CallContext::new("caller");
        CallContext::broadcaster_or(Some(&ctx), &default_dyn)
            .broadcast("fallback", None)
            .await
            .unwrap();
        CallContext::broadcaster_or(None, &default_dyn)
            .broadcast("no-context", None)
            .await
            .unwrap();

        assert_eq!(default.event_names(), vec!["fallback", "no-context"]);
    }
}
