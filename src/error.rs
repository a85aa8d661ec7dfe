//! Error types shared by the gate, the settings loader and the host.

use crate::broker::traits::{BroadcastError, NodeId};
use crate::gate::handler::HandlerError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;

/// HTTP-style status carried by [`ServiceSuspended`].
pub const SERVICE_SUSPENDED_CODE: u16 = 503;

/// Machine-readable tag carried by [`ServiceSuspended`].
pub const SERVICE_SUSPENDED_KIND: &str = "SERVICE_SUSPENDED";

/// What the rejected request was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuspendedData {
    /// An inbound action call.
    Action {
        action: String,
        #[serde(rename = "nodeID")]
        node_id: NodeId,
    },
    /// An inbound broadcast event.
    Event {
        event: String,
        #[serde(rename = "nodeID")]
        node_id: NodeId,
    },
}

/// Rejection raised while a service is suspended.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Service suspended")]
pub struct ServiceSuspended {
    pub data: SuspendedData,
}

impl ServiceSuspended {
    /// Rejection for an action call.
    pub fn action(action: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            data: SuspendedData::Action {
                action: action.into(),
                node_id,
            },
        }
    }

    /// Rejection for an event delivery.
    pub fn event(event: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            data: SuspendedData::Event {
                event: event.into(),
                node_id,
            },
        }
    }

    /// Always 503.
    pub fn code(&self) -> u16 {
        SERVICE_SUSPENDED_CODE
    }

    /// Always `SERVICE_SUSPENDED`.
    pub fn kind(&self) -> &'static str {
        SERVICE_SUSPENDED_KIND
    }

    /// Calling node recorded in the error data.
    pub fn node_id(&self) -> &NodeId {
        match &self.data {
            SuspendedData::Action { node_id, .. } | SuspendedData::Event { node_id, .. } => {
                node_id
            }
        }
    }

    /// Framework-style error object sent back to remote callers.
    pub fn to_json(&self) -> Value {
        json!({
            "name": "ServiceSuspendError",
            "message": self.to_string(),
            "code": self.code(),
            "type": self.kind(),
            "data": self.data,
        })
    }
}

/// Result type for suspend/resume operations.
pub type GateResult<T> = Result<T, GateError>;

/// Failures of the gate's control operations.
///
/// Handler and broadcaster failures are carried as-is.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Suspended(#[from] ServiceSuspended),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

/// Result type for settings loading and gate construction.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Settings could not be loaded or resolved.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file '{path}': {message}")]
    Write { path: PathBuf, message: String },

    #[error("Transition handler '{0}' is not a method of this service")]
    UnknownHandler(String),

    #[error("Service name must not be empty")]
    EmptyServiceName,

    #[error("Action '{0}' is reserved for suspend control")]
    ReservedAction(String),

    #[error("Service '{0}' is already registered")]
    DuplicateService(String),
}

/// Result type for host dispatch.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures seen by callers of a hosted service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Suspended(#[from] ServiceSuspended),

    #[error("Action '{0}' not found")]
    ActionNotFound(String),

    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("Action failed: {0}")]
    Handler(String),

    #[error(transparent)]
    Gate(GateError),
}

impl From<GateError> for ServiceError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Suspended(suspended) => ServiceError::Suspended(suspended),
            other => ServiceError::Gate(other),
        }
    }
}

impl ServiceError {
    /// The suspension rejection, if that is what this is.
    pub fn as_suspended(&self) -> Option<&ServiceSuspended> {
        match self {
            ServiceError::Suspended(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SuspendedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspendedData::Action { action, node_id } => {
                write!(f, "action '{}' from {}", action, node_id)
            }
            SuspendedData::Event { event, node_id } => {
                write!(f, "event '{}' from {}", event, node_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_suspended_code_and_kind() {
        let err = ServiceSuspended::action("baz", NodeId::from("node-1"));
        assert_eq!(err.code(), 503);
        assert_eq!(err.kind(), "SERVICE_SUSPENDED");
        assert_eq!(err.to_string(), "Service suspended");
        assert_eq!(err.node_id().as_str(), "node-1");
    }

    #[test]
    fn test_action_data_json_shape() {
        let err = ServiceSuspended::action("baz", NodeId::from("node-1"));
        let json = err.to_json();
        assert_eq!(json["code"], 503);
        assert_eq!(json["type"], "SERVICE_SUSPENDED");
        assert_eq!(json["data"]["action"], "baz");
        assert_eq!(json["data"]["nodeID"], "node-1");
        assert!(json["data"].get("event").is_none());
    }

    #[test]
    fn test_event_data_json_shape() {
        let err = ServiceSuspended::event("user.created", NodeId::from("node-2"));
        let json = err.to_json();
        assert_eq!(json["data"]["event"], "user.created");
        assert_eq!(json["data"]["nodeID"], "node-2");
    }

    #[test]
    fn test_gate_error_into_service_error_unwraps_suspension() {
        let gate_err = GateError::from(ServiceSuspended::action("baz", NodeId::from("n")));
        let service_err = ServiceError::from(gate_err);
        assert!(service_err.as_suspended().is_some());

        let gate_err = GateError::from(BroadcastError::Closed);
        let service_err = ServiceError::from(gate_err);
        assert!(matches!(service_err, ServiceError::Gate(GateError::Broadcast(_))));
    }
}
