//! Service Suspend - suspend/resume gate for hosted services
//!
//! A service carrying a [`gate::SuspendGate`] can be switched into a
//! suspended state at runtime. While suspended it rejects inbound action
//! calls and ignores inbound broadcast events with
//! [`error::ServiceSuspended`] (code 503), except for:
//! - the control actions `suspendService`, `resumeService`, `isSuspended`
//! - configured allow-lists of action/event patterns
//! - framework-internal and suspend/resume notification events
//!
//! Suspension is tracked per service instance; it is not persisted and not
//! synchronized across nodes.

pub mod broker;
pub mod error;
pub mod gate;
pub mod pattern;
pub mod service;
pub mod settings;

pub use error::{GateError, ServiceError, ServiceSuspended, SettingsError};
pub use gate::{SuspendGate, SuspendStatus};
pub use settings::SuspendSettings;
