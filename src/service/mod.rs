//! In-process service hosting.
//!
//! A service built here carries the suspend gate the way a framework mixin
//! would: the control actions are added for it, and every inbound call and
//! event passes the gate before reaching the service's own handlers.

pub mod action;
pub mod suspendable;

pub use action::{action_fn, event_fn, ActionHandler, EventHandler};
pub use suspendable::{ServiceBuilder, SuspendableService};
