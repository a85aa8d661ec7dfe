//! Broker integration
//!
//! - `traits`: what the gate needs from its host (broadcaster, call context)
//! - `local`: an in-process broker hosting suspendable services
//! - `mock`: recording broadcaster for tests

pub mod local;
pub mod mock;
pub mod traits;

pub use local::{DeliveryReport, LocalBroker};
pub use mock::MockBroadcaster;
pub use traits::{
    BroadcastError, BroadcastEvent, BroadcastResult, Broadcaster, CallContext, NodeId,
};
