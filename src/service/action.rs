//! Action and event handler seams for hosted services.

use crate::broker::traits::{BroadcastEvent, CallContext};
use crate::error::ServiceResult;
use async_trait::async_trait;
use serde_json::Value;

/// Handler behind a named action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, ctx: &CallContext) -> ServiceResult<Value>;
}

/// Handler behind an event subscription.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &BroadcastEvent) -> ServiceResult<()>;
}

/// Closure adapter for [`ActionHandler`].
pub struct FnAction<F>(F);

/// Wrap a synchronous closure as an action.
pub fn action_fn<F>(f: F) -> FnAction<F>
where
    F: Fn(&CallContext) -> ServiceResult<Value> + Send + Sync,
{
    FnAction(f)
}

#[async_trait]
impl<F> ActionHandler for FnAction<F>
where
    F: Fn(&CallContext) -> ServiceResult<Value> + Send + Sync,
{
    async fn call(&self, ctx: &CallContext) -> ServiceResult<Value> {
        (self.0)(ctx)
    }
}

/// Closure adapter for [`EventHandler`].
pub struct FnEvent<F>(F);

/// Wrap a synchronous closure as an event subscriber.
pub fn event_fn<F>(f: F) -> FnEvent<F>
where
    F: Fn(&BroadcastEvent) -> ServiceResult<()> + Send + Sync,
{
    FnEvent(f)
}

#[async_trait]
impl<F> EventHandler for FnEvent<F>
where
    F: Fn(&BroadcastEvent) -> ServiceResult<()> + Send + Sync,
{
    async fn handle(&self, event: &BroadcastEvent) -> ServiceResult<()> {
        (self.0)(event)
    }
}
