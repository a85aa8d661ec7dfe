//! In-process broker
//!
//! Hosts [`SuspendableService`]s on one node. Broadcasts fan out to every
//! hosted service and to observers subscribed on a
//! `tokio::sync::broadcast` channel.
//!
//! ```text
//! broadcast(event)
//!      ↓
//! every service.deliver()   (gate rejections are logged, not returned)
//!      ↓
//! broadcast::Sender → observers
//! ```
//!
//! Services only hold a weak handle back to the broker, so dropping the
//! broker releases everything; later broadcasts fail with
//! [`BroadcastError::Closed`].

use super::traits::*;
use crate::error::{ServiceError, ServiceResult, SettingsError, SettingsResult};
use crate::service::{ServiceBuilder, SuspendableService};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Observer channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Outcome of one broadcast across the hosted services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Services that took the event.
    pub accepted: usize,
    /// Services whose gate turned the event away.
    pub rejected: usize,
    /// Services whose handlers or control transition failed.
    pub failed: usize,
}

/// In-process broker for one node.
#[derive(Clone)]
pub struct LocalBroker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    node_id: NodeId,
    services: RwLock<HashMap<String, Arc<SuspendableService>>>,
    observers: broadcast::Sender<BroadcastEvent>,
}

impl LocalBroker {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self::with_capacity(node_id, DEFAULT_CAPACITY)
    }

    /// Broker whose observer channel buffers `capacity` events.
    pub fn with_capacity(node_id: impl Into<NodeId>, capacity: usize) -> Self {
        let (observers, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(BrokerInner {
                node_id: node_id.into(),
                services: RwLock::new(HashMap::new()),
                observers,
            }),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.inner.node_id
    }

    /// Weak broadcaster handle for services hosted here.
    pub fn handle(&self) -> Arc<dyn Broadcaster> {
        Arc::new(BrokerHandle {
            inner: Arc::downgrade(&self.inner),
        })
    }

    /// Build and register a service on this node.
    ///
    /// The name check and the insert happen under one write lock.
    pub fn create_service(&self, builder: ServiceBuilder) -> SettingsResult<Arc<SuspendableService>> {
        let service = {
            let mut services = self
                .inner
                .services
                .write()
                .unwrap_or_else(|e| e.into_inner());
            let slot = match services.entry(builder.name().to_string()) {
                Entry::Occupied(existing) => {
                    return Err(SettingsError::DuplicateService(existing.key().clone()))
                }
                Entry::Vacant(slot) => slot,
            };
            let service = Arc::new(builder.build(self.inner.node_id.clone(), self.handle())?);
            slot.insert(service.clone());
            service
        };

        let missing = self.missing_dependencies(&service);
        if !missing.is_empty() {
            debug!(service = service.name(), ?missing, "dependencies not registered yet");
        }
        Ok(service)
    }

    pub fn service(&self, name: &str) -> Option<Arc<SuspendableService>> {
        self.inner.snapshot_one(name)
    }

    /// Names of registered services, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .services
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Declared dependencies of `service` that are not registered here.
    pub fn missing_dependencies(&self, service: &SuspendableService) -> Vec<String> {
        let services = self
            .inner
            .services
            .read()
            .unwrap_or_else(|e| e.into_inner());
        service
            .dependencies()
            .iter()
            .filter(|dep| !services.contains_key(dep.as_str()))
            .cloned()
            .collect()
    }

    /// Call `service.action` from this node.
    pub async fn call(&self, target: &str, params: Value) -> ServiceResult<Value> {
        let ctx = CallContext::new(self.inner.node_id.clone()).with_params(params);
        self.call_with(target, ctx).await
    }

    /// Call `service.action` with an explicit context (e.g. from another node).
    ///
    /// The context's broadcaster defaults to this broker.
    pub async fn call_with(&self, target: &str, ctx: CallContext) -> ServiceResult<Value> {
        let (service_name, action) = target
            .rsplit_once('.')
            .ok_or_else(|| ServiceError::ActionNotFound(target.to_string()))?;
        let service = self
            .service(service_name)
            .ok_or_else(|| ServiceError::ServiceNotFound(service_name.to_string()))?;

        let ctx = if ctx.broadcaster().is_some() {
            ctx
        } else {
            ctx.with_broadcaster(self.handle())
        };

        debug!(action = target, caller = %ctx.node_id, "call");
        service.call(action, &ctx).await
    }

    /// Broadcast `event` as if it came from `sender`.
    pub async fn broadcast_from(
        &self,
        event: &str,
        payload: Option<Value>,
        sender: NodeId,
    ) -> DeliveryReport {
        self.inner
            .publish(BroadcastEvent::new(event, payload, sender))
            .await
    }

    /// Observe every event broadcast through this broker.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.inner.observers.subscribe()
    }
}

impl BrokerInner {
    fn snapshot(&self) -> Vec<Arc<SuspendableService>> {
        self.services
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    fn snapshot_one(&self, name: &str) -> Option<Arc<SuspendableService>> {
        self.services
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Deliver to every service, then to observers.
    async fn publish(&self, event: BroadcastEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for service in self.snapshot() {
            match service.deliver(&event).await {
                Ok(_) => report.accepted += 1,
                Err(ServiceError::Suspended(err)) => {
                    report.rejected += 1;
                    debug!(service = service.name(), event = %event.name, "not delivered: {}", err.data);
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(service = service.name(), event = %event.name, "event handler failed: {}", err);
                }
            }
        }

        // No observers is not an error.
        let _ = self.observers.send(event);
        report
    }
}

#[async_trait]
impl Broadcaster for LocalBroker {
    async fn broadcast(&self, event: &str, payload: Option<Value>) -> BroadcastResult<()> {
        self.inner
            .publish(BroadcastEvent::new(event, payload, self.inner.node_id.clone()))
            .await;
        Ok(())
    }
}

/// Broadcaster held by hosted services.
struct BrokerHandle {
    inner: Weak<BrokerInner>,
}

#[async_trait]
impl Broadcaster for BrokerHandle {
    async fn broadcast(&self, event: &str, payload: Option<Value>) -> BroadcastResult<()> {
        let inner = self.inner.upgrade().ok_or(BroadcastError::Closed)?;
        let sender = inner.node_id.clone();
        inner
            .publish(BroadcastEvent::new(event, payload, sender))
            .await;
        Ok(())
    }
}
