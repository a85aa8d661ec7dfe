//! In-process simulation
//!
//! Hosts the configured service on a [`LocalBroker`] and runs a scripted
//! sequence of calls and broadcasts against it, printing what a caller
//! would see. Every non-control action named in a step is registered as an
//! echo action; a configured transition handler name is registered as a
//! method that logs the transition.

use super::config::GateConfig;
use serde_json::{json, Value};
use service_suspend::broker::{CallContext, DeliveryReport, LocalBroker, NodeId};
use service_suspend::error::{ServiceError, SettingsResult};
use service_suspend::gate::{handler_fn, is_control_action};
use service_suspend::service::{action_fn, SuspendableService};
use service_suspend::ServiceSuspended;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::info;

/// Node that simulated calls and broadcasts come from
const SIMULATION_CALLER: &str = "simulator";

/// One simulated step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Call an action of the configured service
    Call(String),
    /// Broadcast an event from the simulator node
    Emit(String),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("call", action)) if !action.is_empty() => Ok(Step::Call(action.to_string())),
            Some(("emit", event)) if !event.is_empty() => Ok(Step::Emit(event.to_string())),
            _ => Err(format!(
                "Invalid step '{}': expected call:<action> or emit:<event>",
                s
            )),
        }
    }
}

/// What a step produced
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Action returned a value
    Returned(Value),
    /// Action or event was rejected with this error object
    Rejected(Value),
    /// Action failed for another reason
    Failed(String),
    /// Event was delivered to the service
    Delivered,
}

pub async fn execute(config: String, steps: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = GateConfig::load(&PathBuf::from(config))?;
    super::logging::init(&config.logging)?;

    let steps = steps
        .iter()
        .map(|s| s.parse::<Step>())
        .collect::<Result<Vec<_>, _>>()?;

    let broker = host(&config, &steps)?;
    let mut notifications = broker.subscribe();

    println!("🧪 Simulating {} on {}", config.service.name, config.service.node_id);
    println!();

    for step in &steps {
        let outcome = run_step(&broker, &config.service.name, step).await;
        match (step, &outcome) {
            (Step::Call(action), StepOutcome::Returned(value)) => {
                println!("call {} → {}", action, value)
            }
            (Step::Call(action), StepOutcome::Failed(err)) => {
                println!("call {} ✗ {}", action, err)
            }
            (Step::Emit(event), StepOutcome::Delivered) => println!("emit {} → delivered", event),
            (Step::Emit(_), StepOutcome::Failed(err)) => println!("emit ✗ {}", err),
            (step, StepOutcome::Rejected(err)) => {
                println!("{:?} ✗ {}", step, serde_json::to_string(err)?)
            }
            (step, outcome) => println!("{:?} → {:?}", step, outcome),
        }
    }

    println!();
    println!("Broadcasts:");
    loop {
        match notifications.try_recv() {
            Ok(event) => println!("  {} from {}", event.name, event.sender),
            Err(TryRecvError::Lagged(skipped)) => println!("  ... {} more", skipped),
            Err(_) => break,
        }
    }

    Ok(())
}

/// Host the configured service on a fresh broker
pub fn host(config: &GateConfig, steps: &[Step]) -> SettingsResult<LocalBroker> {
    let broker = LocalBroker::new(config.service.node_id.as_str());
    let mut builder =
        SuspendableService::builder(config.service.name.clone()).settings(config.suspend.clone());

    for step in steps {
        if let Step::Call(action) = step {
            if !is_control_action(action) {
                let name = action.clone();
                builder = builder.action(
                    action.clone(),
                    action_fn(move |ctx| Ok(json!({ "action": name, "params": ctx.params }))),
                );
            }
        }
    }

    if let Some(method) = &config.suspend.handler {
        let method_name = method.clone();
        builder = builder.method(
            method.clone(),
            handler_fn(move |transition, _| {
                info!(method = %method_name, %transition, "transition handler invoked");
                Ok(())
            }),
        );
    }

    broker.create_service(builder)?;
    Ok(broker)
}

/// Run one step against `service` on `broker`
pub async fn run_step(broker: &LocalBroker, service: &str, step: &Step) -> StepOutcome {
    match step {
        Step::Call(action) => {
            let ctx = CallContext::new(SIMULATION_CALLER);
            match broker.call_with(&format!("{}.{}", service, action), ctx).await {
                Ok(value) => StepOutcome::Returned(value),
                Err(ServiceError::Suspended(rejection)) => {
                    StepOutcome::Rejected(rejection.to_json())
                }
                Err(err) => StepOutcome::Failed(err.to_string()),
            }
        }
        Step::Emit(event) => {
            let report = broker
                .broadcast_from(event, None, NodeId::from(SIMULATION_CALLER))
                .await;
            emit_outcome(event, report)
        }
    }
}

/// Outcome of an `emit` step on a broker hosting a single service
fn emit_outcome(event: &str, report: DeliveryReport) -> StepOutcome {
    if report.accepted > 0 {
        StepOutcome::Delivered
    } else if report.rejected > 0 {
        let rejection = ServiceSuspended::event(event, NodeId::from(SIMULATION_CALLER));
        StepOutcome::Rejected(rejection.to_json())
    } else {
        StepOutcome::Failed(format!("'{}' not delivered", event))
    }
}
