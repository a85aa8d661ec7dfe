//! Offline gating decisions
//!
//! Evaluates a config's allow-lists without hosting the service. Prints
//! `allowed` or the JSON rejection a caller would receive, and exits
//! non-zero on rejection so the command can be scripted.

use super::config::GateConfig;
use service_suspend::broker::NodeId;
use service_suspend::gate::{is_addressed_to, SuspendPolicy};
use service_suspend::ServiceSuspended;
use std::path::PathBuf;

/// Decide an action call against `config`
pub fn decide_action(
    config: &GateConfig,
    action: &str,
    suspended: bool,
    node_id: &str,
) -> Result<(), ServiceSuspended> {
    SuspendPolicy::from(&config.suspend).check_action(action, suspended, &NodeId::from(node_id))
}

/// Decide an event delivery against `config`
pub fn decide_event(
    config: &GateConfig,
    event: &str,
    suspended: bool,
    node_id: &str,
) -> Result<(), ServiceSuspended> {
    if is_addressed_to(&config.service.name, event) {
        return Ok(());
    }
    SuspendPolicy::from(&config.suspend).check_event(event, suspended, &NodeId::from(node_id))
}

pub fn execute_action(
    config: String,
    action: String,
    suspended: bool,
    node_id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(config)?;
    report(
        &format!("action '{}.{}'", config.service.name, action),
        decide_action(&config, &action, suspended, &node_id),
    )
}

pub fn execute_event(
    config: String,
    event: String,
    suspended: bool,
    node_id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(config)?;
    report(
        &format!("event '{}' on {}", event, config.service.name),
        decide_event(&config, &event, suspended, &node_id),
    )
}

fn load(config: String) -> Result<GateConfig, Box<dyn std::error::Error>> {
    let config = GateConfig::load(&PathBuf::from(config))?;
    super::logging::init(&config.logging)?;
    Ok(config)
}

fn report(
    subject: &str,
    decision: Result<(), ServiceSuspended>,
) -> Result<(), Box<dyn std::error::Error>> {
    match decision {
        Ok(()) => {
            println!("✅ {} allowed", subject);
            Ok(())
        }
        Err(rejection) => {
            println!("{}", serde_json::to_string_pretty(&rejection.to_json())?);
            Err(format!("{} rejected: {}", subject, rejection).into())
        }
    }
}
